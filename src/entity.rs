//! Static mapping tables for destination types.
//!
//! Every destination type describes its writable properties once, in a
//! `static` [`EntityDescriptor`], together with the mapping annotations each
//! property carries. The [`entity!`](crate::entity!) macro writes that table
//! (and the [`Entity`] impl that reads and writes properties by name) from a
//! struct declaration:
//!
//! ```
//! use rowbind::{entity, mapped_enum};
//!
//! mapped_enum! {
//!     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//!     pub enum AccountState {
//!         Active = 1,
//!         #[alias("closed")]
//!         Inactive = 2,
//!     }
//! }
//!
//! entity! {
//!     #[derive(Debug, Default, Clone, PartialEq)]
//!     pub struct Account {
//!         pub id: i32,
//!         #[column("Status")]
//!         #[enum_map("A" => "Active", "I" => "Inactive")]
//!         pub state: AccountState,
//!         #[ignore]
//!         #[table_ignore]
//!         pub note: Option<String>,
//!     }
//! }
//! ```

use std::any::TypeId;

use crate::datatype::{PropertyType, Value};

/// `(external code, local member name)`
pub type EnumPair = (&'static str, &'static str);

/// Mapping annotations of one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotations {
    /// Explicit column names feeding this property.
    pub columns: &'static [&'static str],
    /// Never populated from a result set, even on an exact name match.
    pub ignore: bool,
    pub enum_map: &'static [EnumPair],
    /// Column name used when the property is written to an outbound table.
    pub table_column: Option<&'static str>,
    /// Left out of outbound tables.
    pub table_ignore: bool,
}

impl Annotations {
    pub const NONE: Annotations = Annotations {
        columns: &[],
        ignore: false,
        enum_map: &[],
        table_column: None,
        table_ignore: false,
    };
    /// Exact-case match against the explicit column names.
    pub fn maps_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| *c == column)
    }
    pub fn maps_column_ignore_case(&self, column: &str) -> bool {
        self.columns.iter().any(|c| same_name(c, column))
    }
    /// The same annotations with `columns` cut down to the explicit names
    /// equal to `column`.
    pub fn only_column(&self, column: &str) -> Annotations {
        let all = self.columns;
        let columns = match all.iter().position(|c| *c == column) {
            Some(at) => std::slice::from_ref(&all[at]),
            None => &[],
        };
        Annotations { columns, ..*self }
    }
}

#[derive(Debug)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub property_type: PropertyType,
    pub annotations: Annotations,
}

impl PropertyDescriptor {
    pub const fn new(name: &'static str, property_type: PropertyType) -> Self {
        Self {
            name,
            property_type,
            annotations: Annotations::NONE,
        }
    }
    pub const fn columns(mut self, columns: &'static [&'static str]) -> Self {
        self.annotations.columns = columns;
        self
    }
    pub const fn ignored(mut self) -> Self {
        self.annotations.ignore = true;
        self
    }
    pub const fn enum_map(mut self, pairs: &'static [EnumPair]) -> Self {
        self.annotations.enum_map = pairs;
        self
    }
    pub const fn table_column(mut self, column: &'static str) -> Self {
        self.annotations.table_column = Some(column);
        self
    }
    pub const fn table_ignored(mut self) -> Self {
        self.annotations.table_ignore = true;
        self
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }
    /// The column this property becomes in an outbound table.
    pub fn table_column_name(&self) -> &'static str {
        self.annotations.table_column.unwrap_or(self.name)
    }
}

/// The reflected shape of a destination type.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub properties: &'static [PropertyDescriptor],
}

impl EntityDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn properties(&self) -> &'static [PropertyDescriptor] {
        self.properties
    }
    pub fn property(&self, name: &str) -> Option<&'static PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
    /// First property whose name equals `name` ignoring case.
    pub fn property_ignore_case(&self, name: &str) -> Option<&'static PropertyDescriptor> {
        self.properties.iter().find(|p| same_name(p.name, name))
    }
}

/// A destination type populated from rows.
pub trait Entity: Sized + Send + 'static {
    fn descriptor() -> &'static EntityDescriptor;
    /// The parameterless constructor. `None` means the type has none, which
    /// makes every population of it a configuration error.
    fn construct() -> Option<Self> {
        None
    }
    /// Writes an already coerced value; a value of the wrong kind, or an
    /// unknown property, hands the value back.
    fn assign(&mut self, property: &str, value: Value) -> Result<(), Value>;
    fn read(&self, property: &str) -> Option<Value>;
}

/// Identity of a destination type as the metadata cache sees it.
#[derive(Debug, Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    descriptor: &'static EntityDescriptor,
}

impl EntityType {
    pub fn of<T: Entity>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            descriptor: T::descriptor(),
        }
    }
    pub fn id(&self) -> TypeId {
        self.id
    }
    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}
impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for EntityType {}

// ------------- Enumerations -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumMember {
    pub name: &'static str,
    pub ordinal: i32,
    /// Secondary string form a database may use for this member.
    pub alias: Option<&'static str>,
}

#[derive(Debug)]
pub struct EnumDescriptor {
    pub name: &'static str,
    pub members: &'static [EnumMember],
}

impl EnumDescriptor {
    pub fn by_ordinal(&self, ordinal: i32) -> Option<&'static EnumMember> {
        self.members.iter().find(|m| m.ordinal == ordinal)
    }
    /// A member name, or the decimal form of a member's ordinal.
    pub fn parse(&self, text: &str) -> Option<&'static EnumMember> {
        let text = text.trim();
        self.members
            .iter()
            .find(|m| m.name == text)
            .or_else(|| text.parse::<i32>().ok().and_then(|o| self.by_ordinal(o)))
    }
    pub fn by_alias(&self, alias: &str) -> Option<&'static EnumMember> {
        self.members.iter().find(|m| m.alias == Some(alias))
    }
}

pub trait MappedEnum: Sized + Default {
    fn descriptor() -> &'static EnumDescriptor;
    fn from_ordinal(ordinal: i32) -> Option<Self>;
    fn ordinal(&self) -> i32;
}

pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || (!a.is_ascii() && a.to_lowercase() == b.to_lowercase())
}

/// Declares a destination struct together with its static mapping table.
///
/// Field annotations: `#[column("A", ...)]`, `#[ignore]`,
/// `#[enum_map("ext" => "Member", ...)]`, `#[table_column("A")]` and
/// `#[table_ignore]`. Any other field attribute, doc comments included, is
/// kept on the generated field. The struct must implement `Default`, which
/// serves as its parameterless constructor.
#[macro_export]
macro_rules! entity {
    // struct body: drops mapping annotations, keeps every other attribute
    (@struct [$($head:tt)*] [$($done:tt)*]) => {
        $($head)* { $($done)* }
    };
    (@struct $head:tt [$($done:tt)*]
        { [$($kept:tt)*] [] $field_vis:vis $field:ident : $field_ty:ty } $($rest:tt)*) => {
        $crate::entity!(@struct $head [$($done)* $($kept)* $field_vis $field : $field_ty,] $($rest)*);
    };
    (@struct $head:tt $done:tt { $kept:tt [[column $($args:tt)*] $($attrs:tt)*] $($field:tt)* } $($rest:tt)*) => {
        $crate::entity!(@struct $head $done { $kept [$($attrs)*] $($field)* } $($rest)*);
    };
    (@struct $head:tt $done:tt { $kept:tt [[ignore] $($attrs:tt)*] $($field:tt)* } $($rest:tt)*) => {
        $crate::entity!(@struct $head $done { $kept [$($attrs)*] $($field)* } $($rest)*);
    };
    (@struct $head:tt $done:tt { $kept:tt [[enum_map $($args:tt)*] $($attrs:tt)*] $($field:tt)* } $($rest:tt)*) => {
        $crate::entity!(@struct $head $done { $kept [$($attrs)*] $($field)* } $($rest)*);
    };
    (@struct $head:tt $done:tt { $kept:tt [[table_column $($args:tt)*] $($attrs:tt)*] $($field:tt)* } $($rest:tt)*) => {
        $crate::entity!(@struct $head $done { $kept [$($attrs)*] $($field)* } $($rest)*);
    };
    (@struct $head:tt $done:tt { $kept:tt [[table_ignore] $($attrs:tt)*] $($field:tt)* } $($rest:tt)*) => {
        $crate::entity!(@struct $head $done { $kept [$($attrs)*] $($field)* } $($rest)*);
    };
    (@struct $head:tt $done:tt
        { [$($kept:tt)*] [[$($attr:tt)*] $($attrs:tt)*] $($field:tt)* } $($rest:tt)*) => {
        $crate::entity!(@struct $head $done { [$($kept)* #[$($attr)*]] [$($attrs)*] $($field)* } $($rest)*);
    };

    (@annotate $property:expr ;) => { $property };
    (@annotate $property:expr ; [column($($column:literal),+ $(,)?)] $($rest:tt)*) => {
        $crate::entity!(@annotate $property.columns(&[$($column),+]) ; $($rest)*)
    };
    (@annotate $property:expr ; [ignore] $($rest:tt)*) => {
        $crate::entity!(@annotate $property.ignored() ; $($rest)*)
    };
    (@annotate $property:expr ; [enum_map($($external:literal => $local:literal),+ $(,)?)] $($rest:tt)*) => {
        $crate::entity!(@annotate $property.enum_map(&[$(($external, $local)),+]) ; $($rest)*)
    };
    (@annotate $property:expr ; [table_column($column:literal)] $($rest:tt)*) => {
        $crate::entity!(@annotate $property.table_column($column) ; $($rest)*)
    };
    (@annotate $property:expr ; [table_ignore] $($rest:tt)*) => {
        $crate::entity!(@annotate $property.table_ignored() ; $($rest)*)
    };
    (@annotate $property:expr ; [$($other:tt)*] $($rest:tt)*) => {
        $crate::entity!(@annotate $property ; $($rest)*)
    };

    (
        $(#[$outer:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$($annotation:tt)*])*
                $field_vis:vis $field:ident : $field_ty:ty
            ),* $(,)?
        }
    ) => {
        $crate::entity!(@struct
            [$(#[$outer])* $vis struct $name]
            []
            $( { [] [$( [$($annotation)*] )*] $field_vis $field : $field_ty } )*
        );

        impl $crate::Entity for $name {
            fn descriptor() -> &'static $crate::EntityDescriptor {
                static DESCRIPTOR: $crate::EntityDescriptor = $crate::EntityDescriptor {
                    name: stringify!($name),
                    properties: &[
                        $(
                            $crate::entity!(@annotate
                                $crate::PropertyDescriptor::new(
                                    stringify!($field),
                                    <$field_ty as $crate::Field>::TYPE,
                                ) ;
                                $( [$($annotation)*] )*
                            ),
                        )*
                    ],
                };
                &DESCRIPTOR
            }

            fn construct() -> ::std::option::Option<Self> {
                ::std::option::Option::Some(<Self as ::std::default::Default>::default())
            }

            #[allow(unreachable_code, unused_variables)]
            fn assign(
                &mut self,
                property: &str,
                value: $crate::Value,
            ) -> ::std::result::Result<(), $crate::Value> {
                match property {
                    $(
                        stringify!($field) => {
                            self.$field = <$field_ty as $crate::Field>::from_value(value)?;
                            ::std::result::Result::Ok(())
                        }
                    )*
                    _ => ::std::result::Result::Err(value),
                }
            }

            fn read(&self, property: &str) -> ::std::option::Option<$crate::Value> {
                match property {
                    $(
                        stringify!($field) => ::std::option::Option::Some(
                            $crate::Field::to_value(&self.$field),
                        ),
                    )*
                    _ => ::std::option::Option::None,
                }
            }
        }
    };
}

/// Declares an enumeration with explicit ordinals and optional string
/// aliases, usable as an entity property. The first member is the default.
/// A variant may carry doc comments ahead of its `#[alias(..)]`.
#[macro_export]
macro_rules! mapped_enum {
    (@alias) => { ::std::option::Option::None };
    (@alias $alias:literal) => { ::std::option::Option::Some($alias) };

    (
        $(#[$outer:meta])*
        $vis:vis enum $name:ident {
            $(#[doc = $first_doc:literal])*
            $(#[alias($first_alias:literal)])?
            $first:ident = $first_ordinal:literal
            $(
                ,
                $(#[doc = $doc:literal])*
                $(#[alias($alias:literal)])?
                $variant:ident = $ordinal:literal
            )*
            $(,)?
        }
    ) => {
        $(#[$outer])*
        #[repr(i32)]
        $vis enum $name {
            $(#[doc = $first_doc])*
            $first = $first_ordinal,
            $( $(#[doc = $doc])* $variant = $ordinal, )*
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                $name::$first
            }
        }

        impl $crate::MappedEnum for $name {
            fn descriptor() -> &'static $crate::EnumDescriptor {
                static DESCRIPTOR: $crate::EnumDescriptor = $crate::EnumDescriptor {
                    name: stringify!($name),
                    members: &[
                        $crate::EnumMember {
                            name: stringify!($first),
                            ordinal: $first_ordinal,
                            alias: $crate::mapped_enum!(@alias $($first_alias)?),
                        },
                        $(
                            $crate::EnumMember {
                                name: stringify!($variant),
                                ordinal: $ordinal,
                                alias: $crate::mapped_enum!(@alias $($alias)?),
                            },
                        )*
                    ],
                };
                &DESCRIPTOR
            }
            fn from_ordinal(ordinal: i32) -> ::std::option::Option<Self> {
                match ordinal {
                    $first_ordinal => ::std::option::Option::Some($name::$first),
                    $( $ordinal => ::std::option::Option::Some($name::$variant), )*
                    _ => ::std::option::Option::None,
                }
            }
            fn ordinal(&self) -> i32 {
                match self {
                    $name::$first => $first_ordinal,
                    $( $name::$variant => $ordinal, )*
                }
            }
        }

        impl $crate::Field for $name {
            const TYPE: $crate::PropertyType =
                $crate::PropertyType::enumeration(<$name as $crate::MappedEnum>::descriptor);
            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::Value> {
                match value {
                    $crate::Value::Null => ::std::result::Result::Ok(<$name as ::std::default::Default>::default()),
                    $crate::Value::I32(ordinal) => {
                        <$name as $crate::MappedEnum>::from_ordinal(ordinal)
                            .ok_or($crate::Value::I32(ordinal))
                    }
                    other => ::std::result::Result::Err(other),
                }
            }
            fn to_value(&self) -> $crate::Value {
                $crate::Value::I32(<$name as $crate::MappedEnum>::ordinal(self))
            }
        }
    };
}
