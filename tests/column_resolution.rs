use std::sync::Arc;

use rowbind::resolve::ColumnResolver;
use rowbind::{ColumnType, EntityType, Mapper, MapperSettings, MetadataCache, Row, Schema, Value, entity};

entity! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Customer {
        pub id: i32,
        pub name: String,
        #[ignore]
        pub secret: String,
        #[column("Status", "customer_status")]
        pub status_code: String,
        // fed both by its own name and by "Status"
        #[column("Status")]
        pub status: String,
    }
}

entity! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Pair {
        #[column("X", "b")]
        pub a: String,
        #[column("X")]
        pub b: String,
    }
}

entity! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Labelled {
        #[column("label")]
        pub name: String,
        #[column("name")]
        pub title: String,
    }
}

fn mapper() -> Mapper {
    Mapper::with_cache(Arc::new(MetadataCache::new()), MapperSettings::default())
}

fn populate<T: rowbind::Entity>(mapper: &Mapper, columns: &[(&str, ColumnType)], cells: Vec<Value>) -> T {
    let schema: Schema = columns.iter().copied().collect();
    mapper.to_entity(&Row::new(cells), &schema).expect("population ok")
}

#[test]
fn unmatched_columns_are_skipped() {
    let mapper = mapper();
    let customer: Customer = populate(
        &mapper,
        &[("Unknown", ColumnType::Text), ("Id", ColumnType::I32), ("Other", ColumnType::I64)],
        vec![Value::from("x"), Value::I32(3), Value::I64(99)],
    );
    assert_eq!(customer, Customer { id: 3, ..Customer::default() });
}

#[test]
fn property_names_match_ignoring_case() {
    let mapper = mapper();
    let customer: Customer = populate(
        &mapper,
        &[("ID", ColumnType::I32), ("NAME", ColumnType::Text)],
        vec![Value::I32(1), Value::from("Ada")],
    );
    assert_eq!(customer.id, 1);
    assert_eq!(customer.name, "Ada");
}

#[test]
fn ignored_property_is_never_written() {
    let mapper = mapper();
    let customer: Customer = populate(
        &mapper,
        &[("secret", ColumnType::Text), ("Secret", ColumnType::Text)],
        vec![Value::from("leak"), Value::from("leak")],
    );
    assert_eq!(customer.secret, "");
}

#[test]
fn explicit_column_names_match_exact_case_only() {
    let mapper = mapper();
    let customer: Customer = populate(
        &mapper,
        &[("CUSTOMER_STATUS", ColumnType::Text)],
        vec![Value::from("ignored")],
    );
    assert_eq!(customer.status_code, "");

    let customer: Customer = populate(&mapper, &[("customer_status", ColumnType::Text)], vec![Value::from("gold")]);
    assert_eq!(customer.status_code, "gold");
    assert_eq!(customer.status, "");
}

#[test]
fn one_column_fans_out_to_name_match_and_explicit_mappings() {
    let mapper = mapper();
    let customer: Customer = populate(&mapper, &[("Status", ColumnType::Text)], vec![Value::from("active")]);
    assert_eq!(customer.status, "active");
    assert_eq!(customer.status_code, "active");
}

#[test]
fn explicit_match_does_not_claim_the_other_names_of_the_property() {
    let mapper = mapper();
    // `a` also lists "b", but only "X" is what fed it
    let pair: Pair = populate(&mapper, &[("X", ColumnType::Text)], vec![Value::from("v")]);
    assert_eq!(pair.a, "v");
    assert_eq!(pair.b, "v");

    let cache = MetadataCache::new();
    let names: Vec<&str> = ColumnResolver::new(&cache)
        .resolve("X", EntityType::of::<Pair>())
        .iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["a", "b"]);
    assert!(!cache.has_column_mapping(EntityType::of::<Pair>(), "b"));
}

#[test]
fn resolution_order_is_name_match_first() {
    let cache = MetadataCache::new();
    let resolver = ColumnResolver::new(&cache);
    let names: Vec<&str> = resolver
        .resolve("Status", EntityType::of::<Customer>())
        .iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["status", "status_code"]);
    assert!(resolver.resolve("nothing", EntityType::of::<Customer>()).is_empty());
}

#[test]
fn repeated_resolution_is_served_from_the_cache() {
    let cache = MetadataCache::new();
    let resolver = ColumnResolver::new(&cache);
    let first = resolver.resolve("Status", EntityType::of::<Customer>());
    let second = resolver.resolve("Status", EntityType::of::<Customer>());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.property_count(EntityType::of::<Customer>()), 2);
}

#[test]
fn column_claimed_by_another_property_blocks_its_own_alias() {
    let mapper = mapper();
    // "name" feeds both `name` and `title`; once `title` is cached its claim
    // on "name" keeps the `label` alias of `name` from applying.
    let labelled: Labelled = populate(
        &mapper,
        &[("name", ColumnType::Text), ("label", ColumnType::Text)],
        vec![Value::from("first"), Value::from("second")],
    );
    assert_eq!(labelled.name, "first");
    assert_eq!(labelled.title, "first");
}

#[test]
fn alias_applies_when_nothing_claims_the_name() {
    let mapper = mapper();
    let labelled: Labelled = populate(&mapper, &[("label", ColumnType::Text)], vec![Value::from("second")]);
    assert_eq!(labelled.name, "second");
    assert_eq!(labelled.title, "");
}
