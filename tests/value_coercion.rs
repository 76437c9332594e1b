use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveTime};
use rowbind::coerce::convert;
use rowbind::{
    CoercionFailure, ColumnType, Mapper, MapperSettings, MetadataCache, Row, RowbindError, Schema, Value, entity,
    mapped_enum,
};

mapped_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum State {
        Active = 1,
        #[alias("closed")]
        Inactive = 2,
    }
}

entity! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Account {
        pub id: i32,
        #[column("Status")]
        #[enum_map("A" => "Active", "I" => "Inactive")]
        pub state: State,
        pub plain: State,
        pub maybe_state: Option<State>,
        pub small: u8,
        pub total: i64,
        pub ratio: f64,
        pub amount: BigDecimal,
        pub flag: bool,
        pub label: String,
        pub opened: NaiveDate,
        pub at: NaiveTime,
        pub nickname: Option<String>,
        pub rank: Option<i32>,
    }
}

mapped_enum! {
    /// Ledger entry direction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Direction {
        /// Money in.
        Credit = 1,
        /// Money out.
        #[alias("dr")]
        Debit = 2,
    }
}

entity! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Entry {
        /// Surrogate key.
        #[column("EntryId")]
        pub id: i64,
        #[allow(dead_code)]
        /// Free text, mapped by name.
        pub note: String,
        /// Stored as a code.
        #[column("Dir")]
        pub direction: Direction,
    }
}

fn mapper() -> Mapper {
    Mapper::with_cache(Arc::new(MetadataCache::new()), MapperSettings::default())
}

fn single(column: &str, column_type: ColumnType, value: Value) -> rowbind::Result<Account> {
    let schema: Schema = [(column, column_type)].into_iter().collect();
    mapper().to_entity(&Row::new(vec![value]), &schema)
}

fn cause(error: RowbindError) -> CoercionFailure {
    match error {
        RowbindError::Population(population) => population.source.cause,
        other => panic!("expected a population error, got {other}"),
    }
}

#[test]
fn no_value_cells_yield_defaults() {
    let schema: Schema = [
        ("id", ColumnType::I32),
        ("Status", ColumnType::Text),
        ("label", ColumnType::Text),
        ("opened", ColumnType::Date),
        ("nickname", ColumnType::Text),
        ("amount", ColumnType::Decimal),
    ]
    .into_iter()
    .collect();
    let account: Account = mapper()
        .to_entity(&Row::new(vec![Value::Null; 6]), &schema)
        .expect("no-value cells never fail");
    assert_eq!(account, Account::default());
    assert_eq!(account.state, State::Active);
    assert_eq!(account.nickname, None);
}

#[test]
fn optional_destinations_wrap_present_values() {
    let account = single("rank", ColumnType::I64, Value::I64(5)).expect("ok");
    assert_eq!(account.rank, Some(5));
    let account = single("nickname", ColumnType::I32, Value::I32(3)).expect("ok");
    assert_eq!(account.nickname.as_deref(), Some("3"));
    let account = single("rank", ColumnType::I64, Value::Null).expect("ok");
    assert_eq!(account.rank, None);
}

#[test]
fn enum_value_map_translates_external_codes() {
    assert_eq!(single("Status", ColumnType::Text, Value::from("A")).expect("ok").state, State::Active);
    assert_eq!(single("Status", ColumnType::Text, Value::from("I")).expect("ok").state, State::Inactive);
}

#[test]
fn enum_falls_back_to_member_name_then_alias() {
    assert_eq!(single("Status", ColumnType::Text, Value::from("Inactive")).expect("ok").state, State::Inactive);
    assert_eq!(single("plain", ColumnType::Text, Value::from("Inactive")).expect("ok").plain, State::Inactive);
    assert_eq!(single("plain", ColumnType::Text, Value::from("closed")).expect("ok").plain, State::Inactive);
    // value map pairs belong to the property that declares them
    assert!(single("plain", ColumnType::Text, Value::from("A")).is_err());
}

#[test]
fn enum_accepts_ordinals() {
    assert_eq!(single("plain", ColumnType::I32, Value::I32(2)).expect("ok").plain, State::Inactive);
    assert_eq!(single("plain", ColumnType::I64, Value::I64(1)).expect("ok").plain, State::Active);
    assert_eq!(single("plain", ColumnType::U8, Value::U8(2)).expect("ok").plain, State::Inactive);
    assert_eq!(single("plain", ColumnType::Text, Value::from("2")).expect("ok").plain, State::Inactive);
    assert_eq!(
        single("maybe_state", ColumnType::I32, Value::I32(2)).expect("ok").maybe_state,
        Some(State::Inactive)
    );
}

#[test]
fn unknown_enum_value_names_value_and_type() {
    let error = single("Status", ColumnType::Text, Value::from("Bogus")).unwrap_err();
    match &error {
        RowbindError::Population(population) => {
            assert_eq!(population.property, "state");
            assert_eq!(population.column, "Status");
            assert_eq!(population.column_type, ColumnType::Text);
            assert_eq!(population.value, Value::from("Bogus"));
        }
        other => panic!("unexpected error {other}"),
    }
    match cause(error) {
        CoercionFailure::Enum(e) => {
            assert_eq!(e.value, "Bogus");
            assert_eq!(e.enum_type, "State");
            assert_eq!(e.to_string(), "The value 'Bogus' is not contained in State");
        }
        other => panic!("unexpected cause {other}"),
    }
    assert!(matches!(
        cause(single("plain", ColumnType::I32, Value::I32(9)).unwrap_err()),
        CoercionFailure::Enum(_)
    ));
    assert!(matches!(
        cause(single("plain", ColumnType::F64, Value::F64(1.0)).unwrap_err()),
        CoercionFailure::Unsupported { .. }
    ));
}

#[test]
fn numeric_narrowing_is_checked() {
    assert_eq!(single("small", ColumnType::I64, Value::I64(200)).expect("ok").small, 200);
    assert!(matches!(
        cause(single("small", ColumnType::I64, Value::I64(300)).unwrap_err()),
        CoercionFailure::Overflow { .. }
    ));
    assert!(matches!(
        cause(single("id", ColumnType::I64, Value::I64(i64::from(i32::MAX) + 1)).unwrap_err()),
        CoercionFailure::Overflow { .. }
    ));
    assert!(matches!(
        cause(single("small", ColumnType::I32, Value::I32(-1)).unwrap_err()),
        CoercionFailure::Overflow { .. }
    ));
}

#[test]
fn floats_round_half_to_even_into_integers() {
    assert_eq!(single("id", ColumnType::F64, Value::F64(2.5)).expect("ok").id, 2);
    assert_eq!(single("id", ColumnType::F64, Value::F64(3.5)).expect("ok").id, 4);
    assert_eq!(single("total", ColumnType::F32, Value::F32(-7.25)).expect("ok").total, -7);
    assert!(matches!(
        cause(single("total", ColumnType::F64, Value::F64(f64::NAN)).unwrap_err()),
        CoercionFailure::Overflow { .. }
    ));
}

#[test]
fn text_converts_to_numbers_dates_and_flags() {
    assert_eq!(single("id", ColumnType::Text, Value::from(" 42 ")).expect("ok").id, 42);
    assert_eq!(single("ratio", ColumnType::Text, Value::from("0.25")).expect("ok").ratio, 0.25);
    assert_eq!(
        single("amount", ColumnType::Text, Value::from("12.50")).expect("ok").amount,
        BigDecimal::from_str("12.50").expect("decimal")
    );
    assert!(single("flag", ColumnType::Text, Value::from("TRUE")).expect("ok").flag);
    assert_eq!(
        single("opened", ColumnType::Text, Value::from("2024-03-01")).expect("ok").opened,
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    );
    assert_eq!(
        single("opened", ColumnType::Text, Value::from("2024-03-01T10:20:30")).expect("ok").opened,
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    );
    assert_eq!(
        single("at", ColumnType::Text, Value::from("10:20")).expect("ok").at,
        NaiveTime::from_hms_opt(10, 20, 0).expect("time")
    );
    assert!(matches!(
        cause(single("id", ColumnType::Text, Value::from("forty")).unwrap_err()),
        CoercionFailure::Parse { .. }
    ));
}

#[test]
fn numbers_and_flags_convert_to_text_and_back() {
    assert_eq!(single("label", ColumnType::I32, Value::I32(7)).expect("ok").label, "7");
    assert_eq!(single("label", ColumnType::Bool, Value::Bool(true)).expect("ok").label, "true");
    assert!(single("flag", ColumnType::I64, Value::I64(2)).expect("ok").flag);
    assert_eq!(single("id", ColumnType::Bool, Value::Bool(true)).expect("ok").id, 1);
    assert_eq!(single("ratio", ColumnType::Decimal, Value::Decimal(BigDecimal::from(3))).expect("ok").ratio, 3.0);
}

#[test]
fn conversion_error_carries_property_and_value() {
    let error = single("id", ColumnType::Bytes, Value::Bytes(vec![1, 2])).unwrap_err();
    let RowbindError::Population(population) = error else {
        panic!("expected a population error");
    };
    assert_eq!(population.source.property, "id");
    assert_eq!(population.source.property_type.to_string(), "i32");
    assert_eq!(population.source.value, Value::Bytes(vec![1, 2]));
    assert_eq!(population.row, None);
    assert!(population.to_string().contains("Column Name: id"));
}

#[test]
fn general_conversion_table() {
    assert_eq!(convert(&Value::U8(9), ColumnType::I64).expect("widen"), Value::I64(9));
    assert_eq!(convert(&Value::I16(9), ColumnType::F32).expect("widen"), Value::F32(9.0));
    assert_eq!(
        convert(&Value::F64(1.5), ColumnType::Decimal).expect("decimal"),
        Value::Decimal(BigDecimal::from_str("1.5").expect("decimal"))
    );
    assert_eq!(
        convert(&Value::Decimal(BigDecimal::from_str("2.5").expect("decimal")), ColumnType::I32).expect("round"),
        Value::I32(2)
    );
    assert_eq!(
        convert(&Value::from("2024-03-01"), ColumnType::DateTime).expect("midnight"),
        Value::DateTime(
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("datetime")
        )
    );
    assert!(convert(&Value::from("abc"), ColumnType::Bytes).is_err());
    assert!(convert(&Value::Bytes(vec![0]), ColumnType::Text).is_err());
}

#[test]
fn documented_fields_and_variants_still_map() {
    let schema: Schema = [("EntryId", ColumnType::I64), ("note", ColumnType::Text), ("Dir", ColumnType::Text)]
        .into_iter()
        .collect();
    let row = Row::new(vec![Value::I64(12), Value::from("rent"), Value::from("dr")]);
    let entry: Entry = mapper().to_entity(&row, &schema).expect("populated");
    assert_eq!(
        entry,
        Entry {
            id: 12,
            note: "rent".into(),
            direction: Direction::Debit,
        }
    );
    let id = <Entry as rowbind::Entity>::descriptor().property("id").expect("declared");
    assert_eq!(id.annotations().columns, ["EntryId"]);
}
