use std::sync::Arc;

use chrono::NaiveDate;
use rowbind::persist::read_table;
use rowbind::{ColumnType, Mapper, MapperSettings, MetadataCache, Value, entity, mapped_enum, outbound};
use rusqlite::{Connection, params_from_iter};

mapped_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Standing {
        Good = 1,
        Suspended = 2,
    }
}

entity! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Member {
        pub id: i32,
        pub name: String,
        pub joined: Option<NaiveDate>,
        #[column("standing_code")]
        #[enum_map("G" => "Good", "S" => "Suspended")]
        pub standing: Standing,
        pub rating: f64,
    }
}

fn setup() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory database");
    connection
        .execute_batch(
            "CREATE TABLE member (id INTEGER, name TEXT, joined TEXT, standing_code TEXT, rating REAL, note TEXT);
             INSERT INTO member VALUES (1, 'ann', '2023-01-15', 'G', 4.5, NULL);
             INSERT INTO member VALUES (2, 'bob', NULL, 'S', 3.0, NULL);
             INSERT INTO member VALUES (3, 'cy', '2024-02-29', 'G', 5.0, NULL);",
        )
        .expect("schema and seed");
    connection
}

#[test]
fn query_results_become_tables() {
    let connection = setup();
    let table = read_table(&connection, "SELECT * FROM member ORDER BY id", []).expect("query ok");
    let types: Vec<ColumnType> = table.schema().columns().iter().map(|c| c.column_type).collect();
    assert_eq!(
        types,
        [
            ColumnType::I64,
            ColumnType::Text,
            ColumnType::Text,
            ColumnType::Text,
            ColumnType::F64,
            // never present
            ColumnType::Text,
        ]
    );
    assert_eq!(table.len(), 3);
    assert_eq!(table.cell(1, "joined"), Some(&Value::Null));
}

#[test]
fn query_results_populate_entities() {
    let connection = setup();
    let table = read_table(&connection, "SELECT * FROM member WHERE id >= ?1 ORDER BY id", [2]).expect("query ok");
    let mapper = Mapper::with_cache(Arc::new(MetadataCache::new()), MapperSettings::default());
    let members: Vec<Member> = mapper.populate_many(&table).expect("populated");
    assert_eq!(
        members,
        vec![
            Member {
                id: 2,
                name: "bob".into(),
                joined: None,
                standing: Standing::Suspended,
                rating: 3.0,
            },
            Member {
                id: 3,
                name: "cy".into(),
                joined: NaiveDate::from_ymd_opt(2024, 2, 29),
                standing: Standing::Good,
                rating: 5.0,
            },
        ]
    );
}

#[test]
fn outbound_cells_bind_as_parameters() {
    let connection = setup();
    connection
        .execute_batch("CREATE TABLE staged (id INTEGER, name TEXT, joined TEXT, standing INTEGER, rating REAL)")
        .expect("staging table");
    let members = vec![Member {
        id: 9,
        name: "dee".into(),
        joined: NaiveDate::from_ymd_opt(2022, 12, 31),
        standing: Standing::Suspended,
        rating: 1.25,
    }];
    let table = outbound::from_entities(&members).expect("outbound table");
    for row in table.rows() {
        connection
            .execute("INSERT INTO staged VALUES (?1, ?2, ?3, ?4, ?5)", params_from_iter(row.cells()))
            .expect("insert");
    }

    let read = read_table(&connection, "SELECT * FROM staged", []).expect("query ok");
    let mapper = Mapper::with_cache(Arc::new(MetadataCache::new()), MapperSettings::default());
    let round_tripped: Vec<Member> = mapper.populate_many(&read).expect("populated");
    assert_eq!(round_tripped, members);
}
