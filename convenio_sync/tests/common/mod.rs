#![allow(dead_code)]

use convenio_sync::db::{connection, migrate};
use convenio_sync::input::{AcceptanceRow, PriceRow};
use convenio_sync::models::{NewCatalogItem, NewSite};
use convenio_sync::schema::{ref_vacinas, unidade};
use convenio_sync::store::memory::MemoryStore;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use std::path::PathBuf;
use tempfile::TempDir;

/// Sites as they exist in production.
pub const SITES: &[&str] = &[
    "Vaccini Barra Américas",
    "Vaccini Botafogo",
    "Vaccini Copacabana",
    "Vaccini Largo do Machardo",
    "Vaccini Nova Iguaçu",
    "Vaccini Tijuca 45",
    "Vaccini Tijuca Central",
];

pub const ITEMS: &[&str] = &["Febre Amarela", "Hepatite B", "Influenza Tetravalente", "BCG"];

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let c: Count = diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {table}"))
        .get_result(conn)
        .unwrap();
    c.n
}

pub fn seed_sites(conn: &mut SqliteConnection, names: &[&str]) -> Vec<i64> {
    names
        .iter()
        .map(|&nome| {
            diesel::insert_into(unidade::table)
                .values(NewSite { nome, status: true })
                .returning(unidade::id)
                .get_result(conn)
                .unwrap()
        })
        .collect()
}

pub fn seed_items(conn: &mut SqliteConnection, names: &[&str]) -> Vec<i64> {
    names
        .iter()
        .map(|&nome| {
            diesel::insert_into(ref_vacinas::table)
                .values(NewCatalogItem {
                    nome,
                    preco: 0.0,
                    status: true,
                })
                .returning(ref_vacinas::id)
                .get_result(conn)
                .unwrap()
        })
        .collect()
}

/// Memory store holding the production sites and a few items.
pub fn seeded_memory_store() -> MemoryStore {
    let store = MemoryStore::new();
    for site in SITES {
        store.add_site(site);
    }
    for item in ITEMS {
        store.add_item(item);
    }
    store
}

pub fn price(partner: &str, item: &str, preco: &str) -> PriceRow {
    PriceRow {
        partner: partner.into(),
        item: item.into(),
        price_text: (!preco.is_empty()).then(|| preco.to_string()),
    }
}

pub fn accept(partner: &str, site: &str, aceita: &str) -> AcceptanceRow {
    AcceptanceRow {
        partner: partner.into(),
        site: site.into(),
        accepted_text: Some(aceita.to_string()),
    }
}
