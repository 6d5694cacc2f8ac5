//! Database utilities for connections and the reference schema.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON,
//!   and a 5000ms busy_timeout, and accepts `sqlite:` / `sqlite://` URLs as well as bare paths.
//! - Embedded Diesel migrations: [`migrate::run_sqlite`] creates the reference schema
//!   (partners, sites, catalog items and the two association tables) in a local database.
//!
//! The importer itself never runs migrations; they exist so a local SQLite copy and
//! the integration tests have the same tables the production store has.
//!
//! Example:
//! ```no_run
//! use convenio_sync::db::{connection, migrate};
//!
//! let db_path = std::env::temp_dir().join("convenio_sync_example.db");
//! migrate::run_sqlite(db_path.to_str().unwrap()).expect("migrations");
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
