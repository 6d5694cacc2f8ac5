//! Store abstraction used by the import pipeline.
//!
//! The pipeline only ever needs three things from persistence: an exact lookup
//! by name, a case-insensitive substring lookup by name, and a keyed upsert.
//! [`Store`] captures exactly that surface so the pipeline can run against
//! SQLite in production ([`sqlite::SqliteStore`]) and against an in-memory
//! backend in tests ([`memory::MemoryStore`]).
//!
//! Lookups return [`EntityRef`]s ordered by ascending id. Upserts take and
//! return [`Record`]s; the returned records carry store-assigned ids.

pub mod memory;
pub mod sqlite;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Tables of the reference schema the importer reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// `convenios`: partners, unique on `nome`.
    Partners,
    /// `unidade`: physical sites.
    Sites,
    /// `ref_vacinas`: priceable catalog items.
    CatalogItems,
    /// `convenio_vacina_precos`: price per (partner, item).
    PriceAssociations,
    /// `unidade_convenios`: acceptance per (site, partner).
    AcceptanceAssociations,
}

impl Table {
    /// Physical table name.
    pub const fn name(self) -> &'static str {
        match self {
            Table::Partners => "convenios",
            Table::Sites => "unidade",
            Table::CatalogItems => "ref_vacinas",
            Table::PriceAssociations => "convenio_vacina_precos",
            Table::AcceptanceAssociations => "unidade_convenios",
        }
    }

    /// Column holding the display name, for tables that can be looked up by name.
    pub const fn name_column(self) -> Option<&'static str> {
        match self {
            Table::Partners | Table::Sites | Table::CatalogItems => Some("nome"),
            Table::PriceAssociations | Table::AcceptanceAssociations => None,
        }
    }

    /// Unique constraint used as the upsert conflict target, if the table is upsertable.
    pub const fn conflict_key(self) -> Option<&'static [&'static str]> {
        match self {
            Table::Partners => Some(&["nome"]),
            Table::PriceAssociations => Some(&["convenio_id", "vacina_id"]),
            Table::AcceptanceAssociations => Some(&["unidade_id", "convenio_id"]),
            Table::Sites | Table::CatalogItems => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A persisted entity as seen by lookups: its id and stored display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    /// Store-assigned identifier.
    pub id: i64,
    /// Stored display name (`nome`).
    pub name: String,
}

/// A partner row. `id` is `None` on the way in and filled by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerRecord {
    /// Store-assigned identifier.
    pub id: Option<i64>,
    /// Canonical partner name; the identity of the row.
    pub name: String,
    /// Whether the partner is active.
    pub active: bool,
}

/// Price of one catalog item under one partner.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAssociation {
    /// Partner id (`convenio_id`).
    pub partner_id: i64,
    /// Catalog item id (`vacina_id`).
    pub item_id: i64,
    /// Negotiated price.
    pub price: f64,
    /// Whether the price is active.
    pub active: bool,
}

/// Whether a site accepts a partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceAssociation {
    /// Site id (`unidade_id`).
    pub site_id: i64,
    /// Partner id (`convenio_id`).
    pub partner_id: i64,
    /// `true` when the site accepts the partner.
    pub accepted: bool,
}

/// A row handed to or returned from [`Store::upsert`].
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Row of [`Table::Partners`].
    Partner(PartnerRecord),
    /// Row of [`Table::PriceAssociations`].
    Price(PriceAssociation),
    /// Row of [`Table::AcceptanceAssociations`].
    Acceptance(AcceptanceAssociation),
}

impl Record {
    /// The table this record belongs to.
    pub fn table(&self) -> Table {
        match self {
            Record::Partner(_) => Table::Partners,
            Record::Price(_) => Table::PriceAssociations,
            Record::Acceptance(_) => Table::AcceptanceAssociations,
        }
    }
}

/// Errors surfaced by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or opened.
    #[error("store connection failed: {0}")]
    Connection(String),

    /// Lookup on a table or column that has no name semantics.
    #[error("table {table} cannot be queried by column {column}")]
    UnknownColumn {
        /// Table queried.
        table: Table,
        /// Column requested.
        column: String,
    },

    /// Upsert requested with a conflict target that isn't the table's unique key.
    #[error("table {table} has no unique key on ({})", .columns.join(", "))]
    UnsupportedConflictKey {
        /// Table written.
        table: Table,
        /// Conflict columns requested.
        columns: Vec<String>,
    },

    /// A record of one table was handed to an upsert on another.
    #[error("{found} record passed to an upsert on {table}")]
    RecordMismatch {
        /// Table written.
        table: Table,
        /// Table the record belongs to.
        found: Table,
    },

    /// The backend refused the write.
    #[error("write to {table} rejected: {message}")]
    Rejected {
        /// Table written.
        table: Table,
        /// Backend message.
        message: String,
    },

    /// Diesel query or constraint failure.
    #[error(transparent)]
    Query(#[from] diesel::result::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence surface consumed by the locator and the upsert writer.
#[async_trait]
pub trait Store: Send + Sync {
    /// Entities of `table` whose `column` equals `value` exactly, ordered by id.
    async fn query_exact(&self, table: Table, column: &str, value: &str)
    -> StoreResult<Vec<EntityRef>>;

    /// Entities of `table` whose `column` contains `fragment`, ignoring case, ordered by id.
    async fn query_contains(
        &self,
        table: Table,
        column: &str,
        fragment: &str,
    ) -> StoreResult<Vec<EntityRef>>;

    /// Insert-or-update `records` into `table`, using `conflict_key` as the
    /// uniqueness constraint. Returns the persisted rows, ids included.
    async fn upsert(
        &self,
        table: Table,
        records: Vec<Record>,
        conflict_key: &[&str],
    ) -> StoreResult<Vec<Record>>;
}

/// Case-insensitive substring test with full Unicode case folding.
pub(crate) fn contains_ignore_case(name: &str, fragment: &str) -> bool {
    name.to_lowercase().contains(&fragment.to_lowercase())
}

/// Checks shared by backends before touching storage.
pub(crate) fn check_name_column(table: Table, column: &str) -> StoreResult<()> {
    match table.name_column() {
        Some(expected) if expected == column => Ok(()),
        _ => Err(StoreError::UnknownColumn {
            table,
            column: column.to_string(),
        }),
    }
}

pub(crate) fn check_conflict_key(table: Table, conflict_key: &[&str]) -> StoreResult<()> {
    match table.conflict_key() {
        Some(expected) if expected == conflict_key => Ok(()),
        _ => Err(StoreError::UnsupportedConflictKey {
            table,
            columns: conflict_key.iter().map(|c| c.to_string()).collect(),
        }),
    }
}

pub(crate) fn check_records(table: Table, records: &[Record]) -> StoreResult<()> {
    match records.iter().find(|r| r.table() != table) {
        Some(r) => Err(StoreError::RecordMismatch {
            table,
            found: r.table(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_keys_match_unique_constraints() {
        assert_eq!(Table::Partners.conflict_key(), Some(&["nome"][..]));
        assert_eq!(
            Table::PriceAssociations.conflict_key(),
            Some(&["convenio_id", "vacina_id"][..])
        );
        assert_eq!(
            Table::AcceptanceAssociations.conflict_key(),
            Some(&["unidade_id", "convenio_id"][..])
        );
        assert_eq!(Table::Sites.conflict_key(), None);
    }

    #[test]
    fn substring_match_folds_accented_capitals() {
        assert!(contains_ignore_case("Vaccini Nova Iguaçu", "NOVA IGUAÇU"));
        assert!(contains_ignore_case("Vacina Pneumocócica 13", "PNEUMOCÓCICA"));
        assert!(!contains_ignore_case("Vaccini Nova Iguaçu", "IGUACU"));
    }

    #[test]
    fn conflict_key_order_matters() {
        let err = check_conflict_key(Table::PriceAssociations, &["vacina_id", "convenio_id"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "table convenio_vacina_precos has no unique key on (vacina_id, convenio_id)"
        );
    }

    #[test]
    fn association_tables_are_not_name_queryable() {
        assert!(check_name_column(Table::Sites, "nome").is_ok());
        assert!(check_name_column(Table::Sites, "id").is_err());
        assert!(check_name_column(Table::PriceAssociations, "nome").is_err());
    }

    #[test]
    fn mismatched_records_are_rejected() {
        let rows = vec![Record::Partner(PartnerRecord {
            id: None,
            name: "AMIL".into(),
            active: true,
        })];
        assert!(check_records(Table::Partners, &rows).is_ok());
        let err = check_records(Table::PriceAssociations, &rows).unwrap_err();
        assert!(matches!(
            err,
            StoreError::RecordMismatch {
                table: Table::PriceAssociations,
                found: Table::Partners
            }
        ));
    }
}
