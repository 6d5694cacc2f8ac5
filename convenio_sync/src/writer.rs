//! Upsert Writer: keyed upserts with the right conflict target per table.
//!
//! Callers never name a conflict key; it comes from [`Table::conflict_key`],
//! which mirrors the unique constraints of the reference schema. Store errors
//! come back as [`ImportError::UpsertFailed`] and are never retried here.

use crate::error::ImportError;
use crate::store::{
    AcceptanceAssociation, PartnerRecord, PriceAssociation, Record, Store, StoreError, Table,
};

/// Upsert `records` into `table` keyed on the table's unique constraint.
///
/// Returns the persisted rows with store-assigned ids. An empty batch is a
/// no-op that skips the store.
pub async fn upsert<S: Store + ?Sized>(
    store: &S,
    table: Table,
    records: Vec<Record>,
) -> Result<Vec<Record>, ImportError> {
    let conflict_key = table
        .conflict_key()
        .ok_or_else(|| ImportError::UpsertFailed {
            table,
            source: StoreError::UnsupportedConflictKey {
                table,
                columns: Vec::new(),
            },
        })?;
    if records.is_empty() {
        return Ok(Vec::new());
    }
    store
        .upsert(table, records, conflict_key)
        .await
        .map_err(|source| ImportError::UpsertFailed { table, source })
}

fn unexpected(table: Table, record: &Record) -> ImportError {
    ImportError::UpsertFailed {
        table,
        source: StoreError::RecordMismatch {
            table,
            found: record.table(),
        },
    }
}

/// Upsert active partners by name. Returned records carry ids.
pub async fn upsert_partners<S: Store + ?Sized>(
    store: &S,
    names: impl IntoIterator<Item = String>,
) -> Result<Vec<PartnerRecord>, ImportError> {
    let records = names
        .into_iter()
        .map(|name| {
            Record::Partner(PartnerRecord {
                id: None,
                name,
                active: true,
            })
        })
        .collect();
    upsert(store, Table::Partners, records)
        .await?
        .into_iter()
        .map(|r| match r {
            Record::Partner(p) => Ok(p),
            other => Err(unexpected(Table::Partners, &other)),
        })
        .collect()
}

/// Upsert one price association keyed on (partner, item).
pub async fn upsert_price<S: Store + ?Sized>(
    store: &S,
    price: PriceAssociation,
) -> Result<(), ImportError> {
    upsert(store, Table::PriceAssociations, vec![Record::Price(price)]).await?;
    Ok(())
}

/// Upsert one acceptance association keyed on (site, partner).
pub async fn upsert_acceptance<S: Store + ?Sized>(
    store: &S,
    acceptance: AcceptanceAssociation,
) -> Result<(), ImportError> {
    upsert(
        store,
        Table::AcceptanceAssociations,
        vec![Record::Acceptance(acceptance)],
    )
    .await?;
    Ok(())
}
