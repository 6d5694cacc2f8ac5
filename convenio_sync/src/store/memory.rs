//! In-memory [`Store`] backend.
//!
//! Behaves like the SQLite backend for everything the pipeline observes:
//! lookups ordered by id, case-insensitive substring search, upserts keyed on
//! the table's unique constraint. On top of that it records every call and can
//! be told to reject selected writes, which is what the pipeline tests use to
//! exercise failure paths.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{
    AcceptanceAssociation, EntityRef, PartnerRecord, PriceAssociation, Record, Store, StoreError,
    StoreResult, Table, check_conflict_key, check_name_column, check_records,
    contains_ignore_case,
};

/// One observed store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `query_exact(table, value)`.
    Exact(Table, String),
    /// `query_contains(table, fragment)`.
    Contains(Table, String),
    /// `upsert(table, n records)`.
    Upsert(Table, usize),
}

type RejectFn = Box<dyn Fn(&Record) -> bool + Send + Sync>;

#[derive(Default)]
struct Tables {
    next_id: i64,
    partners: BTreeMap<i64, PartnerRecord>,
    sites: BTreeMap<i64, String>,
    items: BTreeMap<i64, String>,
    prices: BTreeMap<(i64, i64), (f64, bool)>,
    acceptance: BTreeMap<(i64, i64), bool>,
    calls: Vec<StoreCall>,
}

impl Tables {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn named(&self, table: Table) -> Vec<EntityRef> {
        let to_ref = |(id, name): (&i64, &String)| EntityRef {
            id: *id,
            name: name.clone(),
        };
        match table {
            Table::Partners => self
                .partners
                .iter()
                .map(|(id, p)| EntityRef {
                    id: *id,
                    name: p.name.clone(),
                })
                .collect(),
            Table::Sites => self.sites.iter().map(to_ref).collect(),
            Table::CatalogItems => self.items.iter().map(to_ref).collect(),
            Table::PriceAssociations | Table::AcceptanceAssociations => Vec::new(),
        }
    }
}

/// Mutex-guarded tables; the guard is never held across an `.await`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    reject: Mutex<Option<RejectFn>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Connection("memory store lock poisoned".into()))
    }

    fn guard(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Seed a site (`unidade`) and return its id.
    pub fn add_site(&self, name: &str) -> i64 {
        let mut t = self.guard();
        let id = t.alloc_id();
        t.sites.insert(id, name.to_string());
        id
    }

    /// Seed a catalog item (`ref_vacinas`) and return its id.
    pub fn add_item(&self, name: &str) -> i64 {
        let mut t = self.guard();
        let id = t.alloc_id();
        t.items.insert(id, name.to_string());
        id
    }

    /// Seed an existing partner and return its id.
    pub fn add_partner(&self, name: &str, active: bool) -> i64 {
        let mut t = self.guard();
        let id = t.alloc_id();
        t.partners.insert(
            id,
            PartnerRecord {
                id: Some(id),
                name: name.to_string(),
                active,
            },
        );
        id
    }

    /// Reject every upserted record for which `pred` returns true.
    ///
    /// A batch containing one rejected record fails as a whole and writes nothing.
    pub fn reject_upserts_where<F>(&self, pred: F)
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        let mut slot = self.reject.lock().unwrap_or_else(|p| p.into_inner());
        *slot = Some(Box::new(pred));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.guard().calls.clone()
    }

    /// Stored partners, ordered by id.
    pub fn partners(&self) -> Vec<PartnerRecord> {
        self.guard().partners.values().cloned().collect()
    }

    /// Stored price associations, ordered by (partner id, item id).
    pub fn prices(&self) -> Vec<PriceAssociation> {
        self.guard()
            .prices
            .iter()
            .map(|(&(partner_id, item_id), &(price, active))| PriceAssociation {
                partner_id,
                item_id,
                price,
                active,
            })
            .collect()
    }

    /// Stored acceptance associations, ordered by (site id, partner id).
    pub fn acceptance(&self) -> Vec<AcceptanceAssociation> {
        self.guard()
            .acceptance
            .iter()
            .map(|(&(site_id, partner_id), &accepted)| AcceptanceAssociation {
                site_id,
                partner_id,
                accepted,
            })
            .collect()
    }

    fn rejected(&self, records: &[Record]) -> Option<Record> {
        let slot = self.reject.lock().unwrap_or_else(|p| p.into_inner());
        let pred = slot.as_ref()?;
        records.iter().find(|r| pred(r)).cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query_exact(
        &self,
        table: Table,
        column: &str,
        value: &str,
    ) -> StoreResult<Vec<EntityRef>> {
        let mut t = self.lock()?;
        t.calls.push(StoreCall::Exact(table, value.to_string()));
        check_name_column(table, column)?;
        Ok(t.named(table)
            .into_iter()
            .filter(|e| e.name == value)
            .collect())
    }

    async fn query_contains(
        &self,
        table: Table,
        column: &str,
        fragment: &str,
    ) -> StoreResult<Vec<EntityRef>> {
        let mut t = self.lock()?;
        t.calls.push(StoreCall::Contains(table, fragment.to_string()));
        check_name_column(table, column)?;
        Ok(t.named(table)
            .into_iter()
            .filter(|e| contains_ignore_case(&e.name, fragment))
            .collect())
    }

    async fn upsert(
        &self,
        table: Table,
        records: Vec<Record>,
        conflict_key: &[&str],
    ) -> StoreResult<Vec<Record>> {
        let rejected = self.rejected(&records);
        let mut t = self.lock()?;
        t.calls.push(StoreCall::Upsert(table, records.len()));
        check_conflict_key(table, conflict_key)?;
        check_records(table, &records)?;
        if let Some(r) = rejected {
            return Err(StoreError::Rejected {
                table,
                message: format!("rejected by test hook: {r:?}"),
            });
        }

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            match record {
                Record::Partner(p) => {
                    let existing = t
                        .partners
                        .iter()
                        .find(|(_, row)| row.name == p.name)
                        .map(|(id, _)| *id);
                    let id = match existing {
                        Some(id) => id,
                        None => t.alloc_id(),
                    };
                    let row = PartnerRecord {
                        id: Some(id),
                        name: p.name,
                        active: p.active,
                    };
                    t.partners.insert(id, row.clone());
                    out.push(Record::Partner(row));
                }
                Record::Price(p) => {
                    t.prices
                        .insert((p.partner_id, p.item_id), (p.price, p.active));
                    out.push(Record::Price(p));
                }
                Record::Acceptance(a) => {
                    t.acceptance.insert((a.site_id, a.partner_id), a.accepted);
                    out.push(Record::Acceptance(a));
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partner(name: &str) -> Record {
        Record::Partner(PartnerRecord {
            id: None,
            name: name.into(),
            active: true,
        })
    }

    #[tokio::test]
    async fn partner_upsert_keeps_identity_by_name() {
        let store = MemoryStore::new();
        let existing = store.add_partner("AMIL", false);

        let out = store
            .upsert(Table::Partners, vec![partner("AMIL"), partner("BNDES")], &["nome"])
            .await
            .unwrap();

        let ids: Vec<_> = out
            .iter()
            .map(|r| match r {
                Record::Partner(p) => p.id.unwrap(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ids[0], existing);
        assert_ne!(ids[1], existing);
        assert!(store.partners().iter().all(|p| p.active));
    }

    #[tokio::test]
    async fn contains_ignores_case_and_orders_by_id() {
        let store = MemoryStore::new();
        let b = store.add_item("Febre Amarela (Stamaril)");
        let a = store.add_item("FEBRE AMARELA");
        let _ = store.add_item("Hepatite B");

        let hits = store
            .query_contains(Table::CatalogItems, "nome", "febre amarela")
            .await
            .unwrap();
        assert_eq!(hits.iter().map(|e| e.id).collect::<Vec<_>>(), vec![b, a]);
    }

    #[tokio::test]
    async fn rejected_batch_writes_nothing() {
        let store = MemoryStore::new();
        store.reject_upserts_where(|r| matches!(r, Record::Partner(p) if p.name == "BAD"));

        let err = store
            .upsert(Table::Partners, vec![partner("OK"), partner("BAD")], &["nome"])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { table: Table::Partners, .. }));
        assert!(store.partners().is_empty());
        assert_eq!(store.calls(), vec![StoreCall::Upsert(Table::Partners, 2)]);
    }

    #[tokio::test]
    async fn wrong_conflict_key_is_refused() {
        let store = MemoryStore::new();
        let err = store
            .upsert(Table::Partners, vec![partner("AMIL")], &["id"])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedConflictKey { .. }));
    }
}
