use indexmap::{IndexMap, IndexSet};
use tracing::info;

use crate::aliases::AliasResolver;
use crate::error::ImportError;
use crate::input::{AcceptanceRow, PriceRow};
use crate::store::{PartnerRecord, Store};
use crate::writer::upsert_partners;

/// Canonical partner name -> id, as returned by the partner upsert.
///
/// Built once by phase 1 and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerIndex {
    ids: IndexMap<String, i64>,
}

impl PartnerIndex {
    /// Index the records returned by the store. Records without an id are
    /// ignored.
    pub fn from_records(records: &[PartnerRecord]) -> Self {
        let ids = records
            .iter()
            .filter_map(|p| p.id.map(|id| (p.name.clone(), id)))
            .collect();
        Self { ids }
    }

    /// Id of the partner named exactly `canonical`.
    pub fn get(&self, canonical: &str) -> Option<i64> {
        self.ids.get(canonical).copied()
    }

    /// Number of partners indexed.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when phase 1 produced no partners.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// (name, id) pairs in upsert order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.ids.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// Distinct canonical partner names across both streams, prices first, in
/// first-seen order. Empty names are dropped.
pub fn canonical_partners(
    aliases: &AliasResolver,
    prices: &[PriceRow],
    acceptance: &[AcceptanceRow],
) -> IndexSet<String> {
    prices
        .iter()
        .map(|r| r.partner.as_str())
        .chain(acceptance.iter().map(|r| r.partner.as_str()))
        .map(|raw| aliases.resolve_partner(raw))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Phase 1: upsert every canonical partner as active and index the result.
pub(crate) async fn import_partners<S: Store + ?Sized>(
    store: &S,
    aliases: &AliasResolver,
    prices: &[PriceRow],
    acceptance: &[AcceptanceRow],
) -> Result<PartnerIndex, ImportError> {
    let names = canonical_partners(aliases, prices, acceptance);
    info!(partners = names.len(), "phase 1: upserting partners");

    let records = upsert_partners(store, names).await?;
    let index = PartnerIndex::from_records(&records);
    info!(partners = index.len(), "phase 1: partners imported/updated");
    Ok(index)
}
