//! Entity Locator: canonical name -> stored identifier.
//!
//! Lookups run through an ordered list of strategies per entity kind and stop
//! at the first one that finds anything:
//!
//! | kind         | strategies          |
//! |--------------|---------------------|
//! | partner      | exact               |
//! | site         | exact, substring    |
//! | catalog item | substring           |
//!
//! Within a tier the smallest id wins, whatever order the store returns rows
//! in. An exact hit therefore always beats a substring hit, and a substring
//! hit is logged with the stored name it settled on.

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use crate::store::{EntityRef, Store, StoreError, Table};

/// Kind of entity a name can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// `convenios`.
    Partner,
    /// `unidade`.
    Site,
    /// `ref_vacinas`.
    CatalogItem,
}

impl EntityKind {
    /// Table holding entities of this kind.
    pub const fn table(self) -> Table {
        match self {
            EntityKind::Partner => Table::Partners,
            EntityKind::Site => Table::Sites,
            EntityKind::CatalogItem => Table::CatalogItems,
        }
    }

    /// Strategies tried, in order.
    pub const fn strategies(self) -> &'static [MatchStrategy] {
        match self {
            EntityKind::Partner => &[MatchStrategy::Exact],
            EntityKind::Site => &[MatchStrategy::Exact, MatchStrategy::Substring],
            EntityKind::CatalogItem => &[MatchStrategy::Substring],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Partner => "partner",
            EntityKind::Site => "site",
            EntityKind::CatalogItem => "catalog item",
        })
    }
}

/// How a name was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Stored name equals the query.
    Exact,
    /// Stored name contains the query, ignoring case.
    Substring,
}

/// A resolved entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Stored identifier.
    pub id: i64,
    /// Stored name, which differs from the query on substring hits.
    pub name: String,
    /// Strategy that produced the hit.
    pub strategy: MatchStrategy,
}

/// Lookup failure.
#[derive(Debug, Error)]
pub enum LocateError {
    /// No strategy matched.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Kind looked up.
        kind: EntityKind,
        /// Query.
        name: String,
    },
    /// The store failed during lookup.
    #[error("{kind} lookup for {name} failed")]
    Store {
        /// Kind looked up.
        kind: EntityKind,
        /// Query.
        name: String,
        /// Backend error.
        #[source]
        source: StoreError,
    },
}

/// Resolve `name` (trimmed first) to an entity of `kind`.
///
/// An empty name is [`LocateError::NotFound`] without touching the store.
pub async fn locate<S: Store + ?Sized>(
    store: &S,
    kind: EntityKind,
    name: &str,
) -> Result<Located, LocateError> {
    let name = name.trim();
    let not_found = || LocateError::NotFound {
        kind,
        name: name.to_string(),
    };
    if name.is_empty() {
        return Err(not_found());
    }

    let table = kind.table();
    let column = table.name_column().unwrap_or("nome");

    for &strategy in kind.strategies() {
        let hits = match strategy {
            MatchStrategy::Exact => store.query_exact(table, column, name).await,
            MatchStrategy::Substring => store.query_contains(table, column, name).await,
        }
        .map_err(|source| LocateError::Store {
            kind,
            name: name.to_string(),
            source,
        })?;

        let Some(hit) = smallest_id(&hits) else {
            continue;
        };
        match strategy {
            MatchStrategy::Exact if hits.len() > 1 => warn!(
                %kind,
                query = name,
                matches = hits.len(),
                id = hit.id,
                "several exact matches; using the smallest id"
            ),
            MatchStrategy::Exact => {}
            MatchStrategy::Substring => info!(
                %kind,
                query = name,
                matched = %hit.name,
                id = hit.id,
                "resolved by similarity"
            ),
        }
        return Ok(Located {
            id: hit.id,
            name: hit.name.clone(),
            strategy,
        });
    }

    Err(not_found())
}

fn smallest_id(hits: &[EntityRef]) -> Option<&EntityRef> {
    hits.iter().min_by_key(|e| e.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryStore, StoreCall};

    #[tokio::test]
    async fn exact_match_beats_substring() {
        let store = MemoryStore::new();
        let _broader = store.add_site("Vaccini Tijuca 45 Anexo");
        let exact = store.add_site("Vaccini Tijuca 45");

        let hit = locate(&store, EntityKind::Site, "Vaccini Tijuca 45")
            .await
            .unwrap();
        assert_eq!(hit.id, exact);
        assert_eq!(hit.strategy, MatchStrategy::Exact);
    }

    #[tokio::test]
    async fn site_falls_back_to_substring() {
        let store = MemoryStore::new();
        let id = store.add_site("Vaccini Botafogo");

        let hit = locate(&store, EntityKind::Site, "botafogo").await.unwrap();
        assert_eq!(
            hit,
            Located {
                id,
                name: "Vaccini Botafogo".into(),
                strategy: MatchStrategy::Substring
            }
        );
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Exact(Table::Sites, "botafogo".into()),
                StoreCall::Contains(Table::Sites, "botafogo".into()),
            ]
        );
    }

    #[tokio::test]
    async fn catalog_items_use_substring_only_on_trimmed_name() {
        let store = MemoryStore::new();
        let first = store.add_item("Febre Amarela");
        let _second = store.add_item("Febre Amarela Fracionada");

        let hit = locate(&store, EntityKind::CatalogItem, "  febre amarela ")
            .await
            .unwrap();
        assert_eq!(hit.id, first);
        assert_eq!(
            store.calls(),
            vec![StoreCall::Contains(Table::CatalogItems, "febre amarela".into())]
        );
    }

    #[tokio::test]
    async fn duplicate_exact_names_pick_smallest_id() {
        let store = MemoryStore::new();
        let a = store.add_site("Vaccini Copacabana");
        let _b = store.add_site("Vaccini Copacabana");
        let hit = locate(&store, EntityKind::Site, "Vaccini Copacabana")
            .await
            .unwrap();
        assert_eq!(hit.id, a);
    }

    #[tokio::test]
    async fn empty_name_never_queries() {
        let store = MemoryStore::new();
        store.add_item("BCG");
        let err = locate(&store, EntityKind::CatalogItem, "   ").await.unwrap_err();
        assert!(matches!(
            err,
            LocateError::NotFound {
                kind: EntityKind::CatalogItem,
                ..
            }
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn unmatched_name_is_not_found() {
        let store = MemoryStore::new();
        store.add_site("Vaccini Botafogo");
        let err = locate(&store, EntityKind::Site, "Clinica X").await.unwrap_err();
        assert_eq!(err.to_string(), "site not found: Clinica X");
    }
}
