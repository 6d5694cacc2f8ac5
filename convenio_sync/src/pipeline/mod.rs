//! Reconciliation Pipeline.
//!
//! ## Phases
//! 1. **Partners**: every canonical partner name from both streams is upserted
//!    as active in one batch keyed on `nome`. The returned rows become the
//!    [`PartnerIndex`]. A failure here ends the run before any row of the
//!    later phases is looked at.
//! 2. **Prices**: each price row resolves its partner through the index and
//!    its catalog item through the locator, then upserts the price keyed on
//!    `(convenio_id, vacina_id)`.
//! 3. **Acceptance**: each acceptance row resolves its partner through the
//!    index and its site through the locator, then upserts the flag keyed on
//!    `(unidade_id, convenio_id)`.
//!
//! Phases 2 and 3 never query the store for partners. Their row problems
//! (missing partner, unknown item/site, store failures) are logged and counted
//! in the [`ImportSummary`], and the batch moves on.
//!
//! Running the same input twice leaves the store unchanged after the first run.

mod acceptance;
mod partners;
mod prices;
mod summary;

use std::path::Path;

use tracing::info;

pub use partners::{PartnerIndex, canonical_partners};
pub use summary::ImportSummary;

use crate::aliases::AliasResolver;
use crate::error::ImportError;
use crate::input::{AcceptanceRow, PriceRow, read_acceptance_rows, read_price_rows};
use crate::store::Store;

/// Both input streams, fully read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportInput {
    /// Price export rows.
    pub prices: Vec<PriceRow>,
    /// Acceptance export rows.
    pub acceptance: Vec<AcceptanceRow>,
}

impl ImportInput {
    /// Read both exports from disk.
    pub fn read(prices: &Path, acceptance: &Path) -> Result<Self, ImportError> {
        Ok(Self {
            prices: read_price_rows(prices)?,
            acceptance: read_acceptance_rows(acceptance)?,
        })
    }
}

/// The import, bound to a store and an alias resolver.
pub struct Pipeline<'a, S: ?Sized> {
    store: &'a S,
    aliases: &'a AliasResolver,
}

impl<'a, S: Store + ?Sized> Pipeline<'a, S> {
    /// Bind the pipeline; nothing is read or written until [`Pipeline::run`].
    pub fn new(store: &'a S, aliases: &'a AliasResolver) -> Self {
        Self { store, aliases }
    }

    /// Run all three phases over `input`.
    ///
    /// Only a phase-1 failure is returned as an error; everything later is
    /// reflected in the summary.
    pub async fn run(&self, input: &ImportInput) -> Result<ImportSummary, ImportError> {
        info!(
            price_rows = input.prices.len(),
            acceptance_rows = input.acceptance.len(),
            "starting import"
        );

        let index =
            partners::import_partners(self.store, self.aliases, &input.prices, &input.acceptance)
                .await?;

        let mut summary = ImportSummary {
            partners: index.len(),
            ..Default::default()
        };
        prices::import_prices(self.store, self.aliases, &index, &input.prices, &mut summary).await;
        acceptance::import_acceptance(
            self.store,
            self.aliases,
            &index,
            &input.acceptance,
            &mut summary,
        )
        .await;

        info!(
            partners = summary.partners,
            prices = summary.prices_upserted,
            acceptance = summary.acceptance_upserted,
            "import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::AliasConfig;

    fn resolver() -> AliasResolver {
        let mut cfg = AliasConfig::default();
        cfg.partners.insert("AMIL SAUDE".into(), "AMIL".into());
        AliasResolver::new(cfg)
    }

    #[test]
    fn canonical_partners_are_an_ordered_set() {
        let prices = vec![
            PriceRow {
                partner: "amil".into(),
                item: "BCG".into(),
                price_text: None,
            },
            PriceRow {
                partner: " ".into(),
                item: "BCG".into(),
                price_text: None,
            },
        ];
        let acceptance = vec![
            AcceptanceRow {
                partner: "BNDES".into(),
                site: "Copa".into(),
                accepted_text: None,
            },
            AcceptanceRow {
                partner: "Amil Saude".into(),
                site: "Copa".into(),
                accepted_text: None,
            },
        ];
        let names = canonical_partners(&resolver(), &prices, &acceptance);
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["AMIL", "BNDES"]);
    }
}
