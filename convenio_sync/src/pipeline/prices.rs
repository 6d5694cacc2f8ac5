use tracing::{error, info, warn};

use super::partners::PartnerIndex;
use super::summary::ImportSummary;
use crate::aliases::AliasResolver;
use crate::error::ImportError;
use crate::input::PriceRow;
use crate::locate::{EntityKind, locate};
use crate::store::{PriceAssociation, Store};
use crate::writer::upsert_price;

async fn import_row<S: Store + ?Sized>(
    store: &S,
    partner: &str,
    partner_id: i64,
    row: &PriceRow,
) -> Result<(), ImportError> {
    let item = locate(store, EntityKind::CatalogItem, &row.item).await?;

    upsert_price(
        store,
        PriceAssociation {
            partner_id,
            item_id: item.id,
            price: row.price(),
            active: true,
        },
    )
    .await
    .inspect_err(|e| error!(partner, item = %row.item, error = %e, "price upsert failed"))
}

/// Phase 2: one price association per row. Row problems are counted, never
/// propagated.
pub(crate) async fn import_prices<S: Store + ?Sized>(
    store: &S,
    aliases: &AliasResolver,
    index: &PartnerIndex,
    rows: &[PriceRow],
    summary: &mut ImportSummary,
) {
    info!(rows = rows.len(), "phase 2: importing prices");

    for row in rows {
        let partner = aliases.resolve_partner(&row.partner);
        let Some(partner_id) = index.get(&partner) else {
            warn!(partner = %partner, item = %row.item, "partner not in index; price row skipped");
            summary.prices_partner_missing += 1;
            continue;
        };

        match import_row(store, &partner, partner_id, row).await {
            Ok(()) => summary.prices_upserted += 1,
            Err(ImportError::EntityNotFound { name, .. }) => {
                warn!(partner = %partner, item = %name, "catalog item not found; price row skipped");
                summary.prices_skipped += 1;
            }
            Err(e @ ImportError::LookupFailed { .. }) => {
                error!(partner = %partner, item = %row.item, error = %e, "catalog item lookup failed");
                summary.prices_failed += 1;
            }
            Err(_) => summary.prices_failed += 1,
        }
    }

    info!(
        upserted = summary.prices_upserted,
        skipped = summary.prices_skipped,
        partner_missing = summary.prices_partner_missing,
        failed = summary.prices_failed,
        "phase 2: prices done"
    );
}
