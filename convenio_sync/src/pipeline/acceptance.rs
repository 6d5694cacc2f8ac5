use tracing::{error, info, warn};

use super::partners::PartnerIndex;
use super::summary::ImportSummary;
use crate::aliases::AliasResolver;
use crate::error::ImportError;
use crate::input::AcceptanceRow;
use crate::locate::{EntityKind, locate};
use crate::store::{AcceptanceAssociation, Store};
use crate::writer::upsert_acceptance;

async fn import_row<S: Store + ?Sized>(
    store: &S,
    partner: &str,
    partner_id: i64,
    site: &str,
    accepted: bool,
) -> Result<(), ImportError> {
    let located = locate(store, EntityKind::Site, site).await?;

    upsert_acceptance(
        store,
        AcceptanceAssociation {
            site_id: located.id,
            partner_id,
            accepted,
        },
    )
    .await
    .inspect_err(|e| error!(partner, site, error = %e, "acceptance upsert failed"))
}

/// Phase 3: one acceptance association per row. Row problems are counted,
/// never propagated.
pub(crate) async fn import_acceptance<S: Store + ?Sized>(
    store: &S,
    aliases: &AliasResolver,
    index: &PartnerIndex,
    rows: &[AcceptanceRow],
    summary: &mut ImportSummary,
) {
    info!(rows = rows.len(), "phase 3: importing site acceptance");

    for row in rows {
        let partner = aliases.resolve_partner(&row.partner);
        let site = aliases.resolve_site(&row.site);
        let Some(partner_id) = index.get(&partner) else {
            warn!(partner = %partner, site = %site, "partner not in index; acceptance row skipped");
            summary.acceptance_partner_missing += 1;
            continue;
        };

        match import_row(store, &partner, partner_id, &site, row.accepted()).await {
            Ok(()) => summary.acceptance_upserted += 1,
            Err(ImportError::EntityNotFound { name, .. }) => {
                warn!(partner = %partner, site = %name, "site not found; acceptance row skipped");
                summary.acceptance_skipped += 1;
            }
            Err(e @ ImportError::LookupFailed { .. }) => {
                error!(partner = %partner, site = %site, error = %e, "site lookup failed");
                summary.acceptance_failed += 1;
            }
            Err(_) => summary.acceptance_failed += 1,
        }
    }

    info!(
        upserted = summary.acceptance_upserted,
        skipped = summary.acceptance_skipped,
        partner_missing = summary.acceptance_partner_missing,
        failed = summary.acceptance_failed,
        "phase 3: acceptance done"
    );
}
