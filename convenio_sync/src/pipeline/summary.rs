use std::fmt;

/// Counters for one import run.
///
/// Every row of phase 2 lands in exactly one of `prices_upserted`,
/// `prices_partner_missing`, `prices_skipped` or `prices_failed`; phase 3 is
/// split the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Partners upserted in phase 1.
    pub partners: usize,
    /// Price rows written.
    pub prices_upserted: usize,
    /// Catalog item not found.
    pub prices_skipped: usize,
    /// Canonical partner absent from the phase-1 index.
    pub prices_partner_missing: usize,
    /// Lookup or upsert failed in the store.
    pub prices_failed: usize,
    /// Acceptance rows written.
    pub acceptance_upserted: usize,
    /// Site not found.
    pub acceptance_skipped: usize,
    /// Canonical partner absent from the phase-1 index.
    pub acceptance_partner_missing: usize,
    /// Lookup or upsert failed in the store.
    pub acceptance_failed: usize,
}

impl ImportSummary {
    /// Rows of the price stream accounted for.
    pub fn price_rows(&self) -> usize {
        self.prices_upserted + self.prices_skipped + self.prices_partner_missing + self.prices_failed
    }

    /// Rows of the acceptance stream accounted for.
    pub fn acceptance_rows(&self) -> usize {
        self.acceptance_upserted
            + self.acceptance_skipped
            + self.acceptance_partner_missing
            + self.acceptance_failed
    }

    /// True when no row was skipped or failed.
    pub fn is_clean(&self) -> bool {
        self.price_rows() == self.prices_upserted
            && self.acceptance_rows() == self.acceptance_upserted
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_any = false;
        // (label, count, hide when zero)
        let mut section = |title: &str, lines: &[(&str, usize, bool)]| -> fmt::Result {
            if wrote_any {
                writeln!(f)?;
            }
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.len()))?;
            for &(label, n, optional) in lines {
                if optional && n == 0 {
                    continue;
                }
                writeln!(f, "{label:<22}{n:>6}")?;
            }
            wrote_any = true;
            Ok(())
        };

        section("Partners", &[("upserted", self.partners, false)])?;
        section(
            "Prices",
            &[
                ("upserted", self.prices_upserted, false),
                ("skipped (no item)", self.prices_skipped, false),
                ("partner missing", self.prices_partner_missing, true),
                ("failed", self.prices_failed, true),
            ],
        )?;
        section(
            "Acceptance",
            &[
                ("upserted", self.acceptance_upserted, false),
                ("skipped (no site)", self.acceptance_skipped, false),
                ("partner missing", self.acceptance_partner_missing, true),
                ("failed", self.acceptance_failed, true),
            ],
        )
    }
}
