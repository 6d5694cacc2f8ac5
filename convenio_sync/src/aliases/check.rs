//! Alias coverage report.
//!
//! Lists every distinct partner and site label found in the inputs together
//! with the canonical name it resolves to, flagging labels that only resolved
//! through the fallback. Useful before an import to spot new spellings.

use std::fmt;

use indexmap::IndexMap;

use super::AliasResolver;
use crate::input::{AcceptanceRow, PriceRow};

/// One distinct input label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCoverage {
    /// Label as it appears in the input, trimmed.
    pub label: String,
    /// Name it resolves to.
    pub canonical: String,
    /// Whether an explicit alias matched.
    pub explicit: bool,
    /// Rows carrying this label.
    pub rows: usize,
}

/// Coverage of both alias tables over a pair of inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasCoverage {
    /// Partner labels from both streams, first-seen order.
    pub partners: Vec<LabelCoverage>,
    /// Site labels from the acceptance stream, first-seen order.
    pub sites: Vec<LabelCoverage>,
}

impl AliasCoverage {
    /// Partner labels without an explicit alias.
    pub fn unmapped_partners(&self) -> impl Iterator<Item = &LabelCoverage> {
        self.partners.iter().filter(|l| !l.explicit)
    }

    /// Site labels without an explicit alias.
    pub fn unmapped_sites(&self) -> impl Iterator<Item = &LabelCoverage> {
        self.sites.iter().filter(|l| !l.explicit)
    }
}

fn tally<'a>(
    labels: impl Iterator<Item = &'a str>,
    resolve: impl Fn(&str) -> (String, bool),
) -> Vec<LabelCoverage> {
    let mut seen: IndexMap<&str, LabelCoverage> = IndexMap::new();
    for raw in labels {
        let label = raw.trim();
        if label.is_empty() {
            continue;
        }
        seen.entry(label)
            .or_insert_with(|| {
                let (canonical, explicit) = resolve(label);
                LabelCoverage {
                    label: label.to_string(),
                    canonical,
                    explicit,
                    rows: 0,
                }
            })
            .rows += 1;
    }
    seen.into_values().collect()
}

/// Resolve every distinct label in `prices` and `acceptance`.
pub fn coverage(
    resolver: &AliasResolver,
    prices: &[PriceRow],
    acceptance: &[AcceptanceRow],
) -> AliasCoverage {
    let partner_labels = prices
        .iter()
        .map(|r| r.partner.as_str())
        .chain(acceptance.iter().map(|r| r.partner.as_str()));
    let partners = tally(partner_labels, |label| {
        (
            resolver.resolve_partner(label),
            resolver.partner_alias(label).is_some(),
        )
    });
    let sites = tally(acceptance.iter().map(|r| r.site.as_str()), |label| {
        (
            resolver.resolve_site(label),
            resolver.site_alias(label).is_some(),
        )
    });
    AliasCoverage { partners, sites }
}

impl fmt::Display for AliasCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = [("Partners", &self.partners), ("Sites", &self.sites)];
        for (i, (title, entries)) in groups.into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.len()))?;
            for e in entries {
                let mark = if e.explicit { '=' } else { '?' };
                writeln!(f, "{mark} \"{}\" → \"{}\"  ({} rows)", e.label, e.canonical, e.rows)?;
            }
            let unmapped = entries.iter().filter(|e| !e.explicit).count();
            writeln!(
                f,
                "{} labels, {} with alias, {} fallback",
                entries.len(),
                entries.len() - unmapped,
                unmapped
            )?;
        }
        Ok(())
    }
}
