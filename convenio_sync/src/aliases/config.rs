//! Alias tables: parsing, normalization, and loading.
//!
//! The alias file is a small TOML document with two tables:
//!
//! ```toml
//! [partners]
//! "SULAMÉRICA PRESTIGE" = "SULAMÉRICA PRESTIGE"
//!
//! [sites]
//! "TIJ 45" = "Vaccini Tijuca 45"
//! ```
//!
//! Keys are spreadsheet labels and are compared after [`normalize`], so
//! normalization rewrites every key into that form. Targets are canonical store
//! names and are only trimmed; their casing is significant.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_aliases_str`]
//! - Parse + normalize from a file path: [`load_aliases_path`]
//! - The table shipped with the crate: [`builtin`]

use anyhow::{Context, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::normalize::normalize;

/// Alias table compiled into the binary.
pub const BUILTIN_ALIASES: &str = include_str!("../../config/aliases.toml");

/// Both alias tables, label -> canonical name, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    /// Partner label -> canonical partner name.
    #[serde(default)]
    pub partners: IndexMap<String, String>,
    /// Site label -> canonical site name.
    #[serde(default)]
    pub sites: IndexMap<String, String>,
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Partner keys rewritten by trimming/uppercasing.
    pub partner_keys_renamed: usize,
    /// Partner entries dropped because an equal entry already existed.
    pub partner_duplicates_collapsed: usize,
    /// Site keys rewritten by trimming/uppercasing.
    pub site_keys_renamed: usize,
    /// Site entries dropped because an equal entry already existed.
    pub site_duplicates_collapsed: usize,
}

fn normalize_table(
    section: &str,
    table: &mut IndexMap<String, String>,
    renamed: &mut usize,
    collapsed: &mut usize,
) -> anyhow::Result<()> {
    let mut rebuilt: IndexMap<String, String> = IndexMap::with_capacity(table.len());

    for (raw_key, raw_target) in std::mem::take(table) {
        let key = normalize(&raw_key);
        if key.is_empty() {
            bail!("{section}: alias key cannot be empty after trimming");
        }
        if key != raw_key {
            *renamed += 1;
        }
        let target = raw_target.trim().to_string();
        if target.is_empty() {
            bail!("{section}: alias '{key}' has an empty target");
        }

        match rebuilt.get(&key) {
            Some(existing) if *existing == target => *collapsed += 1,
            Some(existing) => bail!(
                "{section}: alias '{key}' maps to both '{existing}' and '{target}'"
            ),
            None => {
                rebuilt.insert(key, target);
            }
        }
    }

    *table = rebuilt;
    Ok(())
}

/// Normalize both tables in place.
///
/// - Keys are trimmed and uppercased
/// - Targets are trimmed
/// - Entries whose keys collide after normalization collapse when they agree
///
/// Errors:
/// - Empty key or empty target after trimming
/// - Two entries with the same normalized key and different targets
pub fn normalize_aliases(cfg: &mut AliasConfig) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();
    normalize_table(
        "partners",
        &mut cfg.partners,
        &mut report.partner_keys_renamed,
        &mut report.partner_duplicates_collapsed,
    )?;
    normalize_table(
        "sites",
        &mut cfg.sites,
        &mut report.site_keys_renamed,
        &mut report.site_duplicates_collapsed,
    )?;
    Ok(report)
}

/// Parse and normalize alias tables from a TOML string.
pub fn load_aliases_str(toml_str: &str) -> anyhow::Result<AliasConfig> {
    let mut cfg: AliasConfig = from_str(toml_str).context("failed to parse alias TOML")?;
    let report = normalize_aliases(&mut cfg).context("normalize_aliases failed")?;
    tracing::debug!(
        partners = cfg.partners.len(),
        sites = cfg.sites.len(),
        ?report,
        "alias tables loaded"
    );
    Ok(cfg)
}

/// Read an alias TOML file from disk, parse, and normalize it.
pub fn load_aliases_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<AliasConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read alias file {}", path.as_ref().display()))?;
    load_aliases_str(&text)
}

/// The alias tables shipped in `config/aliases.toml`.
pub fn builtin() -> anyhow::Result<AliasConfig> {
    load_aliases_str(BUILTIN_ALIASES).context("built-in alias table is invalid")
}
