//! Alias Resolver.
//!
//! Maps raw spreadsheet labels to canonical names through two fixed tables
//! (see [`config`]). The lookup key is always [`normalize`]d, so matching is
//! insensitive to case and surrounding whitespace. When no alias matches:
//!
//! - partners fall back to the **normalized** label (`" amil "` -> `"AMIL"`)
//! - sites fall back to the **trimmed original** label (`" Clinica X "` -> `"Clinica X"`)
//!
//! The resolver is immutable and cheap to share by reference.

pub mod check;
pub mod config;

use std::path::Path;

use anyhow::Context;

pub use check::{AliasCoverage, LabelCoverage, coverage};
pub use config::{AliasConfig, NormalizationReport, load_aliases_path, load_aliases_str};

use crate::normalize::normalize;

/// Read-only partner and site alias tables.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    config: AliasConfig,
}

impl AliasResolver {
    /// Resolver over `config`. Keys must already be in normalized form, as
    /// produced by [`load_aliases_str`] and friends.
    pub fn new(config: AliasConfig) -> Self {
        Self { config }
    }

    /// Resolver over the built-in tables.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self::new(config::builtin()?))
    }

    /// Resolver over the tables in the TOML file at `path`.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let config = load_aliases_path(path)
            .with_context(|| format!("load aliases from {}", path.display()))?;
        Ok(Self::new(config))
    }

    /// The underlying tables.
    pub fn config(&self) -> &AliasConfig {
        &self.config
    }

    /// Explicit partner alias for `raw`, if any.
    pub fn partner_alias(&self, raw: &str) -> Option<&str> {
        self.config.partners.get(&normalize(raw)).map(String::as_str)
    }

    /// Explicit site alias for `raw`, if any.
    pub fn site_alias(&self, raw: &str) -> Option<&str> {
        self.config.sites.get(&normalize(raw)).map(String::as_str)
    }

    /// Canonical partner name for a spreadsheet label.
    pub fn resolve_partner(&self, raw: &str) -> String {
        match self.partner_alias(raw) {
            Some(canonical) => canonical.to_string(),
            None => normalize(raw),
        }
    }

    /// Canonical site name for a spreadsheet label.
    pub fn resolve_site(&self, raw: &str) -> String {
        match self.site_alias(raw) {
            Some(canonical) => canonical.to_string(),
            None => raw.trim().to_string(),
        }
    }
}
