//! Spreadsheet reconciliation and upsert-merge import.
//!
//! Two exports (partner price lists and per-site acceptance lists) are
//! reconciled against a relational store of partners (`convenios`), sites
//! (`unidade`) and catalog items (`ref_vacinas`):
//!
//! raw label → [`normalize`] → [`aliases`] → canonical name → [`locate`] → id
//! → [`writer`] → [`store`]
//!
//! [`pipeline::Pipeline`] drives this over both streams in three phases.
//! Importing the same files again leaves the store unchanged.

#![deny(missing_docs)]

pub mod aliases;
pub mod db;
pub mod error;
pub mod input;
pub mod locate;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod verify;
pub mod writer;

use std::path::Path;

pub use aliases::AliasResolver;
pub use error::ImportError;
pub use pipeline::{ImportInput, ImportSummary, Pipeline};

/// Environment variable naming an alias TOML file to use instead of the
/// built-in tables.
pub const ALIASES_ENV: &str = "CONVENIO_SYNC_ALIASES";

/// Alias resolver for a run: `path` if given, else the file named by
/// [`ALIASES_ENV`], else the built-in tables.
pub fn load_resolver(path: Option<&Path>) -> anyhow::Result<AliasResolver> {
    let from_env = shared_utils::get_env_var_opt(ALIASES_ENV);
    match path.map(Path::to_path_buf).or(from_env.map(Into::into)) {
        Some(path) => AliasResolver::from_path(&path),
        None => AliasResolver::builtin(),
    }
}
