//! Errors surfaced by the import.
//!
//! Only input, store-availability and partner-phase errors end a run; the
//! per-row kinds are caught at the row boundary and counted (see
//! [`crate::pipeline`]).

use std::path::PathBuf;

use thiserror::Error;

use crate::locate::{EntityKind, LocateError};
use crate::store::{StoreError, Table};

/// Everything that can go wrong while importing.
#[derive(Debug, Error)]
pub enum ImportError {
    /// An input file could not be opened.
    #[error("cannot open input {}", .path.display())]
    InputMissing {
        /// Path that was tried.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An input is missing a required column or holds an unreadable record.
    #[error("input {input} is malformed: {message}")]
    InputMalformed {
        /// File path or stream label.
        input: String,
        /// What was wrong.
        message: String,
    },

    /// The store could not be configured or reached before the run started.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A name did not resolve to a stored entity.
    #[error("{kind} not found: {name}")]
    EntityNotFound {
        /// What was looked up.
        kind: EntityKind,
        /// Canonical name used for the lookup.
        name: String,
    },

    /// The store failed while looking a name up.
    #[error("{kind} lookup for {name} failed")]
    LookupFailed {
        /// What was looked up.
        kind: EntityKind,
        /// Canonical name used for the lookup.
        name: String,
        /// Backend error.
        #[source]
        source: StoreError,
    },

    /// The store refused or failed a keyed upsert.
    #[error("upsert into {table} failed")]
    UpsertFailed {
        /// Table written.
        table: Table,
        /// Backend error.
        #[source]
        source: StoreError,
    },
}

impl From<LocateError> for ImportError {
    fn from(e: LocateError) -> Self {
        match e {
            LocateError::NotFound { kind, name } => ImportError::EntityNotFound { kind, name },
            LocateError::Store { kind, name, source } => {
                ImportError::LookupFailed { kind, name, source }
            }
        }
    }
}

impl ImportError {
    /// True for the kinds that abort the whole run when they reach the top.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ImportError::InputMissing { .. }
                | ImportError::InputMalformed { .. }
                | ImportError::StoreUnavailable(_)
                | ImportError::UpsertFailed {
                    table: Table::Partners,
                    ..
                }
        )
    }
}
