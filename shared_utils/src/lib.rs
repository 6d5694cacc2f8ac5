//! Small helpers shared by the workspace binaries.

pub mod config;
pub mod env;

pub use config::ConfigError;
pub use env::{get_env_var, get_env_var_opt};
