use thiserror::Error;

/// Errors related to application configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// The variable is set but holds only whitespace.
    #[error("Environment variable {0} is set but empty")]
    EmptyEnvVar(String),
}
