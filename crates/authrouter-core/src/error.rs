//! Error types for loading the policy document.

use std::path::PathBuf;

/// Result alias for policy loading.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors raised while reading, parsing or validating a policy document.
///
/// All of these are fatal at startup; request evaluation never produces one.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("could not read policy file '{path}': {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not have the expected shape.
    #[error("could not parse policy document, please ensure it is valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required per-user field is missing or empty.
    #[error("the field `{field}` is missing for user '{user}'")]
    MissingField {
        /// Username the field belongs to.
        user: String,
        /// Dotted field name, e.g. `sitemaps.default`.
        field: &'static str,
    },

    /// The entrypoint is not an absolute path.
    #[error("the entrypoint '{entrypoint}' for user '{user}' must be an absolute path")]
    RelativeEntrypoint {
        /// Username the entrypoint belongs to.
        user: String,
        /// The configured entrypoint.
        entrypoint: String,
    },
}

impl PolicyError {
    pub(crate) fn missing(user: &str, field: &'static str) -> Self {
        Self::MissingField {
            user: user.to_string(),
            field,
        }
    }
}
