//! Configuration errors rejected at construction time.

use thiserror::Error;

/// Invalid configuration detected before any repository is contacted.
///
/// These are programming or settings mistakes. They are reported eagerly when
/// a pipeline, vendor or repository is built, never while rendering.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown document format '{format}' for README candidate '{path}'")]
    UnknownFormat { path: String, format: String },

    #[error("README candidate path must not be empty")]
    EmptyCandidatePath,

    #[error("sanitization policy has no entry for tag <{tag}> emitted by the renderer")]
    MissingPolicyEntry { tag: String },

    #[error("unsupported repository vendor '{0}'")]
    UnsupportedVendor(String),

    #[error("malformed vendor identifier '{0}'")]
    MalformedVendorId(String),

    #[error("cannot infer vendor for host '{0}', pass it explicitly")]
    UnknownHost(String),

    #[error("repository URL must use HTTPS: {0}")]
    InsecureUrl(String),

    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid settings: {0}")]
    Settings(String),
}
