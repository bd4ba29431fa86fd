use camino::Utf8PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DexError {
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("invalid generation number: {0}")]
    InvalidGeneration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("search index unavailable, try again")]
    IndexUnavailable,

    #[error("upstream request failed: {0}")]
    UpstreamHttp(String),

    #[error("upstream returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("malformed upstream resource: {0}")]
    Malformed(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl DexError {
    /// True when upstream answered that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DexError::NotFound(_) | DexError::UpstreamStatus { status: 404, .. }
        )
    }
}
