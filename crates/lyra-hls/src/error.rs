#![forbid(unsafe_code)]

use thiserror::Error;

/// Structured playlist parse failures.
///
/// Variants carry the 1-based line number and the raw line text of the
/// offending input, except `EmptyContent` where no line exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed attribute list at line {line}: {text}")]
    MalformedAttributeList { line: usize, text: String },

    #[error("missing URI after tag at line {line}: {text}")]
    MissingUriAfterTag { line: usize, text: String },

    #[error("empty playlist content")]
    EmptyContent,

    #[error("unsupported playlist grammar at line {line}: {text}")]
    UnsupportedGrammar { line: usize, text: String },
}

/// HLS core errors.
#[derive(Debug, Error)]
pub enum HlsError {
    #[error("playlist parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("cache error: {0}")]
    Cache(#[from] lyra_cache::CacheError),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("key processing failed: {0}")]
    KeyProcessing(String),

    #[error("background parse task failed: {0}")]
    Task(String),

    #[error("cancelled")]
    Cancelled,
}

pub type HlsResult<T> = Result<T, HlsError>;
