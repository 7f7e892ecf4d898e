//! Error types for normalization, sanitization, extraction and live views.

/// Numeric text that holds no parsable digits.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed number: {input:?}")]
pub struct MalformedNumber {
    pub input: String,
}

/// A sanitized batch still carries a disallowed glyph.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Sanitization incomplete: item {index} still contains a disallowed glyph")]
pub struct SanitizationIncomplete {
    pub index: usize,
}

/// Failures reported by a [`LiveView`](crate::live::LiveView).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The page or session behind the view no longer exists.
    #[error("View gone: {0}")]
    Gone(String),

    /// A handle from an earlier poll was used after a newer poll.
    #[error("Stale handle: generation {handle} used after poll {current}")]
    StaleHandle { handle: u64, current: u64 },

    #[error("Script error: {0}")]
    Script(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

/// One feed item that could not be turned into a structured value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Stats label {0:?} has no metric segment")]
    MissingSeparator(String),

    #[error("No link target contains the detail marker")]
    MissingDetailReference,

    #[error(transparent)]
    Number(#[from] MalformedNumber),

    #[error(transparent)]
    View(#[from] ViewError),
}

/// Convenience result type for view calls.
pub type ViewResult<T> = std::result::Result<T, ViewError>;
