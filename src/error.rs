//! Error types for pdfsift PDF parsing.

use thiserror::Error;

/// Primary error type for PDF parsing operations.
///
/// Low-level parse errors (`Read`, `Expected`) are recovered close to where
/// they occur and never reach callers of `read_object`; the end-of-composite
/// sentinels are in-band signals consumed by the parser loops. `Password` and
/// `Unsupported` surface verbatim.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("unexpected end of input")]
    Read,

    #[error("expected {0}")]
    Expected(&'static str),

    #[error("end of array")]
    EndOfArray,

    #[error("end of dictionary")]
    EndOfDictionary,

    #[error("incorrect password")]
    Password,

    #[error("unsupported feature: {0}")]
    Unsupported(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// Build an `Expected` error, snapshotting a backtrace when trace
    /// logging is enabled. The snapshot is diagnostic only.
    pub(crate) fn expected(token: &'static str) -> Self {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("expected {token}: {}", std::backtrace::Backtrace::capture());
        }
        PdfError::Expected(token)
    }

    pub(crate) fn corrupt(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("corrupt: {detail}: {}", std::backtrace::Backtrace::capture());
        }
        PdfError::Corrupt(detail)
    }

    /// True for the in-band composite terminators.
    pub fn is_end_of_composite(&self) -> bool {
        matches!(self, PdfError::EndOfArray | PdfError::EndOfDictionary)
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
