//! Error type for the pdf-reraster library.
//!
//! Every pipeline stage returns `Result<_, RerasterError>` and the
//! orchestrator in [`crate::convert`] propagates the first failure unchanged.
//! There is only one channel: a stage never logs a failure and
//! then hands back an empty value for the caller to reinterpret.
//!
//! Variants are grouped by the stage that raises them so a caller can tell
//! "your Base64 is broken" apart from "pdfium is not installed" without
//! string matching.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf-reraster library.
#[derive(Debug, Error)]
pub enum RerasterError {
    // ── Decode errors ─────────────────────────────────────────────────────
    /// The Base64 payload was empty (or only whitespace).
    #[error("Input payload is empty; expected Base64-encoded PDF data")]
    EmptyInput,

    /// The payload could not be decoded as standard Base64.
    #[error("Input is not valid Base64: {reason}")]
    InvalidBase64 { reason: String },

    // ── Staging errors ────────────────────────────────────────────────────
    /// The per-run staging directory (or one of its files) could not be
    /// created, written, or removed.
    #[error("Staging I/O failed at '{path}': {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// pdfium could not parse the decoded document.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rasterizer finished without producing a single page image.
    #[error("No images were generated from the PDF")]
    NoPagesRendered,

    /// The rasterizer reported the same page index twice.
    #[error("Rasterizer returned page {page} more than once")]
    DuplicatePage { page: usize },

    // ── Recombine errors ──────────────────────────────────────────────────
    /// A staged page image could not be read or decoded.
    #[error("Failed to decode page image '{path}': {detail}")]
    ImageDecodeFailed { path: PathBuf, detail: String },

    /// A page image could not be re-encoded with the configured codec.
    #[error("Failed to re-encode page {page}: {detail}")]
    ImageEncodeFailed { page: usize, detail: String },

    /// lopdf failed to serialise the rebuilt document.
    #[error("Failed to write rebuilt PDF: {0}")]
    PdfWriteFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write a caller-requested output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
If pdfium is not installed system-wide you can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
  • Pass --pdfium-lib /path/to/libpdfium.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RerasterError {
    /// Wrap an I/O error raised while touching the staging area.
    pub(crate) fn staging(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RerasterError::Staging {
            path: path.into(),
            source,
        }
    }
}
