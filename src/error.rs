//! Error type for the pdf-vision-ocr library.
//!
//! The pipeline has no per-page recovery: the first failure ends the run and
//! whatever images or text files were already written stay on disk. A single
//! fatal enum is therefore enough. Variants are grouped by where the run
//! stopped:
//!
//! * **Input / render** — the PDF could not be opened or a page could not be
//!   rasterised or saved.
//! * **Network / API** — the request never completed, or the API answered
//!   with a non-2xx status.
//! * **Response shape** — a 2xx answer did not carry
//!   `choices[0].message.content`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-vision-ocr library.
#[derive(Debug, Error)]
pub enum PdfOcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not load the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be encoded or written as PNG.
    #[error("Failed to write page image '{path}': {source}")]
    ImageWriteFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── API errors ────────────────────────────────────────────────────────
    /// OCR was requested but no API key is configured.
    #[error("No API key configured.\nSet OPENAI_API_KEY or pass --api-key.")]
    MissingApiKey,

    /// The request could not be sent or the response body could not be read.
    #[error("HTTP request to '{url}' failed: {reason}")]
    HttpFailed { url: String, reason: String },

    /// The API answered with a non-2xx status. `body` is the raw response.
    #[error("Error calling OCR API (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// The API answered 2xx but the body did not have the expected shape.
    #[error("Malformed API response: {detail}")]
    MalformedResponse { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Creating a directory, listing it, or reading/writing a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
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
Install libpdfium for your platform, or point PDFIUM_LIB_PATH (--pdfium-lib)\n\
at the directory that contains it.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfOcrError {
    /// Wrap an `io::Error` together with the path it concerns.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PdfOcrError::Io {
            path: path.into(),
            source,
        }
    }
}
