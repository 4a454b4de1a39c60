//! Progress-callback trait for per-page and per-image events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to receive events
//! as the pipeline saves each page image and each text file. The `pdfocr`
//! binary uses this to print one status line per page to stdout; library
//! callers can forward events wherever they like.
//!
//! # Example
//!
//! ```rust
//! use pdf_vision_ocr::{OcrConfig, RunProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_page_saved(&self, _page_num: usize, _total: usize, _path: &Path) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//! let config = OcrConfig::builder()
//!     .progress_callback(cb as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::RunSummary;
use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline as it works through pages and images.
///
/// All methods have no-op defaults. Events arrive in order on a single
/// logical sequence, but rasterisation events are raised from a blocking
/// worker thread, so implementations must be `Send + Sync`.
pub trait RunProgressCallback: Send + Sync {
    /// Called once the page count is known, before the first page renders.
    fn on_rasterize_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after `page_{page_num}.png` has been written.
    fn on_page_saved(&self, page_num: usize, total_pages: usize, path: &Path) {
        let _ = (page_num, total_pages, path);
    }

    /// Called once the images to OCR have been enumerated.
    fn on_ocr_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called after the text file for `image_path` has been written.
    ///
    /// `index` is 1-based position in the processing order.
    fn on_text_saved(&self, image_path: &Path, text_path: &Path, index: usize, total: usize) {
        let _ = (image_path, text_path, index, total);
    }

    /// Called once after every selected stage has finished successfully.
    fn on_run_complete(&self, summary: &RunSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

/// Invoke `f` on the configured callback, if any.
pub(crate) fn notify(cb: Option<&ProgressCallback>, f: impl FnOnce(&dyn RunProgressCallback)) {
    if let Some(cb) = cb {
        f(cb.as_ref());
    }
}
