//! Pipeline stages for rasterise-then-OCR runs.
//!
//! ## Data Flow
//!
//! ```text
//! render ──▶ (page_N.png on disk) ──▶ encode ──▶ ocr ──▶ page_N.txt
//! (pdfium)                            (base64)   (VLM)
//! ```
//!
//! 1. [`render`] — rasterise every page at the configured DPI; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`encode`] — wrap PNG bytes in a base64 `data:` URI
//! 3. [`ocr`]    — list images, send one chat request per image in order,
//!    write the returned text verbatim
//!
//! The stages only meet on disk: the OCR stage reads whatever `*.png` files
//! are in the image directory when it starts.

pub mod encode;
pub mod ocr;
pub mod render;
