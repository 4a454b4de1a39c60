//! # pdf-vision-ocr
//!
//! Rasterise PDF pages and transcribe them with a vision-capable chat model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Render  every page → output/page_N.png at 300 DPI (pdfium, print mode)
//!  ├─ 2. Encode  PNG bytes → data:image/png;base64,…
//!  ├─ 3. OCR     one chat-completions request per image, in page order
//!  └─ 4. Output  output/text_files/page_N.txt, text written verbatim
//! ```
//!
//! Rendering finishes before the first request is sent. Requests are sent
//! one after another with no retry; the first failure ends the run and
//! leaves already-written files in place.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_vision_ocr::{run, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OcrConfig::builder()
//!         .pdf_path("pdf/test.pdf")
//!         .output_dir("output")
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!     let summary = run(&config).await?;
//!     eprintln!("{} pages, {} text files", summary.pages_rendered, summary.images_processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfocr` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{ChatCompletion, ChatRequest, HttpVisionClient, Usage, VisionClient};
pub use config::{OcrConfig, OcrConfigBuilder, Stage};
pub use error::PdfOcrError;
pub use output::{DocumentInfo, OcrResult, PageImage, PageSize, RunSummary};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{inspect, run, run_sync, run_with_client};
