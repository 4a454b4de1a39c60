//! Run entry points: rasterise, then OCR.
//!
//! [`run`] is what the binary calls. It rasterises `pdf_path` into
//! `output_dir`, then OCRs every `*.png` in `output_dir` into the text
//! directory. The two stages never overlap and the first error ends the run.

use crate::client::{HttpVisionClient, VisionClient};
use crate::config::OcrConfig;
use crate::error::PdfOcrError;
use crate::output::{DocumentInfo, RunSummary};
use crate::pipeline::{ocr, render};
use crate::progress::notify;
use std::time::Instant;
use tracing::info;

/// Run the configured stages against the real API.
///
/// # Errors
/// Any input, render, network, API or response-shape error. Files written
/// before the failure are left on disk.
pub async fn run(config: &OcrConfig) -> Result<RunSummary, PdfOcrError> {
    // Build the client up front so a missing key fails before rendering.
    let client = if config.stage.runs_ocr() {
        Some(HttpVisionClient::new(config)?)
    } else {
        None
    };
    execute(config, client.as_ref().map(|c| c as &dyn VisionClient)).await
}

/// Run the configured stages with a caller-supplied client.
pub async fn run_with_client(
    config: &OcrConfig,
    client: &dyn VisionClient,
) -> Result<RunSummary, PdfOcrError> {
    execute(config, Some(client)).await
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(config: &OcrConfig) -> Result<RunSummary, PdfOcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PdfOcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(config))
}

/// Page count and page sizes of `config.pdf_path`.
///
/// Does not require an API key.
pub async fn inspect(config: &OcrConfig) -> Result<DocumentInfo, PdfOcrError> {
    render::inspect(&config.pdf_path, config.pdfium_lib_path.as_deref()).await
}

async fn execute(
    config: &OcrConfig,
    client: Option<&dyn VisionClient>,
) -> Result<RunSummary, PdfOcrError> {
    let total_start = Instant::now();
    let text_dir = config.text_dir();
    let mut summary = RunSummary {
        output_dir: config.output_dir.clone(),
        text_dir: text_dir.clone(),
        ..RunSummary::default()
    };

    // ── Step 1: Rasterise pages ──────────────────────────────────────────
    if config.stage.rasterizes() {
        info!("Rasterising {}", config.pdf_path.display());
        let render_start = Instant::now();
        let pages = render::rasterize(config).await?;
        summary.pages_rendered = pages.len();
        summary.render_duration_ms = render_start.elapsed().as_millis() as u64;
        info!(
            "Rendered {} pages in {}ms",
            summary.pages_rendered, summary.render_duration_ms
        );
    }

    // ── Step 2: OCR images ───────────────────────────────────────────────
    if config.stage.runs_ocr() {
        let client = client.ok_or(PdfOcrError::MissingApiKey)?;
        let ocr_start = Instant::now();
        let results = ocr::ocr_images(client, &config.output_dir, &text_dir, config).await?;
        summary.images_processed = results.len();
        summary.total_input_tokens = results.iter().map(|r| r.input_tokens).sum();
        summary.total_output_tokens = results.iter().map(|r| r.output_tokens).sum();
        summary.ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
        info!(
            "OCR complete: {} images in {}ms",
            summary.images_processed, summary.ocr_duration_ms
        );
    }

    summary.total_duration_ms = total_start.elapsed().as_millis() as u64;
    notify(config.progress_callback.as_ref(), |cb| cb.on_run_complete(&summary));
    Ok(summary)
}
