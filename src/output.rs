//! Result types produced by the pipeline stages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Physical size of one PDF page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Width in PDF points (1/72 inch).
    pub width_points: f32,
    /// Height in PDF points (1/72 inch).
    pub height_points: f32,
}

impl PageSize {
    /// Pixel dimensions of this page rendered at `dpi`.
    ///
    /// `points / 72 * dpi`, truncated toward zero.
    pub fn pixel_dimensions(&self, dpi: u32) -> (u32, u32) {
        (
            points_to_pixels(self.width_points, dpi),
            points_to_pixels(self.height_points, dpi),
        )
    }
}

/// Convert a length in points to whole pixels at `dpi`, truncating.
pub fn points_to_pixels(points: f32, dpi: u32) -> u32 {
    let px = points / 72.0 * dpi as f32;
    if px.is_finite() && px > 0.0 {
        px as u32
    } else {
        0
    }
}

/// Page count and page sizes of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub pages: Vec<PageSize>,
}

/// One rendered page, already written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-indexed page number used in the file name.
    pub page_num: usize,
    pub path: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
}

/// OCR output for one image, already written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub image_path: PathBuf,
    pub text_path: PathBuf,
    /// Text exactly as returned by the model.
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

/// Counts and timings for a whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub pages_rendered: usize,
    pub images_processed: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub total_duration_ms: u64,
    pub output_dir: PathBuf,
    pub text_dir: PathBuf,
}
