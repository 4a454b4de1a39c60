//! OCR stage: send every page image to the vision model, one at a time.
//!
//! Images are listed from a single directory (non-recursive), ordered by the
//! page number in their file name, and processed strictly in sequence. Each
//! request is awaited before the next file is read. The first error ends
//! the batch: no text file is written for the failing image or any image
//! after it, and earlier text files stay on disk.

use crate::client::{ChatRequest, VisionClient};
use crate::config::OcrConfig;
use crate::error::PdfOcrError;
use crate::output::OcrResult;
use crate::pipeline::encode::{data_uri, PNG_MIME};
use crate::progress::notify;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extension of the files picked up from the image directory.
pub const IMAGE_EXTENSION: &str = "png";

static RE_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)$").unwrap());

/// List the `*.png` files directly inside `image_dir`, in page order.
///
/// Ordering: by the number at the end of the file stem (`page_2` before
/// `page_10`); files without such a number come after numbered ones; ties
/// are broken by file name.
pub async fn list_images(image_dir: &Path) -> Result<Vec<PathBuf>, PdfOcrError> {
    let mut entries = tokio::fs::read_dir(image_dir)
        .await
        .map_err(|e| PdfOcrError::io(image_dir, e))?;

    let mut images = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PdfOcrError::io(image_dir, e))?
    {
        let path = entry.path();
        // metadata() follows symlinks, so a linked page image still counts.
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| PdfOcrError::io(&path, e))?;
        if !meta.is_file() {
            continue;
        }
        if has_image_extension(&path) {
            images.push(path);
        } else {
            debug!("Skipping non-image entry {}", path.display());
        }
    }

    images.sort_by(|a, b| compare_page_order(a, b));
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(IMAGE_EXTENSION))
}

/// Trailing number of the file stem, e.g. `page_12.png` → 12.
pub fn page_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    RE_PAGE_NUMBER
        .captures(stem)
        .and_then(|caps| caps[1].parse().ok())
}

fn compare_page_order(a: &Path, b: &Path) -> Ordering {
    let by_number = match (page_number(a), page_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_number.then_with(|| a.file_name().cmp(&b.file_name()))
}

/// Text file path for `image_path`: same stem, `.txt`, inside `text_dir`.
pub fn text_path_for(image_path: &Path, text_dir: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    let mut name = stem;
    name.push(".txt");
    text_dir.join(name)
}

/// OCR every image in `image_dir`, writing one text file per image into
/// `text_dir`.
///
/// Creates `text_dir` if needed. Stops at the first failure.
pub async fn ocr_images(
    client: &dyn VisionClient,
    image_dir: &Path,
    text_dir: &Path,
    config: &OcrConfig,
) -> Result<Vec<OcrResult>, PdfOcrError> {
    tokio::fs::create_dir_all(text_dir)
        .await
        .map_err(|e| PdfOcrError::io(text_dir, e))?;

    let images = list_images(image_dir).await?;
    let total = images.len();
    if total == 0 {
        warn!("No .{} files found in {}", IMAGE_EXTENSION, image_dir.display());
    } else {
        info!("OCR of {} images from {}", total, image_dir.display());
    }
    notify(config.progress_callback.as_ref(), |cb| cb.on_ocr_start(total));

    let mut results = Vec::with_capacity(total);
    for (i, image_path) in images.iter().enumerate() {
        let result = process_image(client, image_path, text_dir, config).await?;
        notify(config.progress_callback.as_ref(), |cb| {
            cb.on_text_saved(image_path, &result.text_path, i + 1, total)
        });
        results.push(result);
    }

    Ok(results)
}

/// OCR a single image and write its text file.
pub async fn process_image(
    client: &dyn VisionClient,
    image_path: &Path,
    text_dir: &Path,
    config: &OcrConfig,
) -> Result<OcrResult, PdfOcrError> {
    let start = Instant::now();

    let bytes = tokio::fs::read(image_path)
        .await
        .map_err(|e| PdfOcrError::io(image_path, e))?;
    let request = ChatRequest::ocr(
        &config.model,
        &config.instruction,
        data_uri(PNG_MIME, &bytes),
        config.max_tokens,
    );
    drop(bytes);

    let completion = client.complete(&request).await?;
    let usage = completion.usage.unwrap_or_default();

    let text_path = text_path_for(image_path, text_dir);
    tokio::fs::write(&text_path, completion.content.as_bytes())
        .await
        .map_err(|e| PdfOcrError::io(&text_path, e))?;

    let duration = start.elapsed();
    info!(
        "OCR result saved for {} in {}",
        image_path.display(),
        text_path.display()
    );
    debug!(
        "{}: {} input tokens, {} output tokens, {:?}",
        image_path.display(),
        usage.prompt_tokens,
        usage.completion_tokens,
        duration
    );

    Ok(OcrResult {
        image_path: image_path.to_path_buf(),
        text_path,
        text: completion.content,
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        duration_ms: duration.as_millis() as u64,
    })
}
