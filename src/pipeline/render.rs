//! PDF rasterisation: render every page to `page_{n}.png` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the whole render loop onto a blocking
//! thread, and the document handle never leaves that thread.
//!
//! ## Pixel size
//!
//! Each page is rendered at exactly `points / 72 * dpi` pixels per axis,
//! truncated toward zero, so a US-Letter page at 300 DPI becomes
//! 2550 × 3300 px. Rendering uses pdfium's print flag rather than the
//! screen-preview path.

use crate::config::OcrConfig;
use crate::error::PdfOcrError;
use crate::output::{DocumentInfo, PageImage, PageSize};
use crate::progress::{notify, ProgressCallback};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the image for a 1-indexed page.
pub fn page_image_name(page_num: usize) -> String {
    format!("page_{page_num}.png")
}

/// Bind to a pdfium shared library.
///
/// With `lib_dir` set, only that directory is tried. Otherwise the working
/// directory is tried first, then the system library search path.
pub fn bind_pdfium(lib_dir: Option<&Path>) -> Result<Pdfium, PdfOcrError> {
    let bindings = match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PdfOcrError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Rasterise every page of `config.pdf_path` into `config.output_dir`.
///
/// This runs inside `spawn_blocking` since pdfium operations are CPU-bound.
///
/// # Returns
/// One [`PageImage`] per page, in page order.
pub async fn rasterize(config: &OcrConfig) -> Result<Vec<PageImage>, PdfOcrError> {
    let pdf_path = config.pdf_path.clone();
    let output_dir = config.output_dir.clone();
    let lib_dir = config.pdfium_lib_path.clone();
    let dpi = config.dpi;
    let progress = config.progress_callback.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(lib_dir.as_deref())?;
        render_document(&pdfium, &pdf_path, &output_dir, dpi, progress.as_ref())
    })
    .await
    .map_err(|e| PdfOcrError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
///
/// Creates `output_dir` if needed, then renders and writes each page before
/// moving to the next. The first failure is returned; pages already written
/// are left in place.
pub fn render_document(
    pdfium: &Pdfium,
    pdf_path: &Path,
    output_dir: &Path,
    dpi: u32,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<PageImage>, PdfOcrError> {
    std::fs::create_dir_all(output_dir).map_err(|e| PdfOcrError::io(output_dir, e))?;

    let document = open_document(pdfium, pdf_path)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);
    notify(progress, |cb| cb.on_rasterize_start(total_pages));

    let mut results = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let size = page_size(&page, page_num);
        let (width, height) = size.pixel_dimensions(dpi);

        let render_config = PdfRenderConfig::new()
            .set_target_size(width.max(1) as i32, height.max(1) as i32)
            .use_print_quality(true)
            .render_form_data(true);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            PdfOcrError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} ({:.1}×{:.1} pt) → {}x{} px",
            page_num,
            size.width_points,
            size.height_points,
            image.width(),
            image.height()
        );

        let path = output_dir.join(page_image_name(page_num));
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| PdfOcrError::ImageWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        info!("Saved page {} as {}", page_num, path.display());
        notify(progress, |cb| cb.on_page_saved(page_num, total_pages, &path));

        results.push(PageImage {
            page_num,
            width_px: image.width(),
            height_px: image.height(),
            path,
        });
    }

    Ok(results)
}

/// Read page count and page sizes without rendering anything.
pub async fn inspect(pdf_path: &Path, lib_dir: Option<&Path>) -> Result<DocumentInfo, PdfOcrError> {
    let path = pdf_path.to_path_buf();
    let lib_dir = lib_dir.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(lib_dir.as_deref())?;
        document_info(&pdfium, &path)
    })
    .await
    .map_err(|e| PdfOcrError::Internal(format!("Inspect task panicked: {}", e)))?
}

/// Blocking implementation of [`inspect`].
pub fn document_info(pdfium: &Pdfium, pdf_path: &Path) -> Result<DocumentInfo, PdfOcrError> {
    let document = open_document(pdfium, pdf_path)?;
    let pages: Vec<PageSize> = document
        .pages()
        .iter()
        .enumerate()
        .map(|(idx, page)| page_size(&page, idx + 1))
        .collect();

    Ok(DocumentInfo {
        page_count: pages.len(),
        pages,
    })
}

/// Load a document, classifying the common failure causes.
fn open_document<'a>(pdfium: &'a Pdfium, pdf_path: &Path) -> Result<PdfDocument<'a>, PdfOcrError> {
    check_readable(pdf_path)?;

    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| PdfOcrError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

/// Open the input once so missing or unreadable files get their own error
/// instead of pdfium's generic load failure.
pub(crate) fn check_readable(pdf_path: &Path) -> Result<(), PdfOcrError> {
    let path: PathBuf = pdf_path.to_path_buf();
    match std::fs::File::open(&path) {
        Ok(_) => Ok(()),
        Err(e) => Err(match e.kind() {
            std::io::ErrorKind::NotFound => PdfOcrError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => PdfOcrError::PermissionDenied { path },
            _ => PdfOcrError::io(path, e),
        }),
    }
}

fn page_size(page: &PdfPage, page_num: usize) -> PageSize {
    PageSize {
        page_num,
        width_points: page.width().value,
        height_points: page.height().value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_names_are_one_indexed() {
        assert_eq!(page_image_name(1), "page_1.png");
        assert_eq!(page_image_name(12), "page_12.png");
    }

    #[test]
    fn missing_library_dir_fails_to_bind() {
        let result = bind_pdfium(Some(Path::new("/nonexistent/pdfium/dir")));
        assert!(matches!(result, Err(PdfOcrError::PdfiumBindingFailed(_))));
    }

    #[test]
    fn readable_input_passes_check() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();
        assert!(check_readable(&pdf).is_ok());
    }

    #[test]
    fn missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("nested").join("missing.pdf");
        match check_readable(&pdf) {
            Err(PdfOcrError::FileNotFound { path }) => assert_eq!(path, pdf),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn file_used_as_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("plain");
        std::fs::write(&blocker, b"x").unwrap();
        let result = check_readable(&blocker.join("doc.pdf"));
        assert!(matches!(result, Err(PdfOcrError::Io { .. })), "{:?}", result);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_input_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("locked.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();
        std::fs::set_permissions(&pdf, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can open anything; nothing to check then.
        if std::fs::File::open(&pdf).is_ok() {
            println!("SKIP — running with permission override");
            return;
        }
        match check_readable(&pdf) {
            Err(PdfOcrError::PermissionDenied { path }) => assert_eq!(path, pdf),
            other => panic!("expected PermissionDenied, got {:?}", other),
        }
    }
}
