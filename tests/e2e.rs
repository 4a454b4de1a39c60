//! End-to-end test against a live chat-completions API.
//!
//! Uses a real PDF in `./test_cases/` and makes live API calls. Gated behind
//! the `E2E_ENABLED` environment variable so it does not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... PDFIUM_LIB_PATH=. \
//!     cargo test --test e2e -- --nocapture

use pdf_vision_ocr::{run, OcrConfig};
use std::path::PathBuf;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test unless E2E_ENABLED and OPENAI_API_KEY are set and the
/// PDF at `path` exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let key = match std::env::var("OPENAI_API_KEY") {
            Ok(k) if !k.is_empty() => k,
            _ => {
                println!("SKIP — OPENAI_API_KEY not set");
                return;
            }
        };
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        (p, key)
    }};
}

#[tokio::test]
async fn test_live_ocr_of_sample_pdf() {
    let (pdf, key) = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let out = tempfile::tempdir().unwrap();

    let mut builder = OcrConfig::builder()
        .pdf_path(&pdf)
        .output_dir(out.path())
        .api_key(key)
        .dpi(150)
        .api_timeout_secs(120);
    if let Some(dir) = std::env::var_os("PDFIUM_LIB_PATH") {
        builder = builder.pdfium_lib_path(PathBuf::from(dir));
    }
    let config = builder.build().unwrap();

    let summary = run(&config).await.expect("live run should succeed");

    assert!(summary.pages_rendered > 0);
    assert_eq!(summary.pages_rendered, summary.images_processed);
    for n in 1..=summary.pages_rendered {
        let text = std::fs::read_to_string(config.text_dir().join(format!("page_{n}.txt")))
            .expect("text file per page");
        println!("page {n}: {} bytes", text.len());
    }
}
