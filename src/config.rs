//! Configuration for a rasterise-then-OCR run.
//!
//! Every knob lives in [`OcrConfig`], built via [`OcrConfigBuilder`]. The
//! defaults reproduce the fixed behaviour of the pipeline: 300 DPI,
//! `gpt-4o-mini`, an 8000-token output cap, the OpenAI chat-completions
//! endpoint, and text files under `output/text_files`.

use crate::error::PdfOcrError;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_OCR_INSTRUCTION;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default API base URL; `/chat/completions` is appended per request.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default render resolution (print quality).
pub const DEFAULT_DPI: u32 = 300;

/// Default cap on generated tokens per page.
pub const DEFAULT_MAX_TOKENS: u32 = 8000;

/// Name of the text directory created inside the output directory.
pub const TEXT_SUBDIR: &str = "text_files";

const MIN_DPI: u32 = 72;
const MAX_DPI: u32 = 600;

/// Configuration for a run.
///
/// # Example
/// ```rust
/// use pdf_vision_ocr::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .pdf_path("scans/contract.pdf")
///     .output_dir("out")
///     .api_key("sk-test")
///     .build()
///     .unwrap();
/// assert_eq!(config.text_dir(), std::path::Path::new("out/text_files"));
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// PDF to rasterise. Default: `pdf/test.pdf`.
    pub pdf_path: PathBuf,

    /// Directory receiving `page_{n}.png`. Default: `output`.
    pub output_dir: PathBuf,

    /// Directory receiving `page_{n}.txt`. Default: `output_dir/text_files`.
    pub text_dir: Option<PathBuf>,

    /// Bearer token for the API. Required unless the stage skips OCR.
    pub api_key: Option<String>,

    /// API base URL. Default: [`DEFAULT_API_BASE_URL`].
    pub api_base_url: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Render resolution. Range: 72–600. Default: 300.
    pub dpi: u32,

    /// `max_tokens` sent with every request. Default: 8000.
    pub max_tokens: u32,

    /// Text part of the user message. Default: [`DEFAULT_OCR_INSTRUCTION`].
    pub instruction: String,

    /// Per-request timeout. `None` keeps the HTTP client's default.
    pub api_timeout_secs: Option<u64>,

    /// Directory holding the pdfium shared library. `None` searches the
    /// working directory and then the system library path.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Which stages to run. Default: both.
    pub stage: Stage,

    /// Receives status events as pages and images complete.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            pdf_path: PathBuf::from("pdf").join("test.pdf"),
            output_dir: PathBuf::from("output"),
            text_dir: None,
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            dpi: DEFAULT_DPI,
            max_tokens: DEFAULT_MAX_TOKENS,
            instruction: DEFAULT_OCR_INSTRUCTION.to_string(),
            api_timeout_secs: None,
            pdfium_lib_path: None,
            stage: Stage::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("pdf_path", &self.pdf_path)
            .field("output_dir", &self.output_dir)
            .field("text_dir", &self.text_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("dpi", &self.dpi)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("stage", &self.stage)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory the OCR stage writes into.
    pub fn text_dir(&self) -> PathBuf {
        self.text_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join(TEXT_SUBDIR))
    }

    /// Full chat-completions URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base_url.trim_end_matches('/'))
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn pdf_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.pdf_path = path.as_ref().to_path_buf();
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn text_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.text_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = text.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.pdfium_lib_path = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.config.stage = stage;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, PdfOcrError> {
        let c = &self.config;
        if c.dpi < MIN_DPI || c.dpi > MAX_DPI {
            return Err(PdfOcrError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if c.max_tokens == 0 {
            return Err(PdfOcrError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(PdfOcrError::InvalidConfig("model must not be empty".into()));
        }
        if c.api_base_url.trim().is_empty() {
            return Err(PdfOcrError::InvalidConfig(
                "api_base_url must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which pipeline stages a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stage {
    /// Rasterise the PDF, then OCR every image. (default)
    #[default]
    All,
    /// Rasterise only; no API key needed.
    RasterizeOnly,
    /// OCR the images already present in `output_dir`; the PDF is not opened.
    OcrOnly,
}

impl Stage {
    pub fn rasterizes(self) -> bool {
        matches!(self, Stage::All | Stage::RasterizeOnly)
    }

    pub fn runs_ocr(self) -> bool {
        matches!(self, Stage::All | Stage::OcrOnly)
    }
}
