//! CLI binary for pdf-vision-ocr.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `OcrConfig`, prints status lines and a summary.

use anyhow::{Context, Result};
use clap::Parser;
use pdf_vision_ocr::{
    inspect, run, OcrConfig, ProgressCallback, RunProgressCallback, RunSummary, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Status-line callback ─────────────────────────────────────────────────────

/// Prints one status line per saved page image and per saved text file to
/// stdout, with an optional progress bar on stderr. The bar is suspended
/// while each line is printed so the two never interleave.
struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    fn new(show_bar: bool) -> Arc<Self> {
        let bar = if show_bar {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.set_prefix("Preparing");
            bar.set_message("Opening PDF…");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        } else {
            ProgressBar::hidden()
        };
        Arc::new(Self { bar })
    }

    /// Switch to the counting style for a stage of `total` items.
    fn start_stage(&self, prefix: &'static str, unit: &str, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  ⏱ {{elapsed_precise}}"
        );
        self.bar.set_style(
            ProgressStyle::with_template(&template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        self.bar.set_prefix(prefix);
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.reset_eta();
    }
}

impl RunProgressCallback for ConsoleProgress {
    fn on_rasterize_start(&self, total_pages: usize) {
        self.start_stage("Rendering", "pages", total_pages);
    }

    fn on_page_saved(&self, page_num: usize, _total: usize, path: &Path) {
        self.bar
            .suspend(|| println!("Saved page {} as {}", page_num, path.display()));
        self.bar.inc(1);
    }

    fn on_ocr_start(&self, total_images: usize) {
        self.start_stage("OCR", "images", total_images);
    }

    fn on_text_saved(&self, image_path: &Path, text_path: &Path, _index: usize, _total: usize) {
        let name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.suspend(|| {
            println!("OCR result saved for {} in {}", name, text_path.display())
        });
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rasterise pdf/test.pdf into output/ and OCR every page
  pdfocr pdf/test.pdf

  # Different output directory and model
  pdfocr scans/contract.pdf -o contract --model gpt-4o

  # Only render the page images (no API key needed)
  pdfocr --rasterize-only report.pdf -o report

  # OCR images that are already in output/
  pdfocr --ocr-only -o output

  # Page count and page sizes (no API key needed)
  pdfocr --inspect-only report.pdf

  # Any OpenAI-compatible endpoint
  pdfocr --api-base-url http://localhost:1234/v1 --model qwen2-vl doc.pdf

OUTPUT LAYOUT:
  <output-dir>/page_1.png … page_N.png
  <output-dir>/text_files/page_1.txt … page_N.txt   (override: --text-dir)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY      API key sent as a bearer token
  OPENAI_BASE_URL     API base URL (default https://api.openai.com/v1)
  PDFIUM_LIB_PATH     Directory containing libpdfium
  RUST_LOG            Log filter, e.g. RUST_LOG=pdf_vision_ocr=debug
"#;

/// Rasterise a PDF and OCR each page with a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdfocr",
    version,
    about = "Rasterise PDF pages and OCR them with a vision LLM",
    long_about = "Render every page of a PDF to a PNG at a fixed DPI, send each image to an \
OpenAI-compatible chat-completions endpoint, and save the returned text as one .txt file per page.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to rasterise.
    #[arg(default_value = "pdf/test.pdf")]
    input: PathBuf,

    /// Directory for page images (text goes to <dir>/text_files).
    #[arg(short, long, env = "PDFOCR_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Directory for text files. Default: <output-dir>/text_files.
    #[arg(long, env = "PDFOCR_TEXT_DIR")]
    text_dir: Option<PathBuf>,

    /// API key sent as `Authorization: Bearer <key>`.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL; `/chat/completions` is appended.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = pdf_vision_ocr::config::DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Vision model ID.
    #[arg(long, env = "PDFOCR_MODEL", default_value = pdf_vision_ocr::config::DEFAULT_MODEL)]
    model: String,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDFOCR_DPI", default_value_t = pdf_vision_ocr::config::DEFAULT_DPI,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Max output tokens per page.
    #[arg(long, env = "PDFOCR_MAX_TOKENS", default_value_t = pdf_vision_ocr::config::DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Text file whose contents replace the OCR instruction.
    #[arg(long, env = "PDFOCR_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Per-request timeout in seconds (default: none).
    #[arg(long, env = "PDFOCR_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Render page images only; skip OCR.
    #[arg(long, conflicts_with = "ocr_only")]
    rasterize_only: bool,

    /// OCR the images already in the output directory; skip rendering.
    #[arg(long)]
    ocr_only: bool,

    /// Print page count and page sizes, then exit.
    #[arg(long)]
    inspect_only: bool,

    /// Print the run summary (or inspect result) as JSON.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFOCR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFOCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFOCR_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Status lines already report each page; library INFO logs would
    // duplicate them.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None).await?;
        let info = inspect(&config).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise page info")?
            );
        } else {
            println!("File:   {}", cli.input.display());
            println!("Pages:  {}", info.page_count);
            for page in &info.pages {
                let (w, h) = page.pixel_dimensions(cli.dpi);
                println!(
                    "  page {:>3}  {:>7.1} × {:<7.1} pt  →  {} × {} px @ {} DPI",
                    page.page_num, page.width_points, page.height_points, w, h, cli.dpi
                );
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if cli.quiet || cli.json {
        None
    } else {
        let show_bar = !cli.no_progress && !cli.verbose;
        Some(ConsoleProgress::new(show_bar) as Arc<dyn RunProgressCallback>)
    };

    let config = build_config(&cli, progress).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = run(&config).await.context("Run failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages rendered, {} pages OCR'd  {}ms",
            green("✔"),
            bold(&summary.pages_rendered.to_string()),
            bold(&summary.images_processed.to_string()),
            summary.total_duration_ms,
        );
        if summary.images_processed > 0 {
            eprintln!(
                "   {} tokens in  /  {} tokens out  →  {}",
                dim(&summary.total_input_tokens.to_string()),
                dim(&summary.total_output_tokens.to_string()),
                bold(&summary.text_dir.display().to_string()),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `OcrConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<OcrConfig> {
    let stage = if cli.rasterize_only {
        Stage::RasterizeOnly
    } else if cli.ocr_only {
        Stage::OcrOnly
    } else {
        Stage::All
    };

    let mut builder = OcrConfig::builder()
        .pdf_path(&cli.input)
        .output_dir(&cli.output_dir)
        .api_base_url(cli.api_base_url.clone())
        .model(cli.model.clone())
        .dpi(cli.dpi)
        .max_tokens(cli.max_tokens)
        .stage(stage);

    if let Some(ref dir) = cli.text_dir {
        builder = builder.text_dir(dir);
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref path) = cli.prompt_file {
        let instruction = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.instruction(instruction);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref dir) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_library_defaults() {
        let cli = Cli::parse_from(["pdfocr"]);
        assert_eq!(cli.input, PathBuf::from("pdf/test.pdf"));
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert_eq!(cli.dpi, 300);
        assert_eq!(cli.max_tokens, 8000);
        assert_eq!(cli.model, "gpt-4o-mini");
    }

    #[test]
    fn stage_flags_conflict() {
        let res = Cli::try_parse_from(["pdfocr", "--rasterize-only", "--ocr-only", "a.pdf"]);
        assert!(res.is_err());
    }

    #[test]
    fn dpi_range_enforced() {
        assert!(Cli::try_parse_from(["pdfocr", "--dpi", "20", "a.pdf"]).is_err());
        assert!(Cli::try_parse_from(["pdfocr", "--dpi", "150", "a.pdf"]).is_ok());
    }

    #[tokio::test]
    async fn build_config_maps_stage_and_dirs() {
        let cli = Cli::parse_from([
            "pdfocr",
            "--rasterize-only",
            "-o",
            "out",
            "--text-dir",
            "texts",
            "doc.pdf",
        ]);
        let config = build_config(&cli, None).await.unwrap();
        assert_eq!(config.stage, Stage::RasterizeOnly);
        assert_eq!(config.pdf_path, PathBuf::from("doc.pdf"));
        assert_eq!(config.text_dir(), PathBuf::from("texts"));
    }
}
