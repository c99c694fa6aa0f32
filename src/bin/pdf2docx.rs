//! CLI binary for edgequake-pdf2docx.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionOptions`, runs one conversion and writes the artifact.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2docx::document::{output_path_for, UploadedDocument};
use edgequake_pdf2docx::{
    ConversionObserver, ConversionOptions, ConversionStage, ConversionState, Orchestrator,
    OrchestratorConfig, PageBound, TranslationOptions,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner observer ─────────────────────────────────────────────────────────

/// Terminal spinner driven by the conversion state machine.
///
/// The engine reports no per-page progress, so a spinner with the current
/// stage is all there is to show.
struct SpinnerObserver {
    bar: ProgressBar,
    started: Instant,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            started: Instant::now(),
        })
    }
}

impl ConversionObserver for SpinnerObserver {
    fn on_state_change(&self, _from: ConversionState, to: ConversionState) {
        match to {
            ConversionState::Validating => self.bar.set_prefix("Validating"),
            ConversionState::Converting => self.bar.set_prefix("Converting"),
            ConversionState::Done | ConversionState::Failed => {
                self.bar.finish_and_clear();
                eprintln!(
                    "{} {} after {}",
                    if to == ConversionState::Done { green("✔") } else { red("✘") },
                    to,
                    dim(&format!("{:.1}s", self.started.elapsed().as_secs_f64()))
                );
            }
            ConversionState::Idle => {}
        }
    }

    fn on_stage(&self, stage: ConversionStage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_failure(&self, message: &str) {
        self.bar.println(format!("  {}", red(message)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Whole document, next to the input (report.docx)
  pdf2docx report.pdf

  # Pages 3 to 5 into a chosen file
  pdf2docx report.pdf --start 3 --end 5 -o out.docx

  # Let the engine use several processes
  pdf2docx big.pdf --multi-processing

  # Translate into Traditional Chinese (report_translated.docx)
  pdf2docx report.pdf --translate zh-TW

  # Translate into French and export as PDF
  pdf2docx report.pdf --translate fr --to-pdf -o fr/report.pdf

  # Page count and metadata only
  pdf2docx --inspect-only --json report.pdf

ENVIRONMENT VARIABLES:
  PDF2DOCX_BIN        pdf2docx executable (default: pdf2docx on PATH)
  SOFFICE_BIN         LibreOffice executable for --to-pdf (default: soffice)
  PDF2DOCX_TEMP_DIR   Where per-run workspaces are created
  RUST_LOG            Overrides the log filter

SETUP:
  pip install pdf2docx           # conversion engine
  apt install libreoffice-writer # only for --to-pdf
"#;

/// Convert PDF files to DOCX.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2docx",
    version,
    about = "Convert PDF files to editable DOCX documents",
    long_about = "Convert a PDF to DOCX with the pdf2docx engine, optionally restricted to a \
page range, optionally translated paragraph by paragraph and exported back to PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file.
    input: PathBuf,

    /// Write the result here instead of next to the input.
    #[arg(short, long, env = "PDF2DOCX_OUTPUT")]
    output: Option<PathBuf>,

    /// First page to convert (1-based).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    start: Option<u32>,

    /// Last page to convert (1-based, inclusive).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    end: Option<u32>,

    /// Let the engine spread the work across processes.
    #[arg(long, env = "PDF2DOCX_MULTI_PROCESSING")]
    multi_processing: bool,

    /// Translate the result into this language code (e.g. zh-TW, fr).
    #[arg(long, value_name = "LANG")]
    translate: Option<String>,

    /// Source language of the document.
    #[arg(long, value_name = "LANG", default_value = "auto", requires = "translate")]
    source_lang: String,

    /// Export the translated document as PDF.
    #[arg(long, requires = "translate")]
    to_pdf: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON summary on stdout.
    #[arg(long, env = "PDF2DOCX_JSON")]
    json: bool,

    /// pdf2docx executable.
    #[arg(long, env = "PDF2DOCX_BIN", default_value = "pdf2docx")]
    engine_bin: String,

    /// LibreOffice executable used by --to-pdf.
    #[arg(long, env = "SOFFICE_BIN", default_value = "soffice")]
    soffice_bin: String,

    /// Directory for temporary workspaces.
    #[arg(long, env = "PDF2DOCX_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2DOCX_QUIET")]
    quiet: bool,

    /// Disable the spinner.
    #[arg(long, env = "PDF2DOCX_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; INFO logs would
    // scribble over it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = OrchestratorConfig::builder()
        .engine_program(&cli.engine_bin)
        .soffice_program(&cli.soffice_bin);
    if let Some(ref dir) = cli.temp_dir {
        config = config.temp_root(dir);
    }
    let config = config.build().context("Invalid configuration")?;

    let mut builder =
        Orchestrator::production(config).context("Failed to set up the converter")?;
    if show_progress {
        builder = builder.observer(SpinnerObserver::new());
    }
    let orchestrator = builder.build();

    let document = UploadedDocument::from_path(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = orchestrator
            .inspect(&document)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = info.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = info.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = info.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", info.page_count);
            println!("PDF Version:  {}", info.pdf_version);
            println!("Encrypted:    {}", info.is_encrypted);
            if let Some(ref p) = info.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = info.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let options = build_options(&cli);
    let started = Instant::now();
    let artifact = orchestrator
        .convert(document, &options)
        .await
        .context("Conversion failed")?;

    let output_path = output_path_for(cli.output.as_deref(), &cli.input, &artifact.filename);
    artifact
        .write_to(&output_path)
        .await
        .context("Failed to write output")?;

    if cli.json {
        let summary = json!({
            "input": cli.input,
            "output": output_path,
            "filename": artifact.filename,
            "media_type": artifact.media_type,
            "bytes": artifact.bytes.len(),
            "duration_ms": started.elapsed().as_millis() as u64,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} bytes  {}ms  →  {}",
            green("●"),
            artifact.bytes.len(),
            started.elapsed().as_millis(),
            bold(&output_path.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionOptions`.
fn build_options(cli: &Cli) -> ConversionOptions {
    let bound = |page: Option<u32>| page.map(PageBound::at).unwrap_or_default();
    let output_filename = cli
        .output
        .as_ref()
        .and_then(|p| p.file_stem())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    ConversionOptions {
        start_page: bound(cli.start),
        end_page: bound(cli.end),
        multi_processing: cli.multi_processing,
        output_filename,
        translation: cli.translate.as_ref().map(|target| TranslationOptions {
            source_lang: cli.source_lang.clone(),
            target_lang: target.clone(),
        }),
        export_pdf: cli.to_pdf,
    }
}
