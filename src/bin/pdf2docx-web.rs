//! HTTP server binary for edgequake-pdf2docx.
//!
//! Serves the upload form and converts submissions with the shared
//! orchestrator.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2docx::web::{self, AppState};
use edgequake_pdf2docx::{Orchestrator, OrchestratorConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Serve the PDF→DOCX upload form.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2docx-web",
    version,
    about = "Serve the PDF to DOCX upload form over HTTP",
    color = clap::ColorChoice::Auto
)]
struct Args {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 8501)]
    port: u16,

    /// Largest accepted request body, in MiB.
    #[arg(long, env = "PDF2DOCX_MAX_UPLOAD_MB", default_value_t = 200)]
    max_upload_mb: usize,

    /// pdf2docx executable.
    #[arg(long, env = "PDF2DOCX_BIN", default_value = "pdf2docx")]
    engine_bin: String,

    /// LibreOffice executable for translated PDF export.
    #[arg(long, env = "SOFFICE_BIN", default_value = "soffice")]
    soffice_bin: String,

    /// Directory for per-request workspaces.
    #[arg(long, env = "PDF2DOCX_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Default target language in the form.
    #[arg(long, env = "PDF2DOCX_TARGET_LANG", default_value = "zh-TW")]
    target_lang: String,

    /// Hide the translation controls.
    #[arg(long, env = "PDF2DOCX_NO_TRANSLATION")]
    no_translation: bool,

    /// Hide the translated-PDF option.
    #[arg(long, env = "PDF2DOCX_NO_PDF_EXPORT")]
    no_pdf_export: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DOCX_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "edgequake_pdf2docx=debug,pdf2docx_web=debug,tower_http=debug"
    } else {
        "edgequake_pdf2docx=info,pdf2docx_web=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = OrchestratorConfig::builder()
        .engine_program(&args.engine_bin)
        .soffice_program(&args.soffice_bin)
        .default_target_lang(&args.target_lang);
    if let Some(ref dir) = args.temp_dir {
        config = config.temp_root(dir);
    }
    let config = config.build().context("Invalid configuration")?;

    let mut builder =
        Orchestrator::production(config).context("Failed to set up the converter")?;
    if args.no_translation {
        builder = builder.without_translation();
    }
    if args.no_pdf_export {
        builder = builder.without_pdf_export();
    }
    let orchestrator = Arc::new(builder.build());
    info!(
        "Translation: {}, PDF export: {}",
        orchestrator.supports_translation(),
        orchestrator.supports_pdf_export()
    );

    let app = web::router(AppState::new(orchestrator), args.max_upload_mb * 1024 * 1024)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
