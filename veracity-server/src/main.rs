use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use veracity_common::observability::{LogConfig, LogFormat, init_logging};
use veracity_config::{VeracityConfig, VeracityConfigLoader};
use veracity_eval::Evaluator;

/// Claim truthfulness checker backed by an LLM with verified sources.
#[derive(Debug, Parser)]
#[command(name = "veracity", version, about)]
struct Cli {
    /// YAML config file; skipped when missing.
    #[arg(short, long, env = "VERACITY_CONFIG", default_value = "veracity.yaml")]
    config: PathBuf,

    /// Address to listen on, overriding `server.bind`.
    #[arg(short, long, env = "VERACITY_BIND")]
    bind: Option<String>,

    /// Ping the model endpoint and exit.
    #[arg(long)]
    health_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (env wins)
    let cfg: VeracityConfig = VeracityConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    let log_path = init_logging(log_config(&cfg)?)?;
    tracing::info!(log_file = %log_path.display(), config = %cli.config.display(), "starting veracity");

    let evaluator = Evaluator::from_config(&cfg).context("building evaluator")?;

    if cli.health_check {
        let healthy = evaluator.health_check().await?;
        println!(
            "{}: {}",
            evaluator.model_name(),
            if healthy { "ok" } else { "unreachable" }
        );
        if !healthy {
            std::process::exit(1);
        }
        return Ok(());
    }

    let bind = cli.bind.unwrap_or(cfg.server.bind);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;

    let cancel = CancellationToken::new();
    tokio::spawn(veracity_server::shutdown_on_signal(cancel.clone()));

    veracity_server::serve(listener, evaluator, cancel).await
}

fn log_config(cfg: &VeracityConfig) -> Result<LogConfig> {
    let format: LogFormat = cfg
        .logging
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    Ok(LogConfig {
        app_name: "veracity",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format,
        default_filter: cfg.logging.filter.clone(),
    })
}
