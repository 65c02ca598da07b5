//! mapkit CLI - replays map method-call scripts.
//!
//! Reads a script of method calls, one JSON object per line, and runs it
//! against the in-memory engine. Every call is submitted up front in
//! script order; engine readiness fires after `--ready-delay-ms`, so calls
//! made before readiness exercise the deferred path.
//!
//! ```text
//! {"method": "map#addLayer", "arguments": {"layerId": "poi"}}
//! {"method": "markers#getAll", "arguments": {"layerId": "poi"}}
//! ```
//!
//! Each call produces one JSON line on stdout, in script order:
//! `{"method": .., "result": ..}` or `{"method": .., "error": {..}}`.
//! Logs go to stderr. Blank lines and lines starting with `#` are skipped.
//!
//! # Configuration
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`MAPKIT_*`)
//! 3. Config file given with `--config`
//! 4. Default values (lowest priority)

use anyhow::{Context, Result};
use clap::Parser;
use mapkit_runtime::memory::{InMemoryEngine, InMemoryObjectManagerFactory, PlainClusterRenderer};
use mapkit_runtime::{ConfigLoader, MapConfig, MapController, RenderContext};
use mapkit_types::{CallResult, MethodCall};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// mapkit CLI - replay map method calls against an in-memory engine
#[derive(Parser, Debug)]
#[command(name = "mapkit")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Delay before the engine reports ready
    #[arg(long, value_name = "MS", default_value_t = 0)]
    ready_delay_ms: u64,

    /// Never report the engine ready (deferred calls time out)
    #[arg(long, conflicts_with = "ready_delay_ms")]
    never_ready: bool,

    /// Override the readiness wait bound (also: MAPKIT_READY_TIMEOUT_MS)
    #[arg(long, value_name = "MS")]
    ready_timeout_ms: Option<u64>,

    /// Exit with status 1 if any call failed
    #[arg(long)]
    strict: bool,

    /// Script file (reads stdin when omitted)
    script: Option<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> Result<MapConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(ref path) = self.config {
            loader = loader.with_file(path.clone());
        }
        let mut config = loader.load().context("config error")?;

        if let Some(ms) = self.ready_timeout_ms {
            config.timeouts.ready_ms = ms;
        }
        Ok(config)
    }

    async fn read_script(&self) -> Result<String> {
        match &self.script {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("cannot read script {}", path.display())),
            None => {
                let mut script = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut script)
                    .await
                    .context("cannot read script from stdin")?;
                Ok(script)
            }
        }
    }
}

/// Parses a JSON-lines script into calls, skipping blanks and `#` comments.
fn parse_script(script: &str) -> Result<Vec<MethodCall>> {
    script
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str::<MethodCall>(line)
                .with_context(|| format!("line {}: invalid method call", i + 1))
        })
        .collect()
}

fn render(method: &str, result: &CallResult) -> Value {
    match result {
        Ok(value) => json!({ "method": method, "result": value }),
        Err(err) => json!({ "method": method, "error": err }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Terminal filter: --debug > --verbose > RUST_LOG env > default "warn"
    let filter = if args.debug {
        EnvFilter::new("debug,tokio=warn")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();

    let config = args.resolve_config()?;
    let calls = parse_script(&args.read_script().await?)?;
    info!(calls = calls.len(), ready_ms = config.timeouts.ready_ms, "script loaded");

    let engine = Arc::new(InMemoryEngine::new());
    let factory = Arc::new(InMemoryObjectManagerFactory::new());
    let render_context = RenderContext::new(factory, Arc::new(PlainClusterRenderer));
    let map = MapController::new(config, engine.as_ref(), render_context);

    let pending: Vec<_> = calls
        .into_iter()
        .map(|call| {
            let method = call.method.clone();
            (method, tokio::spawn(map.submit(call)))
        })
        .collect();

    let readiness = if args.never_ready {
        debug!("engine readiness suppressed");
        None
    } else {
        let delay = Duration::from_millis(args.ready_delay_ms);
        let engine = Arc::clone(&engine);
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.fire_ready();
        }))
    };

    let mut failed = 0usize;
    for (method, handle) in pending {
        let result = handle.await.context("call task panicked")?;
        if result.is_err() {
            failed += 1;
        }
        println!("{}", render(&method, &result));
    }

    // Layers only built at readiness still need their deferred close.
    if let Some(readiness) = readiness {
        readiness.await.context("readiness task panicked")?;
    }
    map.dispose();
    info!(failed, "script finished");

    if args.strict && failed > 0 {
        anyhow::bail!("{failed} call(s) failed");
    }
    Ok(())
}
