//! Kairos - continuous queries over temporal RDF fragments
//!
//! Runs one split-query session and prints every emitted row as a JSON line.
//!
//! Usage:
//!   kairos --session demos/delays.json --data demos/trains.ttl --interval
//!   kairos --session session.json --endpoint http://localhost:3030/ds/sparql

use clap::Parser;
use kairos::client::{FragmentsClient, HttpSparqlClient, OxigraphClient};
use kairos::config::KairosConfig;
use kairos::execution::{SessionDescription, Streamer};
use kairos::query::SparqlComposer;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const STORE_ENDPOINT: &str = "memory";

#[derive(Parser, Debug)]
#[command(name = "kairos")]
#[command(about = "Continuous query engine for temporal RDF fragments", long_about = None)]
struct Args {
    /// JSON description of the split query
    #[arg(short, long)]
    session: PathBuf,

    /// RDF document to load into an in-memory store
    #[arg(short, long, conflicts_with = "endpoint", required_unless_present = "endpoint")]
    data: Option<PathBuf>,

    /// SPARQL endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Use interval annotations instead of expiration times
    #[arg(long)]
    interval: bool,

    /// Enable per-round diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Stop after this many rounds
    #[arg(long)]
    max_rounds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = KairosConfig::from_env()?;
    if args.interval {
        config.annotation_mode = kairos::annotation::AnnotationMode::Interval;
    }
    config.verbose |= args.verbose;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut description = SessionDescription::from_json(&std::fs::read_to_string(&args.session)?)?;
    description.apply_annotations(&config.annotator(), config.annotation_strategy);
    let projection = description.projection();
    let mut context = description.into_context(&SparqlComposer::new())?;

    let source = (&args.data, &args.endpoint);
    let (client, endpoint): (Box<dyn FragmentsClient>, String) = match source {
        (Some(path), _) => {
            let client = OxigraphClient::new()?;
            client.load_file(path)?;
            tracing::info!("loaded {}", path.display());
            (Box::new(client), STORE_ENDPOINT.to_string())
        }
        (None, Some(url)) => (Box::new(HttpSparqlClient::new()), url.clone()),
        (None, None) => return Err("either --data or --endpoint is required".into()),
    };

    let mut streamer = Streamer::start(client.as_ref(), &endpoint, projection, |ms| {
        tracing::info!(duration_ms = ms, "round finished");
    })?
    .with_min_retry_delay(config.min_retry_delay());
    if let Some(max_rounds) = args.max_rounds {
        streamer = streamer.with_max_rounds(max_rounds);
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        tracing::info!("received Ctrl+C, stopping");
        let _ = stop_tx.send(true);
    })?;

    let stdout = std::io::stdout();
    let rounds = streamer
        .run(
            &mut context,
            |row, round| {
                let line = serde_json::json!({ "round": round, "bindings": row });
                let mut out = stdout.lock();
                if let Err(e) = writeln!(out, "{}", line) {
                    tracing::error!("failed to write row: {}", e);
                }
            },
            stop_rx,
        )
        .await;

    tracing::info!(rounds, cached = context.cache().len(), "session ended");
    Ok(())
}
