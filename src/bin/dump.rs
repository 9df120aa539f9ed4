use anyhow::Context;
use clap::Parser;
use nuldc::config::cli::GlobalArgs;
use nuldc::utils::{logger, validation::Validate};
use nuldc::{CatalogDump, DcClient, HttpTransport, LocalStorage};

#[derive(Parser)]
#[command(name = "nuldc-dump")]
#[command(about = "Dump catalog metadata as json, xml and csv, one set of files per collection")]
struct Args {
    #[command(flatten)]
    global: GlobalArgs,

    /// Directory holding json/, xml/, csv/ and the marker file
    #[arg(short, long)]
    output: Option<String>,

    /// Collections dumped at the same time
    #[arg(short, long)]
    workers: Option<usize>,

    /// Log JSON lines instead of human-readable output
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger(args.global.verbose);
    } else {
        logger::init_cli_logger(args.global.verbose);
    }

    let mut config = args
        .global
        .load_config()
        .context("Failed to load configuration")?;
    if let Some(output) = args.output {
        config.dump.output_path = output;
    }
    if let Some(workers) = args.workers {
        config.dump.workers = workers;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    tracing::info!(
        "🚀 Dumping {} into {} with {} workers",
        config.api.base_url,
        config.dump.output_path,
        config.dump.workers
    );

    let transport = HttpTransport::new(config.timeout(), config.retry_policy())
        .context("Failed to build the HTTP client")?;
    let client = DcClient::new(transport, config.dump_client_settings());
    let storage = LocalStorage::new(config.dump.output_path.clone());
    let dump = CatalogDump::new(client, storage, config.dump_settings());

    let today = chrono::Local::now().date_naive();
    let summary = dump
        .run(today)
        .await
        .with_context(|| format!("Dump against {} failed", config.api.base_url))?;

    println!(
        "✅ {} saved, {} empty, {} partial, {} failed",
        summary.saved.len(),
        summary.empty.len(),
        summary.partial.len(),
        summary.failed.len()
    );
    for (id, reason) in &summary.failed {
        eprintln!("❌ {}: {}", id, reason);
    }

    if !summary.is_complete() {
        eprintln!("💡 Marker left unchanged; re-run to retry the missing collections");
        std::process::exit(2);
    }

    Ok(())
}
