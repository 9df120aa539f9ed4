use anyhow::Context;
use clap::Parser;
use nuldc::config::cli::{Cli, Command, SearchOptions};
use nuldc::utils::error::{ErrorSeverity, NuldcError};
use nuldc::utils::{logger, validation::Validate};
use nuldc::{
    DcClient, ExportEngine, ExportRequest, HttpTransport, LocalStorage, OutputFormat, SearchExport,
};
use serde_json::{json, Value};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init_cli_logger(cli.global.verbose);
    tracing::debug!("CLI args: {:?}", cli);

    let config = match cli.global.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let transport = HttpTransport::new(config.timeout(), config.retry_policy())
        .context("Failed to build the HTTP client")?;
    let client = DcClient::new(transport, config.client_settings());

    if let Err(e) = run(cli.command, client).await {
        tracing::error!("❌ {} (Severity: {:?})", e, e.severity());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let code = exit_code(&e);
        if code > 0 {
            std::process::exit(code);
        }
    }

    Ok(())
}

async fn run(command: Command, client: DcClient<HttpTransport>) -> nuldc::Result<()> {
    match command {
        Command::Works { id, format } => {
            let work = client.get_work(&id, format).await?;
            print_json(&work)
        }
        Command::Collections { id, format, all } => {
            let walked = client.get_collection(&id, client.params(format), all).await?;
            print_json(&walked.value)
        }
        Command::Search {
            query,
            format,
            options,
        } => {
            let params = client
                .params(format)
                .with_query(query)
                .with_source_filter(&options.fields, &options.exclude_fields);
            let walked = client.search(&options.model, params, options.all).await?;
            print_json(&walked.value)
        }
        Command::Csv {
            query,
            outfile,
            options,
        } => export(client, query, outfile, options, OutputFormat::Csv).await,
        Command::Xml {
            query,
            outfile,
            options,
        } => export(client, query, outfile, options, OutputFormat::Xml).await,
    }
}

async fn export(
    client: DcClient<HttpTransport>,
    query: String,
    outfile: PathBuf,
    options: SearchOptions,
    format: OutputFormat,
) -> nuldc::Result<()> {
    let outfile = outfile.to_string_lossy().into_owned();
    let request = ExportRequest {
        query,
        model: options.model,
        all: options.all,
        fields: options.fields,
        exclude_fields: options.exclude_fields,
        format,
        outfile: outfile.clone(),
    };

    let pipeline = SearchExport::new(client, LocalStorage::new("."), request);
    ExportEngine::new(pipeline).run().await?;

    print_json(&json!({
        "message": format!("saved {} to : {}", format.extension(), outfile)
    }))
}

fn print_json(value: &Value) -> nuldc::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn exit_code(error: &NuldcError) -> i32 {
    if let NuldcError::CeilingExceeded { .. } = error {
        return 1;
    }
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
