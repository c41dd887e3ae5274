use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use structopt::StructOpt;

use alert_relay::config::Config;
use alert_relay::output::{OutputFormat, OutputHandler};
use alert_relay::{FieldExtractor, Forwarder, RpcClient};

/// Parse an alert log and forward every record to a process_alert endpoint
#[derive(StructOpt, Debug)]
#[structopt(name = "send_records")]
struct Cli {
    /// ASCII alert log, one alert per line
    #[structopt(parse(from_os_str))]
    record_file: PathBuf,

    /// Remote endpoint as host:port
    endpoint: String,

    /// Path to configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::from_args();

    let config = match cli.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal, stopping after the current record...");
        r.store(false, Ordering::SeqCst);
    })?;

    let extractor = FieldExtractor::new()?;
    let client = RpcClient::new(&cli.endpoint, &config.client)?;
    let mut output = OutputHandler::new(
        OutputFormat::from_str(&config.output.format),
        config.output.file_path.clone(),
    )?;

    let file = File::open(&cli.record_file)?;
    log::info!("Forwarding {:?} to {}", cli.record_file, client.url());

    let forwarder = Forwarder::new(client, config.client.on_malformed).with_running_flag(running);
    let summary = forwarder
        .forward_all(extractor.records(BufReader::new(file)), |record, response| {
            output.write_response(record, response)
        })
        .await?;
    output.flush()?;

    log::info!(
        "Forwarded {} record(s); {} line(s) rejected, {} record(s) failed",
        summary.sent,
        summary.rejected.len(),
        summary.failed.len()
    );
    for failure in &summary.failed {
        log::error!("Not delivered: {} ({})", failure.record, failure.error);
    }

    if !summary.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}
