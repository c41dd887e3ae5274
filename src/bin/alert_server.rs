use std::env;
use std::path::PathBuf;

use alert_relay::config::Config;
use alert_relay::transport::bind_server;

/// Reference process_alert echo server
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1).map(PathBuf::from) {
        Some(path) => Config::from_file(&path)?,
        None => {
            log::info!("No config file given, using defaults");
            Config::default()
        }
    };

    let (server, addrs) = bind_server(&config.server)?;
    for addr in &addrs {
        log::info!("Serving process_alert on http://{}{}", addr, config.server.rpc_path);
    }

    server.await?;
    log::info!("Alert server stopped");
    Ok(())
}
