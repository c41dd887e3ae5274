use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration shared by the forwarding client and the echo server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Forwarding client configuration
    pub client: ClientConfig,
    /// Echo server configuration
    pub server: ServerConfig,
    /// Response output configuration
    pub output: OutputConfig,
}

/// Forwarding client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// HTTP path the RPC endpoint is served on
    pub rpc_path: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// What to do with a line that cannot be parsed
    pub on_malformed: MalformedPolicy,
}

/// Handling of lines that do not yield a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Log a warning, count the line as rejected and keep going
    Skip,
    /// Stop the run at the first bad line
    Abort,
}

/// Echo server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_address: String,
    /// HTTP path the RPC endpoint is served on
    pub rpc_path: String,
    /// Also return the ip/port tuple, not just the start time
    pub echo_ip_port_pair: bool,
    /// Number of worker threads
    pub workers: usize,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json", "jsonl", or "console"
    pub format: String,
    /// Output file path (stdout when unset)
    pub file_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            rpc_path: "/RPC2".to_string(),
            timeout_secs: 30,
            on_malformed: MalformedPolicy::Skip,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1:8000".to_string(),
            rpc_path: "/RPC2".to_string(),
            echo_ip_port_pair: false,
            workers: 1,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: "console".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.client.rpc_path, "/RPC2");
        assert_eq!(config.client.on_malformed, MalformedPolicy::Skip);
        assert_eq!(config.server.bind_address, "127.0.0.1:8000");
        assert!(!config.server.echo_ip_port_pair);
        assert_eq!(config.output.format, "console");
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");

        let mut config = Config::default();
        config.client.timeout_secs = 5;
        config.client.on_malformed = MalformedPolicy::Abort;
        config.output.file_path = Some(PathBuf::from("responses.jsonl"));
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.client.timeout_secs, 5);
        assert_eq!(loaded.client.on_malformed, MalformedPolicy::Abort);
        assert_eq!(loaded.output.file_path, Some(PathBuf::from("responses.jsonl")));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            bind_address = "0.0.0.0:9000"
            echo_ip_port_pair = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert!(config.server.echo_ip_port_pair);
        assert_eq!(config.server.rpc_path, "/RPC2");
        assert_eq!(config.client.timeout_secs, 30);
    }
}
