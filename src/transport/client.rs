use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use super::wire::{RpcRequest, RpcResponse, PROCESS_ALERT};
use super::{AlertTransport, TransportError};
use crate::config::ClientConfig;
use crate::models::AlertRecord;

/// HTTP client for a remote `process_alert` endpoint
pub struct RpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for `endpoint` (in the form `host:port`)
    pub fn new(endpoint: &str, config: &ClientConfig) -> Result<Self, TransportError> {
        validate_endpoint(endpoint)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let path = if config.rpc_path.starts_with('/') {
            config.rpc_path.clone()
        } else {
            format!("/{}", config.rpc_path)
        };

        Ok(RpcClient {
            client,
            url: format!("http://{}{}", endpoint, path),
            next_id: AtomicU64::new(1),
        })
    }

    /// Full URL requests are posted to
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, request: RpcRequest) -> Result<Value, TransportError> {
        let expected_id = request.id.clone();

        let response = self.client.post(&self.url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        if let Some(fault) = body.error {
            return Err(TransportError::Fault {
                code: fault.code,
                message: fault.message,
            });
        }

        if body.id != expected_id {
            return Err(TransportError::InvalidResponse(format!(
                "response id {} does not match request id {}",
                body.id, expected_id
            )));
        }

        body.result
            .ok_or_else(|| TransportError::InvalidResponse("missing result".to_string()))
    }
}

impl AlertTransport for RpcClient {
    async fn process_alert(&self, record: &AlertRecord) -> Result<Vec<Value>, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::process_alert(record, id)?;

        log::debug!("Calling {} #{} for {}", PROCESS_ALERT, id, record);

        match self.call(request).await? {
            Value::Array(values) => Ok(values),
            other => Err(TransportError::InvalidResponse(format!(
                "expected a sequence, got {}",
                other
            ))),
        }
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), TransportError> {
    let invalid = || TransportError::InvalidEndpoint(endpoint.to_string());

    if endpoint.contains('/') {
        return Err(invalid());
    }

    let (host, port) = endpoint.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(invalid());
    }

    Ok(())
}
