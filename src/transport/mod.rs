//! RPC transport for alert records
//!
//! Records are sent as JSON-RPC 2.0 `process_alert` calls over HTTP.
//! [`RpcClient`] is the sending side and [`AlertHandler`] the reference
//! echo server.

pub mod client;
pub mod server;
pub mod wire;

pub use client::RpcClient;
pub use server::{bind_server, AlertHandler};
pub use wire::{RpcFault, RpcRequest, RpcResponse};

use serde_json::Value;
use thiserror::Error;

use crate::models::AlertRecord;

/// Errors that can occur while sending a record
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Remote fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid endpoint '{0}', expected host:port")]
    InvalidEndpoint(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TransportError {
    /// True when the endpoint could not be reached or dropped the connection
    ///
    /// Such a failure will repeat for every following record, unlike a
    /// fault reported for one record. A request that failed without any
    /// HTTP status (connection reset, server gone mid-run) counts too.
    pub fn is_connection_fault(&self) -> bool {
        match self {
            TransportError::Http(e) => {
                e.is_connect() || e.is_timeout() || (e.is_request() && e.status().is_none())
            }
            _ => false,
        }
    }
}

/// Something that can carry a record to a `process_alert` endpoint
#[allow(async_fn_in_trait)]
pub trait AlertTransport {
    /// Send one record and wait for the response sequence
    async fn process_alert(&self, record: &AlertRecord) -> Result<Vec<Value>, TransportError>;
}
