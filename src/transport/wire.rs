//! JSON-RPC 2.0 messages exchanged between the client and the echo server
//!
//! JSON numbers cover the full `u64` range, so IPv4 integers travel
//! without any widening tricks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::AlertRecord;

pub const JSONRPC_VERSION: &str = "2.0";

/// Name of the single remote procedure
pub const PROCESS_ALERT: &str = "process_alert";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcFault>,
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcFault {
    pub code: i64,
    pub message: String,
}

impl RpcRequest {
    /// Build a `process_alert(start_time, ip_port_pair)` call for `record`
    pub fn process_alert(record: &AlertRecord, id: u64) -> Result<Self, serde_json::Error> {
        let params = serde_json::to_value((record.start_time(), record.ip_port_pair()))?;

        Ok(RpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: PROCESS_ALERT.to_string(),
            params,
            id: Value::from(id),
        })
    }
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        RpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        RpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(RpcFault {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_process_alert_request_shape() {
        let start_time = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 23, 45)
            .unwrap();
        let record = AlertRecord::new(u32::MAX, 4444, 167_772_165, 80, start_time);

        let request = RpcRequest::process_alert(&record, 7).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "jsonrpc": "2.0",
                "method": "process_alert",
                "params": ["2024-01-15T10:23:45", [4294967295u64, 4444, 167772165, 80]],
                "id": 7
            })
        );
    }

    #[test]
    fn test_failure_omits_result() {
        let response = RpcResponse::failure(Value::Null, METHOD_NOT_FOUND, "nope");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("result"));
        assert!(json.contains("-32601"));
    }
}
