//! Reference echo server for `process_alert`
//!
//! The handler is an explicit object shared with every worker through
//! `web::Data`; it carries the server options and nothing else.

use std::net::SocketAddr;

use actix_web::dev::Server;
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use chrono::NaiveDateTime;
use serde_json::Value;

use super::wire::{
    RpcRequest, RpcResponse, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND, PARSE_ERROR, PROCESS_ALERT,
};
use crate::config::ServerConfig;

/// Handles `process_alert` calls
#[derive(Debug, Clone)]
pub struct AlertHandler {
    echo_ip_port_pair: bool,
}

impl AlertHandler {
    pub fn new(config: &ServerConfig) -> Self {
        AlertHandler {
            echo_ip_port_pair: config.echo_ip_port_pair,
        }
    }

    /// Echo the start time back, plus the ip/port tuple when configured
    pub fn process_alert(
        &self,
        start_time: NaiveDateTime,
        ip_port_pair: &[u64],
    ) -> Result<Vec<Value>, serde_json::Error> {
        let mut response = vec![serde_json::to_value(start_time)?];
        if self.echo_ip_port_pair {
            response.push(serde_json::to_value(ip_port_pair)?);
        }
        Ok(response)
    }

    /// Decode one JSON-RPC request body and produce its response
    pub fn handle_payload(&self, body: &[u8]) -> RpcResponse {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Unparseable request body: {}", e);
                return RpcResponse::failure(Value::Null, PARSE_ERROR, "Parse error");
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: RpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => return RpcResponse::failure(id, INVALID_REQUEST, e.to_string()),
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return RpcResponse::failure(
                request.id,
                INVALID_REQUEST,
                format!("unsupported jsonrpc version '{}'", request.jsonrpc),
            );
        }

        self.dispatch(request)
    }

    fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        if request.method != PROCESS_ALERT {
            return RpcResponse::failure(
                request.id,
                METHOD_NOT_FOUND,
                format!("method '{}' is not supported", request.method),
            );
        }

        let (start_time, ip_port_pair): (NaiveDateTime, Vec<u64>) =
            match serde_json::from_value(request.params) {
                Ok(params) => params,
                Err(e) => return RpcResponse::failure(request.id, INVALID_PARAMS, e.to_string()),
            };

        if ip_port_pair.len() != 4 {
            return RpcResponse::failure(
                request.id,
                INVALID_PARAMS,
                format!("ip_port_pair needs 4 elements, got {}", ip_port_pair.len()),
            );
        }

        log::debug!("process_alert({}, {:?})", start_time, ip_port_pair);

        match self.process_alert(start_time, &ip_port_pair) {
            Ok(result) => RpcResponse::success(request.id, Value::Array(result)),
            Err(e) => RpcResponse::failure(request.id, INTERNAL_ERROR, e.to_string()),
        }
    }
}

async fn rpc_endpoint(handler: web::Data<AlertHandler>, body: web::Bytes) -> HttpResponse {
    HttpResponse::Ok().json(handler.handle_payload(&body))
}

/// Register the RPC route on `rpc_path`
pub fn configure(cfg: &mut web::ServiceConfig, rpc_path: &str) {
    cfg.route(rpc_path, web::post().to(rpc_endpoint));
}

/// Bind the echo server without starting it
///
/// Returns the server future together with the addresses it is bound to,
/// which matters when binding to port 0.
pub fn bind_server(config: &ServerConfig) -> std::io::Result<(Server, Vec<SocketAddr>)> {
    let handler = web::Data::new(AlertHandler::new(config));
    let rpc_path = config.rpc_path.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(handler.clone())
            .configure(|cfg| configure(cfg, &rpc_path))
    })
    .workers(config.workers.max(1))
    .bind(config.bind_address.as_str())?;

    let addrs = server.addrs();
    Ok((server.run(), addrs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use chrono::NaiveDate;
    use serde_json::json;

    fn handler(echo_ip_port_pair: bool) -> AlertHandler {
        AlertHandler::new(&ServerConfig {
            echo_ip_port_pair,
            ..ServerConfig::default()
        })
    }

    fn request_body(method: &str, params: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 3
        }))
        .unwrap()
    }

    #[test]
    fn test_echoes_start_time() {
        let body = request_body(
            "process_alert",
            json!(["2024-01-15T10:23:45", [3232235786u64, 4444, 167772165, 80]]),
        );
        let response = handler(false).handle_payload(&body);

        assert_eq!(response.error, None);
        assert_eq!(response.id, json!(3));
        assert_eq!(response.result, Some(json!(["2024-01-15T10:23:45"])));
    }

    #[test]
    fn test_echoes_ip_port_pair_when_enabled() {
        let body = request_body(
            "process_alert",
            json!(["2024-01-15T10:23:45", [1, 2, 3, 4]]),
        );
        let response = handler(true).handle_payload(&body);

        assert_eq!(
            response.result,
            Some(json!(["2024-01-15T10:23:45", [1, 2, 3, 4]]))
        );
    }

    #[test]
    fn test_process_alert_direct() {
        let start_time = NaiveDate::from_ymd_opt(2024, 2, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let result = handler(false).process_alert(start_time, &[1, 0, 0, 0]).unwrap();
        assert_eq!(result, vec![json!("2024-02-02T00:00:00")]);
    }

    #[test]
    fn test_fault_codes() {
        let h = handler(false);

        let response = h.handle_payload(b"not json at all");
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);

        let response = h.handle_payload(br#"{"id": 1}"#);
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(response.id, json!(1));

        let response = h.handle_payload(&request_body("other", json!([])));
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);

        let response = h.handle_payload(&request_body(
            "process_alert",
            json!(["2024-01-15T10:23:45", [1, 2, 3]]),
        ));
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        let response = h.handle_payload(&request_body(
            "process_alert",
            json!(["yesterday", [1, 2, 3, 4]]),
        ));
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[actix_web::test]
    async fn test_rpc_route() {
        let app = actix_web::test::init_service(
            App::new()
                .app_data(web::Data::new(handler(false)))
                .configure(|cfg| configure(cfg, "/RPC2")),
        )
        .await;

        let req = actix_web::test::TestRequest::post()
            .uri("/RPC2")
            .set_payload(request_body(
                "process_alert",
                json!(["2024-01-15T10:23:45", [1, 2, 3, 4]]),
            ))
            .to_request();
        let response: RpcResponse = actix_web::test::call_and_read_body_json(&app, req).await;
        assert_eq!(response.result, Some(json!(["2024-01-15T10:23:45"])));

        let req = actix_web::test::TestRequest::post()
            .uri("/elsewhere")
            .set_payload("{}")
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
