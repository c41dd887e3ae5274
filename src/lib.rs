pub mod config;
pub mod forwarder;
pub mod input;
pub mod models;
pub mod output;
pub mod transport;

// Re-export commonly used types
pub use models::AlertRecord;
pub use input::{FieldExtractor, ExtractError, LineError, int_to_ip, ip_to_int};
pub use forwarder::{Forwarder, ForwardError, ForwardSummary};
pub use transport::{AlertTransport, AlertHandler, RpcClient, TransportError};
