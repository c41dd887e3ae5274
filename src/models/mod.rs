mod alert;

pub use alert::{AlertRecord, DEFAULT_IP, DEFAULT_PORT};
