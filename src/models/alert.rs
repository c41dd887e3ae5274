use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::input::int_to_ip;

/// Port assigned when a line carries no port
pub const DEFAULT_PORT: u16 = 0;

/// Address assigned when a line carries no destination (`0.0.0.0`)
pub const DEFAULT_IP: u32 = 0;

/// One parsed alert line
///
/// Fields are only set through [`AlertRecord::new`]; a record never
/// changes after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    source_ip: u32,
    source_port: u16,
    destination_ip: u32,
    destination_port: u16,
    start_time: NaiveDateTime,
}

impl AlertRecord {
    pub fn new(
        source_ip: u32,
        source_port: u16,
        destination_ip: u32,
        destination_port: u16,
        start_time: NaiveDateTime,
    ) -> Self {
        AlertRecord {
            source_ip,
            source_port,
            destination_ip,
            destination_port,
            start_time,
        }
    }

    pub fn source_ip(&self) -> u32 {
        self.source_ip
    }

    pub fn source_port(&self) -> u16 {
        self.source_port
    }

    pub fn destination_ip(&self) -> u32 {
        self.destination_ip
    }

    pub fn destination_port(&self) -> u16 {
        self.destination_port
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    /// The `[source_ip, source_port, destination_ip, destination_port]`
    /// tuple sent alongside the start time, widened for the wire
    pub fn ip_port_pair(&self) -> [u64; 4] {
        [
            u64::from(self.source_ip),
            u64::from(self.source_port),
            u64::from(self.destination_ip),
            u64::from(self.destination_port),
        ]
    }
}

impl fmt::Display for AlertRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} -> {}:{}",
            self.start_time,
            int_to_ip(self.source_ip),
            self.source_port,
            int_to_ip(self.destination_ip),
            self.destination_port
        )
    }
}
