//! Sequential forwarding of parsed alerts
//!
//! Records are pulled from the lazy extractor stream and sent one at a
//! time; the next call is only issued after the previous one completed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::config::MalformedPolicy;
use crate::input::LineError;
use crate::models::AlertRecord;
use crate::transport::{AlertTransport, TransportError};

/// Errors that stop a forwarding run
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("Malformed input, aborting: {0}")]
    Malformed(LineError),

    #[error("Failed to read input: {0}")]
    Read(LineError),

    #[error("Lost connection to endpoint after {sent} record(s): {source}")]
    Connection {
        sent: usize,
        source: TransportError,
    },

    #[error("Failed to write response: {0}")]
    Output(#[from] std::io::Error),
}

/// A record the endpoint did not accept
#[derive(Debug)]
pub struct FailedRecord {
    pub record: AlertRecord,
    pub error: TransportError,
}

/// Outcome of a completed forwarding run
#[derive(Debug, Default)]
pub struct ForwardSummary {
    /// Records the endpoint answered successfully
    pub sent: usize,
    /// Lines skipped because no record could be extracted
    pub rejected: Vec<LineError>,
    /// Records the endpoint answered with a fault
    pub failed: Vec<FailedRecord>,
    /// The run was stopped before the input was exhausted
    pub interrupted: bool,
}

impl ForwardSummary {
    /// True when every line became a record and every record was accepted
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.failed.is_empty() && !self.interrupted
    }
}

/// Drives records through an [`AlertTransport`]
pub struct Forwarder<T> {
    transport: T,
    on_malformed: MalformedPolicy,
    running: Arc<AtomicBool>,
}

impl<T: AlertTransport> Forwarder<T> {
    pub fn new(transport: T, on_malformed: MalformedPolicy) -> Self {
        Forwarder {
            transport,
            on_malformed,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Share a flag that stops the run once cleared
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Borrow the transport records are sent through
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Forward every record in `records`, in order
    ///
    /// `on_response` sees each record with the sequence the endpoint
    /// returned for it.
    pub async fn forward_all<I, F>(
        &self,
        records: I,
        mut on_response: F,
    ) -> Result<ForwardSummary, ForwardError>
    where
        I: IntoIterator<Item = Result<AlertRecord, LineError>>,
        F: FnMut(&AlertRecord, &[Value]) -> std::io::Result<()>,
    {
        let mut summary = ForwardSummary::default();

        for item in records {
            if !self.running.load(Ordering::SeqCst) {
                log::info!("Forwarding interrupted after {} record(s)", summary.sent);
                summary.interrupted = true;
                break;
            }

            let record = match item {
                Ok(record) => record,
                Err(err) if err.is_fatal() => return Err(ForwardError::Read(err)),
                Err(err) => match self.on_malformed {
                    MalformedPolicy::Abort => return Err(ForwardError::Malformed(err)),
                    MalformedPolicy::Skip => {
                        log::warn!("Skipping {}", err);
                        summary.rejected.push(err);
                        continue;
                    }
                },
            };

            match self.transport.process_alert(&record).await {
                Ok(response) => {
                    summary.sent += 1;
                    on_response(&record, &response)?;
                }
                Err(error) if error.is_connection_fault() => {
                    return Err(ForwardError::Connection {
                        sent: summary.sent,
                        source: error,
                    });
                }
                Err(error) => {
                    log::error!("Endpoint rejected {}: {}", record, error);
                    summary.failed.push(FailedRecord { record, error });
                }
            }
        }

        Ok(summary)
    }
}
