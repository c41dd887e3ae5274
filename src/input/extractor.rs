use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{Datelike, Local, NaiveDateTime};
use regex::{Captures, Regex};

use super::ipv4::ip_to_int;
use super::{ExtractError, LineError};
use crate::models::{AlertRecord, DEFAULT_IP, DEFAULT_PORT};

/// Groups: timestamp, source ip, source port, destination ip, destination port
const ALERT_PATTERN: &str = r"^([A-Z][a-z]{2} [0-9]+? [0-9]{2}:[0-9]{2}:[0-9]{2}).*?([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+):?([0-9]+)?(?: -> )?([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+)?:?([0-9]+)?";

const TIMESTAMP_FORMAT: &str = "%Y %b %d %H:%M:%S";

/// Extracts alert records from log lines
///
/// Holds nothing but the compiled pattern (and an optional fixed year), so
/// one extractor can be shared across files and threads.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    pattern: Regex,
    year: Option<i32>,
}

/// Result of eagerly parsing a whole input
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Records in input order
    pub records: Vec<AlertRecord>,
    /// Lines that could not be turned into a record
    pub rejected: Vec<LineError>,
}

impl FieldExtractor {
    /// Create an extractor that stamps each timestamp with the current year
    pub fn new() -> Result<Self, ExtractError> {
        Ok(FieldExtractor {
            pattern: Regex::new(ALERT_PATTERN)?,
            year: None,
        })
    }

    /// Create an extractor that always uses `year` to complete timestamps
    pub fn with_year(year: i32) -> Result<Self, ExtractError> {
        Ok(FieldExtractor {
            pattern: Regex::new(ALERT_PATTERN)?,
            year: Some(year),
        })
    }

    /// Parse a single log line into an alert record
    pub fn parse_line(&self, line: &str) -> Result<AlertRecord, ExtractError> {
        let caps = self
            .pattern
            .captures(line)
            .ok_or_else(|| ExtractError::MalformedLine(line.to_string()))?;

        let fragment = group(&caps, 1).ok_or(ExtractError::MissingRequiredField("timestamp"))?;
        let start_time = self.complete_timestamp(fragment)?;

        let source_ip = group(&caps, 2)
            .ok_or(ExtractError::MissingRequiredField("source_ip"))
            .and_then(ip_to_int)?;

        let source_port = match group(&caps, 3) {
            Some(port) => parse_port(port)?,
            None => DEFAULT_PORT,
        };
        let destination_ip = match group(&caps, 4) {
            Some(ip) => ip_to_int(ip)?,
            None => DEFAULT_IP,
        };
        let destination_port = match group(&caps, 5) {
            Some(port) => parse_port(port)?,
            None => DEFAULT_PORT,
        };

        Ok(AlertRecord::new(
            source_ip,
            source_port,
            destination_ip,
            destination_port,
            start_time,
        ))
    }

    /// Lazily extract records from a line-oriented reader
    ///
    /// Lines are pulled one at a time, so memory use does not grow with
    /// the size of the input.
    pub fn records<R: BufRead>(&self, reader: R) -> AlertRecords<'_, R> {
        AlertRecords {
            extractor: self,
            lines: reader.split(b'\n'),
            line_number: 0,
            finished: false,
        }
    }

    /// Eagerly parse in-memory lines, keeping rejected lines alongside
    pub fn parse_lines<I, S>(&self, lines: I) -> ParseReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = ParseReport::default();

        for (index, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_line(line) {
                Ok(record) => report.records.push(record),
                Err(kind) => report.rejected.push(LineError::new(index + 1, kind)),
            }
        }

        report
    }

    /// Open `path` and parse every line in it
    ///
    /// Malformed lines end up in [`ParseReport::rejected`]; only I/O errors
    /// fail the whole call.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ParseReport, ExtractError> {
        let file = File::open(path.as_ref())?;
        let mut report = ParseReport::default();

        for result in self.records(BufReader::new(file)) {
            match result {
                Ok(record) => report.records.push(record),
                Err(err) if err.is_fatal() => return Err(err.kind),
                Err(err) => report.rejected.push(err),
            }
        }

        Ok(report)
    }

    fn complete_timestamp(&self, fragment: &str) -> Result<NaiveDateTime, ExtractError> {
        let year = self.year.unwrap_or_else(|| Local::now().year());
        let timestamp = format!("{} {}", year, fragment);

        NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FORMAT).map_err(|source| {
            ExtractError::InvalidTimestamp {
                fragment: fragment.to_string(),
                source,
            }
        })
    }
}

/// Streaming iterator returned by [`FieldExtractor::records`]
pub struct AlertRecords<'a, R> {
    extractor: &'a FieldExtractor,
    lines: std::io::Split<R>,
    line_number: usize,
    finished: bool,
}

impl<R: BufRead> Iterator for AlertRecords<'_, R> {
    type Item = Result<AlertRecord, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let bytes = match self.lines.next()? {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(LineError::new(self.line_number + 1, e.into())));
                }
            };
            self.line_number += 1;

            let line = match std::str::from_utf8(&bytes) {
                Ok(line) => line,
                Err(_) => {
                    let lossy = String::from_utf8_lossy(&bytes).into_owned();
                    return Some(Err(LineError::new(
                        self.line_number,
                        ExtractError::MalformedLine(lossy),
                    )));
                }
            };
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.trim().is_empty() {
                log::debug!("Skipping blank line {}", self.line_number);
                continue;
            }

            return Some(
                self.extractor
                    .parse_line(line)
                    .map_err(|kind| LineError::new(self.line_number, kind)),
            );
        }
    }
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> Option<&'t str> {
    caps.get(index)
        .map(|m| m.as_str())
        .filter(|value| !value.is_empty())
}

fn parse_port(port: &str) -> Result<u16, ExtractError> {
    port.parse::<u16>()
        .map_err(|_| ExtractError::InvalidPort(port.to_string()))
}
