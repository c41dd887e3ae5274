use crate::input::int_to_ip;
use crate::models::AlertRecord;
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Writes the endpoint's response for each forwarded record
pub struct OutputHandler {
    format: OutputFormat,
    writer: Box<dyn Write + Send>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Console,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "jsonl" => OutputFormat::Jsonl,
            "console" => OutputFormat::Console,
            _ => OutputFormat::Console, // Default
        }
    }
}

/// One output entry: the record in readable form plus its response
#[derive(Debug, Serialize)]
struct ForwardedAlert<'a> {
    start_time: String,
    source_ip: String,
    source_port: u16,
    destination_ip: String,
    destination_port: u16,
    response: &'a [Value],
}

impl<'a> ForwardedAlert<'a> {
    fn new(record: &AlertRecord, response: &'a [Value]) -> Self {
        ForwardedAlert {
            start_time: record.start_time().to_string(),
            source_ip: int_to_ip(record.source_ip()),
            source_port: record.source_port(),
            destination_ip: int_to_ip(record.destination_ip()),
            destination_port: record.destination_port(),
            response,
        }
    }
}

impl OutputHandler {
    /// Create a new output handler, appending to `file_path` or writing to stdout
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> io::Result<Self> {
        let writer: Box<dyn Write + Send> = match file_path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout()),
        };

        Ok(OutputHandler { format, writer })
    }

    /// Create an output handler over an arbitrary writer
    pub fn with_writer(format: OutputFormat, writer: Box<dyn Write + Send>) -> Self {
        OutputHandler { format, writer }
    }

    /// Write the response received for `record`
    pub fn write_response(&mut self, record: &AlertRecord, response: &[Value]) -> io::Result<()> {
        let entry = ForwardedAlert::new(record, response);

        let output = match &self.format {
            OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&entry)?),
            OutputFormat::Jsonl => format!("{}\n", serde_json::to_string(&entry)?),
            OutputFormat::Console => format!(
                "[{}] {}:{} -> {}:{} => {}\n",
                entry.start_time,
                entry.source_ip,
                entry.source_port,
                entry.destination_ip,
                entry.destination_port,
                Value::from(response.to_vec())
            ),
        };

        self.writer.write_all(output.as_bytes())?;
        self.writer.flush()
    }

    /// Flush any buffered output
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Writer that keeps everything in a shared buffer
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn record() -> AlertRecord {
        let start_time = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 23, 45)
            .unwrap();
        AlertRecord::new(3_232_235_786, 4444, 167_772_165, 80, start_time)
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("jsonl"), OutputFormat::Jsonl);
        assert_eq!(OutputFormat::from_str("whatever"), OutputFormat::Console);
    }

    #[test]
    fn test_console_output() {
        let buffer = SharedBuffer::default();
        let mut handler =
            OutputHandler::with_writer(OutputFormat::Console, Box::new(buffer.clone()));

        handler
            .write_response(&record(), &[json!("2024-01-15T10:23:45")])
            .unwrap();

        assert_eq!(
            buffer.contents(),
            "[2024-01-15 10:23:45] 192.168.1.10:4444 -> 10.0.0.5:80 => [\"2024-01-15T10:23:45\"]\n"
        );
    }

    #[test]
    fn test_jsonl_output() {
        let buffer = SharedBuffer::default();
        let mut handler = OutputHandler::with_writer(OutputFormat::Jsonl, Box::new(buffer.clone()));

        handler.write_response(&record(), &[json!("x")]).unwrap();
        handler.write_response(&record(), &[json!("y")]).unwrap();

        let contents = buffer.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let entry: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(entry["source_ip"], "192.168.1.10");
        assert_eq!(entry["destination_port"], 80);
        assert_eq!(entry["response"], json!(["x"]));
    }

    #[test]
    fn test_file_output_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.jsonl");

        for _ in 0..2 {
            let mut handler = OutputHandler::new(OutputFormat::Jsonl, Some(path.clone())).unwrap();
            handler.write_response(&record(), &[json!(1)]).unwrap();
            handler.flush().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
