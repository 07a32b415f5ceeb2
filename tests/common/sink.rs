//! Capturing log sink for asserting on emitted records

use std::sync::{Arc, Mutex};

use lango::logger::{LogLevel, LogSink};

/// Records every log write so tests can count and inspect records instead
/// of scraping stdout.
#[derive(Default)]
pub struct CapturingSink {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl CapturingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All captured records, in emission order.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().unwrap().clone()
    }

    /// Only the HTTP-level records.
    pub fn http_records(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(level, _)| *level == LogLevel::Http)
            .map(|(_, record)| record)
            .collect()
    }
}

impl LogSink for CapturingSink {
    fn write(&self, level: LogLevel, record: &str) {
        self.records
            .lock()
            .unwrap()
            .push((level, record.to_string()));
    }
}
