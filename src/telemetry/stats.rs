//! Aggregate statistics over a finite batch of records.

use chrono::{DateTime, Utc};

use crate::codec::protocol::TelemetryRecord;

/// Running totals for one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    pub records: usize,
    pub invalid_checksums: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: &TelemetryRecord) {
        self.records += 1;
        if !record.checksum.valid {
            self.invalid_checksums += 1;
        }
        if self.first.is_none() {
            self.first = Some(record.datetime_utc);
        }
        self.last = Some(record.datetime_utc);
    }

    /// Seconds between the first and last record
    pub fn span_seconds(&self) -> Option<f64> {
        match (self.first, self.last) {
            (Some(first), Some(last)) => Some((last - first).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }

    /// Records per second, when there are at least two records over a positive span
    pub fn average_rate_hz(&self) -> Option<f64> {
        let span = self.span_seconds()?;
        if self.records > 1 && span > 0.0 {
            Some(self.records as f64 / span)
        } else {
            None
        }
    }
}

impl std::fmt::Display for BatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total records parsed: {}", self.records)?;
        if self.invalid_checksums > 0 {
            writeln!(f, "Invalid checksums: {}", self.invalid_checksums)?;
        }
        if let (Some(first), Some(last), Some(span)) = (self.first, self.last, self.span_seconds()) {
            writeln!(
                f,
                "Time span: {} to {} ({:.2} s)",
                first.format("%Y-%m-%d %H:%M:%S"),
                last.format("%Y-%m-%d %H:%M:%S"),
                span
            )?;
        }
        if let Some(rate) = self.average_rate_hz() {
            writeln!(f, "Average rate: {:.2} Hz", rate)?;
        }
        Ok(())
    }
}
