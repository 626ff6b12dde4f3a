//! Row-oriented export of decoded records (CSV or JSON Lines).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::protocol::TelemetryRecord;
use crate::error::Result;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Jsonl,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "jsonl" => Ok(ExportFormat::Jsonl),
            other => Err(format!("unknown export format '{}' (expected csv or jsonl)", other)),
        }
    }
}

/// One exported row; field names are the stable column names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    pub timestamp: u32,
    pub datetime_utc: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub speed_m_s: f64,
    pub speed_kmh: f64,
    pub heading_deg: f64,
    pub compass: &'static str,
    pub fix_type: u8,
    pub satellites: u8,
    pub battery_mv: u16,
    pub battery_v: f64,
    pub battery_pct: u8,
    pub accel_x_g: f64,
    pub accel_y_g: f64,
    pub accel_z_g: f64,
    pub gyro_x_dps: f64,
    pub gyro_y_dps: f64,
    pub accel_magnitude_g: f64,
    pub motion_class: &'static str,
    pub crc_stored: u16,
    pub crc_calc: u16,
    pub crc_ok: bool,
}

impl From<&TelemetryRecord> for RecordRow {
    fn from(record: &TelemetryRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            datetime_utc: record.datetime_utc.format("%Y-%m-%d %H:%M:%S").to_string(),
            latitude: record.latitude,
            longitude: record.longitude,
            altitude_m: record.altitude_m,
            speed_m_s: record.speed_ms,
            speed_kmh: record.speed_kmh(),
            heading_deg: record.heading.degrees,
            compass: record.heading.compass.label(),
            fix_type: record.fix_type.raw(),
            satellites: record.satellites,
            battery_mv: record.battery.millivolts,
            battery_v: record.battery.volts,
            battery_pct: record.battery.percent,
            accel_x_g: record.accel.x,
            accel_y_g: record.accel.y,
            accel_z_g: record.accel.z,
            gyro_x_dps: record.gyro.x,
            gyro_y_dps: record.gyro.y,
            accel_magnitude_g: record.accel_magnitude,
            motion_class: record.motion.label(),
            crc_stored: record.checksum.transmitted,
            crc_calc: record.checksum.computed,
            crc_ok: record.checksum.valid,
        }
    }
}

enum Sink<W: Write> {
    Csv(csv::Writer<W>),
    Jsonl(W),
}

/// Appends one row per record to a CSV or JSON Lines target
pub struct RecordExporter<W: Write> {
    sink: Sink<W>,
    rows: usize,
}

impl RecordExporter<BufWriter<File>> {
    /// Create (or truncate) `path` and export into it
    pub fn create<P: AsRef<Path>>(path: P, format: ExportFormat) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write> RecordExporter<W> {
    pub fn new(writer: W, format: ExportFormat) -> Self {
        let sink = match format {
            ExportFormat::Csv => Sink::Csv(csv::Writer::from_writer(writer)),
            ExportFormat::Jsonl => Sink::Jsonl(writer),
        };
        Self { sink, rows: 0 }
    }

    /// Append one record as a row
    ///
    /// The CSV header is written before the first row.
    pub fn write(&mut self, record: &TelemetryRecord) -> Result<()> {
        let row = RecordRow::from(record);
        match &mut self.sink {
            Sink::Csv(writer) => writer.serialize(&row)?,
            Sink::Jsonl(writer) => {
                serde_json::to_writer(&mut *writer, &row)?;
                writer.write_all(b"\n")?;
            }
        }
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer
    pub fn finish(self) -> Result<W> {
        match self.sink {
            Sink::Csv(writer) => writer
                .into_inner()
                .map_err(|e| crate::error::GpsLogError::Io(e.into_error())),
            Sink::Jsonl(mut writer) => {
                writer.flush()?;
                Ok(writer)
            }
        }
    }
}
