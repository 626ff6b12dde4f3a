//! # Logger Packet Layouts and Types
//!
//! Wire layouts for the two packet variants and the decoded record type.
//!
//! Both variants are little-endian and packed. They share the field order but
//! differ in heading width/scale and in where the checksum sits:
//!
//! ```text
//! Live (40 bytes):    [ 38-byte payload (heading u32, deg × 1e5) ][ crc16 ]
//! Archive (38 bytes): [ 36-byte payload (heading u16, deg × 1e2) ][ crc16 ]
//! ```

use chrono::{DateTime, Utc};

use super::heading::Heading;
use super::motion::MotionClass;
use super::scale::SPEED_SCALE;

/// Live telegram total size (payload + trailing CRC)
pub const LIVE_PACKET_SIZE: usize = 40;

/// Live telegram checksum-covered payload size
pub const LIVE_PAYLOAD_SIZE: usize = 38;

/// Archived record total size (fields + CRC field)
pub const ARCHIVE_RECORD_SIZE: usize = 38;

/// Archived record checksum-covered size
pub const ARCHIVE_PAYLOAD_SIZE: usize = 36;

/// Checksum size in bytes
pub const CHECKSUM_SIZE: usize = 2;

/// Live heading scale (degrees × 10^5)
pub const LIVE_HEADING_SCALE: u32 = 100_000;

/// Archive heading scale (degrees × 10^2)
pub const ARCHIVE_HEADING_SCALE: u32 = 100;

/// Header line written at the start of every archive file
pub const ARCHIVE_HEADER_LINE: &str = "GPS_LOG_V1.0";

/// Width of the heading field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingWidth {
    U16,
    U32,
}

/// Fixed layout descriptor for one variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Total bytes on the wire
    pub total_len: usize,

    /// Bytes covered by the checksum; the checksum starts at this offset
    pub payload_len: usize,

    pub heading_width: HeadingWidth,

    /// Integer divisor turning the raw heading into degrees
    pub heading_scale: u32,

    /// Divisor turning the raw speed into m/s
    pub speed_scale: f64,
}

/// Live telegram layout
pub const LIVE_LAYOUT: Layout = Layout {
    total_len: LIVE_PACKET_SIZE,
    payload_len: LIVE_PAYLOAD_SIZE,
    heading_width: HeadingWidth::U32,
    heading_scale: LIVE_HEADING_SCALE,
    speed_scale: SPEED_SCALE,
};

/// Archived record layout
pub const ARCHIVE_LAYOUT: Layout = Layout {
    total_len: ARCHIVE_RECORD_SIZE,
    payload_len: ARCHIVE_PAYLOAD_SIZE,
    heading_width: HeadingWidth::U16,
    heading_scale: ARCHIVE_HEADING_SCALE,
    speed_scale: SPEED_SCALE,
};

/// Packet variant, chosen by the caller according to its data source
///
/// Variants are never auto-detected from the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// 40-byte UDP telegram
    Live,

    /// 38-byte record from a binary log file
    Archive,
}

impl Variant {
    pub fn layout(self) -> &'static Layout {
        match self {
            Variant::Live => &LIVE_LAYOUT,
            Variant::Archive => &ARCHIVE_LAYOUT,
        }
    }

    /// Total record size on the wire
    pub fn size(self) -> usize {
        self.layout().total_len
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Live => f.write_str("live"),
            Variant::Archive => f.write_str("archive"),
        }
    }
}

/// GNSS solution quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixType {
    NoFix,
    DeadReckoning,
    Fix2D,
    Fix3D,
    GnssDeadReckoning,
    TimeOnly,
    Unknown(u8),
}

impl FixType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => FixType::NoFix,
            1 => FixType::DeadReckoning,
            2 => FixType::Fix2D,
            3 => FixType::Fix3D,
            4 => FixType::GnssDeadReckoning,
            5 => FixType::TimeOnly,
            other => FixType::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match self {
            FixType::NoFix => 0,
            FixType::DeadReckoning => 1,
            FixType::Fix2D => 2,
            FixType::Fix3D => 3,
            FixType::GnssDeadReckoning => 4,
            FixType::TimeOnly => 5,
            FixType::Unknown(raw) => *raw,
        }
    }
}

impl std::fmt::Display for FixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixType::NoFix => f.write_str("No Fix"),
            FixType::DeadReckoning => f.write_str("Dead Reckoning"),
            FixType::Fix2D => f.write_str("2D Fix"),
            FixType::Fix3D => f.write_str("3D Fix"),
            FixType::GnssDeadReckoning => f.write_str("GNSS + Dead Reckoning"),
            FixType::TimeOnly => f.write_str("Time Only"),
            FixType::Unknown(raw) => write!(f, "Unknown ({})", raw),
        }
    }
}

/// Raw integer fields exactly as laid out on the wire
///
/// The heading is widened to `u32` for both variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawFields {
    pub timestamp: u32,
    pub latitude: i32,
    pub longitude: i32,
    pub altitude_mm: i32,
    pub speed_mm_s: u16,
    pub heading: u32,
    pub fix_type: u8,
    pub satellites: u8,
    pub battery_mv: u16,
    pub battery_pct: u8,
    pub accel_x: i16,
    pub accel_y: i16,
    pub accel_z: i16,
    pub gyro_x: i16,
    pub gyro_y: i16,
    pub reserved: u8,
}

/// Battery state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Battery {
    pub millivolts: u16,
    pub volts: f64,
    pub percent: u8,
}

/// Three-axis acceleration in g
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Two-axis angular rate in degrees/s
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngularRate {
    pub x: f64,
    pub y: f64,
}

/// Checksum diagnostics
///
/// An invalid checksum never suppresses the other fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum {
    /// Value carried in the packet
    pub transmitted: u16,

    /// Value computed over the payload
    pub computed: u16,

    pub valid: bool,
}

impl Checksum {
    pub fn new(transmitted: u16, computed: u16) -> Self {
        Self {
            transmitted,
            computed,
            valid: transmitted == computed,
        }
    }
}

/// Decoded, unit-converted telemetry record
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Seconds since the Unix epoch, as transmitted
    pub timestamp: u32,

    pub datetime_utc: DateTime<Utc>,

    /// Degrees
    pub latitude: f64,

    /// Degrees
    pub longitude: f64,

    /// Metres
    pub altitude_m: f64,

    /// Metres per second
    pub speed_ms: f64,

    pub heading: Heading,
    pub fix_type: FixType,
    pub satellites: u8,
    pub battery: Battery,
    pub accel: Acceleration,
    pub gyro: AngularRate,
    pub reserved: u8,
    pub checksum: Checksum,

    /// Euclidean norm of `accel`, in g
    pub accel_magnitude: f64,

    pub motion: MotionClass,
}

impl TelemetryRecord {
    pub fn speed_kmh(&self) -> f64 {
        super::scale::kmh_from_ms(self.speed_ms)
    }
}
