//! # Logger Packet Codec
//!
//! Implementation of the GPS+IMU logger packet formats.
//!
//! This module handles:
//! - Live telegram (40 bytes) and archived record (38 bytes) layouts
//! - Telemetry record decoding and encoding
//! - CRC-16/XMODEM checksum calculation
//! - Unit scaling, heading normalization and motion classification

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
pub mod scale;
pub mod heading;
pub mod motion;

pub use decoder::decode;
pub use encoder::encode;
pub use protocol::{TelemetryRecord, Variant};
