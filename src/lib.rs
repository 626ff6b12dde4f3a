//! # GPS Logger Decoder Library
//!
//! Decode and validate telemetry from a GPS+IMU logging device.
//!
//! This library provides the packet codec (layouts, CRC-16/XMODEM, unit
//! scaling, heading and motion derivation) shared by the live UDP receiver
//! and the archive file reader, plus the report and export collaborators.

pub mod config;
pub mod error;
pub mod codec;
pub mod stream;
pub mod receiver;
pub mod telemetry;
