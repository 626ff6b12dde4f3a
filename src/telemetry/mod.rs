//! # Telemetry Output Module
//!
//! Consumers of decoded records.
//!
//! This module handles:
//! - Rendering each record as a multi-section text report
//! - Exporting records as CSV or JSON Lines rows
//! - Aggregating batch statistics (count, time span, average rate)

pub mod export;
pub mod report;
pub mod stats;
