//! Human-readable multi-section report for one record.

use std::fmt::Write;

use crate::codec::motion::{MotionAlerts, MotionThresholds, RacingMetrics};
use crate::codec::protocol::TelemetryRecord;

const RULE_WIDTH: usize = 60;

/// Per-stream inputs that are not part of the record itself
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportContext {
    /// Heading change since the previous record of the stream
    pub heading_delta: Option<f64>,

    /// Only deltas above this are shown
    pub heading_delta_threshold: f64,

    pub thresholds: MotionThresholds,
}

/// Plain-text report for one record, rendered through [`std::fmt::Display`]
///
/// Sections: timestamp & location, GNSS status, power, motion, packet info,
/// and racing metrics when the speed warrants it.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    record: &'a TelemetryRecord,
    ctx: &'a ReportContext,
}

impl<'a> Report<'a> {
    pub fn new(record: &'a TelemetryRecord, ctx: &'a ReportContext) -> Self {
        Self { record, ctx }
    }
}

impl std::fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_report(f, self.record, self.ctx)
    }
}

/// Render a record as a plain-text report
pub fn render_report(record: &TelemetryRecord, ctx: &ReportContext) -> String {
    Report::new(record, ctx).to_string()
}

fn write_report<W: Write>(
    out: &mut W,
    record: &TelemetryRecord,
    ctx: &ReportContext,
) -> std::fmt::Result {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "TIMESTAMP & LOCATION")?;
    writeln!(out, "   Time        : {} UTC", record.datetime_utc.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "   Latitude    : {:.7}°", record.latitude)?;
    writeln!(out, "   Longitude   : {:.7}°", record.longitude)?;
    writeln!(out, "   Altitude    : {:.2} m", record.altitude_m)?;

    let delta = match ctx.heading_delta {
        Some(delta) if delta > ctx.heading_delta_threshold => format!(" (Δ{:.1}°)", delta),
        _ => String::new(),
    };

    writeln!(out)?;
    writeln!(out, "GNSS STATUS")?;
    writeln!(out, "   Fix Type    : {}", record.fix_type)?;
    writeln!(out, "   Satellites  : {}", record.satellites)?;
    writeln!(out, "   Speed       : {:.1} km/h", record.speed_kmh())?;
    writeln!(
        out,
        "   Heading     : {:.2}° ({}){}",
        record.heading.degrees, record.heading.compass, delta
    )?;

    writeln!(out)?;
    writeln!(out, "POWER STATUS")?;
    writeln!(
        out,
        "   Battery     : {:.2}V ({}%)",
        record.battery.volts, record.battery.percent
    )?;

    writeln!(out)?;
    writeln!(out, "MOTION DATA (IMU)")?;
    writeln!(
        out,
        "   Accelerometer: X={:+.2}g, Y={:+.2}g, Z={:+.2}g",
        record.accel.x, record.accel.y, record.accel.z
    )?;
    writeln!(
        out,
        "   Gyroscope    : X={:+.1}°/s, Y={:+.1}°/s",
        record.gyro.x, record.gyro.y
    )?;
    writeln!(out, "   Total Accel  : {:.2}g", record.accel_magnitude)?;
    writeln!(out, "   Motion Class : {}", record.motion)?;

    let alerts = MotionAlerts::evaluate(record, &ctx.thresholds);
    if alerts.rotation {
        writeln!(out, "   ! Significant rotation detected")?;
    }
    if alerts.impact {
        writeln!(out, "   ! High impact detected ({:.1}g)", record.accel_magnitude)?;
    }
    if alerts.vehicle_dynamics {
        writeln!(out, "   ! Vehicle acceleration/braking detected")?;
    }
    if alerts.stationary {
        writeln!(out, "   ! Device appears stationary")?;
    }

    writeln!(out)?;
    writeln!(out, "PACKET INFO")?;
    writeln!(
        out,
        "   CRC Check   : {} (RX:{:04X} vs CALC:{:04X})",
        if record.checksum.valid { "OK" } else { "FAILED" },
        record.checksum.transmitted,
        record.checksum.computed
    )?;
    writeln!(out, "   Reserved    : 0x{:02X}", record.reserved)?;

    if let Some(racing) = RacingMetrics::evaluate(record, &ctx.thresholds) {
        writeln!(out)?;
        writeln!(out, "RACING METRICS")?;
        writeln!(
            out,
            "   Speed       : {:.1} km/h ({:.1} m/s)",
            racing.speed_kmh, racing.speed_ms
        )?;
        writeln!(
            out,
            "   Heading     : {:.1}° {}",
            racing.heading_degrees, record.heading.compass
        )?;
        writeln!(out, "   Lateral G   : {:.2}g", racing.lateral_g)?;
        writeln!(out, "   Braking/Accel: {:+.2}g", racing.longitudinal_g)?;
        if racing.cornering {
            writeln!(out, "   ! Cornering detected ({:.2}g)", racing.lateral_g)?;
        }
    }

    Ok(())
}
