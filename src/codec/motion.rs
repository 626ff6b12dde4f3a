//! # Motion Classification
//!
//! Maps acceleration magnitude to a coarse motion state, and derives the
//! secondary alerts and racing metrics shown alongside each record.

use serde::{Deserialize, Serialize};

use super::protocol::TelemetryRecord;
use super::scale::magnitude;

/// Lower bounds (g) of each motion bin after "very low"
const STATIONARY_MIN_G: f64 = 0.8;
const WALKING_MIN_G: f64 = 1.2;
const RUNNING_MIN_G: f64 = 1.8;
const VEHICLE_MIN_G: f64 = 3.0;
const HIGH_IMPACT_MIN_G: f64 = 5.0;

/// Motion state derived from total acceleration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MotionClass {
    VeryLow,
    Stationary,
    Walking,
    Running,
    Vehicle,
    HighImpact,
}

impl MotionClass {
    /// Classify an acceleration magnitude in g
    ///
    /// Bins are half-open with inclusive lower bounds at 0.8, 1.2, 1.8, 3.0
    /// and 5.0 g.
    pub fn classify(magnitude_g: f64) -> Self {
        if magnitude_g >= HIGH_IMPACT_MIN_G {
            MotionClass::HighImpact
        } else if magnitude_g >= VEHICLE_MIN_G {
            MotionClass::Vehicle
        } else if magnitude_g >= RUNNING_MIN_G {
            MotionClass::Running
        } else if magnitude_g >= WALKING_MIN_G {
            MotionClass::Walking
        } else if magnitude_g >= STATIONARY_MIN_G {
            MotionClass::Stationary
        } else {
            // Also catches NaN
            MotionClass::VeryLow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MotionClass::VeryLow => "very low",
            MotionClass::Stationary => "stationary",
            MotionClass::Walking => "walking",
            MotionClass::Running => "running",
            MotionClass::Vehicle => "vehicle",
            MotionClass::HighImpact => "high impact",
        }
    }
}

impl std::fmt::Display for MotionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Alert thresholds, overridable from the `[motion]` config section
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MotionThresholds {
    #[serde(default = "default_rotation_dps")]
    pub rotation_dps: f64,

    #[serde(default = "default_impact_g")]
    pub impact_g: f64,

    #[serde(default = "default_vehicle_g")]
    pub vehicle_g: f64,

    #[serde(default = "default_vehicle_min_speed_kmh")]
    pub vehicle_min_speed_kmh: f64,

    #[serde(default = "default_stationary_max_g")]
    pub stationary_max_g: f64,

    #[serde(default = "default_stationary_max_speed_kmh")]
    pub stationary_max_speed_kmh: f64,

    #[serde(default = "default_racing_min_speed_kmh")]
    pub racing_min_speed_kmh: f64,

    #[serde(default = "default_cornering_g")]
    pub cornering_g: f64,
}

fn default_rotation_dps() -> f64 { 15.0 }
fn default_impact_g() -> f64 { 2.5 }
fn default_vehicle_g() -> f64 { 1.5 }
fn default_vehicle_min_speed_kmh() -> f64 { 5.0 }
fn default_stationary_max_g() -> f64 { 0.5 }
fn default_stationary_max_speed_kmh() -> f64 { 1.0 }
fn default_racing_min_speed_kmh() -> f64 { 30.0 }
fn default_cornering_g() -> f64 { 0.3 }

impl Default for MotionThresholds {
    fn default() -> Self {
        Self {
            rotation_dps: default_rotation_dps(),
            impact_g: default_impact_g(),
            vehicle_g: default_vehicle_g(),
            vehicle_min_speed_kmh: default_vehicle_min_speed_kmh(),
            stationary_max_g: default_stationary_max_g(),
            stationary_max_speed_kmh: default_stationary_max_speed_kmh(),
            racing_min_speed_kmh: default_racing_min_speed_kmh(),
            cornering_g: default_cornering_g(),
        }
    }
}

impl MotionThresholds {
    /// Iterate over (name, value) pairs for validation
    pub(crate) fn named_values(&self) -> [(&'static str, f64); 8] {
        [
            ("rotation_dps", self.rotation_dps),
            ("impact_g", self.impact_g),
            ("vehicle_g", self.vehicle_g),
            ("vehicle_min_speed_kmh", self.vehicle_min_speed_kmh),
            ("stationary_max_g", self.stationary_max_g),
            ("stationary_max_speed_kmh", self.stationary_max_speed_kmh),
            ("racing_min_speed_kmh", self.racing_min_speed_kmh),
            ("cornering_g", self.cornering_g),
        ]
    }
}

/// Secondary alerts; each predicate is independent and several may fire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionAlerts {
    /// Either gyro axis exceeds the rotation threshold
    pub rotation: bool,

    /// Acceleration magnitude exceeds the impact threshold
    pub impact: bool,

    /// Hard acceleration or braking while moving
    pub vehicle_dynamics: bool,

    /// Low acceleration and near-zero speed
    pub stationary: bool,
}

impl MotionAlerts {
    pub fn evaluate(record: &TelemetryRecord, thresholds: &MotionThresholds) -> Self {
        let magnitude = record.accel_magnitude;
        let speed_kmh = record.speed_kmh();

        Self {
            rotation: record.gyro.x.abs() > thresholds.rotation_dps
                || record.gyro.y.abs() > thresholds.rotation_dps,
            impact: magnitude > thresholds.impact_g,
            vehicle_dynamics: magnitude > thresholds.vehicle_g
                && speed_kmh > thresholds.vehicle_min_speed_kmh,
            stationary: magnitude < thresholds.stationary_max_g
                && speed_kmh < thresholds.stationary_max_speed_kmh,
        }
    }

    pub fn any(&self) -> bool {
        self.rotation || self.impact || self.vehicle_dynamics || self.stationary
    }
}

/// High-speed summary, only produced above the racing speed threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RacingMetrics {
    pub speed_kmh: f64,
    pub speed_ms: f64,
    pub heading_degrees: f64,

    /// Norm of the X/Y acceleration axes, in g
    pub lateral_g: f64,

    /// Y axis acceleration (braking negative), in g
    pub longitudinal_g: f64,

    pub cornering: bool,
}

impl RacingMetrics {
    pub fn evaluate(record: &TelemetryRecord, thresholds: &MotionThresholds) -> Option<Self> {
        let speed_kmh = record.speed_kmh();
        if speed_kmh <= thresholds.racing_min_speed_kmh {
            return None;
        }

        let lateral_g = magnitude(record.accel.x, record.accel.y, 0.0);

        Some(Self {
            speed_kmh,
            speed_ms: record.speed_ms,
            heading_degrees: record.heading.degrees,
            lateral_g,
            longitudinal_g: record.accel.y,
            cornering: lateral_g > thresholds.cornering_g,
        })
    }
}
