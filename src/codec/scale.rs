//! # Field Scaling
//!
//! Conversions between raw transmitted integers and physical units.
//!
//! Every `*_from_raw` function is total over its integer domain. The inverse
//! `*_to_raw` functions round to the nearest integer and saturate at the
//! field's range; they exist so the encoder can rebuild wire packets.

/// Latitude/longitude scale (degrees × 10^7)
pub const COORDINATE_SCALE: f64 = 1e7;

/// Altitude scale (millimetres per metre)
pub const ALTITUDE_SCALE: f64 = 1000.0;

/// Speed scale (mm/s per m/s)
pub const SPEED_SCALE: f64 = 1000.0;

/// Battery scale (millivolts per volt)
pub const BATTERY_SCALE: f64 = 1000.0;

/// Acceleration scale (milli-g per g)
pub const ACCEL_SCALE: f64 = 1000.0;

/// Gyroscope scale (centi-degrees/s per degree/s)
pub const GYRO_SCALE: f64 = 100.0;

/// Metres per second to kilometres per hour
pub const MS_TO_KMH: f64 = 3.6;

/// Convert raw latitude or longitude (degrees × 10^7) to degrees
pub fn coordinate_from_raw(raw: i32) -> f64 {
    raw as f64 / COORDINATE_SCALE
}

/// Convert raw altitude (mm) to metres
pub fn altitude_from_raw(raw: i32) -> f64 {
    raw as f64 / ALTITUDE_SCALE
}

/// Convert raw speed (mm/s) to m/s, dividing by the variant's speed scale
pub fn speed_from_raw(raw: u16, scale: f64) -> f64 {
    raw as f64 / scale
}

/// Convert m/s to km/h
pub fn kmh_from_ms(speed_ms: f64) -> f64 {
    speed_ms * MS_TO_KMH
}

/// Convert raw battery voltage (mV) to volts
pub fn battery_from_raw(raw: u16) -> f64 {
    raw as f64 / BATTERY_SCALE
}

/// Convert one raw acceleration axis (milli-g) to g
pub fn accel_from_raw(raw: i16) -> f64 {
    raw as f64 / ACCEL_SCALE
}

/// Convert one raw gyroscope axis (centi-degrees/s) to degrees/s
pub fn gyro_from_raw(raw: i16) -> f64 {
    raw as f64 / GYRO_SCALE
}

/// Euclidean norm of three scaled acceleration axes, in g
pub fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// Degrees to raw coordinate (degrees × 10^7)
pub fn coordinate_to_raw(degrees: f64) -> i32 {
    (degrees * COORDINATE_SCALE).round() as i32
}

/// Metres to raw altitude (mm)
pub fn altitude_to_raw(metres: f64) -> i32 {
    (metres * ALTITUDE_SCALE).round() as i32
}

/// m/s to raw speed, multiplying by the variant's speed scale
pub fn speed_to_raw(speed_ms: f64, scale: f64) -> u16 {
    (speed_ms * scale).round() as u16
}

/// g to raw acceleration (milli-g)
pub fn accel_to_raw(g: f64) -> i16 {
    (g * ACCEL_SCALE).round() as i16
}

/// Degrees/s to raw gyroscope value (centi-degrees/s)
pub fn gyro_to_raw(dps: f64) -> i16 {
    (dps * GYRO_SCALE).round() as i16
}
