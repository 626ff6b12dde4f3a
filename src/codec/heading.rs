//! # Heading Normalization
//!
//! Maps raw heading integers onto [0, 360) degrees with a 16-point compass
//! label, and tracks heading change along a single stream.

use serde::Serialize;

/// Width of one compass sector in degrees
const SECTOR_DEGREES: f64 = 22.5;

/// Compass points, clockwise from north
const COMPASS_POINTS: [Compass; 16] = [
    Compass::N,
    Compass::NNE,
    Compass::NE,
    Compass::ENE,
    Compass::E,
    Compass::ESE,
    Compass::SE,
    Compass::SSE,
    Compass::S,
    Compass::SSW,
    Compass::SW,
    Compass::WSW,
    Compass::W,
    Compass::WNW,
    Compass::NW,
    Compass::NNW,
];

/// 16-point compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Compass {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl Compass {
    /// Compass point whose 22.5° sector contains `degrees`
    ///
    /// Sectors are centred on each point, so north covers [348.75, 360) and
    /// [0, 11.25). Input outside [0, 360) is reduced first.
    pub fn from_degrees(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        let sector = ((normalized + SECTOR_DEGREES / 2.0) / SECTOR_DEGREES).floor() as usize;
        COMPASS_POINTS[sector % COMPASS_POINTS.len()]
    }

    /// Short label ("N", "NNE", ...)
    pub fn label(&self) -> &'static str {
        match self {
            Compass::N => "N",
            Compass::NNE => "NNE",
            Compass::NE => "NE",
            Compass::ENE => "ENE",
            Compass::E => "E",
            Compass::ESE => "ESE",
            Compass::SE => "SE",
            Compass::SSE => "SSE",
            Compass::S => "S",
            Compass::SSW => "SSW",
            Compass::SW => "SW",
            Compass::WSW => "WSW",
            Compass::W => "W",
            Compass::WNW => "WNW",
            Compass::NW => "NW",
            Compass::NNW => "NNW",
        }
    }
}

impl std::fmt::Display for Compass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heading {
    /// Heading in degrees, always within [0, 360)
    pub degrees: f64,

    /// Compass sector containing `degrees`
    pub compass: Compass,
}

/// Normalize a raw heading
///
/// # Arguments
///
/// * `raw` - Transmitted heading integer
/// * `scale` - Integer divisor for the variant (100_000 live, 100 archive)
///
/// The raw value is reduced modulo `360 × scale` before division, so a
/// heading re-encoded from the result decodes to the same value.
///
/// # Examples
///
/// ```
/// use gpslog::codec::heading::{normalize, Compass};
///
/// let heading = normalize(18_000_000, 100_000);
/// assert_eq!(heading.degrees, 180.0);
/// assert_eq!(heading.compass, Compass::S);
/// ```
pub fn normalize(raw: u32, scale: u32) -> Heading {
    let scale = scale.max(1);
    let reduced = u64::from(raw) % (360 * u64::from(scale));
    let degrees = reduced as f64 / f64::from(scale);
    Heading {
        degrees,
        compass: Compass::from_degrees(degrees),
    }
}

/// Shortest-arc difference between two headings, in [0, 180]
pub fn heading_delta(current: f64, previous: f64) -> f64 {
    let diff = (current - previous).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Rolling "previous heading" for one stream
///
/// Each stream owns its own tracker; a tracker must not be shared between
/// concurrently decoded streams.
#[derive(Debug, Clone, Default)]
pub struct HeadingTracker {
    last: Option<f64>,
}

impl HeadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `degrees` as the latest heading
    ///
    /// Returns the shortest-arc change since the previous heading, or `None`
    /// for the first heading of the stream.
    pub fn observe(&mut self, degrees: f64) -> Option<f64> {
        let delta = self.last.map(|previous| heading_delta(degrees, previous));
        self.last = Some(degrees);
        delta
    }

    /// Last observed heading
    pub fn last(&self) -> Option<f64> {
        self.last
    }

    /// Forget the previous heading (a new stream begins)
    pub fn reset(&mut self) {
        self.last = None;
    }
}
