use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed location the monitor watches, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Snapshot of the weather at the coordinate, fetched fresh each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub country: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub description: String,
    pub wind_speed_mps: f64,
    pub pressure_hpa: f64,
}

impl CurrentConditions {
    pub fn location(&self) -> String {
        format!("{}, {}", self.location_name, self.country)
    }
}

/// One 3-hour forecast bucket. `rain_3h_mm` is absent when the provider
/// reports no precipitation volume for the bucket; storm-class condition
/// codes can still appear without a volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub rain_3h_mm: Option<f64>,
    pub condition_code: u32,
}

/// Time-ascending sequence of 3-hour buckets covering the next ~5 days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }
}

/// Outcome of the rain analysis over the look-ahead window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RainDecision {
    pub will_rain: bool,
    /// Accumulated 3-hour rain volumes inside the window; always >= 0.
    pub amount_mm: f64,
}

impl RainDecision {
    pub const NO_RAIN: RainDecision = RainDecision { will_rain: false, amount_mm: 0.0 };

    pub fn recommendation(&self) -> &'static str {
        if self.will_rain { "suspend irrigation" } else { "irrigate normally" }
    }
}

/// Per-tick snapshot combining conditions and decision; logged once and
/// discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub timestamp: DateTime<Utc>,
    pub conditions: CurrentConditions,
    pub decision: RainDecision,
}

impl Summary {
    pub fn new(
        timestamp: DateTime<Utc>,
        conditions: CurrentConditions,
        decision: RainDecision,
    ) -> Self {
        Self { timestamp, conditions, decision }
    }
}
