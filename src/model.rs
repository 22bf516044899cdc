/// SensorReading, FloodLabel, FloodError
/// core data structures and error handling
///
/// Core data types for the flood risk service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic beyond value clamping and feature-vector conversion,
/// no I/O, and no external dependencies other than serde derives.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Feature layout
// ---------------------------------------------------------------------------

/// Number of numeric features in a sensor reading.
pub const N_FEATURES: usize = 6;

/// Canonical feature names, in the column order used by the generator, the
/// classifier and the scorer. These are also the JSON keys of the log file.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "nivel_agua_cm",
    "precipitacao_1h_mm",
    "precipitacao_24h_mm",
    "taxa_subida_cm_h",
    "umidade_solo_pct",
    "temperatura_c",
];

/// Column name of the binary label in exported tables.
pub const LABEL_NAME: &str = "enchente";

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// Binary ground-truth label of a training record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloodLabel {
    NoFlood,
    Flood,
}

impl FloodLabel {
    /// Class index used by the classifier (0 = no flood, 1 = flood).
    pub fn class_index(self) -> usize {
        match self {
            FloodLabel::NoFlood => 0,
            FloodLabel::Flood => 1,
        }
    }
}

/// One set of six sensor measurements.
///
/// Serialized with the Portuguese field names used by the log file so a
/// `SimulatedReading` can be flattened straight into a log line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "nivel_agua_cm")]
    pub water_level_cm: f64,
    #[serde(rename = "precipitacao_1h_mm")]
    pub precipitation_1h_mm: f64,
    #[serde(rename = "precipitacao_24h_mm")]
    pub precipitation_24h_mm: f64,
    #[serde(rename = "taxa_subida_cm_h")]
    pub rise_rate_cm_h: f64,
    #[serde(rename = "umidade_solo_pct")]
    pub soil_moisture_pct: f64,
    #[serde(rename = "temperatura_c")]
    pub temperature_c: f64,
}

impl SensorReading {
    /// Builds a reading with the physical range clamps applied:
    /// water level and both precipitation totals are floored at zero,
    /// soil moisture is kept within [0, 100]. Rise rate and temperature
    /// may legitimately be negative and pass through untouched.
    pub fn clamped(
        water_level_cm: f64,
        precipitation_1h_mm: f64,
        precipitation_24h_mm: f64,
        rise_rate_cm_h: f64,
        soil_moisture_pct: f64,
        temperature_c: f64,
    ) -> Self {
        SensorReading {
            water_level_cm: water_level_cm.max(0.0),
            precipitation_1h_mm: precipitation_1h_mm.max(0.0),
            precipitation_24h_mm: precipitation_24h_mm.max(0.0),
            rise_rate_cm_h,
            soil_moisture_pct: soil_moisture_pct.clamp(0.0, 100.0),
            temperature_c,
        }
    }

    /// Feature vector in `FEATURE_NAMES` order.
    pub fn features(&self) -> [f64; N_FEATURES] {
        [
            self.water_level_cm,
            self.precipitation_1h_mm,
            self.precipitation_24h_mm,
            self.rise_rate_cm_h,
            self.soil_moisture_pct,
            self.temperature_c,
        ]
    }
}

/// A training record: a reading plus its ground-truth label.
///
/// Readings scored at runtime carry no label and stay plain `SensorReading`s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledReading {
    pub reading: SensorReading,
    pub label: FloodLabel,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while generating data, training, scoring or
/// writing output files.
#[derive(Debug, PartialEq)]
pub enum FloodError {
    /// A file could not be read, created or appended to.
    Io { path: String, message: String },
    /// A model or log entry could not be (de)serialized.
    Serialization(String),
    /// The configuration file is malformed or holds out-of-range values.
    Config(String),
    /// A caller passed data the operation cannot work with.
    InvalidInput(String),
    /// The classifier could not be fitted.
    Training(String),
}

impl FloodError {
    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        FloodError::Io { path: path.into(), message: err.to_string() }
    }
}

impl std::fmt::Display for FloodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FloodError::Io { path, message } => write!(f, "I/O error on {}: {}", path, message),
            FloodError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            FloodError::Config(msg) => write!(f, "Configuration error: {}", msg),
            FloodError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            FloodError::Training(msg) => write!(f, "Training failed: {}", msg),
        }
    }
}

impl std::error::Error for FloodError {}

impl From<serde_json::Error> for FloodError {
    fn from(err: serde_json::Error) -> Self {
        FloodError::Serialization(err.to_string())
    }
}
