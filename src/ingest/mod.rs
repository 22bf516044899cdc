/// Sensor data sources.
///
/// Submodules:
/// - `esp32`: simulated field station producing fabricated readings

pub mod esp32;
