/// Simulated ESP32 field station.
///
/// Stands in for the microcontroller that would report water level, rain
/// gauge totals, rise rate, soil moisture and air temperature. Each call
/// to `read` fabricates one plausible reading, rounded to the precision a
/// real station would report:
///
///   water level       U(50, 180) cm            0.1
///   rain, 1 h         max(0, N(8, 12)) mm      0.1
///   rain, 24 h        max(0, N(25, 30)) mm     0.1
///   rise rate         N(2, 6) cm/h             0.01
///   soil moisture     U(40, 95) %              0.1
///   temperature       U(18, 32) °C             0.1
///
/// Readings are timestamped with local wall-clock time.

use chrono::{Local, NaiveDateTime};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::model::{FloodError, SensorReading};

/// Timestamp layout used in the log file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A fabricated reading with its capture time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedReading {
    pub timestamp: String,
    #[serde(flatten)]
    pub reading: SensorReading,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Source of fabricated station readings.
pub struct SensorSimulator {
    rng: SmallRng,
    rain_1h: Normal<f64>,
    rain_24h: Normal<f64>,
    rise_rate: Normal<f64>,
}

impl SensorSimulator {
    /// Seeded simulators repeat the same reading sequence; `None` seeds
    /// from OS entropy.
    pub fn new(seed: Option<u64>) -> Result<Self, FloodError> {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let normal = |mean: f64, std_dev: f64| {
            Normal::new(mean, std_dev).map_err(|e| FloodError::InvalidInput(e.to_string()))
        };

        Ok(Self {
            rng,
            rain_1h: normal(8.0, 12.0)?,
            rain_24h: normal(25.0, 30.0)?,
            rise_rate: normal(2.0, 6.0)?,
        })
    }

    /// Fabricates one reading stamped with the current local time.
    pub fn read(&mut self) -> SimulatedReading {
        self.read_at(Local::now().naive_local())
    }

    /// Fabricates one reading stamped with `at`.
    pub fn read_at(&mut self, at: NaiveDateTime) -> SimulatedReading {
        let water_level = round_to(self.rng.random_range(50.0..180.0), 1);
        let rain_1h = round_to(self.rain_1h.sample(&mut self.rng).max(0.0), 1);
        let rain_24h = round_to(self.rain_24h.sample(&mut self.rng).max(0.0), 1);
        let rise_rate = round_to(self.rise_rate.sample(&mut self.rng), 2);
        let moisture = round_to(self.rng.random_range(40.0..95.0), 1);
        let temperature = round_to(self.rng.random_range(18.0..32.0), 1);

        SimulatedReading {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            reading: SensorReading::clamped(
                water_level,
                rain_1h,
                rain_24h,
                rise_rate,
                moisture,
                temperature,
            ),
        }
    }
}
