/// Synthetic flood dataset generator.
///
/// Each record flips a biased coin (flood with probability `flood_fraction`,
/// 0.3 by default) and then draws all six features independently from a
/// normal distribution tuned for that class. The two profiles overlap
/// enough that the classifier has real work to do, but separate well on
/// water level, rainfall and rise rate.
///
/// Generation is fully determined by the seed: the same `(n_samples, seed)`
/// always yields the same table.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::model::{
    FloodError, FloodLabel, LabeledReading, SensorReading, FEATURE_NAMES, LABEL_NAME, N_FEATURES,
};

// ---------------------------------------------------------------------------
// Class profiles
// ---------------------------------------------------------------------------

/// Default share of flood records.
pub const DEFAULT_FLOOD_FRACTION: f64 = 0.3;

/// (mean, standard deviation) per feature, in `FEATURE_NAMES` order.
type Profile = [(f64, f64); N_FEATURES];

/// Flood scenario: high water, heavy rain, fast rise, saturated soil.
pub const FLOOD_PROFILE: Profile = [
    (160.0, 40.0),
    (25.0, 8.0),
    (90.0, 25.0),
    (12.0, 4.0),
    (88.0, 8.0),
    (23.0, 4.0),
];

/// Normal conditions.
pub const NORMAL_PROFILE: Profile = [
    (75.0, 25.0),
    (5.0, 6.0),
    (18.0, 15.0),
    (1.0, 3.0),
    (65.0, 15.0),
    (26.0, 5.0),
];

fn profile_distributions(profile: &Profile) -> Result<Vec<Normal<f64>>, FloodError> {
    profile
        .iter()
        .map(|&(mean, std_dev)| {
            Normal::new(mean, std_dev)
                .map_err(|e| FloodError::InvalidInput(format!("bad profile N({}, {}): {}", mean, std_dev, e)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// A labeled table of synthetic sensor readings.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<LabeledReading>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row-major feature matrix.
    pub fn features(&self) -> Vec<[f64; N_FEATURES]> {
        self.records.iter().map(|r| r.reading.features()).collect()
    }

    /// Class indices (0 = no flood, 1 = flood), aligned with `features()`.
    pub fn labels(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.label.class_index()).collect()
    }

    /// `(no_flood, flood)` record counts.
    pub fn label_counts(&self) -> (usize, usize) {
        let flood = self
            .records
            .iter()
            .filter(|r| r.label == FloodLabel::Flood)
            .count();
        (self.records.len() - flood, flood)
    }

    /// Share of flood records, 0.0 for an empty table.
    pub fn flood_fraction(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.label_counts().1 as f64 / self.records.len() as f64
    }

    /// Writes the table as CSV with a `FEATURE_NAMES,enchente` header.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), FloodError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let file = File::create(path).map_err(|e| FloodError::io(&display, e))?;
        let mut out = BufWriter::new(file);

        writeln!(out, "{},{}", FEATURE_NAMES.join(","), LABEL_NAME)
            .map_err(|e| FloodError::io(&display, e))?;
        for record in &self.records {
            let row: Vec<String> = record.reading.features().iter().map(|v| v.to_string()).collect();
            writeln!(out, "{},{}", row.join(","), record.label.class_index())
                .map_err(|e| FloodError::io(&display, e))?;
        }
        out.flush().map_err(|e| FloodError::io(&display, e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generates `n_samples` records with the default 30% flood share.
pub fn generate_dataset(n_samples: usize, seed: u64) -> Result<Dataset, FloodError> {
    generate_dataset_with(n_samples, seed, DEFAULT_FLOOD_FRACTION)
}

/// Generates `n_samples` records where each is a flood record with
/// probability `flood_fraction`.
pub fn generate_dataset_with(
    n_samples: usize,
    seed: u64,
    flood_fraction: f64,
) -> Result<Dataset, FloodError> {
    if !(0.0..=1.0).contains(&flood_fraction) {
        return Err(FloodError::InvalidInput(format!(
            "flood_fraction must be in [0, 1], got {}",
            flood_fraction
        )));
    }

    let flood = profile_distributions(&FLOOD_PROFILE)?;
    let normal = profile_distributions(&NORMAL_PROFILE)?;
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut records = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let (label, dists) = if rng.random::<f64>() < flood_fraction {
            (FloodLabel::Flood, &flood)
        } else {
            (FloodLabel::NoFlood, &normal)
        };

        let mut f = [0.0; N_FEATURES];
        for (value, dist) in f.iter_mut().zip(dists.iter()) {
            *value = dist.sample(&mut rng);
        }

        records.push(LabeledReading {
            reading: SensorReading::clamped(f[0], f[1], f[2], f[3], f[4], f[5]),
            label,
        });
    }

    Ok(Dataset { records })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_requested_sample_count() {
        let ds = generate_dataset(250, 42).expect("generation should succeed");
        assert_eq!(ds.len(), 250);
        assert_eq!(ds.features().len(), 250);
        assert_eq!(ds.labels().len(), 250);
    }

    #[test]
    fn test_zero_samples_yields_empty_table() {
        let ds = generate_dataset(0, 42).expect("generation should succeed");
        assert!(ds.is_empty());
        assert_eq!(ds.flood_fraction(), 0.0);
    }

    #[test]
    fn test_all_records_respect_clamps() {
        let ds = generate_dataset(2000, 7).expect("generation should succeed");
        for r in &ds.records {
            let x = r.reading;
            assert!(x.water_level_cm >= 0.0);
            assert!(x.precipitation_1h_mm >= 0.0);
            assert!(x.precipitation_24h_mm >= 0.0);
            assert!((0.0..=100.0).contains(&x.soil_moisture_pct));
        }
    }

    #[test]
    fn test_flood_share_close_to_thirty_percent() {
        let ds = generate_dataset(10_000, 42).expect("generation should succeed");
        let share = ds.flood_fraction();
        assert!((share - 0.3).abs() < 0.03, "flood share {} too far from 0.3", share);
    }

    #[test]
    fn test_same_seed_reproduces_dataset() {
        let a = generate_dataset(500, 42).expect("generation should succeed");
        let b = generate_dataset(500, 42).expect("generation should succeed");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_changes_dataset() {
        let a = generate_dataset(500, 42).expect("generation should succeed");
        let b = generate_dataset(500, 43).expect("generation should succeed");
        assert_ne!(a, b);
    }

    #[test]
    fn test_flood_records_have_higher_mean_water_level() {
        let ds = generate_dataset(3000, 42).expect("generation should succeed");
        let mean = |label: FloodLabel| {
            let v: Vec<f64> = ds
                .records
                .iter()
                .filter(|r| r.label == label)
                .map(|r| r.reading.water_level_cm)
                .collect();
            v.iter().sum::<f64>() / v.len() as f64
        };
        assert!(mean(FloodLabel::Flood) > mean(FloodLabel::NoFlood) + 50.0);
    }

    #[test]
    fn test_invalid_fraction_is_rejected() {
        assert!(generate_dataset_with(10, 42, 1.5).is_err());
        assert!(generate_dataset_with(10, 42, -0.1).is_err());
    }

    #[test]
    fn test_write_csv_emits_header_and_rows() {
        let ds = generate_dataset(20, 42).expect("generation should succeed");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dataset.csv");
        ds.write_csv(&path).expect("csv export should succeed");

        let contents = std::fs::read_to_string(&path).expect("csv should exist");
        let mut lines = contents.lines();
        let header = lines.next().expect("header line");
        assert!(header.starts_with("nivel_agua_cm,"));
        assert!(header.ends_with(",enchente"));
        assert_eq!(lines.count(), 20);
    }
}
