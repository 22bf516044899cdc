/// System configuration loader - parses flood_risk.toml
///
/// Separates run parameters (sample count, seeds, forest shape, output
/// paths) from code, making it easy to adjust the demo without
/// recompiling. Every key is optional; a missing file means the built-in
/// defaults, which reproduce the reference run exactly.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::classifier::ClassWeight;
use crate::logging::LogLevel;
use crate::model::FloodError;

/// Default configuration file, looked up in the current working directory.
pub const DEFAULT_CONFIG_PATH: &str = "flood_risk.toml";

/// Synthetic dataset parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub n_samples: usize,
    pub seed: u64,
    /// Probability that a generated record is a flood record
    pub flood_fraction: f64,
    /// Optional CSV export of the generated table
    pub csv_path: Option<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            seed: 42,
            flood_fraction: 0.3,
            csv_path: None,
        }
    }
}

/// Random forest and split parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub test_fraction: f64,
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
    /// `"balanced"` reweights samples inversely to class frequency;
    /// `"uniform"` weighs every sample equally
    pub class_weight: ClassWeight,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            n_trees: 100,
            max_depth: 10,
            seed: 42,
            class_weight: ClassWeight::Balanced,
        }
    }
}

/// Real-time demo loop parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of simulated sensor readings to score
    pub readings: usize,
    /// Fixed seed for the sensor simulator; OS entropy when absent
    pub simulator_seed: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            readings: 5,
            simulator_seed: None,
        }
    }
}

/// Output file locations and diagnostics
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub model_path: String,
    pub log_path: String,
    /// Plain-text diagnostics log (console only when absent)
    pub diagnostics_path: Option<String>,
    pub log_level: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            model_path: "modelo_enchentes.json".to_string(),
            log_path: "log_sistema.json".to_string(),
            diagnostics_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub dataset: DatasetConfig,
    pub training: TrainingConfig,
    pub demo: DemoConfig,
    pub output: OutputConfig,
}

impl SystemConfig {
    /// Parses a configuration document and validates it.
    pub fn from_toml_str(contents: &str) -> Result<Self, FloodError> {
        let config: SystemConfig = toml::from_str(contents)
            .map_err(|e| FloodError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), FloodError> {
        if self.dataset.n_samples == 0 {
            return Err(FloodError::Config("dataset.n_samples must be > 0".into()));
        }
        if !(self.dataset.flood_fraction > 0.0 && self.dataset.flood_fraction < 1.0) {
            return Err(FloodError::Config(format!(
                "dataset.flood_fraction must be in (0, 1), got {}",
                self.dataset.flood_fraction
            )));
        }
        if !(self.training.test_fraction > 0.0 && self.training.test_fraction < 1.0) {
            return Err(FloodError::Config(format!(
                "training.test_fraction must be in (0, 1), got {}",
                self.training.test_fraction
            )));
        }
        if self.training.n_trees == 0 {
            return Err(FloodError::Config("training.n_trees must be > 0".into()));
        }
        if self.training.max_depth == 0 {
            return Err(FloodError::Config("training.max_depth must be > 0".into()));
        }
        self.log_level()?;
        Ok(())
    }

    /// Minimum diagnostics level named by `output.log_level`.
    pub fn log_level(&self) -> Result<LogLevel, FloodError> {
        self.output.log_level.parse()
    }
}

/// Loads the configuration from `path`.
///
/// A missing file is not an error: the defaults are returned. A file that
/// exists but cannot be read, parsed or validated aborts the run.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<SystemConfig, FloodError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| FloodError::io(path.display().to_string(), e))?;

    SystemConfig::from_toml_str(&contents)
}

/// Loads `flood_risk.toml` from the current working directory.
pub fn load_config() -> Result<SystemConfig, FloodError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}
