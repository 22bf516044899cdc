/// Flood detection system driver
///
/// Runs the complete pipeline, in order:
/// 1. Generates the synthetic training table
/// 2. Trains and evaluates the random forest, then saves it
/// 3. Runs the real-time demo: simulate a station reading, score it,
///    print the result and append it to the risk journal
/// 4. Reports a run summary
///
/// Any error aborts the run; there is no retry or partial recovery.

use std::error::Error;

use crate::alert::risk::{assess_risk, RiskAssessment, RiskTier};
use crate::config::SystemConfig;
use crate::dataset::{generate_dataset_with, Dataset};
use crate::ingest::esp32::{SensorSimulator, SimulatedReading};
use crate::journal::{append_entry, JournalEntry};
use crate::logging::{self, Component};
use crate::trainer::{save_model, train_flood_model, FloodModel, TrainingOutcome};

const RULE: &str = "==================================================";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Tier counts over the demo readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl TierCounts {
    pub fn record(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::Low => self.low += 1,
            RiskTier::Medium => self.medium += 1,
            RiskTier::High => self.high += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub accuracy: f64,
    pub readings_logged: usize,
    pub tiers: TierCounts,
    pub model_path: String,
    pub log_path: String,
}

// ---------------------------------------------------------------------------
// System State
// ---------------------------------------------------------------------------

/// Pipeline state: the configuration plus whatever stages have run.
pub struct FloodSystem {
    config: SystemConfig,
    dataset: Option<Dataset>,
    model: Option<FloodModel>,
}

impl Default for FloodSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FloodSystem {
    /// Create a system with the built-in defaults
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default())
    }

    /// Create a system with a custom configuration
    pub fn with_config(config: SystemConfig) -> Self {
        Self {
            config,
            dataset: None,
            model: None,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn model(&self) -> Option<&FloodModel> {
        self.model.as_ref()
    }

    /// Validate configuration and set up diagnostics logging
    pub fn initialize(&mut self) -> Result<(), Box<dyn Error>> {
        self.config.validate()?;
        logging::init_logger(
            self.config.log_level()?,
            self.config.output.diagnostics_path.as_deref(),
        );
        Ok(())
    }

    /// Step 1: generate the synthetic training table
    pub fn generate(&mut self) -> Result<&Dataset, Box<dyn Error>> {
        let cfg = &self.config.dataset;
        println!("📥 Generating flood dataset...");

        let dataset = generate_dataset_with(cfg.n_samples, cfg.seed, cfg.flood_fraction)?;
        let (no_flood, flood) = dataset.label_counts();
        println!("✓ Dataset created: {} samples", dataset.len());
        println!("  Distribution: {{0: {}, 1: {}}}", no_flood, flood);
        logging::debug(
            Component::Generator,
            &format!("seed {} flood share {:.3}", cfg.seed, dataset.flood_fraction()),
        );

        if let Some(ref path) = cfg.csv_path {
            dataset.write_csv(path)?;
            logging::info(Component::Generator, &format!("Dataset exported to {}", path));
        }

        let dataset: &Dataset = self.dataset.insert(dataset);
        Ok(dataset)
    }

    /// Step 2: fit, evaluate and persist the classifier
    pub fn train(&mut self) -> Result<TrainingOutcome, Box<dyn Error>> {
        let dataset = self.dataset.as_ref().ok_or("Dataset not generated")?;

        println!("\n=== TRAINING MACHINE LEARNING MODEL ===");
        let outcome = train_flood_model(dataset, &self.config.training)?;
        logging::debug(
            Component::Trainer,
            &format!(
                "{} trees (max depth {}, {:?} class weight), avg depth {:.1}, {} nodes, {} train / {} test",
                outcome.model.forest.n_trees(),
                outcome.model.forest.params().max_depth,
                outcome.model.forest.params().class_weight,
                outcome.model.forest.avg_depth(),
                outcome.model.forest.total_nodes(),
                outcome.n_train,
                outcome.n_test
            ),
        );

        println!("Model accuracy: {:.3}", outcome.accuracy);
        println!("\nClassification report:");
        println!("{}", outcome.report);

        println!("Feature importance:");
        for item in &outcome.importances {
            println!("  {}: {:.3}", item.feature, item.importance);
        }

        let path = &self.config.output.model_path;
        save_model(&outcome.model, path)?;
        println!("\n✓ Model saved as '{}'", path);

        self.model = Some(outcome.model.clone());
        Ok(outcome)
    }

    /// Score one simulated reading with the trained model
    pub fn score(&self, reading: &SimulatedReading) -> Result<RiskAssessment, Box<dyn Error>> {
        let model = self.model.as_ref().ok_or("Model not trained")?;
        Ok(assess_risk(model, &reading.reading))
    }

    /// Step 3: simulate, score, print and journal the demo readings
    pub fn run_demo(&self) -> Result<TierCounts, Box<dyn Error>> {
        println!("\n{}", RULE);
        println!("REAL-TIME SYSTEM DEMONSTRATION");
        println!("{}", RULE);

        let mut simulator = SensorSimulator::new(self.config.demo.simulator_seed)?;
        let mut tiers = TierCounts::default();
        let log_path = &self.config.output.log_path;

        for i in 0..self.config.demo.readings {
            println!("\n--- READING {} ---", i + 1);

            let reading = simulator.read();
            let assessment = self.score(&reading)?;

            println!("Timestamp: {}", reading.timestamp);
            println!("Sensor data: {}", serde_json::to_string(&reading)?);
            println!("RESULT: {} Risk {}", assessment.color, assessment.risk_level);
            println!("Probability: {:.1}%", assessment.flood_probability * 100.0);
            println!("Action: {}", assessment.recommended_action);

            if assessment.risk_level == RiskTier::High {
                logging::warn(
                    Component::Risk,
                    &format!("High flood risk at {} (p = {:.3})", reading.timestamp, assessment.flood_probability),
                );
            }

            append_entry(log_path, &JournalEntry { reading: &reading, assessment: &assessment })?;
            tiers.record(assessment.risk_level);
        }

        logging::log_tier_summary(tiers.low, tiers.medium, tiers.high);
        Ok(tiers)
    }

    /// Run the whole pipeline
    pub fn run(&mut self) -> Result<RunSummary, Box<dyn Error>> {
        let result = self.run_stages();
        if let Err(ref e) = result {
            logging::error(Component::System, &format!("Run aborted: {}", e));
        }
        result
    }

    fn run_stages(&mut self) -> Result<RunSummary, Box<dyn Error>> {
        println!("🌊 FLOOD DETECTION SYSTEM 🌊");
        println!("{}", RULE);

        self.generate()?;
        let outcome = self.train()?;
        let tiers = self.run_demo()?;

        let summary = RunSummary {
            accuracy: outcome.accuracy,
            readings_logged: tiers.total(),
            tiers,
            model_path: self.config.output.model_path.clone(),
            log_path: self.config.output.log_path.clone(),
        };

        println!("\n{}", RULE);
        println!("SYSTEM SUMMARY");
        println!("{}", RULE);
        println!("✅ Model trained with accuracy: {:.1}%", summary.accuracy * 100.0);
        println!("✅ {} readings scored", summary.readings_logged);
        println!("✅ Logs saved to '{}'", summary.log_path);
        println!("✅ Model saved to '{}'", summary.model_path);

        Ok(summary)
    }
}
