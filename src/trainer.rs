/// Flood classifier training, evaluation and persistence.
///
/// # Training Process
///
/// 1. **Stratified split** of the synthetic table (default 80/20)
/// 2. **Random forest fit** on the training partition
///    (100 trees, depth ≤ 10, balanced class weights)
/// 3. **Evaluation** on the held-out partition: accuracy plus a
///    per-class classification report
/// 4. **Feature ranking** by mean impurity decrease
///
/// # Output
///
/// A `FloodModel` bundles the forest with its feature names and training
/// metadata. It is persisted as JSON and can be reloaded with `load_model`
/// to score readings without retraining.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::classifier::split::take_rows;
use crate::classifier::{
    accuracy, stratified_split, ClassificationReport, ForestParams, RandomForest,
};
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::model::{FloodError, SensorReading, FEATURE_NAMES};

/// Class labels as printed in the classification report.
pub const CLASS_NAMES: [&str; 2] = ["0", "1"];

// ---------------------------------------------------------------------------
// Model artifact
// ---------------------------------------------------------------------------

/// A fitted flood classifier plus the metadata needed to use it later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodModel {
    pub forest: RandomForest,
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    pub test_accuracy: f64,
}

impl FloodModel {
    /// Probability of the flood class for one reading.
    pub fn flood_probability(&self, reading: &SensorReading) -> f64 {
        self.forest.predict_proba(&reading.features())[1]
    }

    /// Predicted class index (0 = no flood, 1 = flood).
    pub fn predict(&self, reading: &SensorReading) -> usize {
        self.forest.predict(&reading.features())
    }
}

/// Writes the model as pretty-printed JSON.
pub fn save_model(model: &FloodModel, path: impl AsRef<Path>) -> Result<(), FloodError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(model)?;
    fs::write(path, json).map_err(|e| FloodError::io(path.display().to_string(), e))
}

/// Reads a model written by `save_model`.
///
/// The forest is checked before it is returned: a file with the wrong
/// feature or class count, no trees, dangling child indices or malformed
/// leaf distributions is rejected as a serialization error.
pub fn load_model(path: impl AsRef<Path>) -> Result<FloodModel, FloodError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| FloodError::io(path.display().to_string(), e))?;
    let model: FloodModel = serde_json::from_str(&json)?;

    if model.forest.n_features() != FEATURE_NAMES.len() {
        return Err(FloodError::Serialization(format!(
            "model expects {} features, readings have {}",
            model.forest.n_features(),
            FEATURE_NAMES.len()
        )));
    }
    if model.forest.n_classes() != CLASS_NAMES.len() {
        return Err(FloodError::Serialization(format!(
            "model predicts {} classes, expected {}",
            model.forest.n_classes(),
            CLASS_NAMES.len()
        )));
    }
    model.forest.check_structure()?;
    Ok(model)
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// One feature's share of the forest's total impurity decrease.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Everything produced by a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: FloodModel,
    pub accuracy: f64,
    pub report: ClassificationReport,
    /// Sorted by descending importance.
    pub importances: Vec<FeatureImportance>,
    pub n_train: usize,
    pub n_test: usize,
}

/// Pairs names with importances and sorts descending.
pub fn rank_importances(names: &[&str], values: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(values)
        .map(|(name, &importance)| FeatureImportance { feature: name.to_string(), importance })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

/// Forest hyperparameters derived from the training configuration.
pub fn forest_params(config: &TrainingConfig) -> ForestParams {
    ForestParams {
        n_trees: config.n_trees,
        max_depth: config.max_depth,
        class_weight: config.class_weight,
        seed: config.seed,
        ..ForestParams::default()
    }
}

/// Splits, fits and evaluates a flood classifier on `dataset`.
pub fn train_flood_model(
    dataset: &Dataset,
    config: &TrainingConfig,
) -> Result<TrainingOutcome, FloodError> {
    if dataset.is_empty() {
        return Err(FloodError::Training("dataset is empty".into()));
    }

    let x: Vec<Vec<f64>> = dataset.features().iter().map(|f| f.to_vec()).collect();
    let y = dataset.labels();

    let split = stratified_split(&y, config.test_fraction, config.seed)?;
    let x_train = take_rows(&x, &split.train);
    let y_train = take_rows(&y, &split.train);
    let x_test = take_rows(&x, &split.test);
    let y_test = take_rows(&y, &split.test);

    let forest = RandomForest::fit(&x_train, &y_train, CLASS_NAMES.len(), &forest_params(config))?;

    let y_pred = forest.predict_batch(&x_test);
    let acc = accuracy(&y_test, &y_pred);
    let report = ClassificationReport::new(&y_test, &y_pred, &CLASS_NAMES);
    let importances = rank_importances(&FEATURE_NAMES, &forest.feature_importances());

    let model = FloodModel {
        forest,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        trained_at: Utc::now(),
        training_samples: split.train.len(),
        test_accuracy: acc,
    };

    Ok(TrainingOutcome {
        model,
        accuracy: acc,
        report,
        importances,
        n_train: split.train.len(),
        n_test: split.test.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::generate_dataset;

    fn quick_config() -> TrainingConfig {
        TrainingConfig { n_trees: 20, ..TrainingConfig::default() }
    }

    #[test]
    fn test_rank_importances_sorts_descending() {
        let ranked = rank_importances(&["a", "b", "c"], &[0.2, 0.5, 0.3]);
        let names: Vec<&str> = ranked.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_training_beats_trivial_baseline() {
        let ds = generate_dataset(600, 42).expect("generation should succeed");
        let outcome = train_flood_model(&ds, &quick_config()).expect("training should succeed");

        assert_eq!(outcome.n_train + outcome.n_test, 600);
        assert!(outcome.accuracy > 0.85, "accuracy {} too low", outcome.accuracy);
        assert_eq!(outcome.report.per_class.len(), 2);
        assert_eq!(outcome.importances.len(), FEATURE_NAMES.len());
        let total: f64 = outcome.importances.iter().map(|i| i.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_flood_probability_is_in_unit_interval() {
        let ds = generate_dataset(300, 1).expect("generation should succeed");
        let outcome = train_flood_model(&ds, &quick_config()).expect("training should succeed");

        let calm = SensorReading::clamped(60.0, 0.0, 5.0, 0.0, 55.0, 27.0);
        let storm = SensorReading::clamped(200.0, 35.0, 120.0, 16.0, 95.0, 22.0);
        let p_calm = outcome.model.flood_probability(&calm);
        let p_storm = outcome.model.flood_probability(&storm);

        assert!((0.0..=1.0).contains(&p_calm));
        assert!((0.0..=1.0).contains(&p_storm));
        assert!(p_storm > p_calm);
        assert_eq!(outcome.model.predict(&storm), 1);
        assert_eq!(outcome.model.predict(&calm), 0);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let ds = Dataset { records: Vec::new() };
        assert!(matches!(
            train_flood_model(&ds, &quick_config()),
            Err(FloodError::Training(_))
        ));
    }

    #[test]
    fn test_saved_model_reloads_with_identical_predictions() {
        let ds = generate_dataset(300, 5).expect("generation should succeed");
        let outcome = train_flood_model(&ds, &quick_config()).expect("training should succeed");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("modelo_enchentes.json");
        save_model(&outcome.model, &path).expect("save should succeed");
        let reloaded = load_model(&path).expect("load should succeed");

        assert_eq!(reloaded.forest, outcome.model.forest);
        for record in ds.records.iter().take(25) {
            assert_eq!(
                reloaded.flood_probability(&record.reading),
                outcome.model.flood_probability(&record.reading)
            );
        }
    }

    #[test]
    fn test_load_missing_model_reports_path() {
        let err = load_model("no/such/model.json").expect_err("load should fail");
        assert!(err.to_string().contains("no/such/model.json"));
    }

    /// Saves a freshly trained model, lets `tamper` edit its JSON, and
    /// reloads it.
    fn reload_tampered(tamper: impl FnOnce(&mut serde_json::Value)) -> Result<FloodModel, FloodError> {
        let ds = generate_dataset(200, 3).expect("generation should succeed");
        let config = TrainingConfig { n_trees: 5, ..TrainingConfig::default() };
        let outcome = train_flood_model(&ds, &config).expect("training should succeed");

        let mut value = serde_json::to_value(&outcome.model).expect("model should serialize");
        tamper(&mut value);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("modelo_enchentes.json");
        fs::write(&path, value.to_string()).expect("write should succeed");
        load_model(&path)
    }

    #[test]
    fn test_untampered_model_reloads() {
        reload_tampered(|_| {}).expect("unchanged model should load");
    }

    #[test]
    fn test_load_rejects_single_class_model() {
        let result = reload_tampered(|v| v["forest"]["n_classes"] = serde_json::json!(1));
        assert!(matches!(result, Err(FloodError::Serialization(_))));
    }

    #[test]
    fn test_load_rejects_model_without_trees() {
        let result = reload_tampered(|v| v["forest"]["trees"] = serde_json::json!([]));
        assert!(matches!(result, Err(FloodError::Serialization(_))));
    }

    #[test]
    fn test_load_rejects_dangling_child_index() {
        let result = reload_tampered(|v| {
            let root = &mut v["forest"]["trees"][0]["nodes"][0];
            assert_ne!(root["feature"], serde_json::json!(-2), "root should be a split");
            root["left_child"] = serde_json::json!(100_000);
        });
        assert!(matches!(result, Err(FloodError::Serialization(_))));
    }

    #[test]
    fn test_load_rejects_wrong_length_leaf_value() {
        let result = reload_tampered(|v| {
            let nodes = v["forest"]["trees"][0]["nodes"]
                .as_array_mut()
                .expect("nodes should be an array");
            let leaf = nodes
                .iter_mut()
                .find(|n| n["feature"] == serde_json::json!(-2))
                .expect("tree should have a leaf");
            leaf["value"] = serde_json::json!([1.0]);
        });
        assert!(matches!(result, Err(FloodError::Serialization(_))));
    }
}
