/// Determinism tests: rerun identical inputs, expect identical output.
///
/// Covers the seeded stages of the pipeline: dataset generation, the
/// stratified split, forest fitting and risk scoring.

use flood_risk_service::alert::risk::assess_risk;
use flood_risk_service::classifier::stratified_split;
use flood_risk_service::config::TrainingConfig;
use flood_risk_service::dataset::generate_dataset;
use flood_risk_service::ingest::esp32::SensorSimulator;
use flood_risk_service::trainer::train_flood_model;

fn quick_training() -> TrainingConfig {
    TrainingConfig { n_trees: 15, ..TrainingConfig::default() }
}

#[test]
fn test_dataset_reproducible_from_seed() {
    let a = generate_dataset(1000, 42).expect("generation should succeed");
    let b = generate_dataset(1000, 42).expect("generation should succeed");
    assert_eq!(a, b);
    for (ra, rb) in a.records.iter().zip(&b.records) {
        for (fa, fb) in ra.reading.features().iter().zip(rb.reading.features().iter()) {
            assert_eq!(fa.to_bits(), fb.to_bits());
        }
    }
}

#[test]
fn test_default_dataset_has_thirty_percent_floods() {
    let ds = generate_dataset(1000, 42).expect("generation should succeed");
    let (no_flood, flood) = ds.label_counts();
    assert_eq!(no_flood + flood, 1000);
    // ±5 points covers the binomial spread at n = 1000 several times over
    assert!((250..=350).contains(&flood), "flood count {} outside 250..=350", flood);
}

#[test]
fn test_split_reproducible_from_seed() {
    let ds = generate_dataset(400, 11).expect("generation should succeed");
    let labels = ds.labels();
    let a = stratified_split(&labels, 0.2, 42).expect("split should succeed");
    let b = stratified_split(&labels, 0.2, 42).expect("split should succeed");
    assert_eq!(a, b);
}

#[test]
fn test_training_reproducible_from_seed() {
    let ds = generate_dataset(400, 11).expect("generation should succeed");
    let a = train_flood_model(&ds, &quick_training()).expect("training should succeed");
    let b = train_flood_model(&ds, &quick_training()).expect("training should succeed");

    assert_eq!(a.model.forest, b.model.forest);
    assert_eq!(a.accuracy.to_bits(), b.accuracy.to_bits());
    assert_eq!(a.importances, b.importances);
}

#[test]
fn test_scoring_is_pure() {
    let ds = generate_dataset(400, 11).expect("generation should succeed");
    let outcome = train_flood_model(&ds, &quick_training()).expect("training should succeed");
    let mut sim = SensorSimulator::new(Some(5)).expect("simulator");

    for _ in 0..20 {
        let reading = sim.read().reading;
        let first = assess_risk(&outcome.model, &reading);
        let second = assess_risk(&outcome.model, &reading);
        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first.flood_probability));
    }
}
