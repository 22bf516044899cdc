/// Stratified train/test splitting.
///
/// Each class is shuffled and cut independently so the test partition keeps
/// the class ratio of the full table. With the reference 1000-record,
/// 30%-flood dataset and a 0.2 test fraction that is roughly 60 flood and
/// 140 normal records held out.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::model::FloodError;

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Splits row indices so that `test_fraction` of every class lands in the
/// test partition (rounded per class). Both partitions are shuffled.
pub fn stratified_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices, FloodError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(FloodError::InvalidInput(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    if labels.is_empty() {
        return Err(FloodError::InvalidInput("cannot split an empty table".into()));
    }

    let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &c) in labels.iter().enumerate() {
        by_class[c].push(i);
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for mut members in by_class {
        members.shuffle(&mut rng);
        let n_test = ((members.len() as f64) * test_fraction).round() as usize;
        // A class must keep at least one training example
        let n_test = n_test.min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    if test.is_empty() {
        return Err(FloodError::InvalidInput(format!(
            "{} rows are too few for a {} test split",
            labels.len(),
            test_fraction
        )));
    }

    Ok(SplitIndices { train, test })
}

/// Picks `rows[i]` for every index.
pub fn take_rows<T: Clone>(rows: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| rows[i].clone()).collect()
}
