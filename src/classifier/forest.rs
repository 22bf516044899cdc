/// Random forest classifier: bagged CART trees with soft voting.
///
/// Each tree is grown on a bootstrap resample of the training rows, looking
/// at a random subset of `max_features` features per split. Class-balanced
/// weighting scales every sample by `n / (n_classes * count_c)` so the
/// minority class carries as much total weight as the majority.
///
/// Prediction averages the per-tree leaf distributions (`predict_proba`)
/// and takes the most probable class. Every tree's RNG is derived from the
/// forest seed, so a fit is reproducible given the same data and seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{argmax, DecisionTree, TreeParams};
use crate::model::FloodError;

/// Per-class sample weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// Every sample weighs 1.
    Uniform,
    /// Weights inversely proportional to class frequency.
    Balanced,
}

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    /// Features tried per split; `None` means ⌊√n_features⌋.
    pub max_features: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub class_weight: ClassWeight,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            max_features: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            class_weight: ClassWeight::Balanced,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// A fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    params: ForestParams,
}

/// Balanced class weights computed from the label vector. Classes absent
/// from `y` get weight 0.
pub fn balanced_class_weights(y: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &c in y {
        if c < n_classes {
            counts[c] += 1;
        }
    }
    counts
        .iter()
        .map(|&count| {
            if count == 0 {
                0.0
            } else {
                y.len() as f64 / (n_classes as f64 * count as f64)
            }
        })
        .collect()
}

impl RandomForest {
    /// Fits a forest on feature rows `x` and class indices `y`.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Result<Self, FloodError> {
        if x.is_empty() {
            return Err(FloodError::Training("empty training set".into()));
        }
        if x.len() != y.len() {
            return Err(FloodError::Training(format!(
                "{} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if params.n_trees == 0 {
            return Err(FloodError::Training("forest needs at least one tree".into()));
        }
        if n_classes < 2 {
            return Err(FloodError::Training("need at least two classes".into()));
        }

        let n = x.len();
        let n_features = x[0].len();
        let max_features = params
            .max_features
            .unwrap_or_else(|| ((n_features as f64).sqrt().floor() as usize).max(1));
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            max_features,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
        };

        let class_weights = match params.class_weight {
            ClassWeight::Balanced => balanced_class_weights(y, n_classes),
            ClassWeight::Uniform => vec![1.0; n_classes],
        };

        let mut seeder = SmallRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        let mut weights = vec![0.0; n];

        for _ in 0..params.n_trees {
            let mut rng = SmallRng::seed_from_u64(seeder.random::<u64>());

            // Bootstrap multiplicity per row
            let mut draws = vec![0u32; n];
            if params.bootstrap {
                for _ in 0..n {
                    draws[rng.random_range(0..n)] += 1;
                }
            } else {
                draws.iter_mut().for_each(|d| *d = 1);
            }

            let mut indices = Vec::with_capacity(n);
            for i in 0..n {
                if y[i] >= n_classes {
                    return Err(FloodError::Training(format!(
                        "label {} out of range for {} classes",
                        y[i], n_classes
                    )));
                }
                weights[i] = f64::from(draws[i]) * class_weights[y[i]];
                if weights[i] > 0.0 {
                    indices.push(i);
                }
            }
            if indices.is_empty() {
                return Err(FloodError::Training("bootstrap sample carries no weight".into()));
            }

            trees.push(DecisionTree::fit(x, y, &weights, &indices, n_classes, &tree_params, &mut rng)?);
        }

        Ok(Self {
            trees,
            n_features,
            n_classes,
            params: params.clone(),
        })
    }

    /// Mean class distribution over all trees.
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }

    /// Most probable class.
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }

    pub fn predict_batch(&self, samples: &[Vec<f64>]) -> Vec<usize> {
        samples.iter().map(|s| self.predict(s)).collect()
    }

    /// Mean of the per-tree normalized impurity decreases, renormalized to
    /// sum to 1 (all zeros if no tree ever split).
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in total.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            total.iter_mut().for_each(|v| *v /= sum);
        }
        total
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Average tree depth across the forest.
    pub fn avg_depth(&self) -> f64 {
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }

    /// Total number of nodes across all trees.
    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }

    /// Checks that the forest can score: at least one tree, and every tree
    /// well formed with this forest's feature and class counts.
    pub fn check_structure(&self) -> Result<(), FloodError> {
        if self.trees.is_empty() {
            return Err(FloodError::Serialization("forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features || tree.n_classes() != self.n_classes {
                return Err(FloodError::Serialization(format!(
                    "tree {} has {} features / {} classes, forest has {} / {}",
                    i,
                    tree.n_features(),
                    tree.n_classes(),
                    self.n_features,
                    self.n_classes
                )));
            }
            tree.check_structure()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated 2-D blobs, 3:1 imbalanced.
    fn blobs() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..60 {
            x.push(vec![(i % 10) as f64 * 0.1, (i / 10) as f64 * 0.1]);
            y.push(0);
        }
        for i in 0..20 {
            x.push(vec![5.0 + (i % 5) as f64 * 0.1, 5.0 + (i / 5) as f64 * 0.1]);
            y.push(1);
        }
        (x, y)
    }

    fn small_params() -> ForestParams {
        ForestParams { n_trees: 15, max_depth: 5, ..ForestParams::default() }
    }

    #[test]
    fn test_balanced_weights_equalize_class_mass() {
        let y = vec![0, 0, 0, 1];
        let w = balanced_class_weights(&y, 2);
        assert!((w[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((w[1] - 2.0).abs() < 1e-12);
        // 3 * w0 == 1 * w1
        assert!((3.0 * w[0] - w[1]).abs() < 1e-12);
    }

    #[test]
    fn test_absent_class_gets_zero_weight() {
        assert_eq!(balanced_class_weights(&[0, 0], 2), vec![0.5, 0.0]);
    }

    #[test]
    fn test_uniform_weights_ignore_class_frequency() {
        let (x, y) = blobs();
        let params = ForestParams { class_weight: ClassWeight::Uniform, ..small_params() };
        let forest = RandomForest::fit(&x, &y, 2, &params).expect("fit should succeed");
        assert_eq!(forest.params().class_weight, ClassWeight::Uniform);
        assert_eq!(forest.predict_batch(&x), y);
    }

    #[test]
    fn test_structure_check_rejects_empty_forest() {
        let (x, y) = blobs();
        let mut forest = RandomForest::fit(&x, &y, 2, &small_params()).expect("fit should succeed");
        forest.check_structure().expect("fitted forest should be well formed");

        forest.trees.clear();
        assert!(matches!(forest.check_structure(), Err(FloodError::Serialization(_))));
    }

    #[test]
    fn test_structure_check_rejects_class_count_mismatch() {
        let (x, y) = blobs();
        let mut forest = RandomForest::fit(&x, &y, 2, &small_params()).expect("fit should succeed");
        forest.n_classes = 1;
        assert!(matches!(forest.check_structure(), Err(FloodError::Serialization(_))));
    }

    #[test]
    fn test_separates_blobs() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(&x, &y, 2, &small_params()).expect("fit should succeed");
        assert_eq!(forest.n_trees(), 15);
        assert_eq!(forest.predict(&[0.2, 0.3]), 0);
        assert_eq!(forest.predict(&[5.2, 5.1]), 1);
        assert_eq!(forest.predict_batch(&x), y);
    }

    #[test]
    fn test_probabilities_are_distributions() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(&x, &y, 2, &small_params()).expect("fit should succeed");
        for point in [[0.0, 0.0], [2.5, 2.5], [6.0, 6.0]] {
            let p = forest.predict_proba(&point);
            assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = blobs();
        let a = RandomForest::fit(&x, &y, 2, &small_params()).expect("fit should succeed");
        let b = RandomForest::fit(&x, &y, 2, &small_params()).expect("fit should succeed");
        assert_eq!(a, b);
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(&x, &y, 2, &small_params()).expect("fit should succeed");
        let imp = forest.feature_importances();
        assert_eq!(imp.len(), 2);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_depth_never_exceeds_limit() {
        let (x, y) = blobs();
        let params = ForestParams { max_depth: 2, ..small_params() };
        let forest = RandomForest::fit(&x, &y, 2, &params).expect("fit should succeed");
        assert!(forest.avg_depth() <= 2.0);
        assert!(forest.total_nodes() >= forest.n_trees());
    }

    #[test]
    fn test_rejects_bad_input() {
        let (x, y) = blobs();
        assert!(RandomForest::fit(&[], &[], 2, &small_params()).is_err());
        assert!(RandomForest::fit(&x, &y[..10], 2, &small_params()).is_err());
        let no_trees = ForestParams { n_trees: 0, ..small_params() };
        assert!(RandomForest::fit(&x, &y, 2, &no_trees).is_err());
    }
}
