/// CART decision tree with weighted Gini impurity.
///
/// Array-based node layout: every node lives in `nodes`, children are
/// referenced by index, leaves have `feature == LEAF`. Each node keeps its
/// normalized weighted class distribution, so a leaf's `value` is directly
/// the tree's class-probability estimate for samples that land there.
///
/// Sample weights enter everywhere a count would: node distributions,
/// impurity, and impurity decrease. The forest uses them to carry both
/// bootstrap multiplicity and class-balancing weights.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::model::FloodError;

/// Feature index marking a leaf node.
pub const LEAF: i32 = -2;

/// Minimum gap between two feature values for a threshold to sit between them.
const FEATURE_THRESHOLD: f64 = 1e-7;

/// A node in the decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index to split on (`LEAF` for leaf nodes).
    pub feature: i32,
    /// Split threshold (features <= threshold go left).
    pub threshold: f64,
    /// Index of left child (`-1` for leaf).
    pub left_child: i32,
    /// Index of right child (`-1` for leaf).
    pub right_child: i32,
    /// Normalized weighted class distribution of the training samples
    /// that reached this node.
    pub value: Vec<f64>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.feature < 0
    }
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    /// Features examined per split; the search keeps drawing past constant
    /// features until this many informative ones have been tried.
    pub max_features: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_features: usize::MAX,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// A fitted decision tree classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    n_classes: usize,
    /// Normalized weighted impurity decrease per feature.
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Mutable state shared by the recursive builder.
struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    w: &'a [f64],
    n_classes: usize,
    params: &'a TreeParams,
    rng: &'a mut SmallRng,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

fn gini(class_weights: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - class_weights.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

impl Builder<'_> {
    fn class_weights(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += self.w[i];
        }
        counts
    }

    fn push_leaf(&mut self, counts: &[f64], total: f64) -> i32 {
        let value = if total > 0.0 {
            counts.iter().map(|c| c / total).collect()
        } else {
            vec![0.0; self.n_classes]
        };
        self.nodes.push(TreeNode {
            feature: LEAF,
            threshold: LEAF as f64,
            left_child: -1,
            right_child: -1,
            value,
        });
        (self.nodes.len() - 1) as i32
    }

    /// Best split of `indices` on one feature, or `None` when the feature
    /// is constant within the node or no threshold leaves enough samples
    /// on both sides.
    fn best_split_on(&self, indices: &[usize], feature: usize, total: f64) -> Option<SplitCandidate> {
        let mut sorted: Vec<(f64, usize, f64)> = indices
            .iter()
            .map(|&i| (self.x[i][feature], self.y[i], self.w[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len();
        if sorted[n - 1].0 <= sorted[0].0 + FEATURE_THRESHOLD {
            return None;
        }

        let mut right = vec![0.0; self.n_classes];
        for &(_, class, weight) in &sorted {
            right[class] += weight;
        }
        let mut left = vec![0.0; self.n_classes];
        let mut left_total = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for k in 0..n - 1 {
            let (value, class, weight) = sorted[k];
            left[class] += weight;
            right[class] -= weight;
            left_total += weight;

            let next = sorted[k + 1].0;
            if next <= value + FEATURE_THRESHOLD {
                continue;
            }
            let n_left = k + 1;
            if n_left < self.params.min_samples_leaf || n - n_left < self.params.min_samples_leaf {
                continue;
            }

            let right_total = total - left_total;
            let impurity = (left_total * gini(&left, left_total)
                + right_total * gini(&right, right_total))
                / total;

            if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                let mut threshold = (value + next) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitCandidate { feature, threshold, impurity });
            }
        }

        best
    }

    fn build(&mut self, indices: &mut [usize], depth: usize) -> i32 {
        let counts = self.class_weights(indices);
        let total: f64 = counts.iter().sum();
        let impurity = gini(&counts, total);

        if depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split
            || indices.len() < 2 * self.params.min_samples_leaf
            || impurity <= f64::EPSILON
        {
            return self.push_leaf(&counts, total);
        }

        let n_features = self.x[indices[0]].len();
        let mut order: Vec<usize> = (0..n_features).collect();
        order.shuffle(&mut *self.rng);

        let mut best: Option<SplitCandidate> = None;
        let mut informative = 0;
        for feature in order {
            if informative >= self.params.max_features {
                break;
            }
            if let Some(candidate) = self.best_split_on(indices, feature, total) {
                informative += 1;
                if best.as_ref().is_none_or(|b| candidate.impurity < b.impurity) {
                    best = Some(candidate);
                }
            }
        }

        let Some(split) = best else {
            return self.push_leaf(&counts, total);
        };

        // Partition in place: left block first
        let mut mid = 0;
        for j in 0..indices.len() {
            if self.x[indices[j]][split.feature] <= split.threshold {
                indices.swap(mid, j);
                mid += 1;
            }
        }

        self.importances[split.feature] += total * (impurity - split.impurity);

        let node_idx = self.nodes.len();
        self.nodes.push(TreeNode {
            feature: split.feature as i32,
            threshold: split.threshold,
            left_child: -1,
            right_child: -1,
            value: counts.iter().map(|c| c / total).collect(),
        });

        let (left_part, right_part) = indices.split_at_mut(mid);
        let left = self.build(left_part, depth + 1);
        let right = self.build(right_part, depth + 1);
        self.nodes[node_idx].left_child = left;
        self.nodes[node_idx].right_child = right;

        node_idx as i32
    }
}

impl DecisionTree {
    /// Fits a tree on the rows of `x` named by `indices`.
    ///
    /// `weights[i]` scales sample `i`'s contribution; `y[i]` must be a class
    /// index below `n_classes`.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        weights: &[f64],
        indices: &[usize],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut SmallRng,
    ) -> Result<Self, FloodError> {
        if x.len() != y.len() || x.len() != weights.len() {
            return Err(FloodError::Training(format!(
                "inconsistent lengths: {} rows, {} labels, {} weights",
                x.len(),
                y.len(),
                weights.len()
            )));
        }
        if indices.is_empty() {
            return Err(FloodError::Training("no samples to fit".into()));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(FloodError::Training(format!(
                "label {} out of range for {} classes",
                bad, n_classes
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= x.len()) {
            return Err(FloodError::Training(format!(
                "sample index {} out of range for {} rows",
                bad,
                x.len()
            )));
        }
        let n_features = x[indices[0]].len();
        if indices.iter().any(|&i| x[i].len() != n_features) {
            return Err(FloodError::Training("ragged feature matrix".into()));
        }

        let mut builder = Builder {
            x,
            y,
            w: weights,
            n_classes,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        let mut working = indices.to_vec();
        builder.build(&mut working, 0);

        let mut importances = builder.importances;
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            importances.iter_mut().for_each(|v| *v /= sum);
        }

        Ok(Self {
            nodes: builder.nodes,
            n_features,
            n_classes,
            importances,
        })
    }

    /// Class distribution of the leaf `features` falls into.
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return &node.value;
            }
            let feat_val = features.get(node.feature as usize).copied().unwrap_or(0.0);
            idx = if feat_val <= node.threshold {
                node.left_child as usize
            } else {
                node.right_child as usize
            };
        }
    }

    /// Most probable class; ties resolve to the lower class index.
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(self.predict_proba(features))
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Tree depth (longest root-to-leaf path).
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    /// Checks that the node array describes a well-formed tree.
    ///
    /// Children must point forward inside `nodes`, split features must be
    /// below `n_features`, and every node's `value` must hold `n_classes`
    /// entries. A tree read back from disk should pass this before it is
    /// used for scoring.
    pub fn check_structure(&self) -> Result<(), FloodError> {
        if self.nodes.is_empty() {
            return Err(FloodError::Serialization("tree has no nodes".into()));
        }
        let n_nodes = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.value.len() != self.n_classes {
                return Err(FloodError::Serialization(format!(
                    "node {} holds {} class values, expected {}",
                    idx,
                    node.value.len(),
                    self.n_classes
                )));
            }
            if node.is_leaf() {
                continue;
            }
            if node.feature as usize >= self.n_features {
                return Err(FloodError::Serialization(format!(
                    "node {} splits on feature {} of {}",
                    idx, node.feature, self.n_features
                )));
            }
            for child in [node.left_child, node.right_child] {
                // Builder pushes parents before children, so indices only grow
                if child <= idx as i32 || child as usize >= n_nodes {
                    return Err(FloodError::Serialization(format!(
                        "node {} has child index {} outside {}..{}",
                        idx,
                        child,
                        idx + 1,
                        n_nodes
                    )));
                }
            }
        }
        Ok(())
    }

    fn node_depth(&self, idx: usize) -> usize {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            return 0;
        }
        let left_depth = self.node_depth(node.left_child as usize);
        let right_depth = self.node_depth(node.right_child as usize);
        1 + left_depth.max(right_depth)
    }
}

/// Index of the largest value; first wins on ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
