/// Tabular classification for the flood risk service.
///
/// Submodules:
/// - `tree`: weighted-Gini CART tree, array-based node layout
/// - `forest`: bagged random forest with class-balanced weights
/// - `split`: stratified train/test partitioning
/// - `metrics`: accuracy and classification report

pub mod forest;
pub mod metrics;
pub mod split;
pub mod tree;

pub use forest::{ClassWeight, ForestParams, RandomForest};
pub use metrics::{accuracy, ClassificationReport};
pub use split::{stratified_split, SplitIndices};
