/// flood_risk_service: synthetic flood-risk classifier and sensor demo.
///
/// # Module structure
///
/// ```text
/// flood_risk_service
/// ├── model       — shared data types (SensorReading, FloodLabel, FloodError, …)
/// ├── config      — optional run configuration loader (flood_risk.toml)
/// ├── logging     — component-tagged console / file diagnostics
/// ├── dataset     — seeded synthetic flood / normal table generator
/// ├── classifier
/// │   ├── tree    — weighted-Gini CART decision tree
/// │   ├── forest  — bagged random forest, balanced class weights
/// │   ├── split   — stratified train/test split
/// │   └── metrics — accuracy and classification report
/// ├── trainer     — fit + evaluate + persist the flood model
/// ├── alert
/// │   └── risk    — probability → BAIXO / MÉDIO / ALTO tier
/// ├── ingest
/// │   └── esp32   — simulated field station readings
/// ├── journal     — append-only JSON-lines risk log (log_sistema.json)
/// └── system      — pipeline driver (generate → train → demo loop)
/// ```

/// Public modules
pub mod alert;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod ingest;
pub mod journal;
pub mod logging;
pub mod model;
pub mod system;
pub mod trainer;
