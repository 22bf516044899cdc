//! Flood Risk Service - Demo Entry Point
//!
//! Runs the complete flood detection pipeline unconditionally:
//! 1. Generates a synthetic training table of sensor readings
//! 2. Trains and evaluates a random forest flood classifier
//! 3. Saves the model (modelo_enchentes.json)
//! 4. Scores five simulated station readings and appends each result
//!    to the risk journal (log_sistema.json)
//!
//! Usage:
//!   cargo run --release
//!
//! Configuration:
//!   flood_risk.toml in the working directory, if present (all keys optional)

use flood_risk_service::config;
use flood_risk_service::system::FloodSystem;

fn main() {
    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ {}\n", e);
            std::process::exit(1);
        }
    };

    let mut system = FloodSystem::with_config(config);
    if let Err(e) = system.initialize() {
        eprintln!("\n❌ Initialization failed: {}\n", e);
        std::process::exit(1);
    }

    match system.run() {
        Ok(summary) => {
            println!("\n🎯 Run complete.");
            println!("Files generated:");
            println!("- {} (trained model)", summary.model_path);
            println!("- {} (risk journal)", summary.log_path);
        }
        Err(e) => {
            eprintln!("\n❌ Run failed: {}", e);
            std::process::exit(1);
        }
    }
}
