/// Append-only JSON-lines risk journal (`log_sistema.json`).
///
/// One line per scored reading: the simulated reading's fields merged with
/// the risk assessment's fields into a single flat object. Lines are only
/// ever appended; earlier runs stay in the file.

use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::alert::risk::RiskAssessment;
use crate::ingest::esp32::SimulatedReading;
use crate::model::FloodError;

/// Keys every journal line carries, in write order.
pub const ENTRY_KEYS: [&str; 12] = [
    "timestamp",
    "nivel_agua_cm",
    "precipitacao_1h_mm",
    "precipitacao_24h_mm",
    "taxa_subida_cm_h",
    "umidade_solo_pct",
    "temperatura_c",
    "predicao_binaria",
    "probabilidade_enchente",
    "nivel_risco",
    "cor",
    "acao_recomendada",
];

/// One journal line.
#[derive(Debug, Serialize)]
pub struct JournalEntry<'a> {
    #[serde(flatten)]
    pub reading: &'a SimulatedReading,
    #[serde(flatten)]
    pub assessment: &'a RiskAssessment,
}

/// Appends one entry as a single JSON line, creating the file if needed.
pub fn append_entry(path: impl AsRef<Path>, entry: &JournalEntry<'_>) -> Result<(), FloodError> {
    let path = path.as_ref();
    let line = serde_json::to_string(entry)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| FloodError::io(path.display().to_string(), e))?;
    writeln!(file, "{}", line).map_err(|e| FloodError::io(path.display().to_string(), e))?;
    Ok(())
}

/// Parses every line of a journal file. A missing file reads as empty.
pub fn read_entries(path: impl AsRef<Path>) -> Result<Vec<Value>, FloodError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| FloodError::io(path.display().to_string(), e))?;

    contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).map_err(FloodError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::risk::classify_probability;
    use crate::model::SensorReading;

    fn sample_reading() -> SimulatedReading {
        SimulatedReading {
            timestamp: "2024-05-01 12:00:00".to_string(),
            reading: SensorReading::clamped(120.5, 10.2, 44.0, 3.25, 77.1, 24.3),
        }
    }

    #[test]
    fn test_entry_has_every_key() {
        let reading = sample_reading();
        let assessment = classify_probability(0, 0.42);
        let entry = JournalEntry { reading: &reading, assessment: &assessment };

        let value = serde_json::to_value(&entry).expect("entry should serialize");
        let obj = value.as_object().expect("entry should be an object");
        assert_eq!(obj.len(), ENTRY_KEYS.len());
        for key in ENTRY_KEYS {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(value["nivel_risco"], "MÉDIO");
    }

    #[test]
    fn test_append_adds_one_line_per_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("log_sistema.json");
        let reading = sample_reading();
        let assessment = classify_probability(1, 0.91);
        let entry = JournalEntry { reading: &reading, assessment: &assessment };

        append_entry(&path, &entry).expect("first append");
        append_entry(&path, &entry).expect("second append");

        let entries = read_entries(&path).expect("journal should parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["predicao_binaria"], 1);
    }

    #[test]
    fn test_missing_journal_reads_empty() {
        let entries = read_entries("no/such/log_sistema.json").expect("missing file is empty");
        assert!(entries.is_empty());
    }
}
