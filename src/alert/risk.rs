//! Flood risk tiering.
//!
//! Turns a classifier's flood probability into one of three tiers, each
//! with a fixed indicator color and recommended action:
//!
//! | probability    | tier  | action                       |
//! |----------------|-------|------------------------------|
//! | p < 0.3        | BAIXO | Monitoramento normal         |
//! | 0.3 ≤ p < 0.7  | MÉDIO | Atenção redobrada            |
//! | p ≥ 0.7        | ALTO  | ALERTA! Preparar evacuação   |

use serde::{Serialize, Serializer};
use std::fmt;

use crate::model::SensorReading;
use crate::trainer::FloodModel;

/// Upper bound (exclusive) of the low tier.
pub const LOW_RISK_MAX: f64 = 0.3;
/// Upper bound (exclusive) of the medium tier.
pub const MEDIUM_RISK_MAX: f64 = 0.7;

/// Risk tiers, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_probability(probability: f64) -> Self {
        if probability < LOW_RISK_MAX {
            RiskTier::Low
        } else if probability < MEDIUM_RISK_MAX {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "BAIXO",
            RiskTier::Medium => "MÉDIO",
            RiskTier::High => "ALTO",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskTier::Low => "🟢",
            RiskTier::Medium => "🟡",
            RiskTier::High => "🔴",
        }
    }

    pub fn recommended_action(self) -> &'static str {
        match self {
            RiskTier::Low => "Monitoramento normal",
            RiskTier::Medium => "Atenção redobrada",
            RiskTier::High => "ALERTA! Preparar evacuação",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for RiskTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Scoring result for one reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    #[serde(rename = "predicao_binaria")]
    pub predicted_flood: u8,
    /// Flood probability rounded to three decimals.
    #[serde(rename = "probabilidade_enchente")]
    pub flood_probability: f64,
    #[serde(rename = "nivel_risco")]
    pub risk_level: RiskTier,
    #[serde(rename = "cor")]
    pub color: &'static str,
    #[serde(rename = "acao_recomendada")]
    pub recommended_action: &'static str,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Builds an assessment from a predicted class and raw flood probability.
///
/// The tier is chosen from the unrounded probability; only the reported
/// value is rounded.
pub fn classify_probability(predicted_class: usize, probability: f64) -> RiskAssessment {
    let probability = probability.clamp(0.0, 1.0);
    let tier = RiskTier::from_probability(probability);
    RiskAssessment {
        predicted_flood: u8::from(predicted_class == 1),
        flood_probability: round3(probability),
        risk_level: tier,
        color: tier.color(),
        recommended_action: tier.recommended_action(),
    }
}

/// Scores one reading against a trained model.
pub fn assess_risk(model: &FloodModel, reading: &SensorReading) -> RiskAssessment {
    let proba = model.forest.predict_proba(&reading.features());
    let predicted = crate::classifier::tree::argmax(&proba);
    classify_probability(predicted, proba[1])
}
