//! Regulatory configuration: conformity thresholds, scoring weights, category
//! cut-offs and provision rates. Defaults follow COBAC regulations R-2015/04
//! (classification and provisioning) and R-2015/06 (alert thresholds).

use crate::error::{CreditAnalysisError, Result};
use crate::schema::Category;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConformityThresholds {
    #[schemars(description = "Minimum net margin, in percent")]
    pub rentabilite_min: f64,
    #[schemars(description = "Maximum financial debt / equity (2.0 = 200%)")]
    pub endettement_max: f64,
    #[schemars(description = "Minimum current ratio (1.0 = 100%)")]
    pub liquidite_min: f64,
    #[schemars(description = "Minimum equity share of the liabilities side, in percent")]
    pub autonomie_min: f64,
}

impl Default for ConformityThresholds {
    fn default() -> Self {
        Self {
            rentabilite_min: 3.0,
            endettement_max: 2.0,
            liquidite_min: 1.0,
            autonomie_min: 20.0,
        }
    }
}

/// Weights applied to each sub-score, which is already expressed in points
/// out of its own maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CriteriaWeights {
    pub rentabilite: f64,
    pub structure: f64,
    pub liquidite: f64,
    pub tresorerie: f64,
    pub croissance: f64,
}

impl Default for CriteriaWeights {
    fn default() -> Self {
        Self {
            rentabilite: 0.25,
            structure: 0.25,
            liquidite: 0.20,
            tresorerie: 0.15,
            croissance: 0.15,
        }
    }
}

impl CriteriaWeights {
    fn as_array(&self) -> [f64; 5] {
        [
            self.rentabilite,
            self.structure,
            self.liquidite,
            self.tresorerie,
            self.croissance,
        ]
    }
}

/// Minimum composite score for each category; anything below `d_min` is `E`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryThresholds {
    pub a_min: f64,
    pub b_min: f64,
    pub c_min: f64,
    pub d_min: f64,
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self {
            a_min: 60.0,
            b_min: 50.0,
            c_min: 40.0,
            d_min: 30.0,
        }
    }
}

impl CategoryThresholds {
    pub fn categorize(&self, score: f64) -> Category {
        if score >= self.a_min {
            Category::A
        } else if score >= self.b_min {
            Category::B
        } else if score >= self.c_min {
            Category::C
        } else if score >= self.d_min {
            Category::D
        } else {
            Category::E
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegulatoryConfig {
    pub thresholds: ConformityThresholds,
    pub weights: CriteriaWeights,
    pub categories: CategoryThresholds,
    #[schemars(description = "Share of the loan to provision for each category, between 0.0 and 1.0")]
    pub provision_rates: BTreeMap<Category, f64>,
    #[schemars(
        description = "Predicted default probability from which an intervention alert is raised (R-2015 seuil d'intervention)"
    )]
    pub intervention_probability: f64,
}

impl Default for RegulatoryConfig {
    fn default() -> Self {
        Self::cobac()
    }
}

impl RegulatoryConfig {
    pub fn cobac() -> Self {
        let provision_rates = BTreeMap::from([
            (Category::A, 0.0),
            (Category::B, 0.0),
            (Category::C, 0.2),
            (Category::D, 0.5),
            (Category::E, 1.0),
        ]);

        Self {
            thresholds: ConformityThresholds::default(),
            weights: CriteriaWeights::default(),
            categories: CategoryThresholds::default(),
            provision_rates,
            intervention_probability: 0.7,
        }
    }

    /// Parses and validates a configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.weights.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CreditAnalysisError::InvalidConfiguration(format!(
                "criteria weights must be finite and non-negative, got {:?}",
                self.weights
            )));
        }

        let c = &self.categories;
        if !(c.a_min >= c.b_min && c.b_min >= c.c_min && c.c_min >= c.d_min) {
            return Err(CreditAnalysisError::InvalidConfiguration(format!(
                "category cut-offs must be descending from A to D, got {:?}",
                c
            )));
        }

        for category in Category::ALL {
            match self.provision_rates.get(&category) {
                None => return Err(CreditAnalysisError::MissingProvisionRate(category)),
                Some(rate) if !(0.0..=1.0).contains(rate) => {
                    return Err(CreditAnalysisError::InvalidConfiguration(format!(
                        "provision rate {} for category {} is outside [0, 1]",
                        rate, category
                    )));
                }
                Some(_) => {}
            }
        }

        if !(0.0..=1.0).contains(&self.intervention_probability) {
            return Err(CreditAnalysisError::InvalidConfiguration(format!(
                "intervention probability {} is outside [0, 1]",
                self.intervention_probability
            )));
        }

        Ok(())
    }

    pub fn provision_rate(&self, category: Category) -> Result<f64> {
        self.provision_rates
            .get(&category)
            .copied()
            .ok_or(CreditAnalysisError::MissingProvisionRate(category))
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RegulatoryConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
