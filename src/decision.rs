//! Consolidated credit recommendation and regulatory alerts.

use crate::features::RiskPrediction;
use crate::schema::{Category, ConformiteResult, ScoreResult, WorkingCapitalResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this default probability an A/B file is approved outright.
pub const LOW_RISK_PROBABILITY: f64 = 0.3;
/// From this default probability a file is refused whatever its category.
pub const HIGH_RISK_PROBABILITY: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditDecision {
    Accord,
    #[schemars(description = "Approval under conditions: closer monitoring, extra collateral, higher rate, shorter term")]
    Mixte,
    Refus,
}

impl fmt::Display for CreditDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditDecision::Accord => write!(f, "ACCORD"),
            CreditDecision::Mixte => write!(f, "MIXTE"),
            CreditDecision::Refus => write!(f, "REFUS"),
        }
    }
}

/// Combines the regulatory category with the model's default probability,
/// when one is available.
pub fn consolidate(category: Category, default_probability: Option<f64>) -> CreditDecision {
    let favourable = matches!(category, Category::A | Category::B);

    match default_probability {
        Some(p) if favourable && p < LOW_RISK_PROBABILITY => CreditDecision::Accord,
        Some(p) if category == Category::C || (LOW_RISK_PROBABILITY..HIGH_RISK_PROBABILITY).contains(&p) => {
            CreditDecision::Mixte
        }
        Some(_) => CreditDecision::Refus,
        None => match category {
            Category::A | Category::B => CreditDecision::Accord,
            Category::C => CreditDecision::Mixte,
            Category::D | Category::E => CreditDecision::Refus,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Alert {
    CriticalCategory { categorie: Category },
    LowProfitability,
    InsufficientLiquidity,
    ExcessiveDebt,
    NegativeTreasury { tn: f64 },
    InterventionThreshold { probability: f64 },
}

impl Alert {
    pub fn level(&self) -> AlertLevel {
        match self {
            Alert::LowProfitability | Alert::InsufficientLiquidity | Alert::ExcessiveDebt => AlertLevel::Warning,
            Alert::CriticalCategory { .. } | Alert::NegativeTreasury { .. } | Alert::InterventionThreshold { .. } => {
                AlertLevel::Critical
            }
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::CriticalCategory { categorie } => {
                write!(f, "Score COBAC critique: catégorie {}, surveillance renforcée requise", categorie)
            }
            Alert::LowProfitability => write!(f, "Rentabilité faible: en dessous du seuil COBAC"),
            Alert::InsufficientLiquidity => write!(f, "Liquidité insuffisante: ratio de liquidité sous le seuil"),
            Alert::ExcessiveDebt => write!(f, "Endettement élevé: ratio d'endettement au-dessus du seuil"),
            Alert::NegativeTreasury { tn } => {
                write!(f, "Trésorerie négative ({:.0}): risque de liquidité à court terme", tn)
            }
            Alert::InterventionThreshold { probability } => {
                write!(f, "Probabilité de défaut {:.1}% au-delà du seuil d'intervention", probability * 100.0)
            }
        }
    }
}

/// Alerts raised for the scored year.
///
/// `conformity` and `working_capital` are that year's results, when present.
pub fn alerts(
    score: &ScoreResult,
    conformity: Option<&ConformiteResult>,
    working_capital: Option<&WorkingCapitalResult>,
    prediction: Option<&RiskPrediction>,
    intervention_probability: f64,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if score.categorie >= Category::D {
        alerts.push(Alert::CriticalCategory {
            categorie: score.categorie,
        });
    }

    if let Some(c) = conformity {
        if !c.rentabilite {
            alerts.push(Alert::LowProfitability);
        }
        if !c.liquidite {
            alerts.push(Alert::InsufficientLiquidity);
        }
        if !c.endettement {
            alerts.push(Alert::ExcessiveDebt);
        }
    }

    if let Some(wc) = working_capital {
        if wc.tn < 0.0 {
            alerts.push(Alert::NegativeTreasury { tn: wc.tn });
        }
    }

    if let Some(p) = prediction {
        if p.probability >= intervention_probability {
            alerts.push(Alert::InterventionThreshold {
                probability: p.probability,
            });
        }
    }

    alerts
}
