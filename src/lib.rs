//! # COBAC Credit Scoring
//!
//! A library for turning a company's annual financial statements into the
//! indicators a CEMAC bank needs to decide on a loan: soldes intermédiaires de
//! gestion (SIG), financial ratios, working-capital indicators, COBAC
//! conformity, a risk score with its A–E category and the provision it
//! requires.
//!
//! ## Core Concepts
//!
//! - **Raw statements**: balance sheet, income statement and optional cash
//!   flow tables, one row per account and one column per fiscal year
//! - **Ledger**: the same figures in long form, each line classified through a
//!   data-driven chart of accounts
//! - **Aggregates**: per-year SIG, ratios and working capital; ratios with a
//!   zero denominator are [`Ratio::Undefined`], never zero
//! - **Scoring**: five tiered sub-scores on the latest year, weighted into a
//!   composite score and a regulatory category
//! - **Regulatory configuration**: thresholds, weights and provision rates live
//!   in an explicit [`RegulatoryConfig`] defaulting to COBAC rules
//!
//! ## Example
//!
//! ```rust,ignore
//! use cobac_credit_scoring::*;
//!
//! let statements = FinancialStatements {
//!     balance_sheet: RawTable::from_csv_str(
//!         "account_code,account_label,2023\n101,Capital social,500000\n162,Emprunts,200000\n",
//!     )?,
//!     income_statement: RawTable::from_csv_str(
//!         "account_code,account_label,2023\n701,Ventes de marchandises,600000\n601,Achats de marchandises,400000\n",
//!     )?,
//!     cash_flow: None,
//! };
//!
//! let analysis = CreditAnalyzer::default().analyze(&statements, 100_000.0)?;
//! println!("{} -> {:.2}", analysis.score.categorie, analysis.score.score_total);
//! ```

pub mod chart_of_accounts;
pub mod conformity;
pub mod decision;
pub mod engine;
pub mod error;
pub mod features;
pub mod ingestion;
pub mod regulation;
pub mod schema;
pub mod scoring;
pub mod utils;

pub use chart_of_accounts::{BucketRule, ChartOfAccounts, Classification, Matcher, NatureRule, SourceRules};
pub use conformity::{check_conformity, check_conformity_by_year};
pub use decision::{consolidate, Alert, AlertLevel, CreditDecision};
pub use engine::{compute_ratios, compute_sig, compute_working_capital, totals_by_year, YearTotals};
pub use error::{CreditAnalysisError, Result};
pub use features::{build_features, FeatureVector, RiskClassifier, RiskPrediction, FEATURE_NAMES, FEATURE_SET_VERSION};
pub use ingestion::*;
pub use regulation::{CategoryThresholds, ConformityThresholds, CriteriaWeights, RegulatoryConfig};
pub use schema::*;
pub use scoring::ScoringEngine;
pub use utils::*;

use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything derived from one company's statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAnalysis {
    pub ledger: Ledger,
    pub sig: BTreeMap<i32, SigResult>,
    pub ratios: BTreeMap<i32, RatiosResult>,
    pub working_capital: BTreeMap<i32, WorkingCapitalResult>,
    pub conformity: BTreeMap<i32, ConformiteResult>,
    pub score: ScoreResult,
    pub provision: ProvisionResult,
    pub features: Option<FeatureVector>,
}

impl CreditAnalysis {
    /// False when either mandatory statement contributed no line, which
    /// happens when its identifier or year columns could not be found.
    pub fn has_sufficient_data(&self) -> bool {
        self.ledger.count_by_source(StatementSource::BalanceSheet) > 0
            && self.ledger.count_by_source(StatementSource::IncomeStatement) > 0
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.score.year
    }

    pub fn latest_conformity(&self) -> Option<&ConformiteResult> {
        self.score.year.and_then(|y| self.conformity.get(&y))
    }

    pub fn latest_working_capital(&self) -> Option<&WorkingCapitalResult> {
        self.score.year.and_then(|y| self.working_capital.get(&y))
    }
}

/// The outcome of combining an analysis with an optional model prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CreditAssessment {
    pub categorie: Category,
    pub receivable_class: ReceivableClass,
    pub review_frequency: ReviewFrequency,
    pub prediction: Option<RiskPrediction>,
    pub decision: CreditDecision,
    pub alerts: Vec<Alert>,
}

pub struct CreditAnalyzer {
    config: RegulatoryConfig,
    chart: ChartOfAccounts,
}

impl Default for CreditAnalyzer {
    fn default() -> Self {
        Self::new(RegulatoryConfig::cobac())
    }
}

impl CreditAnalyzer {
    pub fn new(config: RegulatoryConfig) -> Self {
        Self::with_chart(config, ChartOfAccounts::cobac())
    }

    pub fn with_chart(config: RegulatoryConfig, chart: ChartOfAccounts) -> Self {
        Self { config, chart }
    }

    pub fn config(&self) -> &RegulatoryConfig {
        &self.config
    }

    pub fn chart(&self) -> &ChartOfAccounts {
        &self.chart
    }

    /// Runs the whole pipeline and provisions `loan_amount` against the
    /// resulting category.
    ///
    /// Bad input data never fails the analysis; only an invalid configuration
    /// does.
    pub fn analyze(&self, statements: &FinancialStatements, loan_amount: f64) -> Result<CreditAnalysis> {
        let scoring = ScoringEngine::new(self.config.clone())?;

        info!("Analyzing financial statements with chart '{}'", self.chart.name);

        let ledger = Ledger::from_statements(statements, &self.chart);
        debug!(
            "Ledger contains {} lines ({} balance sheet, {} income statement, {} cash flow) over years {:?}",
            ledger.len(),
            ledger.count_by_source(StatementSource::BalanceSheet),
            ledger.count_by_source(StatementSource::IncomeStatement),
            ledger.count_by_source(StatementSource::CashFlow),
            ledger.years()
        );

        let sig = compute_sig(&ledger);
        let ratios = compute_ratios(&ledger);
        let working_capital = compute_working_capital(&ledger);
        let conformity = check_conformity_by_year(&ratios, &self.config.thresholds);

        let score = scoring.score(&sig, &ratios, &working_capital);
        let provision = scoring.calculate_provisioning(loan_amount, score.categorie)?;
        let features = build_features(&sig, &ratios, &working_capital);

        info!(
            "Analysis complete: score {:.2}, category {} ({}), provision {:.0}",
            score.score_total,
            score.categorie,
            score.categorie.label(),
            provision.provision_requise
        );

        Ok(CreditAnalysis {
            ledger,
            sig,
            ratios,
            working_capital,
            conformity,
            score,
            provision,
            features,
        })
    }

    /// Consolidates the analysis with the classifier's prediction, when a
    /// classifier is given and the analysis has a complete year to feed it.
    pub fn assess(&self, analysis: &CreditAnalysis, classifier: Option<&dyn RiskClassifier>) -> Result<CreditAssessment> {
        let prediction = match (classifier, &analysis.features) {
            (Some(model), Some(features)) => Some(model.predict(features)?),
            _ => None,
        };

        let categorie = analysis.score.categorie;
        let alerts = decision::alerts(
            &analysis.score,
            analysis.latest_conformity(),
            analysis.latest_working_capital(),
            prediction.as_ref(),
            self.config.intervention_probability,
        );

        Ok(CreditAssessment {
            categorie,
            receivable_class: categorie.receivable_class(),
            review_frequency: categorie.review_frequency(),
            prediction,
            decision: consolidate(categorie, prediction.map(|p| p.probability)),
            alerts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> RawTable {
        RawTable::from_csv_str(csv).unwrap()
    }

    fn statements() -> FinancialStatements {
        FinancialStatements {
            balance_sheet: table(
                "account_code,account_label,2022,2023\n\
                 101,Capital social,400000,500000\n\
                 162,Emprunts bancaires,200000,200000\n\
                 401,Fournisseurs,100000,100000\n\
                 231,Bâtiments,300000,300000\n\
                 311,Stocks de marchandises,150000,150000\n\
                 411,Clients,200000,250000\n\
                 521,Banque,100000,100000\n",
            ),
            income_statement: table(
                "account_code,account_label,2022,2023\n\
                 701,Ventes de marchandises,500000,600000\n\
                 601,Achats de marchandises,350000,400000\n",
            ),
            cash_flow: None,
        }
    }

    struct FixedModel(f64);

    impl RiskClassifier for FixedModel {
        fn predict(&self, _features: &FeatureVector) -> Result<RiskPrediction> {
            Ok(RiskPrediction {
                predicted_class: u8::from(self.0 >= 0.5),
                probability: self.0,
            })
        }
    }

    #[test]
    fn test_end_to_end_analysis() {
        let analysis = CreditAnalyzer::default().analyze(&statements(), 100_000.0).unwrap();

        assert!(analysis.has_sufficient_data());
        assert_eq!(analysis.sig.keys().copied().collect::<Vec<_>>(), vec![2022, 2023]);
        assert_eq!(analysis.sig[&2023].resultat_net, 200_000.0);
        assert_eq!(analysis.score.year, Some(2023));
        assert_eq!(analysis.score.scores_detailles.rentabilite, 25);

        let wc = &analysis.working_capital[&2023];
        assert_eq!(wc.tn, wc.fr - wc.bfr);

        assert_eq!(analysis.provision.categorie, analysis.score.categorie);
        assert!(analysis.features.is_some());
        assert_eq!(analysis.features.as_ref().unwrap().year, 2023);
    }

    #[test]
    fn test_empty_statements_are_insufficient() {
        let analysis = CreditAnalyzer::default()
            .analyze(&FinancialStatements::default(), 50_000.0)
            .unwrap();

        assert!(!analysis.has_sufficient_data());
        assert_eq!(analysis.score, ScoreResult::worst_case());
        assert_eq!(analysis.provision.provision_requise, 50_000.0);
        assert!(analysis.features.is_none());
    }

    #[test]
    fn test_invalid_config_fails_loudly() {
        let mut config = RegulatoryConfig::cobac();
        config.provision_rates.remove(&Category::E);
        let result = CreditAnalyzer::new(config).analyze(&statements(), 1.0);
        assert!(matches!(result, Err(CreditAnalysisError::MissingProvisionRate(Category::E))));
    }

    #[test]
    fn test_assessment_with_and_without_model() {
        let analyzer = CreditAnalyzer::default();
        let analysis = analyzer.analyze(&statements(), 100_000.0).unwrap();

        let without = analyzer.assess(&analysis, None).unwrap();
        assert!(without.prediction.is_none());
        assert_eq!(without.decision, consolidate(analysis.score.categorie, None));

        let risky = FixedModel(0.85);
        let with = analyzer.assess(&analysis, Some(&risky)).unwrap();
        assert_eq!(with.prediction.map(|p| p.predicted_class), Some(1));
        assert_eq!(with.decision, CreditDecision::Refus);
        assert!(with
            .alerts
            .contains(&Alert::InterventionThreshold { probability: 0.85 }));
    }
}
