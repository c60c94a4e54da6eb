use crate::error::CreditAnalysisError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementSource {
    #[schemars(description = "Bilan: point-in-time assets and liabilities (classes 1 to 5)")]
    BalanceSheet,

    #[schemars(description = "Compte de résultat: charges (class 6) and products (class 7) for the fiscal year")]
    IncomeStatement,

    #[schemars(description = "Tableau des flux de trésorerie. Optional, never feeds the aggregates")]
    CashFlow,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Nature {
    #[schemars(description = "Income statement credit: sales, production, other products")]
    Product,
    #[schemars(description = "Income statement debit: purchases, external services, payroll, allowances")]
    Charge,
    #[schemars(description = "Balance sheet debit side: fixed assets, stocks, receivables, cash")]
    Asset,
    #[schemars(description = "Balance sheet credit side: equity, financial debt, operating payables")]
    Liability,
    CashIn,
    CashOutOperating,
    Investing,
    Financing,
    #[schemars(description = "Memo, subtotal or unknown line. Excluded from every aggregate")]
    Other,
}

/// Fine-grained classification of a ledger line, as used by the aggregation engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    // Balance sheet
    Equity,
    FinancialDebt,
    FixedAssets,
    Stocks,
    TradeReceivables,
    OtherReceivables,
    Cash,
    TradePayables,
    SocialPayables,
    TaxPayables,
    OtherCurrentLiabilities,
    BankOverdraft,

    // Income statement
    Sales,
    MerchandisePurchases,
    ExternalConsumption,
    OtherOperatingCharges,
    Personnel,
    Depreciation,
    Provisions,
}

impl Bucket {
    pub fn is_current_asset(self) -> bool {
        matches!(
            self,
            Bucket::Stocks | Bucket::TradeReceivables | Bucket::OtherReceivables | Bucket::Cash
        )
    }

    pub fn is_current_liability(self) -> bool {
        matches!(
            self,
            Bucket::TradePayables
                | Bucket::SocialPayables
                | Bucket::TaxPayables
                | Bucket::OtherCurrentLiabilities
        )
    }

    /// Merchandise purchases are a sub-bucket of the `60x` consumption family.
    pub fn is_external_consumption(self) -> bool {
        matches!(self, Bucket::ExternalConsumption | Bucket::MerchandisePurchases)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerEntry {
    pub account_code: String,
    pub account_label: String,
    pub year: i32,
    #[schemars(
        description = "Raw magnitude as printed in the statement. Sign carries no meaning; aggregation applies abs() where charges are combined with products."
    )]
    pub amount: f64,
    pub statement_source: StatementSource,
    pub nature: Nature,
    pub bucket: Option<Bucket>,
}

/// A ratio whose denominator may be zero.
///
/// `Undefined` is kept distinct from `Value(0.0)` so an unmeasurable ratio can
/// never pass a threshold check by accident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Ratio {
    Value(f64),
    Undefined,
}

impl Ratio {
    /// `numerator / denominator`, or `Undefined` when the denominator is not strictly positive.
    pub fn positive_denominator(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 {
            Ratio::Value(numerator / denominator)
        } else {
            Ratio::Undefined
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Ratio::Value(v) => Some(v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Ratio::Undefined)
    }

    pub fn at_least(self, threshold: f64) -> bool {
        self.value().is_some_and(|v| v >= threshold)
    }

    pub fn at_most(self, threshold: f64) -> bool {
        self.value().is_some_and(|v| v <= threshold)
    }

    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Ratio::Value(v) => Ratio::Value(v * factor),
            Ratio::Undefined => Ratio::Undefined,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Value(v) => write!(f, "{:.2}", v),
            Ratio::Undefined => write!(f, "N/A"),
        }
    }
}

/// Soldes intermédiaires de gestion for one fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SigResult {
    pub chiffre_affaires: f64,
    pub marge_commerciale: f64,
    pub valeur_ajoutee: f64,
    pub ebe: f64,
    pub resultat_net: f64,
    pub charges_personnel: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RatiosResult {
    #[schemars(description = "Net result / revenue, in percent")]
    pub rentabilite_nette: Ratio,
    #[schemars(description = "Financial debt / equity")]
    pub ratio_endettement: Ratio,
    #[schemars(description = "Current assets / current liabilities. Zero when there are no current liabilities")]
    pub ratio_liquidite: Ratio,
    #[schemars(description = "Equity / total liabilities side, in percent")]
    pub ratio_autonomie: Ratio,
    #[schemars(description = "Operating EBE / financial debt")]
    pub capacite_remboursement: Ratio,
    pub ebe: f64,
    pub dettes_financieres: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkingCapitalResult {
    #[schemars(description = "Capacité d'autofinancement: net result plus depreciation and provision allowances")]
    pub caf: f64,
    #[schemars(description = "Besoin en fonds de roulement: operating current assets minus operating current liabilities")]
    pub bfr: f64,
    #[schemars(description = "Fonds de roulement: permanent capital minus fixed assets")]
    pub fr: f64,
    #[schemars(description = "Trésorerie nette, always fr - bfr")]
    pub tn: f64,
    pub actif_circulant: f64,
    pub passif_circulant: f64,
    pub capitaux_permanents: f64,
    pub actif_immobilise: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConformiteResult {
    pub rentabilite: bool,
    pub endettement: bool,
    pub liquidite: bool,
    pub autonomie: bool,
    pub global: bool,
}

impl ConformiteResult {
    pub fn new(rentabilite: bool, endettement: bool, liquidite: bool, autonomie: bool) -> Self {
        Self {
            rentabilite,
            endettement,
            liquidite,
            autonomie,
            global: rentabilite && endettement && liquidite && autonomie,
        }
    }
}

/// Risk category, best (`A`) to worst (`E`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Category {
    A,
    B,
    C,
    D,
    E,
}

impl Category {
    pub const ALL: [Category; 5] = [Category::A, Category::B, Category::C, Category::D, Category::E];

    pub fn label(self) -> &'static str {
        match self {
            Category::A => "Excellent - Risque faible",
            Category::B => "Bon - Risque modéré",
            Category::C => "Moyen - Risque acceptable",
            Category::D => "Médiocre - Risque élevé",
            Category::E => "Mauvais - Risque très élevé",
        }
    }

    pub fn receivable_class(self) -> ReceivableClass {
        match self {
            Category::A | Category::B => ReceivableClass::Standard,
            Category::C => ReceivableClass::SuiviSpecial,
            Category::D => ReceivableClass::Douteux,
            Category::E => ReceivableClass::Contentieux,
        }
    }

    pub fn review_frequency(self) -> ReviewFrequency {
        match self {
            Category::A | Category::B => ReviewFrequency::Annual,
            Category::C => ReviewFrequency::SemiAnnual,
            Category::D | Category::E => ReviewFrequency::QuarterlyWithCommittee,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Category::A => "A",
            Category::B => "B",
            Category::C => "C",
            Category::D => "D",
            Category::E => "E",
        };
        f.write_str(code)
    }
}

impl FromStr for Category {
    type Err = CreditAnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Category::A),
            "B" => Ok(Category::B),
            "C" => Ok(Category::C),
            "D" => Ok(Category::D),
            "E" => Ok(Category::E),
            _ => Err(CreditAnalysisError::UnknownCategory(s.to_string())),
        }
    }
}

/// Receivable classification of COBAC regulation R-2015/04 (Art. 8-12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReceivableClass {
    #[schemars(description = "Dossier de bonne qualité, faible risque")]
    Standard,
    #[schemars(description = "Signaux d'alerte, surveillance renforcée")]
    SuiviSpecial,
    #[schemars(description = "Difficultés avérées, risque élevé")]
    Douteux,
    #[schemars(description = "Défaut de paiement, recouvrement nécessaire")]
    Contentieux,
}

impl ReceivableClass {
    pub fn description(self) -> &'static str {
        match self {
            ReceivableClass::Standard => "Dossier de bonne qualité, faible risque",
            ReceivableClass::SuiviSpecial => "Signaux d'alerte, surveillance renforcée",
            ReceivableClass::Douteux => "Difficultés avérées, risque élevé",
            ReceivableClass::Contentieux => "Défaut de paiement, recouvrement nécessaire",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFrequency {
    Annual,
    SemiAnnual,
    #[schemars(description = "Quarterly review, credit committee approval mandatory")]
    QuarterlyWithCommittee,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubScores {
    #[schemars(description = "Out of 25")]
    pub rentabilite: u32,
    #[schemars(description = "Out of 25 (debt out of 15 plus autonomy out of 10)")]
    pub structure: u32,
    #[schemars(description = "Out of 20")]
    pub liquidite: u32,
    #[schemars(description = "Out of 15")]
    pub tresorerie: u32,
    #[schemars(description = "Out of 15")]
    pub croissance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreResult {
    #[schemars(description = "Weighted sum of the sub-scores, clamped to [0, 100]")]
    pub score_total: f64,
    pub categorie: Category,
    pub scores_detailles: SubScores,
    #[schemars(description = "Fiscal year that was scored, absent when no data was available")]
    pub year: Option<i32>,
}

impl ScoreResult {
    pub fn worst_case() -> Self {
        Self {
            score_total: 0.0,
            categorie: Category::E,
            scores_detailles: SubScores::default(),
            year: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProvisionResult {
    pub montant_pret: f64,
    pub categorie: Category,
    pub taux_provision: f64,
    pub provision_requise: f64,
    pub montant_net: f64,
}
