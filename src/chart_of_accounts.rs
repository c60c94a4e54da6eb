//! Chart-of-accounts classification.
//!
//! A chart is an ordered list of typed rules per statement source. Code-prefix
//! rules always take precedence over label-keyword rules, whatever their
//! position in the list: a keyword only classifies what no prefix matched,
//! or narrows a bucket into the sub-bucket it explicitly `refines`.

use crate::schema::{Bucket, Nature, StatementSource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum Matcher {
    #[schemars(description = "Matches when the account code starts with this prefix (case-insensitive)")]
    CodePrefix(String),

    #[schemars(description = "Matches when the account label contains this keyword (case-insensitive)")]
    LabelKeyword(String),
}

impl Matcher {
    pub fn prefix(pattern: &str) -> Self {
        Matcher::CodePrefix(pattern.to_string())
    }

    pub fn keyword(pattern: &str) -> Self {
        Matcher::LabelKeyword(pattern.to_string())
    }

    fn is_prefix(&self) -> bool {
        matches!(self, Matcher::CodePrefix(_))
    }

    /// `code` and `label` must already be upper- and lower-cased respectively.
    fn matches(&self, code: &str, label: &str) -> bool {
        match self {
            Matcher::CodePrefix(p) => !p.is_empty() && code.starts_with(&p.to_uppercase()),
            Matcher::LabelKeyword(k) => !k.is_empty() && label.contains(&k.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NatureRule {
    pub matcher: Matcher,
    pub nature: Nature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BucketRule {
    pub matcher: Matcher,
    #[schemars(description = "The rule only applies to lines of this nature")]
    pub nature: Nature,
    pub bucket: Bucket,
    #[serde(default)]
    #[schemars(
        description = "Keyword rules only: the parent bucket this rule may narrow. Without it the rule only fills lines no prefix rule bucketed."
    )]
    pub refines: Option<Bucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceRules {
    #[serde(default)]
    pub natures: Vec<NatureRule>,
    #[serde(default)]
    pub buckets: Vec<BucketRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    pub nature: Nature,
    pub bucket: Option<Bucket>,
}

impl Classification {
    pub const OTHER: Classification = Classification {
        nature: Nature::Other,
        bucket: None,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChartOfAccounts {
    pub name: String,
    pub balance_sheet: SourceRules,
    pub income_statement: SourceRules,
    #[serde(default)]
    pub cash_flow: SourceRules,
}

impl Default for ChartOfAccounts {
    fn default() -> Self {
        Self::cobac()
    }
}

impl ChartOfAccounts {
    pub fn rules_for(&self, source: StatementSource) -> &SourceRules {
        match source {
            StatementSource::BalanceSheet => &self.balance_sheet,
            StatementSource::IncomeStatement => &self.income_statement,
            StatementSource::CashFlow => &self.cash_flow,
        }
    }

    /// Classifies one line. Total: anything unmatched is `Nature::Other`.
    pub fn classify(&self, account_code: &str, account_label: &str, source: StatementSource) -> Classification {
        let code = account_code.trim().to_uppercase();
        let label = account_label.to_lowercase();
        let rules = self.rules_for(source);

        let nature = rules
            .natures
            .iter()
            .filter(|r| r.matcher.is_prefix())
            .chain(rules.natures.iter().filter(|r| !r.matcher.is_prefix()))
            .find(|r| r.matcher.matches(&code, &label))
            .map(|r| r.nature);

        let Some(nature) = nature.filter(|n| *n != Nature::Other) else {
            return Classification::OTHER;
        };

        let mut bucket = rules
            .buckets
            .iter()
            .filter(|r| r.nature == nature && r.matcher.is_prefix())
            .find(|r| r.matcher.matches(&code, &label))
            .map(|r| r.bucket);

        let refinement = rules
            .buckets
            .iter()
            .filter(|r| r.nature == nature && !r.matcher.is_prefix())
            .filter(|r| bucket.is_none() || (r.refines.is_some() && r.refines == bucket))
            .find(|r| r.matcher.matches(&code, &label));

        if let Some(rule) = refinement {
            bucket = Some(rule.bucket);
        }

        Classification { nature, bucket }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The COBAC/CEMAC (SYSCOHADA) chart of accounts.
    pub fn cobac() -> Self {
        Self {
            name: "COBAC/CEMAC - SYSCOHADA".to_string(),
            balance_sheet: cobac_balance_sheet(),
            income_statement: cobac_income_statement(),
            cash_flow: cobac_cash_flow(),
        }
    }
}

fn natures(prefixes: &[&str], keywords: &[&str], nature: Nature) -> Vec<NatureRule> {
    prefixes
        .iter()
        .map(|p| Matcher::prefix(p))
        .chain(keywords.iter().map(|k| Matcher::keyword(k)))
        .map(|matcher| NatureRule { matcher, nature })
        .collect()
}

fn buckets(prefixes: &[&str], nature: Nature, bucket: Bucket) -> Vec<BucketRule> {
    prefixes
        .iter()
        .map(|p| BucketRule {
            matcher: Matcher::prefix(p),
            nature,
            bucket,
            refines: None,
        })
        .collect()
}

fn keyword_bucket(keyword: &str, nature: Nature, bucket: Bucket, refines: Option<Bucket>) -> BucketRule {
    BucketRule {
        matcher: Matcher::keyword(keyword),
        nature,
        bucket,
        refines,
    }
}

fn cobac_balance_sheet() -> SourceRules {
    use Bucket::*;
    use Nature::{Asset, Liability, Other};

    let natures = [
        natures(&["40", "42", "43", "44", "45", "56"], &[], Liability),
        natures(&["41", "46", "47", "48", "49"], &[], Asset),
        natures(&["1"], &[], Liability),
        natures(&["2", "3", "5"], &[], Asset),
        natures(&[], &["total"], Other),
        natures(&[], &["capital", "réserve", "reserve", "emprunt", "fournisseur"], Liability),
        natures(&[], &["client", "stock", "banque", "caisse", "immobilisation"], Asset),
    ]
    .concat();

    let buckets = [
        buckets(&["101", "106", "109"], Liability, Equity),
        buckets(&["16", "17"], Liability, FinancialDebt),
        buckets(&["40"], Liability, TradePayables),
        buckets(&["431"], Liability, SocialPayables),
        buckets(&["441"], Liability, TaxPayables),
        buckets(&["42", "43", "44", "45"], Liability, OtherCurrentLiabilities),
        buckets(&["56"], Liability, BankOverdraft),
        buckets(&["2"], Asset, FixedAssets),
        buckets(&["3"], Asset, Stocks),
        buckets(&["41"], Asset, TradeReceivables),
        buckets(&["46", "47", "48", "49"], Asset, OtherReceivables),
        buckets(&["5"], Asset, Cash),
        vec![
            keyword_bucket("emprunt", Liability, FinancialDebt, None),
            keyword_bucket("fournisseur", Liability, TradePayables, None),
            keyword_bucket("stock", Asset, Stocks, None),
            keyword_bucket("client", Asset, TradeReceivables, None),
        ],
    ]
    .concat();

    SourceRules { natures, buckets }
}

fn cobac_income_statement() -> SourceRules {
    use Bucket::*;
    use Nature::{Charge, Other, Product};

    // HAO (hors activités ordinaires) lines: odd class-8 accounts are charges, even ones products.
    let natures = [
        natures(&["82", "84", "86", "88"], &[], Product),
        natures(&["81", "83", "85", "87", "89"], &[], Charge),
        natures(&["7"], &[], Product),
        natures(&["6"], &[], Charge),
        natures(&[], &["total"], Other),
        natures(&[], &["reprise", "vente", "produit"], Product),
        natures(&[], &["achat", "dotation", "amortissement", "provision", "charge"], Charge),
    ]
    .concat();

    let buckets = [
        buckets(&["601"], Charge, MerchandisePurchases),
        buckets(&["60"], Charge, ExternalConsumption),
        buckets(&["641", "645"], Charge, Personnel),
        buckets(&["62", "63"], Charge, OtherOperatingCharges),
        buckets(&["681"], Charge, Depreciation),
        buckets(&["691"], Charge, Provisions),
        buckets(&["70"], Product, Sales),
        vec![
            keyword_bucket("achat", Charge, MerchandisePurchases, Some(ExternalConsumption)),
            keyword_bucket("amortissement", Charge, Depreciation, None),
            keyword_bucket("provision", Charge, Provisions, None),
        ],
    ]
    .concat();

    SourceRules { natures, buckets }
}

fn cobac_cash_flow() -> SourceRules {
    use Nature::*;

    let natures = [
        // Z* lines are subtotals of the flows above them.
        natures(&["Z"], &[], Other),
        natures(&["FA"], &[], CashIn),
        natures(&["FB", "FC", "FD", "FE"], &[], CashOutOperating),
        natures(&["FF", "FG", "FH", "FI", "FJ"], &[], Investing),
        natures(&["FK", "FL", "FM", "FN", "FO", "FP", "FQ"], &[], Financing),
        natures(&[], &["total"], Other),
        natures(&[], &["cession", "acquisition", "investissement"], Investing),
        natures(&[], &["emprunt", "dividende", "capital", "financement"], Financing),
        natures(&[], &["encaissement"], CashIn),
        natures(&[], &["décaissement", "decaissement"], CashOutOperating),
    ]
    .concat();

    SourceRules {
        natures,
        buckets: Vec::new(),
    }
}
