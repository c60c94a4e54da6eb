use crate::ingestion::Ledger;
use crate::schema::{
    Bucket, LedgerEntry, Nature, Ratio, RatiosResult, SigResult, StatementSource, WorkingCapitalResult,
};
use std::collections::BTreeMap;

/// Per-year sums of the ledger, one pass over the entries.
///
/// Values are raw sums; absolute values are taken where a formula combines
/// charges with products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearTotals {
    pub products: f64,
    pub charges: f64,
    pub sales: f64,
    pub merchandise_purchases: f64,
    pub external_consumption: f64,
    pub personnel: f64,
    pub other_operating_charges: f64,
    pub depreciation: f64,
    pub provisions: f64,

    pub total_liabilities: f64,
    pub equity: f64,
    pub financial_debt: f64,
    pub fixed_assets: f64,
    pub stocks: f64,
    pub trade_receivables: f64,
    pub trade_payables: f64,
    pub tax_payables: f64,
    pub social_payables: f64,
    pub current_assets: f64,
    pub current_liabilities: f64,
}

impl YearTotals {
    pub fn collect<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        let mut totals = Self::default();
        for entry in entries {
            match entry.statement_source {
                StatementSource::IncomeStatement => totals.add_income_line(entry),
                StatementSource::BalanceSheet => totals.add_balance_line(entry),
                StatementSource::CashFlow => {}
            }
        }
        totals
    }

    fn add_income_line(&mut self, entry: &LedgerEntry) {
        let amount = entry.amount;
        match entry.nature {
            Nature::Product => self.products += amount,
            Nature::Charge => self.charges += amount,
            _ => return,
        }

        let Some(bucket) = entry.bucket else {
            return;
        };

        if bucket.is_external_consumption() {
            self.external_consumption += amount;
        }

        match bucket {
            Bucket::Sales => self.sales += amount,
            Bucket::MerchandisePurchases => self.merchandise_purchases += amount,
            Bucket::Personnel => self.personnel += amount,
            Bucket::OtherOperatingCharges => self.other_operating_charges += amount,
            Bucket::Depreciation => self.depreciation += amount,
            Bucket::Provisions => self.provisions += amount,
            _ => {}
        }
    }

    fn add_balance_line(&mut self, entry: &LedgerEntry) {
        let amount = entry.amount;
        match entry.nature {
            Nature::Liability => self.total_liabilities += amount,
            Nature::Asset => {}
            _ => return,
        }

        let Some(bucket) = entry.bucket else {
            return;
        };

        if bucket.is_current_asset() {
            self.current_assets += amount;
        }
        if bucket.is_current_liability() {
            self.current_liabilities += amount;
        }

        match bucket {
            Bucket::Equity => self.equity += amount,
            Bucket::FinancialDebt => self.financial_debt += amount,
            Bucket::FixedAssets => self.fixed_assets += amount,
            Bucket::Stocks => self.stocks += amount,
            Bucket::TradeReceivables => self.trade_receivables += amount,
            Bucket::TradePayables => self.trade_payables += amount,
            Bucket::TaxPayables => self.tax_payables += amount,
            Bucket::SocialPayables => self.social_payables += amount,
            _ => {}
        }
    }

    pub fn chiffre_affaires(&self) -> f64 {
        self.products
    }

    /// Total revenue minus total charges; not a layered income-statement waterfall.
    pub fn resultat_net(&self) -> f64 {
        self.products - self.charges.abs()
    }

    /// Operating EBE backing the repayment-capacity ratio: revenue minus
    /// consumption and payroll only.
    pub fn operating_ebe(&self) -> f64 {
        self.products - self.external_consumption.abs() - self.personnel.abs()
    }

    pub fn sig(&self) -> SigResult {
        let chiffre_affaires = self.chiffre_affaires();
        let marge_commerciale = chiffre_affaires - self.merchandise_purchases.abs();
        let valeur_ajoutee = marge_commerciale + self.sales - self.external_consumption.abs();
        let ebe = valeur_ajoutee - self.personnel.abs() - self.other_operating_charges.abs();

        SigResult {
            chiffre_affaires,
            marge_commerciale,
            valeur_ajoutee,
            ebe,
            resultat_net: self.resultat_net(),
            charges_personnel: self.personnel.abs(),
        }
    }

    pub fn ratios(&self) -> RatiosResult {
        let chiffre_affaires = self.chiffre_affaires();
        let ebe = self.operating_ebe();

        let ratio_liquidite = if self.current_liabilities > 0.0 {
            Ratio::Value(self.current_assets / self.current_liabilities)
        } else {
            Ratio::Value(0.0)
        };

        RatiosResult {
            rentabilite_nette: Ratio::positive_denominator(self.resultat_net(), chiffre_affaires).scaled(100.0),
            ratio_endettement: Ratio::positive_denominator(self.financial_debt, self.equity),
            ratio_liquidite,
            ratio_autonomie: Ratio::positive_denominator(self.equity, self.total_liabilities).scaled(100.0),
            capacite_remboursement: Ratio::positive_denominator(ebe, self.financial_debt),
            ebe,
            dettes_financieres: self.financial_debt,
        }
    }

    pub fn working_capital(&self) -> WorkingCapitalResult {
        let caf = self.resultat_net() + self.depreciation.abs() + self.provisions.abs();

        let actif_circulant = self.stocks + self.trade_receivables;
        let passif_circulant = self.trade_payables + self.tax_payables + self.social_payables;
        let bfr = actif_circulant - passif_circulant;

        let capitaux_permanents = self.equity + self.financial_debt;
        let actif_immobilise = self.fixed_assets;
        let fr = capitaux_permanents - actif_immobilise;

        WorkingCapitalResult {
            caf,
            bfr,
            fr,
            tn: fr - bfr,
            actif_circulant,
            passif_circulant,
            capitaux_permanents,
            actif_immobilise,
        }
    }
}

fn per_year<T>(ledger: &Ledger, f: impl Fn(&YearTotals) -> T) -> BTreeMap<i32, T> {
    ledger
        .years()
        .into_iter()
        .map(|year| (year, f(&YearTotals::collect(ledger.for_year(year)))))
        .collect()
}

pub fn totals_by_year(ledger: &Ledger) -> BTreeMap<i32, YearTotals> {
    per_year(ledger, YearTotals::clone)
}

pub fn compute_sig(ledger: &Ledger) -> BTreeMap<i32, SigResult> {
    per_year(ledger, YearTotals::sig)
}

pub fn compute_ratios(ledger: &Ledger) -> BTreeMap<i32, RatiosResult> {
    per_year(ledger, YearTotals::ratios)
}

pub fn compute_working_capital(ledger: &Ledger) -> BTreeMap<i32, WorkingCapitalResult> {
    per_year(ledger, YearTotals::working_capital)
}
