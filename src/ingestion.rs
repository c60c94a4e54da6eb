//! Statement tables and the long-form ledger built from them.

use crate::chart_of_accounts::ChartOfAccounts;
use crate::error::Result;
use crate::schema::{LedgerEntry, Nature, StatementSource};
use crate::utils::{clean_account_code, parse_amount, parse_year_header};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;

const CODE_HEADERS: [&str; 3] = ["account_code", "compte", "code"];
const LABEL_HEADERS: [&str; 4] = ["account_label", "libellé", "libelle", "label"];

/// A statement as uploaded: one row per account, one column per fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Reads a table whose first record is the header row. Short rows are allowed.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn from_csv_str(data: &str) -> Result<Self> {
        Self::from_csv_reader(data.as_bytes())
    }

    fn find_column(&self, candidates: &[&str]) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| candidates.iter().any(|c| h.trim().to_lowercase() == *c))
    }

    fn year_columns(&self) -> Vec<(usize, i32)> {
        self.headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| parse_year_header(h).map(|year| (idx, year)))
            .collect()
    }
}

/// Reshapes one wide statement table into ledger entries, one per (account, year).
///
/// Structural problems (missing identifier columns, no year column) yield an
/// empty result: the statement simply contributes nothing. Malformed amount
/// cells become `0.0`.
pub fn normalize(table: &RawTable, source: StatementSource, chart: &ChartOfAccounts) -> Vec<LedgerEntry> {
    let (Some(code_idx), Some(label_idx)) = (table.find_column(&CODE_HEADERS), table.find_column(&LABEL_HEADERS))
    else {
        warn!(
            "{:?} table is missing its account code/label columns (headers: {:?}); ignoring it",
            source, table.headers
        );
        return Vec::new();
    };

    let year_columns = table.year_columns();
    if year_columns.is_empty() {
        warn!("No fiscal year column found in {:?} table; ignoring it", source);
        return Vec::new();
    }

    let mut entries = Vec::with_capacity(table.rows.len() * year_columns.len());
    let mut dropped = 0usize;
    let mut coerced = 0usize;

    for row in &table.rows {
        let account_code = clean_account_code(row.get(code_idx).map(String::as_str).unwrap_or(""));
        if account_code.is_empty() {
            dropped += 1;
            continue;
        }

        let account_label = row.get(label_idx).map(|l| l.trim().to_string()).unwrap_or_default();
        let classification = chart.classify(&account_code, &account_label, source);

        for &(col, year) in &year_columns {
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            let amount = match parse_amount(cell) {
                Some(v) => v,
                None => {
                    if !cell.trim().is_empty() {
                        coerced += 1;
                        debug!(
                            "Unparsable amount '{}' for account {} ({}) coerced to 0",
                            cell, account_code, year
                        );
                    }
                    0.0
                }
            };

            entries.push(LedgerEntry {
                account_code: account_code.clone(),
                account_label: account_label.clone(),
                year,
                amount,
                statement_source: source,
                nature: classification.nature,
                bucket: classification.bucket,
            });
        }
    }

    debug!(
        "Normalized {:?}: {} entries over {} years ({} rows without code dropped, {} cells coerced)",
        source,
        entries.len(),
        year_columns.len(),
        dropped,
        coerced
    );

    entries
}

/// The three statements of one company. The cash flow statement is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatements {
    pub balance_sheet: RawTable,
    pub income_statement: RawTable,
    pub cash_flow: Option<RawTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    pub fn from_statements(statements: &FinancialStatements, chart: &ChartOfAccounts) -> Self {
        let mut entries = normalize(&statements.balance_sheet, StatementSource::BalanceSheet, chart);
        entries.extend(normalize(
            &statements.income_statement,
            StatementSource::IncomeStatement,
            chart,
        ));
        if let Some(cash_flow) = &statements.cash_flow {
            entries.extend(normalize(cash_flow, StatementSource::CashFlow, chart));
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every year seen in any source, ascending.
    pub fn years(&self) -> BTreeSet<i32> {
        self.entries.iter().map(|e| e.year).collect()
    }

    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.entries.iter().filter(move |e| e.year == year)
    }

    /// Entries that feed aggregates, i.e. everything not classified `Other`.
    pub fn classified(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.entries.iter().filter(|e| e.nature != Nature::Other)
    }

    pub fn count_by_source(&self, source: StatementSource) -> usize {
        self.entries.iter().filter(|e| e.statement_source == source).count()
    }
}
