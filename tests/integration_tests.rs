use cobac_credit_scoring::*;
use std::collections::BTreeMap;

const BILAN: &str = "\
account_code,account_label,2021,2022,2023
101,Capital social,400000,450000,500000
106,Réserves,50000,60000,80000
162,Emprunts auprès des établissements de crédit,300000,250000,200000
231,Bâtiments,350000,350000,380000
245,Matériel de transport,120000,110000,100000
311,Stocks de marchandises,140000,150000,160000
411,Clients,180000,210000,240000
401,Fournisseurs,90000,100000,110000
431,Sécurité sociale,10000,12000,14000
441,Etat impôt sur les bénéfices,8000,9000,11000
521,Banque,60000,80000,90000
";

const CPC: &str = "\
account_code,account_label,2021,2022,2023
701,Ventes de marchandises,800000,900000,1050000
706,Services vendus,50000,60000,70000
601,Achats de marchandises,450000,500000,560000
605,Fournitures non stockables,30000,32000,35000
622,Locations,20000,22000,25000
641,Rémunérations du personnel,120000,130000,140000
681,Dotations aux amortissements,40000,42000,45000
";

const TFT: &str = "\
code,libellé,2022,2023
FA,Capacité d'autofinancement globale,150000,180000
FF,Décaissements liés aux acquisitions d'immobilisations,-20000,-45000
FK,Emprunts nouveaux,0,0
ZA,Trésorerie nette au 1er janvier,60000,80000
";

fn statements(cash_flow: bool) -> FinancialStatements {
    FinancialStatements {
        balance_sheet: RawTable::from_csv_str(BILAN).unwrap(),
        income_statement: RawTable::from_csv_str(CPC).unwrap(),
        cash_flow: cash_flow.then(|| RawTable::from_csv_str(TFT).unwrap()),
    }
}

fn expected_total(config: &RegulatoryConfig, s: &SubScores) -> f64 {
    let w = &config.weights;
    let raw = s.rentabilite as f64 * w.rentabilite
        + s.structure as f64 * w.structure
        + s.liquidite as f64 * w.liquidite
        + s.tresorerie as f64 * w.tresorerie
        + s.croissance as f64 * w.croissance;
    raw.clamp(0.0, 100.0)
}

#[test]
fn test_trading_company_full_pipeline() {
    let analysis = CreditAnalyzer::default().analyze(&statements(true), 100_000.0).unwrap();

    assert!(analysis.has_sufficient_data());
    assert_eq!(analysis.ledger.years().into_iter().collect::<Vec<_>>(), vec![2021, 2022, 2023]);

    let sig = &analysis.sig[&2023];
    assert_eq!(sig.chiffre_affaires, 1_120_000.0);
    assert_eq!(sig.marge_commerciale, 1_120_000.0 - 560_000.0);
    assert_eq!(sig.charges_personnel, 140_000.0);
    assert_eq!(sig.resultat_net, 1_120_000.0 - (560_000.0 + 35_000.0 + 25_000.0 + 140_000.0 + 45_000.0));

    let ratios = &analysis.ratios[&2023];
    assert_eq!(ratios.dettes_financieres, 200_000.0);
    assert_eq!(ratios.ratio_endettement, Ratio::Value(200_000.0 / 580_000.0));
    assert!(ratios.capacite_remboursement.value().is_some());

    for (year, wc) in &analysis.working_capital {
        assert_eq!(wc.tn, wc.fr - wc.bfr, "tn invariant broken for {}", year);
    }

    let wc = &analysis.working_capital[&2023];
    assert_eq!(wc.fr, (580_000.0 + 200_000.0) - (380_000.0 + 100_000.0));
    assert_eq!(wc.bfr, (160_000.0 + 240_000.0) - (110_000.0 + 11_000.0 + 14_000.0));
    assert_eq!(wc.caf, sig.resultat_net + 45_000.0);

    for (year, c) in &analysis.conformity {
        assert_eq!(c.global, c.rentabilite && c.endettement && c.liquidite && c.autonomie, "{}", year);
    }

    assert_eq!(analysis.score.year, Some(2023));
    assert!((analysis.score.score_total - expected_total(CreditAnalyzer::default().config(), &analysis.score.scores_detailles)).abs() < 1e-6);
    assert!((0.0..=100.0).contains(&analysis.score.score_total));

    let p = &analysis.provision;
    assert_eq!(p.provision_requise, p.montant_pret * p.taux_provision);
    assert_eq!(p.montant_net, p.montant_pret - p.provision_requise);
}

#[test]
fn test_cash_flow_statement_does_not_change_aggregates() {
    let analyzer = CreditAnalyzer::default();
    let with = analyzer.analyze(&statements(true), 10_000.0).unwrap();
    let without = analyzer.analyze(&statements(false), 10_000.0).unwrap();

    assert!(with.ledger.count_by_source(StatementSource::CashFlow) > 0);
    assert_eq!(without.ledger.count_by_source(StatementSource::CashFlow), 0);
    assert_eq!(with.sig, without.sig);
    assert_eq!(with.ratios, without.ratios);
    assert_eq!(with.working_capital, without.working_capital);
    assert_eq!(with.score, without.score);
}

#[test]
fn test_cash_flow_lines_are_classified() {
    let ledger = Ledger::from_statements(&statements(true), &ChartOfAccounts::cobac());
    let nature_of = |code: &str| {
        ledger
            .entries()
            .iter()
            .find(|e| e.statement_source == StatementSource::CashFlow && e.account_code == code)
            .map(|e| e.nature)
    };

    assert_eq!(nature_of("FA"), Some(Nature::CashIn));
    assert_eq!(nature_of("FF"), Some(Nature::Investing));
    assert_eq!(nature_of("FK"), Some(Nature::Financing));
    assert_eq!(nature_of("ZA"), Some(Nature::Other));
}

#[test]
fn test_wide_to_long_round_trip() {
    let table = RawTable::from_csv_str(CPC).unwrap();
    let entries = normalize(&table, StatementSource::IncomeStatement, &ChartOfAccounts::cobac());
    assert_eq!(entries.len(), 7 * 3);

    let mut regrouped: BTreeMap<(String, i32), f64> = BTreeMap::new();
    for e in &entries {
        *regrouped.entry((e.account_code.clone(), e.year)).or_insert(0.0) += e.amount;
    }

    for row in &table.rows {
        for (idx, year) in [(2, 2021), (3, 2022), (4, 2023)] {
            let original = parse_amount(&row[idx]).unwrap();
            assert_eq!(regrouped[&(row[0].clone(), year)], original);
        }
    }
}

#[test]
fn test_reference_scenario_profitability() {
    let statements = FinancialStatements {
        balance_sheet: RawTable::from_csv_str("account_code,account_label,2023\n101,Capital,1000\n").unwrap(),
        income_statement: RawTable::from_csv_str(
            "account_code,account_label,2023\n701,Ventes,600000\n601,Achats de marchandises,400000\n",
        )
        .unwrap(),
        cash_flow: None,
    };

    let analysis = CreditAnalyzer::default().analyze(&statements, 0.0).unwrap();
    assert_eq!(analysis.sig[&2023].resultat_net, 200_000.0);

    let margin = analysis.ratios[&2023].rentabilite_nette.value().unwrap();
    assert!((margin - 33.333).abs() < 0.01);
    assert_eq!(analysis.score.scores_detailles.rentabilite, 25);
    assert_eq!(analysis.score.scores_detailles.croissance, 7);
}

#[test]
fn test_malformed_and_structural_issues_never_fail() {
    let statements = FinancialStatements {
        balance_sheet: RawTable::from_csv_str("foo,bar\n1,2\n").unwrap(),
        income_statement: RawTable::from_csv_str(
            "compte,libelle,2023.0\n701.0,Ventes,abc\n,Ligne vide,500\n702,Ventes,\"1 200,50\"\n",
        )
        .unwrap(),
        cash_flow: None,
    };

    let analysis = CreditAnalyzer::default().analyze(&statements, 1_000.0).unwrap();
    assert!(!analysis.has_sufficient_data());
    assert_eq!(analysis.ledger.count_by_source(StatementSource::BalanceSheet), 0);
    assert_eq!(analysis.ledger.len(), 2);
    assert_eq!(analysis.sig[&2023].chiffre_affaires, 1200.5);
    assert!(analysis.ratios[&2023].ratio_endettement.is_undefined());
    assert_eq!(analysis.ratios[&2023].ratio_liquidite, Ratio::Value(0.0));
}

#[test]
fn test_empty_statements_score_worst_case() {
    let analysis = CreditAnalyzer::default()
        .analyze(&FinancialStatements::default(), 80_000.0)
        .unwrap();

    assert!(analysis.sig.is_empty());
    assert_eq!(analysis.score.score_total, 0.0);
    assert_eq!(analysis.score.categorie, Category::E);
    assert_eq!(analysis.score.scores_detailles, SubScores::default());
    assert_eq!(analysis.provision.montant_net, 0.0);
}

#[test]
fn test_category_is_monotonic_in_score() {
    let thresholds = CategoryThresholds::default();
    let mut previous = Category::E;
    for step in 0..=1000 {
        let category = thresholds.categorize(step as f64 / 10.0);
        assert!(category <= previous);
        previous = category;
    }
    assert_eq!(previous, Category::A);
}

#[test]
fn test_provisioning_reference_values() {
    let engine = ScoringEngine::new(RegulatoryConfig::default()).unwrap();
    let p = engine.calculate_provisioning(100_000.0, Category::D).unwrap();
    assert_eq!((p.provision_requise, p.montant_net), (50_000.0, 50_000.0));

    let err = engine.calculate_provisioning_for_code(100_000.0, "F").unwrap_err();
    assert!(err.to_string().contains("'F'"));
}

#[test]
fn test_custom_configuration_changes_category() {
    let json = serde_json::to_string(&RegulatoryConfig::cobac()).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value["weights"] = serde_json::json!({
        "rentabilite": 1.0,
        "structure": 1.0,
        "liquidite": 1.0,
        "tresorerie": 1.0,
        "croissance": 1.0
    });
    let config = RegulatoryConfig::from_json(&value.to_string()).unwrap();

    let analysis = CreditAnalyzer::new(config.clone()).analyze(&statements(false), 100_000.0).unwrap();
    let s = &analysis.score.scores_detailles;
    let raw = s.rentabilite + s.structure + s.liquidite + s.tresorerie + s.croissance;

    assert_eq!(analysis.score.score_total, raw as f64);
    assert_eq!(analysis.score.categorie, config.categories.categorize(raw as f64));
    assert_eq!(analysis.provision.categorie, analysis.score.categorie);
}

#[test]
fn test_custom_chart_from_json() {
    let mut chart = ChartOfAccounts::cobac();
    chart.name = "Custom".to_string();
    chart.income_statement.natures.insert(
        0,
        NatureRule {
            matcher: Matcher::prefix("709"),
            nature: Nature::Other,
        },
    );
    let chart = ChartOfAccounts::from_json(&chart.to_json().unwrap()).unwrap();

    assert_eq!(chart.classify("709", "Rabais accordés", StatementSource::IncomeStatement), Classification::OTHER);
    assert_eq!(
        chart.classify("701", "Ventes", StatementSource::IncomeStatement).nature,
        Nature::Product
    );
}

struct ThresholdModel;

impl RiskClassifier for ThresholdModel {
    fn predict(&self, features: &FeatureVector) -> Result<RiskPrediction> {
        if features.as_array().iter().any(|v| !v.is_finite()) {
            return Err(CreditAnalysisError::Classifier("non-finite feature".to_string()));
        }
        let probability = if features.tn < 0.0 { 0.8 } else { 0.1 };
        Ok(RiskPrediction {
            predicted_class: u8::from(probability >= 0.5),
            probability,
        })
    }
}

#[test]
fn test_assessment_with_classifier() {
    let analyzer = CreditAnalyzer::default();
    let analysis = analyzer.analyze(&statements(true), 100_000.0).unwrap();

    let features = analysis.features.as_ref().unwrap();
    assert_eq!(features.year, 2023);
    assert_eq!(features.to_vec().len(), FEATURE_NAMES.len());
    assert_eq!(FEATURE_SET_VERSION, 1);

    let assessment = analyzer.assess(&analysis, Some(&ThresholdModel)).unwrap();
    let prediction = assessment.prediction.unwrap();
    assert_eq!(
        assessment.decision,
        consolidate(analysis.score.categorie, Some(prediction.probability))
    );
    assert_eq!(assessment.receivable_class, analysis.score.categorie.receivable_class());

    let critical = assessment
        .alerts
        .iter()
        .any(|a| matches!(a, Alert::CriticalCategory { .. }));
    assert_eq!(critical, analysis.score.categorie >= Category::D);
}

#[test]
fn test_analysis_serializes_to_json() {
    let analysis = CreditAnalyzer::default().analyze(&statements(false), 100_000.0).unwrap();
    let json = serde_json::to_value(&analysis).unwrap();

    assert!(json["sig"]["2023"]["chiffre_affaires"].is_number());
    assert_eq!(json["ratios"]["2023"]["ratio_endettement"]["kind"], "value");
    assert!(json["score"]["categorie"].is_string());

    let back: CreditAnalysis = serde_json::from_value(json).unwrap();
    assert_eq!(back.sig, analysis.sig);
    assert_eq!(back.ledger.len(), analysis.ledger.len());
    assert_eq!(back.score.categorie, analysis.score.categorie);
}

#[test]
fn test_schema_generation() {
    let schema = RegulatoryConfig::schema_as_json().unwrap();
    assert!(schema.contains("thresholds"));
    assert!(schema.contains("provision_rates"));
}
