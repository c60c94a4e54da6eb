use cobac_credit_scoring::{CreditAnalyzer, FinancialStatements, RawTable};

const BILAN: &str = "\
account_code,account_label,2022,2023
101,Capital social,450000,500000
106,Réserves,60000,80000
162,Emprunts bancaires,250000,200000
231,Bâtiments,350000,380000
311,Stocks de marchandises,150000,160000
411,Clients,210000,240000
401,Fournisseurs,100000,110000
441,Etat impôt sur les bénéfices,9000,11000
521,Banque,80000,90000
";

const CPC: &str = "\
account_code,account_label,2022,2023
701,Ventes de marchandises,900000,1050000
601,Achats de marchandises,500000,560000
622,Locations,22000,25000
641,Rémunérations du personnel,130000,140000
681,Dotations aux amortissements,42000,45000
";

fn main() -> anyhow::Result<()> {
    let statements = FinancialStatements {
        balance_sheet: RawTable::from_csv_str(BILAN)?,
        income_statement: RawTable::from_csv_str(CPC)?,
        cash_flow: None,
    };

    let analyzer = CreditAnalyzer::default();
    let analysis = analyzer.analyze(&statements, 250_000.0)?;

    if !analysis.has_sufficient_data() {
        anyhow::bail!("statements did not yield a balance sheet and an income statement");
    }

    for (year, ratios) in &analysis.ratios {
        println!(
            "{}: rentabilité {}%, endettement {}, liquidité {}, autonomie {}%",
            year, ratios.rentabilite_nette, ratios.ratio_endettement, ratios.ratio_liquidite, ratios.ratio_autonomie
        );
    }

    println!(
        "\nScore {:.2} -> catégorie {} ({})",
        analysis.score.score_total,
        analysis.score.categorie,
        analysis.score.categorie.label()
    );

    let assessment = analyzer.assess(&analysis, None)?;
    println!("Recommandation: {}", assessment.decision);
    for alert in &assessment.alerts {
        println!(" - {}", alert);
    }

    println!("\n{}", serde_json::to_string_pretty(&analysis.score)?);
    println!("{}", serde_json::to_string_pretty(&analysis.provision)?);

    Ok(())
}
