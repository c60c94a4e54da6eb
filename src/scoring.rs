//! COBAC scoring: five tiered sub-scores on the latest fiscal year, a
//! weighted composite, the A–E category and the provisioning it implies.

use crate::error::Result;
use crate::regulation::RegulatoryConfig;
use crate::schema::{
    Category, ProvisionResult, Ratio, RatiosResult, ScoreResult, SigResult, SubScores, WorkingCapitalResult,
};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Sub-score used when fewer than two years of history are available.
pub const NEUTRAL_GROWTH_SCORE: u32 = 7;

pub struct ScoringEngine {
    config: RegulatoryConfig,
}

impl ScoringEngine {
    /// Fails on an invalid configuration.
    pub fn new(config: RegulatoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RegulatoryConfig {
        &self.config
    }

    /// Scores the latest year present in any of the maps. Never fails: a
    /// missing or undefined input only degrades its own sub-score.
    pub fn score(
        &self,
        sig: &BTreeMap<i32, SigResult>,
        ratios: &BTreeMap<i32, RatiosResult>,
        working_capital: &BTreeMap<i32, WorkingCapitalResult>,
    ) -> ScoreResult {
        let latest = [sig.keys().max(), ratios.keys().max(), working_capital.keys().max()]
            .into_iter()
            .flatten()
            .max()
            .copied();

        let Some(year) = latest else {
            warn!("No fiscal year available for scoring; returning worst-case result");
            return ScoreResult::worst_case();
        };

        let latest_ratios = ratios.get(&year);
        if latest_ratios.is_none() {
            warn!("No ratios for {}; profitability, structure and liquidity score 0", year);
        }

        let scores = SubScores {
            rentabilite: latest_ratios.map_or(0, |r| score_rentabilite(r.rentabilite_nette)),
            structure: latest_ratios.map_or(0, |r| score_structure(r.ratio_endettement, r.ratio_autonomie)),
            liquidite: latest_ratios.map_or(0, |r| score_liquidite(r.ratio_liquidite)),
            tresorerie: match working_capital.get(&year) {
                Some(wc) => score_tresorerie(wc),
                None => {
                    warn!("No working-capital indicators for {}; treasury scores 0", year);
                    0
                }
            },
            croissance: score_croissance(sig, ratios),
        };

        let score_total = self.weighted_total(&scores);
        let categorie = self.config.categories.categorize(score_total);

        debug!(
            "Scored {}: {:?} -> {:.2} (category {})",
            year, scores, score_total, categorie
        );

        ScoreResult {
            score_total,
            categorie,
            scores_detailles: scores,
            year: Some(year),
        }
    }

    pub fn weighted_total(&self, scores: &SubScores) -> f64 {
        let w = &self.config.weights;
        let total = scores.rentabilite as f64 * w.rentabilite
            + scores.structure as f64 * w.structure
            + scores.liquidite as f64 * w.liquidite
            + scores.tresorerie as f64 * w.tresorerie
            + scores.croissance as f64 * w.croissance;
        total.clamp(0.0, 100.0)
    }

    /// Provision required on a loan for the given category. A category with no
    /// configured rate means the configuration is broken and is an error.
    pub fn calculate_provisioning(&self, montant_pret: f64, categorie: Category) -> Result<ProvisionResult> {
        let taux_provision = self.config.provision_rate(categorie)?;
        let provision_requise = montant_pret * taux_provision;

        Ok(ProvisionResult {
            montant_pret,
            categorie,
            taux_provision,
            provision_requise,
            montant_net: montant_pret - provision_requise,
        })
    }

    /// Same as [`calculate_provisioning`](Self::calculate_provisioning) for a
    /// category code coming from outside the engine.
    pub fn calculate_provisioning_for_code(&self, montant_pret: f64, code: &str) -> Result<ProvisionResult> {
        self.calculate_provisioning(montant_pret, code.parse()?)
    }
}

pub fn score_rentabilite(net_margin: Ratio) -> u32 {
    let Some(m) = net_margin.value() else {
        return 0;
    };
    match m {
        m if m >= 15.0 => 25,
        m if m >= 10.0 => 20,
        m if m >= 7.0 => 16,
        m if m >= 5.0 => 12,
        m if m >= 3.0 => 8,
        m if m >= 0.0 => 4,
        _ => 0,
    }
}

pub fn score_endettement(debt_ratio: Ratio) -> u32 {
    let Some(d) = debt_ratio.value() else {
        return 3;
    };
    match d {
        d if d <= 0.5 => 15,
        d if d <= 1.0 => 12,
        d if d <= 1.5 => 9,
        d if d <= 2.0 => 6,
        _ => 3,
    }
}

pub fn score_autonomie(autonomy: Ratio) -> u32 {
    let Some(a) = autonomy.value() else {
        return 2;
    };
    match a {
        a if a >= 50.0 => 10,
        a if a >= 40.0 => 8,
        a if a >= 30.0 => 6,
        a if a >= 20.0 => 4,
        _ => 2,
    }
}

pub fn score_structure(debt_ratio: Ratio, autonomy: Ratio) -> u32 {
    score_endettement(debt_ratio) + score_autonomie(autonomy)
}

pub fn score_liquidite(current_ratio: Ratio) -> u32 {
    let Some(l) = current_ratio.value() else {
        return 0;
    };
    match l {
        l if l >= 2.0 => 20,
        l if l >= 1.5 => 16,
        l if l >= 1.2 => 12,
        l if l >= 1.0 => 8,
        l if l >= 0.8 => 4,
        _ => 0,
    }
}

pub fn score_tresorerie(wc: &WorkingCapitalResult) -> u32 {
    let (tn, caf, bfr) = (wc.tn, wc.caf, wc.bfr);
    if tn > 0.0 && caf > 0.0 && caf > bfr.abs() {
        15
    } else if tn > 0.0 && caf > 0.0 {
        12
    } else if tn > 0.0 || caf > 0.0 {
        8
    } else if tn >= -caf {
        4
    } else {
        0
    }
}

/// Growth between the last two SIG years: revenue growth and net-margin delta.
pub fn score_croissance(sig: &BTreeMap<i32, SigResult>, ratios: &BTreeMap<i32, RatiosResult>) -> u32 {
    let mut years = sig.keys().rev();
    let (Some(current), Some(previous)) = (years.next(), years.next()) else {
        return NEUTRAL_GROWTH_SCORE;
    };

    let (Some(r_now), Some(r_prev)) = (ratios.get(current), ratios.get(previous)) else {
        warn!(
            "Missing ratios for {} or {}; growth falls back to the neutral score",
            previous, current
        );
        return NEUTRAL_GROWTH_SCORE;
    };

    let ca_now = sig[current].chiffre_affaires;
    let ca_prev = sig[previous].chiffre_affaires;
    let croissance_ca = crate::utils::growth_percent(ca_now, ca_prev);

    let delta_renta = match (r_now.rentabilite_nette.value(), r_prev.rentabilite_nette.value()) {
        (Some(now), Some(prev)) => Some(now - prev),
        _ => None,
    };

    let renta_above = |threshold: f64| delta_renta.is_some_and(|d| d > threshold);

    if croissance_ca > 10.0 && renta_above(2.0) {
        15
    } else if croissance_ca > 5.0 && renta_above(0.0) {
        12
    } else if croissance_ca > 0.0 {
        9
    } else if croissance_ca >= -5.0 {
        6
    } else {
        3
    }
}
