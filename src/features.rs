//! Feature vector handed to an external default-risk classifier.
//!
//! The model itself lives outside this crate; [`RiskClassifier`] is the seam.
//! Field order is part of the contract with trained models and is versioned by
//! [`FEATURE_SET_VERSION`].

use crate::error::Result;
use crate::schema::{Ratio, RatiosResult, SigResult, WorkingCapitalResult};
use crate::utils::growth_percent;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FEATURE_SET_VERSION: u32 = 1;

pub const FEATURE_NAMES: [&str; 23] = [
    "chiffre_affaires",
    "marge_commerciale",
    "valeur_ajoutee",
    "ebe",
    "resultat_net",
    "marge_commerciale_pct",
    "marge_ebe_pct",
    "marge_nette_pct",
    "rentabilite_nette",
    "ratio_endettement",
    "ratio_liquidite",
    "ratio_autonomie",
    "caf",
    "bfr",
    "fr",
    "tn",
    "caf_sur_ca",
    "bfr_sur_ca",
    "fr_sur_ca",
    "caf_couv_bfr",
    "fr_couv_bfr",
    "croissance_ca",
    "croissance_ebe",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureVector {
    pub year: i32,
    pub chiffre_affaires: f64,
    pub marge_commerciale: f64,
    pub valeur_ajoutee: f64,
    pub ebe: f64,
    pub resultat_net: f64,
    #[schemars(description = "Commercial margin / revenue, in percent (0 without revenue)")]
    pub marge_commerciale_pct: f64,
    pub marge_ebe_pct: f64,
    pub marge_nette_pct: f64,
    #[schemars(description = "Undefined ratios are encoded as 0")]
    pub rentabilite_nette: f64,
    pub ratio_endettement: f64,
    pub ratio_liquidite: f64,
    pub ratio_autonomie: f64,
    pub caf: f64,
    pub bfr: f64,
    pub fr: f64,
    pub tn: f64,
    pub caf_sur_ca: f64,
    pub bfr_sur_ca: f64,
    pub fr_sur_ca: f64,
    #[schemars(description = "CAF / |BFR| (0 when BFR is 0)")]
    pub caf_couv_bfr: f64,
    pub fr_couv_bfr: f64,
    #[schemars(description = "Revenue growth against the previous calendar year, in percent")]
    pub croissance_ca: f64,
    pub croissance_ebe: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order. The year is not a feature.
    pub fn as_array(&self) -> [f64; 23] {
        [
            self.chiffre_affaires,
            self.marge_commerciale,
            self.valeur_ajoutee,
            self.ebe,
            self.resultat_net,
            self.marge_commerciale_pct,
            self.marge_ebe_pct,
            self.marge_nette_pct,
            self.rentabilite_nette,
            self.ratio_endettement,
            self.ratio_liquidite,
            self.ratio_autonomie,
            self.caf,
            self.bfr,
            self.fr,
            self.tn,
            self.caf_sur_ca,
            self.bfr_sur_ca,
            self.fr_sur_ca,
            self.caf_couv_bfr,
            self.fr_couv_bfr,
            self.croissance_ca,
            self.croissance_ebe,
        ]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.as_array().to_vec()
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.as_array())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskPrediction {
    #[schemars(description = "1 when the model predicts a default")]
    pub predicted_class: u8,
    #[schemars(description = "Predicted probability of default, between 0.0 and 1.0")]
    pub probability: f64,
}

/// An opaque default-risk model.
pub trait RiskClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<RiskPrediction>;
}

fn share_of_revenue(value: f64, revenue: f64) -> f64 {
    if revenue > 0.0 {
        value / revenue * 100.0
    } else {
        0.0
    }
}

fn coverage(value: f64, bfr: f64) -> f64 {
    if bfr != 0.0 {
        value / bfr.abs()
    } else {
        0.0
    }
}

fn ratio_or_zero(ratio: Ratio) -> f64 {
    ratio.value().unwrap_or(0.0)
}

/// Builds the features of the latest year present in all three maps, or
/// `None` when no year is complete.
pub fn build_features(
    sig: &BTreeMap<i32, SigResult>,
    ratios: &BTreeMap<i32, RatiosResult>,
    working_capital: &BTreeMap<i32, WorkingCapitalResult>,
) -> Option<FeatureVector> {
    let year = *sig
        .keys()
        .rev()
        .find(|y| ratios.contains_key(y) && working_capital.contains_key(y))?;

    let s = &sig[&year];
    let r = &ratios[&year];
    let wc = &working_capital[&year];
    let ca = s.chiffre_affaires;

    let (croissance_ca, croissance_ebe) = match year.checked_sub(1).and_then(|y| sig.get(&y)) {
        Some(prev) => {
            let ebe_growth = if prev.ebe != 0.0 {
                (s.ebe - prev.ebe) / prev.ebe.abs() * 100.0
            } else {
                0.0
            };
            (growth_percent(ca, prev.chiffre_affaires), ebe_growth)
        }
        None => (0.0, 0.0),
    };

    Some(FeatureVector {
        year,
        chiffre_affaires: ca,
        marge_commerciale: s.marge_commerciale,
        valeur_ajoutee: s.valeur_ajoutee,
        ebe: s.ebe,
        resultat_net: s.resultat_net,
        marge_commerciale_pct: share_of_revenue(s.marge_commerciale, ca),
        marge_ebe_pct: share_of_revenue(s.ebe, ca),
        marge_nette_pct: share_of_revenue(s.resultat_net, ca),
        rentabilite_nette: ratio_or_zero(r.rentabilite_nette),
        ratio_endettement: ratio_or_zero(r.ratio_endettement),
        ratio_liquidite: ratio_or_zero(r.ratio_liquidite),
        ratio_autonomie: ratio_or_zero(r.ratio_autonomie),
        caf: wc.caf,
        bfr: wc.bfr,
        fr: wc.fr,
        tn: wc.tn,
        caf_sur_ca: share_of_revenue(wc.caf, ca),
        bfr_sur_ca: share_of_revenue(wc.bfr, ca),
        fr_sur_ca: share_of_revenue(wc.fr, ca),
        caf_couv_bfr: coverage(wc.caf, wc.bfr),
        fr_couv_bfr: coverage(wc.fr, wc.bfr),
        croissance_ca,
        croissance_ebe,
    })
}
