use crate::regulation::ConformityThresholds;
use crate::schema::{ConformiteResult, RatiosResult};
use std::collections::BTreeMap;

/// Checks one year's ratios against the regulatory alert thresholds.
/// An undefined ratio fails its criterion.
pub fn check_conformity(ratios: &RatiosResult, thresholds: &ConformityThresholds) -> ConformiteResult {
    ConformiteResult::new(
        ratios.rentabilite_nette.at_least(thresholds.rentabilite_min),
        ratios.ratio_endettement.at_most(thresholds.endettement_max),
        ratios.ratio_liquidite.at_least(thresholds.liquidite_min),
        ratios.ratio_autonomie.at_least(thresholds.autonomie_min),
    )
}

pub fn check_conformity_by_year(
    ratios: &BTreeMap<i32, RatiosResult>,
    thresholds: &ConformityThresholds,
) -> BTreeMap<i32, ConformiteResult> {
    ratios
        .iter()
        .map(|(year, r)| (*year, check_conformity(r, thresholds)))
        .collect()
}
