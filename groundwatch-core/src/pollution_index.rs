//! Heavy Metal Pollution Index (HMPI) calculation.
//!
//! Each metal with a known standard `S` and concentration `C` is weighted by
//! `W = 1 / S` and contributes `(C / S) * W` to the numerator and `W` to the
//! denominator. The index is the ratio of the two sums, or zero when no reading
//! matched a standard.

use groundwatch_schemas::{
    calculation::ContaminationLevel, sample::WaterSample, standard::StandardsTable,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub const MODERATE_THRESHOLD: f64 = 100.0;
pub const HIGH_THRESHOLD: f64 = 150.0;
pub const VERY_HIGH_THRESHOLD: f64 = 300.0;

/// Per-metal contribution above which a metal-specific recommendation is added.
const CONTRIBUTION_LIMIT_PERCENT: f64 = 100.0;

pub const TREATMENT_REQUIRED: &str = "Immediate water treatment required";
pub const REGULAR_MONITORING: &str = "Regular monitoring recommended";
pub const LEAD_PLUMBING: &str = "Lead contamination detected - check plumbing systems";
pub const MERCURY_INDUSTRIAL: &str = "Mercury contamination - investigate industrial sources";
pub const WITHIN_LIMITS: &str = "Water quality within acceptable limits";
pub const CONTINUE_MONITORING: &str = "Continue regular monitoring";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexResult {
    pub index: f64,
    pub level: ContaminationLevel,
    /// Concentration of each assessed metal as a percentage of its own standard.
    pub contributions: BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
}

impl IndexResult {
    pub fn requires_treatment(&self) -> bool {
        self.index > MODERATE_THRESHOLD
    }
}

/// Computes the HMPI for one sample's readings (metal name to mg/L).
///
/// Readings for metals absent from `standards` are ignored. An empty or fully
/// unknown set of readings yields an index of zero.
pub fn calculate_hmpi(readings: &BTreeMap<String, f64>, standards: &StandardsTable) -> IndexResult {
    let mut total_weighted_ratio = 0.0;
    let mut total_weight = 0.0;
    let mut contributions = BTreeMap::new();

    for (metal, &concentration) in readings {
        let Some(standard) = standards.limit_for(metal) else {
            debug!(metal = %metal, jurisdiction = %standards.jurisdiction, "no standard for metal, skipping");
            continue;
        };

        let weight = 1.0 / standard;
        let ratio = concentration / standard;
        total_weighted_ratio += ratio * weight;
        total_weight += weight;
        contributions.insert(metal.clone(), ratio * 100.0);
    }

    let index = if total_weight > 0.0 {
        total_weighted_ratio / total_weight
    } else {
        0.0
    };

    let level = classify(index);
    let recommendations = recommend(index, &contributions);
    debug!(index, level = %level, metals = contributions.len(), "computed HMPI");

    IndexResult {
        index,
        level,
        contributions,
        recommendations,
    }
}

/// Maps an index value onto its contamination band. Each band's lower bound is exclusive.
pub fn classify(index: f64) -> ContaminationLevel {
    if index > VERY_HIGH_THRESHOLD {
        ContaminationLevel::VeryHigh
    } else if index > HIGH_THRESHOLD {
        ContaminationLevel::High
    } else if index > MODERATE_THRESHOLD {
        ContaminationLevel::Moderate
    } else {
        ContaminationLevel::Low
    }
}

/// Builds the ordered recommendation list for an index and its per-metal contributions.
pub fn recommend(index: f64, contributions: &BTreeMap<String, f64>) -> Vec<String> {
    let mut recommendations = Vec::new();
    let exceeds = |metal: &str| {
        contributions
            .get(metal)
            .map_or(false, |c| *c > CONTRIBUTION_LIMIT_PERCENT)
    };

    if index > MODERATE_THRESHOLD {
        recommendations.push(TREATMENT_REQUIRED.to_string());
        recommendations.push(REGULAR_MONITORING.to_string());
    }
    if exceeds("Lead") {
        recommendations.push(LEAD_PLUMBING.to_string());
    }
    if exceeds("Mercury") {
        recommendations.push(MERCURY_INDUSTRIAL.to_string());
    }
    if index <= MODERATE_THRESHOLD {
        recommendations.push(WITHIN_LIMITS.to_string());
        recommendations.push(CONTINUE_MONITORING.to_string());
    }

    recommendations
}

/// Folds a sample's readings into the calculator's input. A later reading of the
/// same metal replaces an earlier one.
pub fn readings_from_sample(sample: &WaterSample) -> BTreeMap<String, f64> {
    sample
        .heavy_metals
        .iter()
        .map(|r| (r.metal_type.clone(), r.concentration_mg_l))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn readings(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(m, c)| (m.to_string(), *c)).collect()
    }

    #[test]
    fn worked_example_reproduces_double_weighting() {
        let standards = StandardsTable::new("test")
            .with_limit("Lead", 0.01)
            .with_limit("Mercury", 0.001);
        let result = calculate_hmpi(&readings(&[("Lead", 0.02), ("Mercury", 0.0005)]), &standards);

        assert_relative_eq!(result.contributions["Lead"], 200.0, epsilon = 1e-9);
        assert_relative_eq!(result.contributions["Mercury"], 50.0, epsilon = 1e-9);
        assert_relative_eq!(result.index, 700.0 / 1100.0, epsilon = 1e-9);
        assert_eq!(result.level, ContaminationLevel::Low);
        assert_eq!(
            result.recommendations,
            vec![LEAD_PLUMBING, WITHIN_LIMITS, CONTINUE_MONITORING]
        );
    }

    #[test]
    fn band_boundaries_are_exclusive_on_the_lower_side() {
        assert_eq!(classify(0.0), ContaminationLevel::Low);
        assert_eq!(classify(100.0), ContaminationLevel::Low);
        assert_eq!(classify(100.01), ContaminationLevel::Moderate);
        assert_eq!(classify(150.0), ContaminationLevel::Moderate);
        assert_eq!(classify(150.01), ContaminationLevel::High);
        assert_eq!(classify(300.0), ContaminationLevel::High);
        assert_eq!(classify(300.01), ContaminationLevel::VeryHigh);
    }

    #[test]
    fn empty_readings_default_to_zero_and_acceptable() {
        let result = calculate_hmpi(&BTreeMap::new(), &StandardsTable::who_epa());
        assert_eq!(result.index, 0.0);
        assert_eq!(result.level, ContaminationLevel::Low);
        assert!(result.contributions.is_empty());
        assert_eq!(result.recommendations, vec![WITHIN_LIMITS, CONTINUE_MONITORING]);
    }

    #[test]
    fn unknown_metals_contribute_nothing() {
        let standards = StandardsTable::who_epa();
        let known = calculate_hmpi(&readings(&[("Cadmium", 0.006)]), &standards);
        let mixed = calculate_hmpi(
            &readings(&[("Cadmium", 0.006), ("Uranium", 5.0), ("lead", 9.0)]),
            &standards,
        );

        assert_eq!(known.index, mixed.index);
        assert_eq!(known.contributions, mixed.contributions);
        assert!(!mixed.contributions.contains_key("Uranium"));

        let only_unknown = calculate_hmpi(&readings(&[("Uranium", 5.0)]), &standards);
        assert_eq!(only_unknown.index, 0.0);
    }

    #[test]
    fn index_is_monotonic_in_each_concentration() {
        let standards = StandardsTable::who_epa();
        let base = readings(&[
            ("Lead", 0.5),
            ("Mercury", 0.02),
            ("Cadmium", 0.1),
            ("Copper", 3.0),
            ("Zinc", 1.0),
        ]);
        let base_index = calculate_hmpi(&base, &standards).index;

        for metal in base.keys() {
            for factor in [1.01, 1.5, 10.0] {
                let mut bumped = base.clone();
                *bumped.get_mut(metal).unwrap() *= factor;
                let bumped_index = calculate_hmpi(&bumped, &standards).index;
                assert!(
                    bumped_index >= base_index,
                    "raising {} by {} lowered the index",
                    metal,
                    factor
                );
            }
        }
    }

    #[test]
    fn doubling_a_lone_metal_doubles_the_index() {
        let standards = StandardsTable::who_epa();
        let single = calculate_hmpi(&readings(&[("Arsenic", 0.4), ("Zinc", 0.0)]), &standards);
        let doubled = calculate_hmpi(&readings(&[("Arsenic", 0.8), ("Zinc", 0.0)]), &standards);
        assert_relative_eq!(doubled.index, single.index * 2.0, epsilon = 1e-9);
    }

    #[test]
    fn polluted_sample_gets_treatment_and_metal_specific_advice_in_order() {
        let standards = StandardsTable::who_epa();
        let result = calculate_hmpi(&readings(&[("Lead", 2.0), ("Mercury", 0.5)]), &standards);
        assert!(result.requires_treatment());
        assert_eq!(
            result.recommendations,
            vec![TREATMENT_REQUIRED, REGULAR_MONITORING, LEAD_PLUMBING, MERCURY_INDUSTRIAL]
        );
    }

    #[test]
    fn recommendations_are_stable_across_invocations() {
        let standards = StandardsTable::who_epa();
        let input = readings(&[("Lead", 1.3), ("Nickel", 0.2), ("Mercury", 0.3)]);
        let first = calculate_hmpi(&input, &standards);
        for _ in 0..5 {
            assert_eq!(calculate_hmpi(&input, &standards), first);
        }
    }

    #[test]
    fn contributions_can_exceed_one_hundred_percent() {
        let result = calculate_hmpi(&readings(&[("Copper", 5.0)]), &StandardsTable::who_epa());
        assert_relative_eq!(result.contributions["Copper"], 250.0, epsilon = 1e-9);
    }
}
