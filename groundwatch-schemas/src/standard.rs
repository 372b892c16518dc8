use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_JURISDICTION: &str = "WHO/EPA";

/// Permissible limits (mg/L) for heavy metals under one regulatory guideline.
///
/// Metal names are matched exactly, so "Lead" and "lead" are different keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardsTable {
    pub jurisdiction: String,
    pub limits: BTreeMap<String, f64>,
}

impl StandardsTable {
    pub fn new(jurisdiction: &str) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            limits: BTreeMap::new(),
        }
    }

    /// The WHO/EPA drinking water limits used when no other table is configured.
    pub fn who_epa() -> Self {
        Self::new(DEFAULT_JURISDICTION)
            .with_limit("Lead", 0.01)
            .with_limit("Mercury", 0.001)
            .with_limit("Cadmium", 0.003)
            .with_limit("Arsenic", 0.01)
            .with_limit("Chromium", 0.05)
            .with_limit("Copper", 2.0)
            .with_limit("Zinc", 3.0)
            .with_limit("Nickel", 0.07)
    }

    pub fn with_limit(mut self, metal: &str, limit_mg_l: f64) -> Self {
        self.limits.insert(metal.to_string(), limit_mg_l);
        self
    }

    /// Returns the permissible limit for `metal`, if the table defines a usable one.
    ///
    /// Zero, negative and non-finite limits are treated as absent.
    pub fn limit_for(&self, metal: &str) -> Option<f64> {
        self.limits
            .get(metal)
            .copied()
            .filter(|limit| limit.is_finite() && *limit > 0.0)
    }
}

impl Default for StandardsTable {
    fn default() -> Self {
        Self::who_epa()
    }
}
