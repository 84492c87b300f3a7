//! Canonical clinical input state collected across the wizard steps.
//!
//! Inputs are held per domain as a map of attribute name → [`FieldValue`].
//! Every field is seeded with a documented default at session start, so an
//! incomplete session always carries a scoreable value for each attribute.
//! Payload coercion (earlyguard-engine) is the only consumer that turns
//! these raw values into service-shaped numbers and codes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// One independently scored health category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Metabolic,
    Cardiac,
    Hepatic,
    Mental,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Metabolic,
        Domain::Cardiac,
        Domain::Hepatic,
        Domain::Mental,
    ];

    /// Stable name used in service paths and result maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Metabolic => "metabolic",
            Domain::Cardiac => "cardiac",
            Domain::Hepatic => "hepatic",
            Domain::Mental => "mental",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single clinical attribute as held in session state.
///
/// `Text` carries raw user entry (numeric vitals typed into a form, or a
/// categorical selection); whether it parses as a number or validates as a
/// code is decided by the field's schema at payload-construction time, not
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn number(v: f64) -> Self {
        FieldValue::Number(v)
    }

    pub fn text(v: impl Into<String>) -> Self {
        FieldValue::Text(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Flag(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// Per-domain attribute maps plus the set of domains excluded from scoring.
///
/// Owned by the wizard's session; the engines only ever read a borrow or a
/// caller-made copy, and the extraction pipeline writes through the single
/// confirmation transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInputs {
    domains: BTreeMap<Domain, BTreeMap<String, FieldValue>>,
    skipped: BTreeSet<Domain>,
}

impl ClinicalInputs {
    /// Fresh input state with every attribute of every domain at its
    /// documented default.
    pub fn seeded() -> Self {
        let mut domains = BTreeMap::new();

        domains.insert(
            Domain::Metabolic,
            attrs([
                ("glucose", FieldValue::Number(100.0)),
                ("blood_pressure", FieldValue::Number(72.0)),
                ("skin_thickness", FieldValue::Number(20.0)),
                ("insulin", FieldValue::Number(80.0)),
                ("bmi", FieldValue::Number(25.0)),
                ("family_history", FieldValue::Flag(true)),
                // Lifestyle context shown alongside the vitals; not part of
                // any service payload.
                ("daily_steps", FieldValue::Number(6000.0)),
                ("sleep_hours", FieldValue::Number(7.0)),
            ]),
        );

        domains.insert(
            Domain::Cardiac,
            attrs([
                ("chest_pain", FieldValue::text("typical")),
                ("resting_bp", FieldValue::Number(120.0)),
                ("cholesterol", FieldValue::Number(200.0)),
                ("max_heart_rate", FieldValue::Number(150.0)),
                ("exercise_angina", FieldValue::Flag(false)),
                ("oldpeak", FieldValue::Number(1.0)),
                ("slope", FieldValue::text("flat")),
                ("major_vessels", FieldValue::Number(0.0)),
                ("thalassemia", FieldValue::text("normal")),
            ]),
        );

        domains.insert(
            Domain::Hepatic,
            attrs([
                ("total_bilirubin", FieldValue::Number(0.8)),
                ("direct_bilirubin", FieldValue::Number(0.2)),
                ("alkaline_phosphotase", FieldValue::Number(100.0)),
                ("alamine_aminotransferase", FieldValue::Number(30.0)),
                ("aspartate_aminotransferase", FieldValue::Number(25.0)),
                ("total_proteins", FieldValue::Number(7.0)),
                ("albumin", FieldValue::Number(4.0)),
                ("albumin_globulin_ratio", FieldValue::Number(1.0)),
            ]),
        );

        domains.insert(
            Domain::Mental,
            attrs([
                ("stress_level", FieldValue::Number(5.0)),
                ("workload", FieldValue::Number(5.0)),
                ("sleep_quality", FieldValue::Number(7.0)),
            ]),
        );

        Self {
            domains,
            skipped: BTreeSet::new(),
        }
    }

    pub fn get(&self, domain: Domain, field: &str) -> Option<&FieldValue> {
        self.domains.get(&domain).and_then(|m| m.get(field))
    }

    pub fn set(&mut self, domain: Domain, field: impl Into<String>, value: FieldValue) {
        self.domains
            .entry(domain)
            .or_default()
            .insert(field.into(), value);
    }

    /// Mark a domain as excluded from (or re-included in) aggregation.
    pub fn set_skipped(&mut self, domain: Domain, skip: bool) {
        if skip {
            self.skipped.insert(domain);
        } else {
            self.skipped.remove(&domain);
        }
    }

    pub fn is_skipped(&self, domain: Domain) -> bool {
        self.skipped.contains(&domain)
    }

    /// Domains that take part in aggregation, in declaration order.
    pub fn active_domains(&self) -> Vec<Domain> {
        Domain::ALL
            .iter()
            .copied()
            .filter(|d| !self.skipped.contains(d))
            .collect()
    }

    pub fn fields(&self, domain: Domain) -> Option<&BTreeMap<String, FieldValue>> {
        self.domains.get(&domain)
    }
}

impl Default for ClinicalInputs {
    fn default() -> Self {
        Self::seeded()
    }
}

fn attrs<const N: usize>(pairs: [(&str, FieldValue); N]) -> BTreeMap<String, FieldValue> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_inputs_cover_all_domains() {
        let inputs = ClinicalInputs::seeded();
        for domain in Domain::ALL {
            let fields = inputs.fields(domain).expect("domain seeded");
            assert!(!fields.is_empty(), "{domain} has no seeded fields");
        }
    }

    #[test]
    fn test_skip_excludes_domain_from_active_set() {
        let mut inputs = ClinicalInputs::seeded();
        assert_eq!(inputs.active_domains().len(), 4);

        inputs.set_skipped(Domain::Hepatic, true);
        let active = inputs.active_domains();
        assert_eq!(active.len(), 3);
        assert!(!active.contains(&Domain::Hepatic));

        inputs.set_skipped(Domain::Hepatic, false);
        assert_eq!(inputs.active_domains().len(), 4);
    }

    #[test]
    fn test_set_overwrites_seeded_value() {
        let mut inputs = ClinicalInputs::seeded();
        inputs.set(Domain::Metabolic, "glucose", FieldValue::Number(180.0));
        assert_eq!(
            inputs.get(Domain::Metabolic, "glucose"),
            Some(&FieldValue::Number(180.0))
        );
    }
}
