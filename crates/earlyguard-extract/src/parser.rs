//! Pattern extraction of vital-sign candidates from recognized text.
//!
//! For each target field a case-insensitive "label-synonym, separator,
//! number" search is applied and the first match wins. Fields with no match
//! are simply absent from the result — not zero, not null. Thousands
//! separators are stripped before parsing.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Vital-sign fields the parser knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalField {
    Glucose,
    HeartRate,
    Steps,
    Sleep,
}

impl VitalField {
    pub const ALL: [VitalField; 4] = [
        VitalField::Glucose,
        VitalField::HeartRate,
        VitalField::Steps,
        VitalField::Sleep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VitalField::Glucose => "glucose",
            VitalField::HeartRate => "heart_rate",
            VitalField::Steps => "steps",
            VitalField::Sleep => "sleep",
        }
    }
}

impl fmt::Display for VitalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ExtractionParser {
    re_glucose: Regex,
    re_heart_rate: Regex,
    re_steps: Regex,
    re_sleep: Regex,
}

impl ExtractionParser {
    pub fn new() -> Self {
        Self {
            re_glucose: Regex::new(r"(?i)(?:glucose|sugar)[\s:]*(\d{2,3})").unwrap(),
            re_heart_rate: Regex::new(r"(?i)(?:heart rate|bpm|pulse)[\s:]*(\d{2,3})").unwrap(),
            // Step counts may carry a thousands separator.
            re_steps: Regex::new(r"(?i)(?:steps|count)[\s:]*(\d{1,5}(?:,\d{3})?)").unwrap(),
            re_sleep: Regex::new(r"(?i)(?:sleep|duration)[\s:]*(\d{1,2}(?:\.\d)?)").unwrap(),
        }
    }

    /// Extract candidates from recognized text.
    ///
    /// Pure and deterministic: identical text always yields the identical
    /// candidate set, and text with no recognizable fields yields an empty
    /// map, never an error.
    pub fn parse(&self, text: &str) -> BTreeMap<VitalField, f64> {
        let mut found = BTreeMap::new();

        if let Some(v) = first_number(&self.re_glucose, text) {
            found.insert(VitalField::Glucose, v);
        }
        if let Some(v) = first_number(&self.re_heart_rate, text) {
            found.insert(VitalField::HeartRate, v);
        }
        if let Some(v) = first_number(&self.re_steps, text) {
            found.insert(VitalField::Steps, v);
        }
        if let Some(v) = first_number(&self.re_sleep, text) {
            found.insert(VitalField::Sleep, v);
        }

        found
    }
}

impl Default for ExtractionParser {
    fn default() -> Self {
        Self::new()
    }
}

/// First capture of `re` in `text`, normalized and parsed.
fn first_number(re: &Regex, text: &str) -> Option<f64> {
    let m = re.captures(text)?.get(1)?;
    m.as_str().replace(',', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_glucose_and_steps_with_separator() {
        let parser = ExtractionParser::new();
        let text = "Daily report\nGlucose: 152 mg/dL\nSteps 8,432 today";
        let found = parser.parse(text);

        assert_eq!(found.get(&VitalField::Glucose), Some(&152.0));
        assert_eq!(found.get(&VitalField::Steps), Some(&8432.0));
        assert!(!found.contains_key(&VitalField::HeartRate));
        assert!(!found.contains_key(&VitalField::Sleep));
    }

    #[test]
    fn test_case_insensitive_synonyms() {
        let parser = ExtractionParser::new();
        let found = parser.parse("SUGAR 140, PULSE: 88, sleep 7.5");

        assert_eq!(found.get(&VitalField::Glucose), Some(&140.0));
        assert_eq!(found.get(&VitalField::HeartRate), Some(&88.0));
        assert_eq!(found.get(&VitalField::Sleep), Some(&7.5));
    }

    #[test]
    fn test_first_match_wins() {
        let parser = ExtractionParser::new();
        let found = parser.parse("glucose 110 ... later glucose 190");
        assert_eq!(found.get(&VitalField::Glucose), Some(&110.0));
    }

    #[test]
    fn test_unrecognizable_text_yields_empty_set() {
        let parser = ExtractionParser::new();
        assert!(parser.parse("lorem ipsum dolor sit amet").is_empty());
        assert!(parser.parse("").is_empty());
    }

    #[test]
    fn test_deterministic_and_idempotent() {
        let parser = ExtractionParser::new();
        let text = "Heart Rate: 72 bpm, Sleep duration 6.5 hours, steps 12,000";
        let first = parser.parse(text);
        let second = parser.parse(text);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
