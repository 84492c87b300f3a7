//! Service payload construction.
//!
//! Each domain has a fixed outbound field schema. Every schema entry names
//! the outbound field, where its value is sourced from (a clinical
//! attribute, a demographic, or a constant the services expect but the
//! wizard does not collect), and its documented safe default. Coercion is
//! defensive: malformed or missing inputs are substituted with the default
//! and logged as a data-quality warning — they never abort aggregation and
//! neither `NaN` nor an empty string ever reaches a service call.

use tracing::warn;

use earlyguard_common::{ClinicalInputs, Domain, FieldValue, Sex, UserProfile};

use crate::service::{PayloadValue, PredictionRequest};

/// Age sent to the services when the profile step was left blank.
const DEFAULT_AGE: f64 = 30.0;

/// Where an outbound field draws its value from.
enum Source {
    /// Numeric clinical attribute.
    Attr { attr: &'static str, default: f64 },
    /// Categorical attribute, mapped label → short service code.
    CodeAttr {
        attr: &'static str,
        codes: &'static [(&'static str, &'static str)],
        default: &'static str,
    },
    /// Boolean attribute mapped to a derived number.
    FlagAttr {
        attr: &'static str,
        on: f64,
        off: f64,
        default: f64,
    },
    Age,
    /// Male = 1, female = 0.
    SexCode,
    /// "male" / "female" label, as the hepatic service expects.
    SexLabel,
    Pregnancies,
    /// Fixed numeric field.
    Const(f64),
    /// Fixed code field.
    ConstCode(&'static str),
}

struct FieldSpec {
    name: &'static str,
    source: Source,
}

const CHEST_PAIN_CODES: &[(&str, &str)] = &[
    ("typical", "0"),
    ("atypical", "1"),
    ("non-anginal", "2"),
    ("asymptomatic", "3"),
];

const SLOPE_CODES: &[(&str, &str)] = &[
    ("upsloping", "0"),
    ("flat", "1"),
    ("downsloping", "2"),
];

const THALASSEMIA_CODES: &[(&str, &str)] = &[
    ("normal", "1"),
    ("fixed", "2"),
    ("reversible", "3"),
];

const METABOLIC_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "pregnancies", source: Source::Pregnancies },
    FieldSpec { name: "glucose", source: Source::Attr { attr: "glucose", default: 100.0 } },
    FieldSpec { name: "blood_pressure", source: Source::Attr { attr: "blood_pressure", default: 70.0 } },
    FieldSpec { name: "skin_thickness", source: Source::Attr { attr: "skin_thickness", default: 20.0 } },
    FieldSpec { name: "insulin", source: Source::Attr { attr: "insulin", default: 80.0 } },
    FieldSpec { name: "bmi", source: Source::Attr { attr: "bmi", default: 25.0 } },
    // Family history stands in for the pedigree function the service expects.
    FieldSpec {
        name: "pedigree",
        source: Source::FlagAttr { attr: "family_history", on: 0.8, off: 0.2, default: 0.2 },
    },
    FieldSpec { name: "age", source: Source::Age },
];

const CARDIAC_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "age", source: Source::Age },
    FieldSpec { name: "sex", source: Source::SexCode },
    FieldSpec {
        name: "chest_pain",
        source: Source::CodeAttr { attr: "chest_pain", codes: CHEST_PAIN_CODES, default: "0" },
    },
    FieldSpec { name: "resting_bp", source: Source::Attr { attr: "resting_bp", default: 120.0 } },
    FieldSpec { name: "cholesterol", source: Source::Attr { attr: "cholesterol", default: 200.0 } },
    FieldSpec { name: "fasting_bs", source: Source::Const(0.0) },
    FieldSpec { name: "resting_ecg", source: Source::ConstCode("0") },
    FieldSpec { name: "max_heart_rate", source: Source::Attr { attr: "max_heart_rate", default: 150.0 } },
    FieldSpec {
        name: "exercise_angina",
        source: Source::FlagAttr { attr: "exercise_angina", on: 1.0, off: 0.0, default: 0.0 },
    },
    FieldSpec { name: "oldpeak", source: Source::Attr { attr: "oldpeak", default: 0.0 } },
    FieldSpec {
        name: "slope",
        source: Source::CodeAttr { attr: "slope", codes: SLOPE_CODES, default: "1" },
    },
    FieldSpec { name: "major_vessels", source: Source::Attr { attr: "major_vessels", default: 0.0 } },
    FieldSpec {
        name: "thalassemia",
        source: Source::CodeAttr { attr: "thalassemia", codes: THALASSEMIA_CODES, default: "1" },
    },
];

const HEPATIC_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "age", source: Source::Age },
    FieldSpec { name: "sex", source: Source::SexLabel },
    FieldSpec { name: "total_bilirubin", source: Source::Attr { attr: "total_bilirubin", default: 0.8 } },
    FieldSpec { name: "direct_bilirubin", source: Source::Attr { attr: "direct_bilirubin", default: 0.2 } },
    FieldSpec { name: "alkaline_phosphotase", source: Source::Attr { attr: "alkaline_phosphotase", default: 100.0 } },
    FieldSpec { name: "alamine_aminotransferase", source: Source::Attr { attr: "alamine_aminotransferase", default: 30.0 } },
    FieldSpec { name: "aspartate_aminotransferase", source: Source::Attr { attr: "aspartate_aminotransferase", default: 25.0 } },
    FieldSpec { name: "total_proteins", source: Source::Attr { attr: "total_proteins", default: 7.0 } },
    FieldSpec { name: "albumin", source: Source::Attr { attr: "albumin", default: 4.0 } },
    FieldSpec { name: "albumin_globulin_ratio", source: Source::Attr { attr: "albumin_globulin_ratio", default: 1.0 } },
];

const MENTAL_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "stress_level", source: Source::Attr { attr: "stress_level", default: 5.0 } },
    FieldSpec { name: "workload", source: Source::Attr { attr: "workload", default: 5.0 } },
    FieldSpec { name: "sleep_quality", source: Source::Attr { attr: "sleep_quality", default: 7.0 } },
];

fn schema(domain: Domain) -> &'static [FieldSpec] {
    match domain {
        Domain::Metabolic => METABOLIC_SCHEMA,
        Domain::Cardiac => CARDIAC_SCHEMA,
        Domain::Hepatic => HEPATIC_SCHEMA,
        Domain::Mental => MENTAL_SCHEMA,
    }
}

/// Build the request payload for one domain from canonical (or, under
/// simulation, hypothetical) input state.
pub fn build_payload(
    domain: Domain,
    profile: &UserProfile,
    inputs: &ClinicalInputs,
) -> PredictionRequest {
    let mut request = PredictionRequest::default();
    for spec in schema(domain) {
        let value = match &spec.source {
            Source::Attr { attr, default } => {
                PayloadValue::Number(numeric_attr(domain, attr, *default, inputs))
            }
            Source::CodeAttr { attr, codes, default } => {
                PayloadValue::Code(code_attr(domain, attr, codes, default, inputs))
            }
            Source::FlagAttr { attr, on, off, default } => {
                PayloadValue::Number(flag_attr(domain, attr, *on, *off, *default, inputs))
            }
            Source::Age => PayloadValue::Number(profile.age.map(f64::from).unwrap_or(DEFAULT_AGE)),
            Source::SexCode => PayloadValue::Number(match profile.sex {
                Some(Sex::Male) => 1.0,
                _ => 0.0,
            }),
            Source::SexLabel => PayloadValue::code(profile.sex.unwrap_or(Sex::Female).as_str()),
            Source::Pregnancies => PayloadValue::Number(f64::from(profile.effective_pregnancies())),
            Source::Const(v) => PayloadValue::Number(*v),
            Source::ConstCode(c) => PayloadValue::code(*c),
        };
        request.fields.insert(spec.name.to_string(), value);
    }
    request
}

/// Parse user-entered numeric text, tolerating thousands separators.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn numeric_attr(domain: Domain, attr: &str, default: f64, inputs: &ClinicalInputs) -> f64 {
    match inputs.get(domain, attr) {
        Some(FieldValue::Number(v)) if v.is_finite() => *v,
        Some(FieldValue::Number(v)) => {
            warn!(domain = %domain, field = attr, value = %v, "non-finite value, substituting default");
            default
        }
        Some(FieldValue::Flag(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(FieldValue::Text(s)) => match parse_number(s) {
            Some(v) => v,
            None => {
                warn!(domain = %domain, field = attr, raw = %s, "non-numeric value, substituting default");
                default
            }
        },
        None => {
            warn!(domain = %domain, field = attr, "missing value, substituting default");
            default
        }
    }
}

fn code_attr(
    domain: Domain,
    attr: &str,
    codes: &[(&str, &str)],
    default: &str,
    inputs: &ClinicalInputs,
) -> String {
    match inputs.get(domain, attr) {
        Some(FieldValue::Text(s)) => {
            let lowered = s.trim().to_lowercase();
            match codes.iter().find(|(label, _)| *label == lowered) {
                Some((_, code)) => code.to_string(),
                None => {
                    warn!(domain = %domain, field = attr, raw = %s, "unrecognized categorical code, substituting default");
                    default.to_string()
                }
            }
        }
        Some(_) => {
            warn!(domain = %domain, field = attr, "non-categorical value, substituting default");
            default.to_string()
        }
        None => {
            warn!(domain = %domain, field = attr, "missing value, substituting default");
            default.to_string()
        }
    }
}

fn flag_attr(
    domain: Domain,
    attr: &str,
    on: f64,
    off: f64,
    default: f64,
    inputs: &ClinicalInputs,
) -> f64 {
    match inputs.get(domain, attr) {
        Some(FieldValue::Flag(b)) => {
            if *b {
                on
            } else {
                off
            }
        }
        Some(FieldValue::Number(v)) => {
            if *v != 0.0 {
                on
            } else {
                off
            }
        }
        Some(FieldValue::Text(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => on,
            "false" | "no" | "0" => off,
            _ => {
                warn!(domain = %domain, field = attr, raw = %s, "unrecognized flag value, substituting default");
                default
            }
        },
        None => {
            warn!(domain = %domain, field = attr, "missing value, substituting default");
            default
        }
    }
}
