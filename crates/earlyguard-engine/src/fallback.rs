//! Deterministic fallback heuristics applied when a domain's prediction
//! call fails.
//!
//! One threshold rule per domain, kept as a small lookup table so each rule
//! is independently testable. A rule inspects a single field of the
//! already-coerced payload: above the cutoff scores high, otherwise low.
//! Fallbacks always produce a concrete number — a failed call never leaves
//! a non-skipped domain without a score.

use earlyguard_common::Domain;

use crate::service::{PayloadValue, PredictionRequest};

struct FallbackRule {
    /// Payload field the rule inspects.
    field: &'static str,
    cutoff: f64,
    high: f64,
    low: f64,
}

fn rule(domain: Domain) -> FallbackRule {
    match domain {
        Domain::Metabolic => FallbackRule { field: "glucose", cutoff: 125.0, high: 70.0, low: 20.0 },
        Domain::Cardiac => FallbackRule { field: "cholesterol", cutoff: 240.0, high: 65.0, low: 15.0 },
        Domain::Hepatic => FallbackRule { field: "total_bilirubin", cutoff: 1.2, high: 60.0, low: 18.0 },
        Domain::Mental => FallbackRule { field: "stress_level", cutoff: 7.0, high: 68.0, low: 25.0 },
    }
}

/// Score a domain locally from its payload. Deterministic and cheap.
pub fn fallback_score(domain: Domain, payload: &PredictionRequest) -> f64 {
    let r = rule(domain);
    let value = payload
        .get(r.field)
        .and_then(PayloadValue::as_number)
        .unwrap_or(0.0);
    if value > r.cutoff {
        r.high
    } else {
        r.low
    }
}
