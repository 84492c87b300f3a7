//! Assessment results and the transient what-if outcome.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inputs::Domain;

/// Qualitative band attached to a risk score.
///
/// Services may report their own label; when they omit it the band is
/// derived locally with the same cutoffs the services use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Score > 60 → High, > 30 → Moderate, else Low.
    pub fn from_score(score: f64) -> Self {
        if score > 60.0 {
            RiskLevel::High
        } else if score > 30.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    /// Parse a service-reported label ("High", "moderate", …).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "moderate" => Some(RiskLevel::Moderate),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

/// Score and band for a single domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainRisk {
    /// Risk score in [0, 100].
    pub score: f64,
    pub level: RiskLevel,
}

impl DomainRisk {
    pub fn from_score(score: f64) -> Self {
        Self {
            score,
            level: RiskLevel::from_score(score),
        }
    }
}

/// Outcome of one completed wizard run.
///
/// `None` for a domain means it was explicitly skipped; every non-skipped
/// domain carries a concrete score (live or fallback). Immutable once
/// created — a new run produces a new result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessmentResult {
    pub id: Uuid,
    pub domains: BTreeMap<Domain, Option<DomainRisk>>,
    /// Arithmetic mean of all non-null domain scores.
    pub composite: f64,
    pub composite_level: RiskLevel,
    /// True iff at least one domain was answered by a live model rather
    /// than a fallback heuristic.
    pub verified: bool,
    pub completed_at: DateTime<Utc>,
}

impl RiskAssessmentResult {
    pub fn score(&self, domain: Domain) -> Option<f64> {
        self.domains.get(&domain).copied().flatten().map(|r| r.score)
    }

    /// Number of domains contributing to the composite.
    pub fn scored_domain_count(&self) -> usize {
        self.domains.values().filter(|d| d.is_some()).count()
    }
}

/// Transient result of a what-if run: per-domain scores for the simulated
/// subset only. Never persisted next to canonical results; the caller
/// discards it when the panel closes or a newer simulation lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub scores: BTreeMap<Domain, DomainRisk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_cutoffs() {
        assert_eq!(RiskLevel::from_score(10.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30.1), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(60.1), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::High);
    }

    #[test]
    fn test_scored_domain_count_ignores_skipped() {
        let mut domains = BTreeMap::new();
        domains.insert(Domain::Metabolic, Some(DomainRisk::from_score(40.0)));
        domains.insert(Domain::Cardiac, Some(DomainRisk::from_score(20.0)));
        domains.insert(Domain::Hepatic, None);
        domains.insert(Domain::Mental, Some(DomainRisk::from_score(60.0)));

        let result = RiskAssessmentResult {
            id: Uuid::new_v4(),
            domains,
            composite: 40.0,
            composite_level: RiskLevel::Moderate,
            verified: true,
            completed_at: Utc::now(),
        };

        assert_eq!(result.scored_domain_count(), 3);
        assert_eq!(result.score(Domain::Hepatic), None);
        assert_eq!(result.score(Domain::Mental), Some(60.0));
    }
}
