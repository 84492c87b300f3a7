//! Composite risk aggregation across the prediction services.
//!
//! One call per non-skipped domain, all dispatched concurrently with
//! settle-all semantics: every outcome is observed independently, a slow or
//! failing domain never blocks or cancels the others, and the composite is
//! only finalized once every call has settled. Failed calls are absorbed by
//! the per-domain fallback heuristics, so the only error this module can
//! raise is an aggregation run with no domains to score.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use earlyguard_common::{
    ClinicalInputs, Domain, DomainRisk, RiskAssessmentResult, RiskLevel, UserProfile,
};

use crate::fallback::fallback_score;
use crate::payload::build_payload;
use crate::service::PredictionService;
use crate::EngineError;

/// Outcome for one scored domain, before folding into a result.
pub(crate) struct DomainOutcome {
    pub domain: Domain,
    pub risk: DomainRisk,
    /// True iff the service answered with a `model_source` marker.
    pub live: bool,
}

#[derive(Clone)]
pub struct RiskAggregationEngine {
    service: Arc<dyn PredictionService>,
}

impl RiskAggregationEngine {
    pub fn new(service: Arc<dyn PredictionService>) -> Self {
        Self { service }
    }

    /// Score every non-skipped domain and fold the outcomes into one
    /// immutable [`RiskAssessmentResult`].
    #[instrument(skip_all)]
    pub async fn assess(
        &self,
        profile: &UserProfile,
        inputs: &ClinicalInputs,
    ) -> Result<RiskAssessmentResult, EngineError> {
        let active = inputs.active_domains();
        if active.is_empty() {
            return Err(EngineError::NoActiveDomains);
        }

        let outcomes = self.score_domains(profile, inputs, &active).await;

        let verified = outcomes.iter().any(|o| o.live);
        let mut domains: BTreeMap<Domain, Option<DomainRisk>> =
            Domain::ALL.iter().map(|&d| (d, None)).collect();
        let mut total = 0.0;
        for outcome in &outcomes {
            domains.insert(outcome.domain, Some(outcome.risk));
            total += outcome.risk.score;
        }
        let composite = total / outcomes.len() as f64;

        info!(
            scored = outcomes.len(),
            composite,
            verified,
            "risk aggregation complete"
        );

        Ok(RiskAssessmentResult {
            id: Uuid::new_v4(),
            domains,
            composite,
            composite_level: RiskLevel::from_score(composite),
            verified,
            completed_at: Utc::now(),
        })
    }

    /// Fan out one prediction call per requested domain and settle every
    /// outcome, substituting the fallback heuristic where a call fails.
    pub(crate) async fn score_domains(
        &self,
        profile: &UserProfile,
        inputs: &ClinicalInputs,
        domains: &[Domain],
    ) -> Vec<DomainOutcome> {
        let calls = domains.iter().map(|&domain| {
            let payload = build_payload(domain, profile, inputs);
            let service = Arc::clone(&self.service);
            async move {
                let result = service.predict(domain, &payload).await;
                (domain, payload, result)
            }
        });

        join_all(calls)
            .await
            .into_iter()
            .map(|(domain, payload, result)| match result {
                Ok(resp) => {
                    let score = resp.risk_score.clamp(0.0, 100.0);
                    let level = resp
                        .risk_level
                        .as_deref()
                        .and_then(RiskLevel::from_label)
                        .unwrap_or_else(|| RiskLevel::from_score(score));
                    DomainOutcome {
                        domain,
                        risk: DomainRisk { score, level },
                        live: resp.model_source.is_some(),
                    }
                }
                Err(err) => {
                    warn!(domain = %domain, error = %err, "prediction call failed, applying fallback heuristic");
                    DomainOutcome {
                        domain,
                        risk: DomainRisk::from_score(fallback_score(domain, &payload)),
                        live: false,
                    }
                }
            })
            .collect()
    }
}
