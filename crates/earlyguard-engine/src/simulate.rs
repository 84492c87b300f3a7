//! What-if simulation over hypothetical inputs.
//!
//! Runs the exact per-domain call/fallback path of the aggregation engine,
//! restricted to a caller-chosen subset of domains, against caller-owned
//! copies of the input state. Canonical state is never touched: the engine
//! only reads the copies it is handed, returns scores without a composite,
//! and keeps no record of the run. Overlapping simulations are independent;
//! the caller decides which outcome to display.

use tracing::instrument;

use earlyguard_common::{ClinicalInputs, Domain, SimulationOutcome, UserProfile};

use crate::aggregate::RiskAggregationEngine;
use crate::EngineError;

pub struct SimulationEngine {
    engine: RiskAggregationEngine,
}

impl SimulationEngine {
    pub fn new(engine: RiskAggregationEngine) -> Self {
        Self { engine }
    }

    /// Score `domains` against `hypothetical` inputs. The skip set inside
    /// the hypothetical copy is ignored — the requested subset alone decides
    /// what is scored.
    #[instrument(skip_all, fields(domains = domains.len()))]
    pub async fn simulate(
        &self,
        profile: &UserProfile,
        hypothetical: &ClinicalInputs,
        domains: &[Domain],
    ) -> Result<SimulationOutcome, EngineError> {
        if domains.is_empty() {
            return Err(EngineError::NoActiveDomains);
        }

        let outcomes = self
            .engine
            .score_domains(profile, hypothetical, domains)
            .await;

        Ok(SimulationOutcome {
            scores: outcomes.into_iter().map(|o| (o.domain, o.risk)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use earlyguard_common::{FieldValue, Sex};

    use crate::service::MockPredictionService;

    fn engine(service: MockPredictionService) -> SimulationEngine {
        SimulationEngine::new(RiskAggregationEngine::new(Arc::new(service)))
    }

    fn profile() -> UserProfile {
        UserProfile {
            name: "Test".to_string(),
            age: Some(41),
            sex: Some(Sex::Male),
            pregnancies: None,
        }
    }

    #[tokio::test]
    async fn test_simulation_scores_requested_subset_only() {
        let sim = engine(
            MockPredictionService::new()
                .with_live_score(Domain::Metabolic, 33.0)
                .with_live_score(Domain::Cardiac, 66.0),
        );

        let outcome = sim
            .simulate(
                &profile(),
                &ClinicalInputs::seeded(),
                &[Domain::Metabolic, Domain::Cardiac],
            )
            .await
            .unwrap();

        assert_eq!(outcome.scores.len(), 2);
        assert_eq!(outcome.scores[&Domain::Metabolic].score, 33.0);
        assert_eq!(outcome.scores[&Domain::Cardiac].score, 66.0);
        assert!(!outcome.scores.contains_key(&Domain::Hepatic));
    }

    #[tokio::test]
    async fn test_simulation_never_mutates_canonical_inputs() {
        let sim = engine(MockPredictionService::new().with_live_score(Domain::Metabolic, 10.0));

        let canonical = ClinicalInputs::seeded();
        let before = canonical.clone();

        // The caller hands the engine a distinct altered copy.
        let mut hypothetical = canonical.clone();
        hypothetical.set(Domain::Metabolic, "glucose", FieldValue::Number(300.0));
        hypothetical.set(Domain::Metabolic, "bmi", FieldValue::text("garbage"));

        sim.simulate(&profile(), &hypothetical, &[Domain::Metabolic])
            .await
            .unwrap();

        assert_eq!(canonical, before);
    }

    #[tokio::test]
    async fn test_simulation_applies_fallback_on_failure() {
        let sim = engine(MockPredictionService::new().with_failure(Domain::Metabolic));

        let mut hypothetical = ClinicalInputs::seeded();
        hypothetical.set(Domain::Metabolic, "glucose", FieldValue::Number(200.0));

        let outcome = sim
            .simulate(&profile(), &hypothetical, &[Domain::Metabolic])
            .await
            .unwrap();

        assert_eq!(outcome.scores[&Domain::Metabolic].score, 70.0);
    }

    #[tokio::test]
    async fn test_empty_subset_is_an_error() {
        let sim = engine(MockPredictionService::new());
        let err = sim
            .simulate(&profile(), &ClinicalInputs::seeded(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NoActiveDomains));
    }

    #[tokio::test]
    async fn test_reinvocation_is_independent() {
        let sim = engine(
            MockPredictionService::new().with_live_score(Domain::Mental, 55.0),
        );

        let first = sim
            .simulate(&profile(), &ClinicalInputs::seeded(), &[Domain::Mental])
            .await
            .unwrap();
        let second = sim
            .simulate(&profile(), &ClinicalInputs::seeded(), &[Domain::Mental])
            .await
            .unwrap();

        assert_eq!(first, second);
    }
}
