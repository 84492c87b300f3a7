//! End-to-end assessment flow: profile entry, report-photo extraction,
//! hepatic skip, scoring, and what-if simulation against the same session.

use std::sync::Arc;

use earlyguard_common::{ClinicalInputs, Domain, FieldValue, Sex};
use earlyguard_engine::{MockPredictionService, RiskAggregationEngine, SimulationEngine};
use earlyguard_extract::{MockRecognizer, VitalsExtractionPipeline};
use earlyguard_wizard::{WizardStateMachine, WizardStep};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn fill_profile(machine: &mut WizardStateMachine) {
    let profile = machine.profile_mut().unwrap();
    profile.name = "Jordan".to_string();
    profile.age = Some(52);
    profile.sex = Some(Sex::Female);
    profile.pregnancies = Some(2);
}

#[tokio::test]
async fn test_full_run_with_extraction_and_hepatic_skip() {
    init_tracing();

    let mut machine = WizardStateMachine::new();
    fill_profile(&mut machine);
    machine.advance().unwrap();
    assert_eq!(machine.step(), WizardStep::Vitals);

    // Photographed report fills glucose; the user confirms the candidates.
    let mut pipeline = VitalsExtractionPipeline::new(Arc::new(MockRecognizer::new(
        "Fasting Glucose: 180 mg/dL\nSteps 4,200",
    )));
    let (job, _progress) = pipeline.begin(vec![0xFF, 0xD8, 0xFF]);
    pipeline.complete(job.run().await);
    let merged = pipeline.confirm(machine.inputs_mut().unwrap());
    assert_eq!(merged, 2);
    assert_eq!(
        machine.session().inputs.get(Domain::Metabolic, "glucose"),
        Some(&FieldValue::Number(180.0))
    );

    machine.advance().unwrap();
    assert_eq!(machine.step(), WizardStep::History);
    machine
        .inputs_mut()
        .unwrap()
        .set_skipped(Domain::Hepatic, true);

    // Every service is down: each active domain falls back to its local
    // heuristic and the result is unverified.
    let engine = RiskAggregationEngine::new(Arc::new(
        MockPredictionService::new()
            .with_failure(Domain::Metabolic)
            .with_failure(Domain::Cardiac)
            .with_failure(Domain::Mental),
    ));
    let result = machine.submit(&engine).await.unwrap().clone();

    assert_eq!(machine.step(), WizardStep::Report);
    assert!(!result.verified);
    assert_eq!(result.scored_domain_count(), 3);
    assert_eq!(result.score(Domain::Hepatic), None);
    // glucose 180 trips the metabolic fallback; cardiac and mental sit at
    // their nominal-low scores.
    assert_eq!(result.score(Domain::Metabolic), Some(70.0));
    assert_eq!(result.score(Domain::Cardiac), Some(15.0));
    assert_eq!(result.score(Domain::Mental), Some(25.0));
    let expected = (70.0 + 15.0 + 25.0) / 3.0;
    assert!((result.composite - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_simulation_leaves_canonical_session_untouched() {
    init_tracing();

    let mut machine = WizardStateMachine::new();
    fill_profile(&mut machine);
    machine.advance().unwrap();
    machine.advance().unwrap();

    let service = Arc::new(
        MockPredictionService::new()
            .with_live_score(Domain::Metabolic, 44.0)
            .with_live_score(Domain::Cardiac, 22.0)
            .with_live_score(Domain::Hepatic, 33.0)
            .with_live_score(Domain::Mental, 11.0),
    );
    let engine = RiskAggregationEngine::new(Arc::clone(&service) as _);
    machine.submit(&engine).await.unwrap();

    let canonical: ClinicalInputs = machine.session().inputs.clone();

    // What-if: the user drags glucose up on a copy of the canonical inputs.
    let mut hypothetical = canonical.clone();
    hypothetical.set(Domain::Metabolic, "glucose", FieldValue::Number(260.0));

    let sim = SimulationEngine::new(RiskAggregationEngine::new(service));
    let outcome = sim
        .simulate(
            &machine.session().profile,
            &hypothetical,
            &[Domain::Metabolic, Domain::Cardiac],
        )
        .await
        .unwrap();

    assert_eq!(outcome.scores.len(), 2);
    assert_eq!(machine.session().inputs, canonical);
    // The stored result is untouched by the simulation.
    assert_eq!(machine.result().unwrap().composite, 27.5);
}

#[tokio::test]
async fn test_restart_from_report_begins_fresh_assessment() {
    init_tracing();

    let mut machine = WizardStateMachine::new();
    fill_profile(&mut machine);
    machine.advance().unwrap();
    machine.advance().unwrap();

    let engine = RiskAggregationEngine::new(Arc::new(
        MockPredictionService::new()
            .with_live_score(Domain::Metabolic, 10.0)
            .with_live_score(Domain::Cardiac, 10.0)
            .with_live_score(Domain::Hepatic, 10.0)
            .with_live_score(Domain::Mental, 10.0),
    ));
    machine.submit(&engine).await.unwrap();
    let first_id = machine.result().unwrap().id;

    machine.restart();
    assert_eq!(machine.step(), WizardStep::Profile);
    assert!(machine.result().is_none());

    fill_profile(&mut machine);
    machine.advance().unwrap();
    machine.advance().unwrap();
    machine.submit(&engine).await.unwrap();

    // A new run produced a new result, never an in-place update.
    assert_ne!(machine.result().unwrap().id, first_id);
}
