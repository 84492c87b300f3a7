//! The step-gated wizard state machine.
//!
//! An ordered sequence of collection steps followed by a terminal report
//! step. Advancing requires the current step's completion predicate to
//! hold; retreating never validates; the terminal step is reachable only by
//! submitting the assessment from the last collection step. Scoring is an
//! explicit sub-state during which every transition is refused, so a
//! double-click can never submit twice. A failed scoring run keeps the user
//! on the last collection step with all inputs intact.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use earlyguard_common::{ClinicalInputs, RiskAssessmentResult, UserProfile};
use earlyguard_engine::RiskAggregationEngine;

use crate::session::AssessmentSession;
use crate::WizardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Profile,
    Vitals,
    History,
    Report,
}

impl WizardStep {
    /// Collection steps in wizard order; `Report` is terminal and excluded.
    pub const COLLECTION: [WizardStep; 3] =
        [WizardStep::Profile, WizardStep::Vitals, WizardStep::History];

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Profile => "profile",
            WizardStep::Vitals => "vitals",
            WizardStep::History => "history",
            WizardStep::Report => "report",
        }
    }

    fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Profile => Some(WizardStep::Vitals),
            WizardStep::Vitals => Some(WizardStep::History),
            // History → Report only happens through submit.
            WizardStep::History | WizardStep::Report => None,
        }
    }

    fn prev(self) -> Option<WizardStep> {
        match self {
            WizardStep::Profile => None,
            WizardStep::Vitals => Some(WizardStep::Profile),
            WizardStep::History => Some(WizardStep::Vitals),
            WizardStep::Report => Some(WizardStep::History),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct WizardStateMachine {
    session: AssessmentSession,
    step: WizardStep,
    scoring: bool,
}

impl WizardStateMachine {
    pub fn new() -> Self {
        Self {
            session: AssessmentSession::new(),
            step: WizardStep::Profile,
            scoring: false,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_scoring(&self) -> bool {
        self.scoring
    }

    pub fn session(&self) -> &AssessmentSession {
        &self.session
    }

    pub fn result(&self) -> Option<&RiskAssessmentResult> {
        self.session.result.as_ref()
    }

    /// Mutable access to the profile while the assessment is still editable.
    pub fn profile_mut(&mut self) -> Result<&mut UserProfile, WizardError> {
        self.editable()?;
        Ok(&mut self.session.profile)
    }

    /// Mutable access to the clinical inputs while the assessment is still
    /// editable. The extraction pipeline's confirmation merge writes through
    /// here as well.
    pub fn inputs_mut(&mut self) -> Result<&mut ClinicalInputs, WizardError> {
        self.editable()?;
        Ok(&mut self.session.inputs)
    }

    fn editable(&self) -> Result<(), WizardError> {
        if self.scoring {
            return Err(WizardError::ScoringInProgress);
        }
        if self.session.result.is_some() {
            return Err(WizardError::AssessmentComplete);
        }
        Ok(())
    }

    /// Move to the next collection step if the current one is complete.
    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        if self.scoring {
            return Err(WizardError::ScoringInProgress);
        }
        self.check_step_complete()?;
        match self.step.next() {
            Some(next) => {
                info!(from = %self.step, to = %next, "wizard advanced");
                self.step = next;
                Ok(next)
            }
            None => Err(WizardError::EndOfCollection(self.step)),
        }
    }

    /// Move to the previous step. Never validates.
    pub fn retreat(&mut self) -> Result<WizardStep, WizardError> {
        if self.scoring {
            return Err(WizardError::ScoringInProgress);
        }
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                Ok(prev)
            }
            None => Err(WizardError::AtFirstStep),
        }
    }

    /// Reposition anywhere among the collection steps; the report step is
    /// only a valid target once a result exists.
    pub fn jump_to(&mut self, step: WizardStep) -> Result<(), WizardError> {
        if self.scoring {
            return Err(WizardError::ScoringInProgress);
        }
        if step == WizardStep::Report && self.session.result.is_none() {
            return Err(WizardError::ReportUnavailable);
        }
        self.step = step;
        Ok(())
    }

    /// Drop the whole session and begin a fresh assessment from the first
    /// step. The previous result (if any) is discarded with it.
    pub fn restart(&mut self) {
        info!("starting a new assessment");
        self.session = AssessmentSession::new();
        self.step = WizardStep::Profile;
        self.scoring = false;
    }

    /// Run the aggregation engine over the session and move to the report
    /// step. Only available on the last collection step; while the call is
    /// in flight the machine refuses every transition and a second submit.
    /// On failure the step does not change and all inputs stay intact.
    pub async fn submit(
        &mut self,
        engine: &RiskAggregationEngine,
    ) -> Result<&RiskAssessmentResult, WizardError> {
        if self.scoring {
            return Err(WizardError::ScoringInProgress);
        }
        if self.step != WizardStep::History {
            return Err(WizardError::NotReadyToSubmit);
        }
        // jump_to can land here without passing the profile gate.
        if !self.session.profile.is_complete() {
            return Err(profile_incomplete());
        }

        self.scoring = true;
        info!("scoring started");
        let outcome = engine
            .assess(&self.session.profile, &self.session.inputs)
            .await;
        self.scoring = false;

        match outcome {
            Ok(result) => {
                self.step = WizardStep::Report;
                Ok(self.session.result.insert(result))
            }
            Err(err) => {
                warn!(error = %err, "scoring failed, inputs retained for retry");
                Err(err.into())
            }
        }
    }

    fn check_step_complete(&self) -> Result<(), WizardError> {
        match self.step {
            WizardStep::Profile if !self.session.profile.is_complete() => {
                Err(profile_incomplete())
            }
            // Vitals and history are seeded with defaults, so those steps
            // are always complete.
            _ => Ok(()),
        }
    }
}

impl Default for WizardStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn profile_incomplete() -> WizardError {
    WizardError::StepIncomplete {
        step: WizardStep::Profile,
        reason: "name, age (1-120), and sex are all required".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use earlyguard_common::{Domain, Sex};
    use earlyguard_engine::MockPredictionService;

    fn live_engine() -> RiskAggregationEngine {
        let service = MockPredictionService::new()
            .with_live_score(Domain::Metabolic, 40.0)
            .with_live_score(Domain::Cardiac, 30.0)
            .with_live_score(Domain::Hepatic, 20.0)
            .with_live_score(Domain::Mental, 50.0);
        RiskAggregationEngine::new(Arc::new(service))
    }

    fn complete_profile(machine: &mut WizardStateMachine) {
        let profile = machine.profile_mut().unwrap();
        profile.name = "A".to_string();
        profile.age = Some(34);
        profile.sex = Some(Sex::Male);
    }

    #[test]
    fn test_advance_rejected_until_profile_complete() {
        let mut machine = WizardStateMachine::new();
        assert_eq!(machine.step(), WizardStep::Profile);

        // Blank age (and everything else) keeps the gate shut.
        assert!(matches!(
            machine.advance(),
            Err(WizardError::StepIncomplete { step: WizardStep::Profile, .. })
        ));
        assert_eq!(machine.step(), WizardStep::Profile);

        machine.profile_mut().unwrap().age = Some(34);
        assert!(machine.advance().is_err());
        machine.profile_mut().unwrap().sex = Some(Sex::Male);
        assert!(machine.advance().is_err());
        machine.profile_mut().unwrap().name = "A".to_string();

        assert_eq!(machine.advance().unwrap(), WizardStep::Vitals);
    }

    #[test]
    fn test_retreat_never_validates() {
        let mut machine = WizardStateMachine::new();
        complete_profile(&mut machine);
        machine.advance().unwrap();
        machine.advance().unwrap();
        assert_eq!(machine.step(), WizardStep::History);

        assert_eq!(machine.retreat().unwrap(), WizardStep::Vitals);
        assert_eq!(machine.retreat().unwrap(), WizardStep::Profile);
        assert!(matches!(machine.retreat(), Err(WizardError::AtFirstStep)));
    }

    #[test]
    fn test_advance_stops_at_last_collection_step() {
        let mut machine = WizardStateMachine::new();
        complete_profile(&mut machine);
        machine.advance().unwrap();
        machine.advance().unwrap();
        assert!(matches!(
            machine.advance(),
            Err(WizardError::EndOfCollection(WizardStep::History))
        ));
    }

    #[test]
    fn test_report_jump_requires_result() {
        let mut machine = WizardStateMachine::new();
        assert!(matches!(
            machine.jump_to(WizardStep::Report),
            Err(WizardError::ReportUnavailable)
        ));
        assert!(machine.jump_to(WizardStep::History).is_ok());
    }

    #[tokio::test]
    async fn test_submit_produces_result_and_locks_session() {
        let mut machine = WizardStateMachine::new();
        complete_profile(&mut machine);
        machine.advance().unwrap();
        machine.advance().unwrap();

        let result = machine.submit(&live_engine()).await.unwrap();
        assert_eq!(result.composite, 35.0);
        assert_eq!(machine.step(), WizardStep::Report);

        // Completed assessments are read-only.
        assert!(matches!(
            machine.profile_mut(),
            Err(WizardError::AssessmentComplete)
        ));
        assert!(matches!(
            machine.inputs_mut(),
            Err(WizardError::AssessmentComplete)
        ));
    }

    #[tokio::test]
    async fn test_submit_requires_last_collection_step() {
        let mut machine = WizardStateMachine::new();
        complete_profile(&mut machine);
        assert!(matches!(
            machine.submit(&live_engine()).await,
            Err(WizardError::NotReadyToSubmit)
        ));
    }

    #[tokio::test]
    async fn test_failed_scoring_keeps_inputs_and_step() {
        let mut machine = WizardStateMachine::new();
        complete_profile(&mut machine);
        machine.advance().unwrap();
        machine.advance().unwrap();

        // Skipping every domain makes aggregation impossible.
        for domain in Domain::ALL {
            machine.inputs_mut().unwrap().set_skipped(domain, true);
        }
        let err = machine.submit(&live_engine()).await.unwrap_err();
        assert!(matches!(err, WizardError::Engine(_)));
        assert_eq!(machine.step(), WizardStep::History);
        assert!(!machine.is_scoring());
        assert!(machine.result().is_none());

        // Undo the skip set and retry with the same session.
        for domain in Domain::ALL {
            machine.inputs_mut().unwrap().set_skipped(domain, false);
        }
        assert!(machine.submit(&live_engine()).await.is_ok());
    }

    #[tokio::test]
    async fn test_restart_resets_everything() {
        let mut machine = WizardStateMachine::new();
        complete_profile(&mut machine);
        machine.advance().unwrap();
        machine.advance().unwrap();
        machine.submit(&live_engine()).await.unwrap();

        machine.restart();
        assert_eq!(machine.step(), WizardStep::Profile);
        assert!(machine.result().is_none());
        assert!(machine.session().profile.name.is_empty());
    }
}
