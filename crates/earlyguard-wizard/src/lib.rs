//! earlyguard-wizard — Step-gated assessment flow over the canonical
//! session state.
//!
//! The machine owns the session (profile + clinical inputs + result) and is
//! the single place canonical state is mutated: input edits go through its
//! accessors between await points, scoring runs through `submit`, and a
//! completed assessment is immutable until `restart` creates a fresh
//! session.

use thiserror::Error;

pub mod machine;
pub mod session;

pub use machine::{WizardStateMachine, WizardStep};
pub use session::AssessmentSession;

use earlyguard_engine::EngineError;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("step {step} is incomplete: {reason}")]
    StepIncomplete { step: WizardStep, reason: String },

    #[error("cannot advance past {0}; submit the assessment instead")]
    EndOfCollection(WizardStep),

    #[error("already at the first step")]
    AtFirstStep,

    #[error("the report step requires a completed assessment")]
    ReportUnavailable,

    #[error("scoring already in progress")]
    ScoringInProgress,

    #[error("submit is only available on the final collection step")]
    NotReadyToSubmit,

    #[error("a completed assessment is read-only; start a new one instead")]
    AssessmentComplete,

    #[error(transparent)]
    Engine(#[from] EngineError),
}
