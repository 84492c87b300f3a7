//! Canonical per-assessment state.

use serde::{Deserialize, Serialize};

use earlyguard_common::{ClinicalInputs, RiskAssessmentResult, UserProfile};

/// Everything one assessment run owns: the demographic profile, the seeded
/// clinical inputs, and — after scoring — the immutable result.
///
/// An explicit context object rather than ambient global state: it is owned
/// by the wizard machine and handed to the engines by reference only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub profile: UserProfile,
    pub inputs: ClinicalInputs,
    pub result: Option<RiskAssessmentResult>,
}

impl AssessmentSession {
    pub fn new() -> Self {
        Self {
            profile: UserProfile::default(),
            inputs: ClinicalInputs::seeded(),
            result: None,
        }
    }
}
