//! earlyguard-common — Shared types, errors, and configuration used across all EarlyGuard crates.

pub mod error;
pub mod profile;
pub mod inputs;
pub mod assessment;
pub mod config;

// Re-export commonly used types
pub use error::{EarlyGuardError, Result};
pub use profile::{Sex, UserProfile};
pub use inputs::{ClinicalInputs, Domain, FieldValue};
pub use assessment::{DomainRisk, RiskAssessmentResult, RiskLevel, SimulationOutcome};
pub use config::Config;
