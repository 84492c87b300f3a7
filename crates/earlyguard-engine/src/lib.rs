//! earlyguard-engine — Risk aggregation and what-if simulation over the
//! per-domain prediction services.
//!
//! The engine owns the service contract (one prediction endpoint per health
//! domain), payload construction with defensive coercion, the per-domain
//! fallback heuristics, and the settle-all fan-out that folds every outcome
//! into one composite assessment.

use thiserror::Error;

pub mod service;
pub mod payload;
pub mod fallback;
pub mod aggregate;
pub mod simulate;

pub use aggregate::RiskAggregationEngine;
pub use service::{
    HttpPredictionService, MockPredictionService, PredictionRequest, PredictionResponse,
    PredictionService, ServiceError,
};
pub use simulate::SimulationEngine;

/// Errors that escape the engine. Per-domain service failures never do —
/// they are absorbed by the fallback heuristics; only a call that cannot
/// produce any score at all is surfaced.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("aggregation requires at least one non-skipped domain")]
    NoActiveDomains,
}
