//! earlyguard-extract — Turns a photographed health report into typed
//! vital-sign candidates.
//!
//! The pipeline hands an image to the text-recognition collaborator, parses
//! the recognized text into candidate metrics, and holds them behind an
//! explicit confirmation gate — nothing enters canonical input state until
//! the user approves it.

pub mod parser;
pub mod pipeline;

pub use parser::{ExtractionParser, VitalField};
pub use pipeline::{
    MockRecognizer, PipelineState, ProgressSender, RecognitionJob, RecognitionOutcome,
    RecognizeError, TextRecognizer, VitalsExtractionPipeline,
};
