//! Image-to-vitals extraction pipeline.
//!
//! States: `Idle` → `Recognizing` → `Parsed` → back to `Idle` via
//! `confirm` (candidates merged into clinical inputs) or `cancel`
//! (candidates discarded). Recognition runs as a detached
//! [`RecognitionJob`] the caller awaits; applying its outcome is guarded by
//! a monotonically increasing generation counter so a job superseded by a
//! newer upload (or a cancel) can never touch current state. A failed
//! recognition still reaches `Parsed` — with an empty candidate set and a
//! user-facing notice — so manual entry always remains available.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use earlyguard_common::{ClinicalInputs, Domain, FieldValue};

use crate::parser::{ExtractionParser, VitalField};

#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("recognition failed: {0}")]
    Failed(String),
}

/// Notice shown when the recognizer itself fails.
const RECOGNITION_NOTICE: &str = "Could not read text. Please enter values manually.";

// ── Progress ──────────────────────────────────────────────────────────────────

/// Progress handle given to the recognizer.
///
/// Reports are clamped to 100 and delivered to observers in non-decreasing
/// order; repeated or regressing values are coalesced away.
#[derive(Clone)]
pub struct ProgressSender(watch::Sender<u8>);

impl ProgressSender {
    pub fn report(&self, pct: u8) {
        let pct = pct.min(100);
        self.0.send_if_modified(|cur| {
            if pct > *cur {
                *cur = pct;
                true
            } else {
                false
            }
        });
    }
}

// ── Recognizer contract ───────────────────────────────────────────────────────

/// Opaque text-recognition collaborator (OCR engine).
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(
        &self,
        image: &[u8],
        progress: &ProgressSender,
    ) -> Result<String, RecognizeError>;
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Recognizing { generation: u64 },
    Parsed {
        candidates: BTreeMap<VitalField, f64>,
        notice: Option<String>,
    },
}

/// In-flight recognition work for one submitted image.
///
/// Owns the image and a recognizer handle; driving it does not borrow the
/// pipeline, so a caller may start a newer job while an older one is still
/// running — the older outcome is then rejected at `complete` time.
pub struct RecognitionJob {
    generation: u64,
    image: Vec<u8>,
    recognizer: Arc<dyn TextRecognizer>,
    progress: ProgressSender,
}

impl RecognitionJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn run(self) -> RecognitionOutcome {
        let text = self.recognizer.recognize(&self.image, &self.progress).await;
        if text.is_ok() {
            self.progress.report(100);
        }
        RecognitionOutcome {
            generation: self.generation,
            text,
        }
    }
}

/// A settled recognition call, ready to hand back to the pipeline.
pub struct RecognitionOutcome {
    generation: u64,
    text: Result<String, RecognizeError>,
}

pub struct VitalsExtractionPipeline {
    recognizer: Arc<dyn TextRecognizer>,
    parser: ExtractionParser,
    state: PipelineState,
    generation: u64,
}

impl VitalsExtractionPipeline {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            parser: ExtractionParser::new(),
            state: PipelineState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Start recognition for a newly submitted image.
    ///
    /// Bumps the generation counter, so any job still in flight is
    /// invalidated. Returns the job to drive plus a receiver for its
    /// progress stream.
    pub fn begin(&mut self, image: Vec<u8>) -> (RecognitionJob, watch::Receiver<u8>) {
        self.generation += 1;
        debug!(generation = self.generation, bytes = image.len(), "recognition started");
        self.state = PipelineState::Recognizing {
            generation: self.generation,
        };
        let (tx, rx) = watch::channel(0u8);
        let job = RecognitionJob {
            generation: self.generation,
            image,
            recognizer: Arc::clone(&self.recognizer),
            progress: ProgressSender(tx),
        };
        (job, rx)
    }

    /// Apply a finished job. Outcomes superseded by a newer `begin` or a
    /// `cancel` are discarded without touching current state.
    pub fn complete(&mut self, outcome: RecognitionOutcome) {
        if outcome.generation != self.generation {
            warn!(
                generation = outcome.generation,
                current = self.generation,
                "discarding stale recognition outcome"
            );
            return;
        }

        match outcome.text {
            Ok(text) => {
                let candidates = self.parser.parse(&text);
                info!(found = candidates.len(), "recognized text parsed");
                self.state = PipelineState::Parsed {
                    candidates,
                    notice: None,
                };
            }
            Err(err) => {
                warn!(error = %err, "recognition failed, falling through to manual entry");
                self.state = PipelineState::Parsed {
                    candidates: BTreeMap::new(),
                    notice: Some(RECOGNITION_NOTICE.to_string()),
                };
            }
        }
    }

    /// Candidates awaiting confirmation, when in `Parsed`.
    pub fn candidates(&self) -> Option<&BTreeMap<VitalField, f64>> {
        match &self.state {
            PipelineState::Parsed { candidates, .. } => Some(candidates),
            _ => None,
        }
    }

    /// Merge the confirmed candidate set into clinical inputs and return to
    /// `Idle`. Only fields present in the set are written — values the user
    /// already entered stay untouched unless a candidate for that exact
    /// field exists. Returns the number of fields merged; a no-op outside
    /// `Parsed`.
    pub fn confirm(&mut self, inputs: &mut ClinicalInputs) -> usize {
        let PipelineState::Parsed { candidates, .. } = &self.state else {
            return 0;
        };

        let mut merged = 0;
        for (&field, &value) in candidates {
            let (domain, attr) = target(field);
            inputs.set(domain, attr, FieldValue::Number(value));
            merged += 1;
        }
        info!(merged, "extraction candidates confirmed");
        self.state = PipelineState::Idle;
        merged
    }

    /// Discard candidates unconditionally and return to `Idle`. Also
    /// invalidates any recognition still in flight.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.state = PipelineState::Idle;
    }
}

/// Clinical attribute a confirmed candidate is written to.
fn target(field: VitalField) -> (Domain, &'static str) {
    match field {
        VitalField::Glucose => (Domain::Metabolic, "glucose"),
        VitalField::HeartRate => (Domain::Cardiac, "max_heart_rate"),
        VitalField::Steps => (Domain::Metabolic, "daily_steps"),
        VitalField::Sleep => (Domain::Metabolic, "sleep_hours"),
    }
}

// ── Mock Implementation for Testing ───────────────────────────────────────────

/// Mock recognizer with scripted output for unit tests.
pub struct MockRecognizer {
    text: String,
    fail: bool,
    progress_steps: Vec<u8>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail: false,
            progress_steps: vec![25, 50, 75],
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
            progress_steps: vec![10],
        }
    }

    pub fn with_progress_steps(mut self, steps: Vec<u8>) -> Self {
        self.progress_steps = steps;
        self
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    async fn recognize(
        &self,
        _image: &[u8],
        progress: &ProgressSender,
    ) -> Result<String, RecognizeError> {
        for &step in &self.progress_steps {
            progress.report(step);
        }
        if self.fail {
            return Err(RecognizeError::Failed("engine unavailable".to_string()));
        }
        Ok(self.text.clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
