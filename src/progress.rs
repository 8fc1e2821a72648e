//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn ExplainProgress>`] via
//! [`crate::config::ExplainerConfigBuilder::progress_callback`] to hear about
//! each stage as a request moves through the pipeline. The CLI uses it to
//! drive a spinner; a GUI shell could forward the events to its status bar.
//!
//! # Example
//!
//! ```rust
//! use claim_explainer::{ExplainProgress, ExplainerConfig, Stage};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl ExplainProgress for PrintStages {
//!     fn on_stage(&self, stage: Stage) {
//!         eprintln!("{}", stage.label());
//!     }
//! }
//!
//! let config = ExplainerConfig::builder()
//!     .progress_callback(Arc::new(PrintStages))
//!     .build()
//!     .unwrap();
//! ```

use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A step of the extraction-and-summarisation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classifying,
    ReadingTextLayer,
    RunningOcr,
    ReadingText,
    Summarizing,
}

impl Stage {
    /// Short human-readable label, suitable for a spinner message.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Classifying => "Classifying document…",
            Stage::ReadingTextLayer => "Reading PDF text layer…",
            Stage::RunningOcr => "Running OCR…",
            Stage::ReadingText => "Reading text…",
            Stage::Summarizing => "Summarizing…",
        }
    }
}

/// Called by the pipeline as a request moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExplainProgress: Send + Sync {
    /// Called when a stage begins.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a PDF has no text layer and its pages go to OCR instead.
    fn on_ocr_fallback(&self, page_count: usize) {
        let _ = page_count;
    }

    /// Called once with the terminal outcome of a request.
    fn on_complete(&self, outcome: &Outcome) {
        let _ = outcome;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ExplainProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::ExplainerConfig`].
pub type ProgressCallback = Arc<dyn ExplainProgress>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<Stage>>,
        fallbacks: Mutex<Vec<usize>>,
    }

    impl ExplainProgress for Recorder {
        fn on_stage(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_ocr_fallback(&self, page_count: usize) {
            self.fallbacks.lock().unwrap().push(page_count);
        }
    }

    #[test]
    fn noop_does_not_panic() {
        let cb = NoopProgress;
        cb.on_stage(Stage::Classifying);
        cb.on_ocr_fallback(3);
        cb.on_complete(&Outcome::NoTextDetected);
    }

    #[test]
    fn recorder_receives_events() {
        let rec = Recorder::default();
        rec.on_stage(Stage::ReadingTextLayer);
        rec.on_ocr_fallback(2);
        rec.on_stage(Stage::RunningOcr);
        assert_eq!(
            *rec.stages.lock().unwrap(),
            vec![Stage::ReadingTextLayer, Stage::RunningOcr]
        );
        assert_eq!(*rec.fallbacks.lock().unwrap(), vec![2]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgress);
        cb.on_stage(Stage::Summarizing);
        assert_eq!(Stage::Summarizing.label(), "Summarizing…");
    }
}
