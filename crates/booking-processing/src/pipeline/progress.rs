//! Progress reporting for the processing pipeline.
//!
//! The processor emits a [`ProgressUpdate`] when each stage starts and
//! finishes, and a terminal update on completion or failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use booking_processing::DataProcessor;
//!
//! let summary = DataProcessor::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the processing pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// Reading the train and test tables
    Loading,
    /// Cleaning, encoding and skew correction of both tables
    Preprocessing,
    /// SMOTE oversampling of the training table
    Balancing,
    /// Random-forest ranking and projection of the training table
    FeatureSelection,
    /// Projecting the test table onto the training columns
    Alignment,
    /// Writing both output tables
    Saving,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl ProcessingStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Preprocessing => "Preprocessing",
            Self::Balancing => "Balancing Classes",
            Self::FeatureSelection => "Selecting Features",
            Self::Alignment => "Aligning Test Table",
            Self::Saving => "Saving Data",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Typical share of total run time spent in this stage.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.10,
            Self::Preprocessing => 0.20,
            Self::Balancing => 0.20,
            Self::FeatureSelection => 0.35,
            Self::Alignment => 0.05,
            Self::Saving => 0.10,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Preprocessing => 0.10,
            Self::Balancing => 0.30,
            Self::FeatureSelection => 0.50,
            Self::Alignment => 0.85,
            Self::Saving => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: ProcessingStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: ProcessingStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    pub fn started(stage: ProcessingStage) -> Self {
        Self::new(stage, 0.0, format!("{}...", stage.display_name()))
    }

    pub fn finished(stage: ProcessingStage, message: impl Into<String>) -> Self {
        Self::new(stage, 1.0, message)
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: ProcessingStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: ProcessingStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates from the processor.
///
/// Implementations must be `Send + Sync` so the processor can run on a
/// background thread while reporting elsewhere.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(ProcessingStage::Balancing, 0.5, "Balancing...");
        assert_eq!(update.stage, ProcessingStage::Balancing);
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.40).abs() < 1e-6);
    }

    #[test]
    fn test_started_and_finished() {
        let start = ProgressUpdate::started(ProcessingStage::Saving);
        assert_eq!(start.message, "Saving Data...");
        assert_eq!(start.stage_progress, 0.0);

        let end = ProgressUpdate::finished(ProcessingStage::Saving, "Saved");
        assert!((end.progress - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_complete() {
        let update = ProgressUpdate::complete("Done!");
        assert_eq!(update.stage, ProcessingStage::Complete);
        assert_eq!(update.progress, 1.0);
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::started(ProcessingStage::Loading));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            ProcessingStage::Loading,
            ProcessingStage::Preprocessing,
            ProcessingStage::Balancing,
            ProcessingStage::FeatureSelection,
            ProcessingStage::Alignment,
            ProcessingStage::Saving,
        ];

        let total_weight: f32 = stages.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");

        for pair in stages.windows(2) {
            let end_of_first = pair[0].base_progress() + pair[0].weight();
            assert!((end_of_first - pair[1].base_progress()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_stage_json_values() {
        let stage_expectations = [
            (ProcessingStage::Loading, "\"loading\""),
            (ProcessingStage::FeatureSelection, "\"feature_selection\""),
            (ProcessingStage::Failed, "\"failed\""),
        ];

        for (stage, expected_json) in stage_expectations {
            let json = serde_json::to_string(&stage).expect("Should serialize");
            assert_eq!(json, expected_json);
        }
    }

    #[test]
    fn test_progress_reporter_across_threads() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = Arc::new(ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let reporter_clone = reporter.clone();
        let handle = std::thread::spawn(move || {
            reporter_clone.report(ProgressUpdate::started(ProcessingStage::Loading));
        });

        handle.join().expect("Thread should not panic");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
