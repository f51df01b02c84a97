//! Pipeline module.
//!
//! The [`DataProcessor`] orchestrator and its progress reporting types.

mod processor;
pub mod progress;

pub use processor::{DataProcessor, DataProcessorBuilder, ProcessedTables, align_columns};
pub use progress::{ClosureProgressReporter, ProcessingStage, ProgressReporter, ProgressUpdate};
