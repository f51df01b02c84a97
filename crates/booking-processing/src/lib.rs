//! Booking Cancellation Preprocessing Library
//!
//! Turns the raw hotel booking train/test tables into model-ready tables,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! The [`DataProcessor`] runs, in order:
//!
//! - **Loading**: both CSV tables into memory
//! - **Preprocessing**: identifier and duplicate removal, per-column label
//!   encoding, `log1p` correction of skewed numerical columns
//! - **Balancing**: SMOTE oversampling of the training table only
//! - **Feature Selection**: random-forest importance ranking, top-k kept
//! - **Alignment**: the test table is projected onto the training columns
//! - **Saving**: both tables written as CSV
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use booking_processing::{AppConfig, DataProcessor, PathsConfig};
//!
//! let config = AppConfig::from_yaml_file("config/config.yaml")?;
//!
//! let summary = DataProcessor::builder()
//!     .config(config.data_processing)
//!     .paths(PathsConfig::default())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process()?;
//!
//! println!("Selected: {:?}", summary.selection.selected_features);
//! ```
//!
//! # Configuration
//!
//! The YAML file holds a `data_processing` mapping:
//!
//! ```yaml
//! data_processing:
//!   categorical_columns: [type_of_meal_plan, room_type_reserved, booking_status]
//!   numerical_columns: [lead_time, avg_price_per_room]
//!   skewness_threshold: 5
//!   no_of_features: 10
//! ```
//!
//! Optional keys (`target_column`, `id_column`, `encoding_mode`,
//! `smote_k_neighbors`, `random_seed`, `n_estimators`) fall back to defaults.

pub mod balancing;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod preprocessing;
pub mod selection;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use balancing::{Balancer, Smote, SmoteError};
pub use config::{
    AppConfig, ConfigValidationError, EncodingMode, PathsConfig, ProcessingConfig,
    ProcessingConfigBuilder,
};
pub use error::{ConfigError, PipelineError, PreprocessingCause, PreprocessingStep, Result};
pub use io::{load_table, save_table};
pub use pipeline::{
    ClosureProgressReporter, DataProcessor, DataProcessorBuilder, ProcessedTables, ProcessingStage,
    ProgressReporter, ProgressUpdate,
};
pub use preprocessing::{EncoderFit, EncodingError, LabelEncoder, Preprocessor};
pub use selection::{FeatureSelector, RandomForest, SelectionError};
pub use types::{
    BalancingReport, FeatureImportance, PreprocessingReport, ProcessingSummary, SelectionReport,
};
