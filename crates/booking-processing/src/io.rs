//! CSV input and output for the pipeline tables.

use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Rows scanned when inferring column types.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Read a CSV file with a header row into memory.
pub fn load_table(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let load_error = |source| PipelineError::Load {
        path: path.to_path_buf(),
        source,
    };

    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .map_err(load_error)?
        .finish()
        .map_err(load_error)?;

    info!("Loaded {} with shape {:?}", path.display(), df.shape());
    Ok(df)
}

/// Create the output directory (and parents) if it does not exist yet.
pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| PipelineError::Save {
        path: dir.to_path_buf(),
        source: PolarsError::from(e),
    })?;
    debug!("Output directory ready: {}", dir.display());
    Ok(())
}

/// Write a table as CSV: header row, one line per record, no index column.
pub fn save_table(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let save_error = |source| PipelineError::Save {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(|e| save_error(PolarsError::from(e)))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .map_err(save_error)?;

    info!("Data saved successfully at: {}", path.display());
    Ok(())
}
