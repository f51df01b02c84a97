//! SMOTE (Synthetic Minority Over-sampling Technique).
//!
//! Each non-majority class is grown to the majority count. A synthetic row
//! is placed at a random point on the segment between a class sample and one
//! of its `k` nearest same-class neighbours.

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::cmp::Ordering;
use thiserror::Error;

use crate::utils::MatrixError;

#[derive(Error, Debug)]
pub enum SmoteError {
    #[error("Target column '{0}' not found in table")]
    MissingTarget(String),

    #[error("Need at least 2 classes for SMOTE")]
    SingleClass,

    #[error("Cannot oversample an empty table")]
    EmptyTable,

    #[error("k_neighbors must be at least 1")]
    ZeroNeighbors,

    #[error(
        "Class '{class}' has {samples} samples, SMOTE with k_neighbors={k_neighbors} needs at least {}",
        k_neighbors + 1
    )]
    InsufficientSamples {
        class: String,
        samples: usize,
        k_neighbors: usize,
    },

    #[error("Feature column '{column}' is not numeric ({dtype})")]
    NonNumericFeature { column: String, dtype: String },

    #[error("Feature column '{0}' contains null values")]
    NullFeatureValues(String),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

impl From<MatrixError> for SmoteError {
    fn from(err: MatrixError) -> Self {
        match err {
            MatrixError::NonNumeric { column, dtype } => Self::NonNumericFeature { column, dtype },
            MatrixError::NullValues(column) => Self::NullFeatureValues(column),
            MatrixError::Polars(e) => Self::Polars(e),
        }
    }
}

/// Synthetic rows generated for the minority classes.
#[derive(Debug, Clone, Default)]
pub struct Resampled {
    /// Feature vectors of the generated rows.
    pub rows: Vec<Vec<f64>>,
    /// Index of the original row each synthetic row was grown from.
    /// The synthetic row shares that row's class.
    pub base_rows: Vec<usize>,
}

/// SMOTE sampler with a fixed neighbour count and seed.
#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self::new(5, 42)
    }
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self {
            k_neighbors,
            seed,
        }
    }

    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    /// Generate the rows needed to equalize every class with the majority.
    ///
    /// `classes[i]` is the class index of row `i` of `x`; `class_names` is only
    /// used for error messages.
    pub fn fit_resample(
        &self,
        x: &[Vec<f64>],
        classes: &[usize],
        class_names: &[String],
    ) -> Result<Resampled, SmoteError> {
        if self.k_neighbors == 0 {
            return Err(SmoteError::ZeroNeighbors);
        }
        if x.is_empty() {
            return Err(SmoteError::EmptyTable);
        }

        let n_classes = class_names.len();
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
        for (row, &class) in classes.iter().enumerate() {
            members[class].push(row);
        }

        if members.iter().filter(|m| !m.is_empty()).count() < 2 {
            return Err(SmoteError::SingleClass);
        }

        let majority = members.iter().map(Vec::len).max().unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut resampled = Resampled::default();

        for (class, rows) in members.iter().enumerate() {
            let n_to_generate = majority - rows.len();
            if n_to_generate == 0 {
                continue;
            }
            if rows.len() < self.k_neighbors + 1 {
                return Err(SmoteError::InsufficientSamples {
                    class: class_names[class].clone(),
                    samples: rows.len(),
                    k_neighbors: self.k_neighbors,
                });
            }

            let samples: Vec<&[f64]> = rows.iter().map(|&r| x[r].as_slice()).collect();
            let neighbors = self.nearest_neighbors(&samples);

            for _ in 0..n_to_generate {
                let pick = rng.gen_range(0..samples.len() * self.k_neighbors);
                let sample = pick / self.k_neighbors;
                let neighbor = neighbors[sample][pick % self.k_neighbors];
                let step: f64 = rng.r#gen();

                resampled
                    .rows
                    .push(interpolate(samples[sample], samples[neighbor], step));
                resampled.base_rows.push(rows[sample]);
            }
        }

        Ok(resampled)
    }

    /// For each sample, the positions of its `k` nearest other samples.
    /// Ties keep the lower position first.
    fn nearest_neighbors(&self, samples: &[&[f64]]) -> Vec<Vec<usize>> {
        samples
            .par_iter()
            .enumerate()
            .map(|(i, point)| {
                let mut distances: Vec<(usize, f64)> = samples
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(j, other)| (j, squared_distance(point, other)))
                    .collect();
                distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
                distances
                    .into_iter()
                    .take(self.k_neighbors)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect()
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn interpolate(point: &[f64], neighbor: &[f64], step: f64) -> Vec<f64> {
    point
        .iter()
        .zip(neighbor)
        .map(|(&p, &n)| p + step * (n - p))
        .collect()
}
