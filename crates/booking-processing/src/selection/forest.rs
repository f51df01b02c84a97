//! Random forest classifier reduced to what feature ranking needs:
//! bootstrap samples, Gini trees and mean-decrease-in-impurity importances.

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::debug;

use super::tree::{DecisionTree, TreeData, TreeNode};

/// Number of features drawn at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1
    Sqrt,
    /// Every feature
    All,
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
        }
        .max(1)
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    pub n_estimators: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: u64,
    feature_importances: Option<Vec<f64>>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100, 42)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize, random_state: u64) -> Self {
        Self {
            n_estimators,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state,
            feature_importances: None,
        }
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Fit the forest. Trees are grown in parallel; tree `i` is seeded
    /// with `random_state + i`, so the result does not depend on scheduling.
    /// With `n_estimators == 0` every importance is zero.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize) -> &mut Self {
        let n_samples = x.len();
        let n_features = x.first().map_or(0, Vec::len);
        let max_features = self.max_features.resolve(n_features);
        let data = TreeData { x, y, n_classes };

        debug!(
            "Fitting {} trees on {} rows x {} features (max_features={})",
            self.n_estimators, n_samples, n_features, max_features
        );

        let per_tree: Vec<(Vec<f64>, usize)> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(self.random_state.wrapping_add(tree_idx as u64));
                let samples: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new(max_features);
                tree.fit(&data, &samples, &mut rng);
                let depth = tree.root().map_or(0, TreeNode::depth);
                (tree.feature_importances(), depth)
            })
            .collect();

        let deepest = per_tree.iter().map(|(_, depth)| *depth).max().unwrap_or(0);
        debug!("Deepest tree has depth {}", deepest);

        let mut importances = vec![0.0; n_features];
        for (tree_importances, _) in &per_tree {
            for (total, value) in importances.iter_mut().zip(tree_importances) {
                *total += value;
            }
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for value in &mut importances {
                *value /= sum;
            }
        }

        self.feature_importances = Some(importances);
        self
    }

    /// Normalized importances, one per feature column; `None` before `fit`.
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feature 0 decides the class, features 1 and 2 are noise.
    fn fixture(n: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(7);
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let class = i % 2;
            let signal = class as f64 * 10.0 + rng.gen_range(0.0..1.0);
            x.push(vec![signal, rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)]);
            y.push(class);
        }
        (x, y)
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(9), 3);
        assert_eq!(MaxFeatures::Sqrt.resolve(10), 3);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(0), 1);
        assert_eq!(MaxFeatures::All.resolve(7), 7);
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (x, y) = fixture(60);
        let mut forest = RandomForest::new(25, 42);
        forest.fit(&x, &y, 2);
        let importances = forest.feature_importances().unwrap();
        assert_eq!(importances.len(), 3);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_informative_feature_ranks_first() {
        let (x, y) = fixture(60);
        let mut forest = RandomForest::new(50, 42);
        forest.fit(&x, &y, 2);
        let importances = forest.feature_importances().unwrap();
        assert!(importances[0] > importances[1]);
        assert!(importances[0] > importances[2]);
    }

    #[test]
    fn test_same_seed_same_importances() {
        let (x, y) = fixture(40);
        let mut a = RandomForest::new(20, 42);
        let mut b = RandomForest::new(20, 42);
        a.fit(&x, &y, 2);
        b.fit(&x, &y, 2);
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_single_class_gives_zero_importances() {
        let x = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let y = vec![0, 0, 0];
        let mut forest = RandomForest::new(5, 1).with_bootstrap(false);
        forest.fit(&x, &y, 1);
        assert_eq!(forest.feature_importances(), Some(&[0.0, 0.0][..]));
    }

    #[test]
    fn test_zero_estimators_is_kept() {
        let (x, y) = fixture(10);
        let mut forest = RandomForest::new(0, 42);
        assert_eq!(forest.n_estimators, 0);
        forest.fit(&x, &y, 2);
        assert_eq!(forest.feature_importances(), Some(&[0.0, 0.0, 0.0][..]));
    }
}
