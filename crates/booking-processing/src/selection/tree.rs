//! Gini classification tree used by the forest to score features.
//!
//! The tree only records the structure it grew and the impurity decrease
//! each split contributed; it is never used for prediction.

use rand::rngs::StdRng;
use rand::seq::index;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub enum TreeNode {
    Leaf {
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Training data shared by every node of one tree.
pub struct TreeData<'a> {
    /// Row-major feature matrix.
    pub x: &'a [Vec<f64>],
    /// Class index per row.
    pub y: &'a [usize],
    pub n_classes: usize,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    /// Features drawn (without replacement) at every split.
    pub max_features: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    root: Option<TreeNode>,
    /// Unnormalized impurity decrease per feature.
    importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features: max_features.max(1),
            min_samples_split: 2,
            min_samples_leaf: 1,
            root: None,
            importances: Vec::new(),
        }
    }

    /// Grow the tree on the rows listed in `samples` (repeats allowed).
    pub fn fit(&mut self, data: &TreeData<'_>, samples: &[usize], rng: &mut StdRng) {
        let n_features = data.x.first().map_or(0, Vec::len);
        let mut importances = vec![0.0; n_features];
        let mut samples = samples.to_vec();
        let root = self.build(data, &mut samples, rng, &mut importances);
        self.root = Some(root);
        self.importances = importances;
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Importances of this tree normalized to sum 1, or all zero when the
    /// tree never split.
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.importances.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.importances.len()];
        }
        self.importances.iter().map(|v| v / total).collect()
    }

    fn build(
        &self,
        data: &TreeData<'_>,
        samples: &mut [usize],
        rng: &mut StdRng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = samples.len();
        let counts = class_counts(data, samples);
        let impurity = gini(&counts, n_samples);

        if n_samples < self.min_samples_split || impurity <= 0.0 {
            return TreeNode::Leaf { n_samples };
        }

        let Some(split) = self.best_split(data, samples, &counts, rng) else {
            return TreeNode::Leaf { n_samples };
        };

        samples.sort_by(|&a, &b| {
            cmp_f64(data.x[a][split.feature_idx], data.x[b][split.feature_idx])
        });
        let (left, right) = samples.split_at_mut(split.left_len);

        importances[split.feature_idx] += n_samples as f64 * impurity
            - left.len() as f64 * split.left_impurity
            - right.len() as f64 * split.right_impurity;

        TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left: Box::new(self.build(data, left, rng, importances)),
            right: Box::new(self.build(data, right, rng, importances)),
            n_samples,
        }
    }

    fn best_split(
        &self,
        data: &TreeData<'_>,
        samples: &[usize],
        parent_counts: &[usize],
        rng: &mut StdRng,
    ) -> Option<Split> {
        let n_features = data.x[samples[0]].len();
        let n = samples.len();
        // Constant features are skipped without counting toward max_features.
        let candidates = index::sample(rng, n_features, n_features);

        let mut best: Option<Split> = None;
        let mut best_score = f64::INFINITY;
        let mut order = samples.to_vec();
        let mut visited = 0;

        for feature_idx in candidates.iter() {
            if visited == self.max_features {
                break;
            }
            order.sort_by(|&a, &b| cmp_f64(data.x[a][feature_idx], data.x[b][feature_idx]));
            if data.x[order[0]][feature_idx] >= data.x[order[n - 1]][feature_idx] {
                continue;
            }
            visited += 1;

            let mut left_counts = vec![0usize; data.n_classes];
            let mut right_counts = parent_counts.to_vec();

            for pos in 1..n {
                let moved = data.y[order[pos - 1]];
                left_counts[moved] += 1;
                right_counts[moved] -= 1;

                let prev = data.x[order[pos - 1]][feature_idx];
                let next = data.x[order[pos]][feature_idx];
                if next <= prev {
                    continue;
                }
                if pos < self.min_samples_leaf || n - pos < self.min_samples_leaf {
                    continue;
                }

                let left_impurity = gini(&left_counts, pos);
                let right_impurity = gini(&right_counts, n - pos);
                let score = pos as f64 * left_impurity + (n - pos) as f64 * right_impurity;

                if score < best_score {
                    best_score = score;
                    best = Some(Split {
                        feature_idx,
                        threshold: prev + (next - prev) / 2.0,
                        left_len: pos,
                        left_impurity,
                        right_impurity,
                    });
                }
            }
        }

        best
    }
}

struct Split {
    feature_idx: usize,
    threshold: f64,
    left_len: usize,
    left_impurity: f64,
    right_impurity: f64,
}

fn class_counts(data: &TreeData<'_>, samples: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; data.n_classes];
    for &i in samples {
        counts[data.y[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
