//! Depth-limited regression trees used as boosting weak learners.
//!
//! Splits are found by exact greedy search over candidate feature columns,
//! maximizing the reduction in sum of squared errors. `min_child_weight`
//! bounds the sample count on each side of a split; column subsampling at
//! each depth level is driven by the caller-supplied RNG.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// A node in the flat tree arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal split: rows with `feature <= threshold` go left
    Split {
        /// Feature column index into the full (encoded) feature matrix
        feature: usize,
        /// Split threshold (midpoint between adjacent distinct values)
        threshold: f64,
        /// Arena index of the left child
        left: usize,
        /// Arena index of the right child
        right: usize,
    },
    /// Terminal node carrying the mean target of its rows
    Leaf {
        /// Predicted value
        value: f64,
    },
}

/// Split-growth parameters, fixed for the duration of one tree fit.
#[derive(Debug, Clone, Copy)]
pub struct GrowthParams {
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum number of samples in each child
    pub min_child_weight: usize,
    /// Fraction of the tree's candidate columns re-drawn per depth level
    pub colsample_bylevel: f64,
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Fit a tree to `targets` over the given rows, considering only the
    /// given candidate columns.
    pub fn fit(
        features: ArrayView2<'_, f64>,
        targets: &[f64],
        rows: &[usize],
        columns: &[usize],
        params: GrowthParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut nodes = Vec::new();
        grow(features, targets, rows, columns, params, 0, &mut nodes, rng);
        RegressionTree { nodes }
    }

    /// Predict a single (encoded) feature row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of nodes in the tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn mean(targets: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&i| targets[i]).sum::<f64>() / rows.len() as f64
}

/// Subsample the candidate columns for one depth level.
fn level_columns(columns: &[usize], fraction: f64, rng: &mut StdRng) -> Vec<usize> {
    if fraction >= 1.0 || columns.len() <= 1 {
        return columns.to_vec();
    }
    let count = ((columns.len() as f64) * fraction).ceil().max(1.0) as usize;
    let mut pool = columns.to_vec();
    pool.shuffle(rng);
    pool.truncate(count);
    pool.sort_unstable();
    pool
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_rows: Vec<usize>,
    right_rows: Vec<usize>,
}

/// Exact greedy search for the split maximizing SSE reduction on one column.
fn best_split_on_column(
    features: ArrayView2<'_, f64>,
    targets: &[f64],
    rows: &[usize],
    column: usize,
    min_child_weight: usize,
) -> Option<BestSplit> {
    let n = rows.len();
    let mut order: Vec<usize> = rows.to_vec();
    order.sort_by(|&a, &b| {
        features[[a, column]]
            .partial_cmp(&features[[b, column]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Prefix sums of targets and squared targets along the sorted order
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let prefix: Vec<(f64, f64)> = order
        .iter()
        .map(|&i| {
            sum += targets[i];
            sum_sq += targets[i] * targets[i];
            (sum, sum_sq)
        })
        .collect();
    let (total, total_sq) = prefix[n - 1];
    let parent_sse = total_sq - total * total / n as f64;

    let mut best: Option<BestSplit> = None;
    for split_at in min_child_weight..=(n - min_child_weight) {
        let left_val = features[[order[split_at - 1], column]];
        let right_val = features[[order[split_at], column]];
        if left_val == right_val {
            continue;
        }

        let (left_sum, left_sq) = prefix[split_at - 1];
        let left_n = split_at as f64;
        let right_n = (n - split_at) as f64;
        let right_sum = total - left_sum;
        let right_sq = total_sq - left_sq;
        let sse = (left_sq - left_sum * left_sum / left_n)
            + (right_sq - right_sum * right_sum / right_n);
        let gain = parent_sse - sse;

        if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
            best = Some(BestSplit {
                feature: column,
                threshold: (left_val + right_val) / 2.0,
                gain,
                left_rows: order[..split_at].to_vec(),
                right_rows: order[split_at..].to_vec(),
            });
        }
    }
    best
}

/// Recursively grow the arena; returns the index of the created node.
#[allow(clippy::too_many_arguments)]
fn grow(
    features: ArrayView2<'_, f64>,
    targets: &[f64],
    rows: &[usize],
    columns: &[usize],
    params: GrowthParams,
    depth: usize,
    nodes: &mut Vec<TreeNode>,
    rng: &mut StdRng,
) -> usize {
    let make_leaf = |nodes: &mut Vec<TreeNode>| {
        nodes.push(TreeNode::Leaf {
            value: mean(targets, rows),
        });
        nodes.len() - 1
    };

    if depth >= params.max_depth || rows.len() < 2 * params.min_child_weight {
        return make_leaf(nodes);
    }

    let candidates = level_columns(columns, params.colsample_bylevel, rng);
    let mut best: Option<BestSplit> = None;
    for &column in &candidates {
        if let Some(split) =
            best_split_on_column(features, targets, rows, column, params.min_child_weight)
        {
            if best.as_ref().map_or(true, |b| split.gain > b.gain) {
                best = Some(split);
            }
        }
    }

    match best {
        None => make_leaf(nodes),
        Some(split) => {
            let idx = nodes.len();
            // Reserve the slot so child indices land after this node
            nodes.push(TreeNode::Leaf { value: 0.0 });
            let left = grow(
                features,
                targets,
                &split.left_rows,
                columns,
                params,
                depth + 1,
                nodes,
                rng,
            );
            let right = grow(
                features,
                targets,
                &split.right_rows,
                columns,
                params,
                depth + 1,
                nodes,
                rng,
            );
            nodes[idx] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            idx
        }
    }
}
