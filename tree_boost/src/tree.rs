//! CART regression trees fitted to squared-error residuals

use serde::{Deserialize, Serialize};

/// A node in the flat tree arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Terminal node holding the (unshrunk) output value
    Leaf { value: f64 },
    /// Internal node; rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        gain: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// Best split found for one node
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Grows a single tree over column-major training data.
///
/// `columns[feature][row]` holds the feature values and `residuals[row]` the
/// current negative gradient of the squared-error loss.
pub(crate) struct TreeGrower<'a> {
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) residuals: &'a [f64],
    pub(crate) features: &'a [usize],
    pub(crate) max_depth: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) reg_lambda: f64,
}

impl<'a> TreeGrower<'a> {
    /// Grow a tree on the given row subset
    pub(crate) fn grow(&self, rows: Vec<usize>) -> RegressionTree {
        let mut nodes = Vec::new();
        self.grow_node(rows, 0, &mut nodes);
        RegressionTree { nodes }
    }

    fn grow_node(&self, rows: Vec<usize>, depth: usize, nodes: &mut Vec<Node>) -> usize {
        let index = nodes.len();
        nodes.push(Node::Leaf {
            value: self.leaf_value(&rows),
        });

        if depth >= self.max_depth || rows.len() < 2 * self.min_samples_leaf {
            return index;
        }

        let Some(best) = self.best_split(&rows) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&row| self.columns[best.feature][row] <= best.threshold);

        // Midpoint rounding can collapse a split on adjacent floats
        if left_rows.is_empty() || right_rows.is_empty() {
            return index;
        }

        let left = self.grow_node(left_rows, depth + 1, nodes);
        let right = self.grow_node(right_rows, depth + 1, nodes);
        nodes[index] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            gain: best.gain,
            left,
            right,
        };
        index
    }

    fn leaf_value(&self, rows: &[usize]) -> f64 {
        let sum: f64 = rows.iter().map(|&row| self.residuals[row]).sum();
        sum / (rows.len() as f64 + self.reg_lambda)
    }

    fn score(&self, gradient_sum: f64, count: usize) -> f64 {
        gradient_sum * gradient_sum / (count as f64 + self.reg_lambda)
    }

    fn best_split(&self, rows: &[usize]) -> Option<SplitCandidate> {
        let total: f64 = rows.iter().map(|&row| self.residuals[row]).sum();
        let parent_score = self.score(total, rows.len());
        let mut best: Option<SplitCandidate> = None;

        for &feature in self.features {
            let column = &self.columns[feature];
            let mut sorted: Vec<(f64, f64)> = rows
                .iter()
                .map(|&row| (column[row], self.residuals[row]))
                .collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for i in 1..sorted.len() {
                left_sum += sorted[i - 1].1;
                let n_left = i;
                let n_right = sorted.len() - i;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }
                if sorted[i - 1].0 >= sorted[i].0 {
                    continue;
                }

                let gain = self.score(left_sum, n_left) + self.score(total - left_sum, n_right)
                    - parent_score;
                if gain > 0.0 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (sorted[i - 1].0 + sorted[i].0) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

impl RegressionTree {
    /// Output of the tree for a single row
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// All nodes, root first
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// Add this tree's split gains into `totals`, indexed by feature
    pub(crate) fn accumulate_gain(&self, totals: &mut [f64]) {
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = node {
                totals[*feature] += gain;
            }
        }
    }
}
