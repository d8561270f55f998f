//! ID3 tree builder
//!
//! Grows a decision tree top-down, splitting each node on the feature with
//! the highest information gain. Bins come from the per-feature cache built
//! once at training start, so every branch splitting on a feature uses the
//! same edges.
//!
//! The natural recursion is run on an explicit worklist over row-index
//! views of the training table. Nodes are first written into an arena
//! (children always after their parent) and then assembled bottom-up into
//! the owned [`TreeNode`] structure.

use id3_core::{
    gain_over_rows, majority_label, partition_rows, Bin, Column, Dataset, Edge, Id3Error,
    TreeNode,
};
use tracing::debug;

/// Best feature found for a node.
///
/// Candidates are compared by gain only; among equal gains the feature with
/// the lowest column position wins.
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    position: usize,
    gain: f64,
}

impl SplitCandidate {
    fn beats(&self, current: &SplitCandidate) -> bool {
        self.gain > current.gain
            || (self.gain == current.gain && self.position < current.position)
    }
}

/// Node recorded in the arena before assembly
enum Draft {
    Leaf(String),
    Internal { position: usize, children: Vec<usize> },
}

/// Pending node expansion
struct Task {
    slot: usize,
    rows: Vec<usize>,
    features: Vec<usize>,
    depth_left: Option<usize>,
}

/// Builds an ID3 tree over a labelled dataset with precomputed bins
pub struct TreeBuilder<'a> {
    columns: &'a [Column],
    labels: &'a [String],
    bins: Vec<&'a [Bin]>,
}

impl<'a> TreeBuilder<'a> {
    /// `bins[i]` are the cached bins of feature column `i`.
    pub fn new(dataset: &'a Dataset, bins: Vec<&'a [Bin]>) -> Result<Self, Id3Error> {
        let labels = dataset.labels()?;
        if bins.len() != dataset.n_features() {
            return Err(Id3Error::Configuration(format!(
                "expected bins for {} features, got {}",
                dataset.n_features(),
                bins.len()
            )));
        }
        Ok(Self {
            columns: dataset.features(),
            labels,
            bins,
        })
    }

    /// Build the tree. `None` means unlimited depth.
    pub fn build(&self, depth_limit: Option<usize>) -> Result<TreeNode, Id3Error> {
        if self.labels.is_empty() {
            return Err(Id3Error::EmptyDataset);
        }

        let mut arena: Vec<Option<Draft>> = vec![None];
        let mut stack = vec![Task {
            slot: 0,
            rows: (0..self.labels.len()).collect(),
            features: (0..self.columns.len()).collect(),
            depth_left: depth_limit,
        }];

        while let Some(task) = stack.pop() {
            let slot = task.slot;
            let draft = self.expand(task, &mut arena, &mut stack);
            arena[slot] = Some(draft);
        }

        self.assemble(arena)
    }

    /// Decide what the node for `task` becomes, queueing its children.
    fn expand(&self, task: Task, arena: &mut Vec<Option<Draft>>, stack: &mut Vec<Task>) -> Draft {
        let Task {
            rows,
            features,
            depth_left,
            ..
        } = task;

        let first = self.labels[rows[0]].as_str();
        if rows.iter().all(|&r| self.labels[r] == first) {
            return Draft::Leaf(first.to_string());
        }

        let majority = self.majority(&rows);
        if features.is_empty() || depth_left == Some(0) {
            return Draft::Leaf(majority);
        }

        let best = self.select_feature(&rows, &features);
        debug!(
            feature = self.columns[best.position].name(),
            gain = best.gain,
            rows = rows.len(),
            "splitting node"
        );

        let remaining: Vec<usize> = features
            .iter()
            .copied()
            .filter(|&f| f != best.position)
            .collect();
        let child_depth = depth_left.map(|d| d - 1);

        let groups = partition_rows(&self.columns[best.position], &rows, self.bins[best.position]);
        let mut children = Vec::with_capacity(groups.len());
        for group in groups {
            let slot = arena.len();
            if group.is_empty() {
                // Unseen bin: fall back to the parent's majority label.
                arena.push(Some(Draft::Leaf(majority.clone())));
            } else {
                arena.push(None);
                stack.push(Task {
                    slot,
                    rows: group,
                    features: remaining.clone(),
                    depth_left: child_depth,
                });
            }
            children.push(slot);
        }

        Draft::Internal {
            position: best.position,
            children,
        }
    }

    fn select_feature(&self, rows: &[usize], features: &[usize]) -> SplitCandidate {
        let mut best: Option<SplitCandidate> = None;
        for &position in features {
            let candidate = SplitCandidate {
                position,
                gain: gain_over_rows(self.labels, &self.columns[position], rows, self.bins[position]),
            };
            best = match best {
                Some(current) if !candidate.beats(&current) => Some(current),
                _ => Some(candidate),
            };
        }
        // `features` is non-empty here, the caller returns a leaf otherwise.
        best.unwrap_or(SplitCandidate {
            position: features[0],
            gain: 0.0,
        })
    }

    fn majority(&self, rows: &[usize]) -> String {
        majority_label(rows.iter().map(|&r| self.labels[r].as_str()))
            .unwrap_or_default()
            .to_string()
    }

    /// Turn the arena into the owned tree, children first.
    fn assemble(&self, arena: Vec<Option<Draft>>) -> Result<TreeNode, Id3Error> {
        let mut built: Vec<Option<TreeNode>> = Vec::new();
        built.resize_with(arena.len(), || None);

        for (slot, draft) in arena.into_iter().enumerate().rev() {
            let node = match draft {
                Some(Draft::Leaf(label)) => TreeNode::leaf(label),
                Some(Draft::Internal { position, children }) => {
                    let mut edges = Vec::with_capacity(children.len());
                    for (bin, child) in self.bins[position].iter().zip(children) {
                        let child = built[child].take().ok_or_else(|| {
                            Id3Error::InvalidModel(format!("node {slot} lost child {child}"))
                        })?;
                        edges.push(Edge {
                            bin: bin.clone(),
                            child,
                        });
                    }
                    TreeNode::internal(self.columns[position].name(), edges)
                }
                None => {
                    return Err(Id3Error::InvalidModel(format!(
                        "node {slot} was never expanded"
                    )))
                }
            };
            built[slot] = Some(node);
        }

        built
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| Id3Error::InvalidModel("empty tree".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use id3_core::{values_of, Discretization};

    fn build(dataset: &Dataset, bin_count: Option<usize>, depth: Option<usize>) -> TreeNode {
        let options = Discretization::new(bin_count);
        let bins: Vec<Vec<Bin>> = dataset
            .features()
            .iter()
            .map(|c| values_of(c, &options).unwrap())
            .collect();
        let builder = TreeBuilder::new(dataset, bins.iter().map(Vec::as_slice).collect()).unwrap();
        builder.build(depth).unwrap()
    }

    #[test]
    fn test_leftmost_feature_wins_ties() {
        // Both features separate the labels perfectly.
        let dataset = Dataset::new(vec![
            Column::nominal("first", ["p", "q", "p", "q"]),
            Column::nominal("second", ["m", "n", "m", "n"]),
            Column::nominal("label", ["0", "1", "0", "1"]),
        ])
        .unwrap();
        let tree = build(&dataset, None, None);
        match tree {
            TreeNode::Internal { feature, .. } => assert_eq!(feature, "first"),
            TreeNode::Leaf { .. } => panic!("expected a split"),
        }
    }

    #[test]
    fn test_leftmost_wins_with_reversed_categories() {
        // `b` groups rows exactly like `a` but declares its categories in
        // reverse, so its edges come in the opposite order.
        for seed in 0..200usize {
            let n = 7 + seed % 31;
            let names = ["p", "q", "r"];
            let values: Vec<&str> = (0..n)
                .map(|i| names[(i * 11 + seed * 5 + i * i) % 3])
                .collect();
            let labels: Vec<String> = (0..n)
                .map(|i| ((i * 3 + seed + i / 4) % 3).to_string())
                .collect();
            let dataset = Dataset::new(vec![
                Column::categorical("a", ["p", "q", "r"], values.clone()),
                Column::categorical("b", ["r", "q", "p"], values),
                Column::nominal("label", labels),
            ])
            .unwrap();

            if let TreeNode::Internal { feature, .. } = build(&dataset, None, Some(1)) {
                assert_eq!(feature, "a", "seed {seed}");
            }
        }
    }

    #[test]
    fn test_higher_gain_feature_chosen() {
        let dataset = Dataset::new(vec![
            Column::nominal("noise", ["a", "a", "b", "b"]),
            Column::nominal("signal", ["x", "y", "x", "y"]),
            Column::nominal("label", ["0", "1", "0", "1"]),
        ])
        .unwrap();
        let tree = build(&dataset, None, None);
        assert!(matches!(tree, TreeNode::Internal { ref feature, .. } if feature == "signal"));
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_features_exhausted_gives_majority() {
        // Identical feature values with conflicting labels.
        let dataset = Dataset::new(vec![
            Column::nominal("a", ["x", "x", "x"]),
            Column::nominal("label", ["1", "0", "0"]),
        ])
        .unwrap();
        let tree = build(&dataset, None, None);
        let edges = tree.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].child.label(), Some("0"));
    }

    #[test]
    fn test_empty_bin_uses_parent_majority() {
        let dataset = Dataset::new(vec![
            Column::categorical("c", ["a", "b", "unseen"], ["a", "b", "b"]),
            Column::nominal("label", ["yes", "no", "no"]),
        ])
        .unwrap();
        let tree = build(&dataset, None, None);
        let edges = tree.edges();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2].bin, Bin::Category("unseen".into()));
        assert_eq!(edges[2].child.label(), Some("no"));
    }

    #[test]
    fn test_depth_limit_caps_tree() {
        let dataset = Dataset::new(vec![
            Column::nominal("a", ["0", "0", "1", "1", "0", "1"]),
            Column::nominal("b", ["0", "1", "0", "1", "1", "0"]),
            Column::nominal("label", ["0", "1", "1", "0", "1", "1"]),
        ])
        .unwrap();

        assert_eq!(build(&dataset, None, Some(0)).depth(), 0);
        assert!(build(&dataset, None, Some(1)).depth() <= 1);
        assert_eq!(build(&dataset, None, None).depth(), 2);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        // Each feature peels off one row, producing a tree as deep as the
        // feature count.
        let n = 250;
        let mut columns = Vec::new();
        for f in 0..n {
            let values: Vec<String> = (0..=n)
                .map(|r| if r == f { "hit".to_string() } else { "miss".to_string() })
                .collect();
            columns.push(Column::nominal(format!("f{f:03}"), values));
        }
        let labels: Vec<String> = (0..=n).map(|r| (r % 2).to_string()).collect();
        columns.push(Column::nominal("label", labels));
        let dataset = Dataset::new(columns).unwrap();

        let tree = build(&dataset, None, None);
        assert!(tree.depth() > 100);
    }
}
