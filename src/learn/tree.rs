//! Multi-way classification tree stored as an arena of nodes.
//!
//! Nodes are added in any order with their parent id, then
//! [`TreeBuilder::finalize`] links children to parents in a single pass.

use crate::error::{Result, WordspaceError};
use crate::kernel::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Split rule of an internal node.
///
/// Branch `b` takes values in `(thresholds[b-1], thresholds[b]]`; values
/// above the last threshold take the last branch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub axis: usize,
    pub thresholds: Vec<f64>,
}

impl Split {
    pub fn new(axis: usize, thresholds: Vec<f64>) -> Self {
        Self { axis, thresholds }
    }

    /// Number of branches, always `thresholds + 1`.
    pub fn branches(&self) -> usize {
        self.thresholds.len() + 1
    }

    /// Branch taken by `value`.
    pub fn branch(&self, value: f64) -> usize {
        branch_index(&self.thresholds, value)
    }
}

/// First threshold at or above `value`, or the last branch when `value`
/// exceeds them all.
pub(crate) fn branch_index(thresholds: &[f64], value: f64) -> usize {
    thresholds
        .iter()
        .position(|&t| value <= t)
        .unwrap_or(thresholds.len())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node<L> {
    id: usize,
    parent: Option<usize>,
    split: Option<Split>,
    probabilities: Vec<(L, f64)>,
    children: Vec<usize>,
}

impl<L> Node<L> {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// `None` on terminal nodes.
    pub fn split(&self) -> Option<&Split> {
        self.split.as_ref()
    }

    /// Label frequencies among the training points that reached this node.
    pub fn probabilities(&self) -> &[(L, f64)] {
        &self.probabilities
    }

    /// Child ids in branch order.
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn is_terminal(&self) -> bool {
        self.split.is_none()
    }
}

/// Collects nodes before they are linked into a [`DecisionTree`].
#[derive(Debug)]
pub struct TreeBuilder<L> {
    nodes: Vec<Node<L>>,
}

impl<L> Default for TreeBuilder<L> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<L> TreeBuilder<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        id: usize,
        parent: Option<usize>,
        split: Option<Split>,
        probabilities: Vec<(L, f64)>,
    ) {
        self.nodes.push(Node {
            id,
            parent,
            split,
            probabilities,
            children: Vec::new(),
        });
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Link every node to its parent.
    ///
    /// Ids must be `0..n` with `0` the only root, every parent id smaller than
    /// its child's id, and every internal node must end up with exactly one
    /// child per branch. Children are ordered by id.
    pub fn finalize(mut self) -> Result<DecisionTree<L>> {
        self.nodes.sort_by_key(|n| n.id);
        check_ids(&self.nodes)?;

        let links: Vec<(usize, usize)> = self
            .nodes
            .iter()
            .filter_map(|n| n.parent.map(|p| (p, n.id)))
            .collect();
        for (parent, child) in links {
            self.nodes[parent].children.push(child);
        }

        check_links(&self.nodes)?;
        Ok(DecisionTree { nodes: self.nodes })
    }
}

/// Ids are `0..n` in position order, `0` is the only root and every parent
/// precedes its child.
fn check_ids<L>(nodes: &[Node<L>]) -> Result<()> {
    if nodes.is_empty() {
        return Err(WordspaceError::EmptyInput("tree has no nodes".to_string()));
    }
    for (i, node) in nodes.iter().enumerate() {
        if node.id != i {
            return Err(WordspaceError::InvalidArgument(format!(
                "node ids must be contiguous from 0, found {} at position {}",
                node.id, i
            )));
        }
        match node.parent {
            None if i != 0 => {
                return Err(WordspaceError::InvalidArgument(format!(
                    "node {} has no parent",
                    i
                )))
            }
            Some(p) if p >= i => {
                return Err(WordspaceError::InvalidArgument(format!(
                    "node {} has parent {} that does not precede it",
                    i, p
                )))
            }
            _ => {}
        }
    }
    Ok(())
}

/// One child per branch, listed in ascending id order, each pointing back at
/// the node that lists it. Assumes [`check_ids`] passed.
fn check_links<L>(nodes: &[Node<L>]) -> Result<()> {
    let mut linked = 0;
    for node in nodes {
        let expected = node.split.as_ref().map_or(0, Split::branches);
        if node.children.len() != expected {
            return Err(WordspaceError::InvalidArgument(format!(
                "node {} has {} children, expected {}",
                node.id,
                node.children.len(),
                expected
            )));
        }
        if node.children.windows(2).any(|w| w[0] >= w[1]) {
            return Err(WordspaceError::InvalidArgument(format!(
                "children of node {} are not in ascending id order",
                node.id
            )));
        }
        for &child in &node.children {
            if nodes.get(child).and_then(|c| c.parent) != Some(node.id) {
                return Err(WordspaceError::InvalidArgument(format!(
                    "node {} lists child {} that does not name it as parent",
                    node.id, child
                )));
            }
        }
        linked += node.children.len();
    }
    if linked != nodes.len() - 1 {
        return Err(WordspaceError::InvalidArgument(format!(
            "{} of {} non-root nodes are linked to their parent",
            linked,
            nodes.len() - 1
        )));
    }
    Ok(())
}

/// A linked classification tree. Node `0` is the root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TreeData<L>")]
pub struct DecisionTree<L> {
    nodes: Vec<Node<L>>,
}

/// Unchecked wire form; a deserialized tree must pass the same checks as
/// [`TreeBuilder::finalize`].
#[derive(Deserialize)]
struct TreeData<L> {
    nodes: Vec<Node<L>>,
}

impl<L> TryFrom<TreeData<L>> for DecisionTree<L> {
    type Error = WordspaceError;

    fn try_from(raw: TreeData<L>) -> Result<Self> {
        check_ids(&raw.nodes)?;
        check_links(&raw.nodes)?;
        Ok(Self { nodes: raw.nodes })
    }
}

impl<L> DecisionTree<L> {
    pub fn root(&self) -> &Node<L> {
        &self.nodes[0]
    }

    pub fn node(&self, id: usize) -> Option<&Node<L>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[Node<L>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Terminal node reached by `point`.
    pub fn leaf(&self, point: &[f64]) -> Result<&Node<L>> {
        let mut node = self.root();
        while let Some(split) = &node.split {
            let value = point
                .get(split.axis)
                .copied()
                .ok_or(WordspaceError::DimensionMismatch {
                    expected: split.axis + 1,
                    got: point.len(),
                })?;
            node = node
                .children
                .get(split.branch(value))
                .and_then(|&child| self.nodes.get(child))
                .ok_or_else(|| {
                    WordspaceError::InvalidArgument(format!(
                        "node {} has no child for its branch",
                        node.id
                    ))
                })?;
        }
        Ok(node)
    }

    /// Label-probability table for `point`.
    pub fn classify(&self, point: &[f64]) -> Result<&[(L, f64)]> {
        Ok(self.leaf(point)?.probabilities())
    }

    /// One table per row of `points`, in row order.
    pub fn classify_batch(&self, points: &Matrix) -> Result<Vec<&[(L, f64)]>> {
        points.iter_rows().map(|p| self.classify(p)).collect()
    }
}

impl<L: fmt::Display> fmt::Display for DecisionTree<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // (node, depth, condition leading to it)
        let mut stack: Vec<(usize, usize, Option<String>)> = vec![(0, 0, None)];
        while let Some((id, depth, condition)) = stack.pop() {
            let node = &self.nodes[id];
            let indent = "\t".repeat(depth);
            let depth = match condition {
                Some(condition) => {
                    writeln!(f, "{}{}", indent, condition)?;
                    depth + 1
                }
                None => depth,
            };

            match &node.split {
                Some(split) => {
                    let last = split.thresholds.len();
                    for (b, &child) in node.children.iter().enumerate().rev() {
                        let condition = if b < last {
                            format!("axis-{}: <={}", split.axis, split.thresholds[b])
                        } else {
                            // last branch is everything above the last threshold
                            match split.thresholds.last() {
                                Some(t) => format!("axis-{}: >{}", split.axis, t),
                                None => format!("axis-{}: *", split.axis),
                            }
                        };
                        stack.push((child, depth, Some(condition)));
                    }
                }
                None => {
                    let table = node
                        .probabilities
                        .iter()
                        .map(|(label, p)| format!("{}: {:.3}", label, p))
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(f, "{}[{}]", "\t".repeat(depth), table)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root splits axis 0 at [0, 10]; child 2 splits axis 1 at [5].
    fn sample() -> DecisionTree<&'static str> {
        let mut builder = TreeBuilder::new();
        // Insertion order deliberately scrambled
        builder.add_node(4, Some(2), None, vec![("hi", 1.0)]);
        builder.add_node(1, Some(0), None, vec![("lo", 1.0)]);
        builder.add_node(
            0,
            None,
            Some(Split::new(0, vec![0.0, 10.0])),
            vec![("hi", 0.5), ("lo", 0.5)],
        );
        builder.add_node(5, Some(2), None, vec![("lo", 0.25), ("hi", 0.75)]);
        builder.add_node(3, Some(0), None, vec![("hi", 1.0)]);
        builder.add_node(
            2,
            Some(0),
            Some(Split::new(1, vec![5.0])),
            vec![("hi", 0.6), ("lo", 0.4)],
        );
        builder.finalize().unwrap()
    }

    #[test]
    fn test_finalize_links_children_in_id_order() {
        let tree = sample();
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.root().children(), &[1, 2, 3]);
        assert_eq!(tree.node(2).unwrap().children(), &[4, 5]);
        assert!(tree.node(3).unwrap().is_terminal());
        assert_eq!(tree.node(5).unwrap().parent(), Some(2));
    }

    #[test]
    fn test_classify_boundaries() {
        let tree = sample();
        // threshold is an inclusive upper bound
        assert_eq!(tree.leaf(&[0.0, 0.0]).unwrap().id(), 1);
        assert_eq!(tree.leaf(&[0.1, 5.0]).unwrap().id(), 4);
        assert_eq!(tree.leaf(&[10.0, 5.1]).unwrap().id(), 5);
        assert_eq!(tree.classify(&[-3.0, 99.0]).unwrap(), &[("lo", 1.0)]);
    }

    #[test]
    fn test_value_above_all_thresholds_takes_last_branch() {
        let tree = sample();
        assert_eq!(tree.leaf(&[1e9, 0.0]).unwrap().id(), 3);
        assert_eq!(tree.leaf(&[5.0, 1e9]).unwrap().id(), 5);
    }

    #[test]
    fn test_classify_batch_preserves_order() {
        let tree = sample();
        let points = Matrix::from_rows(&[[20.0, 0.0], [-1.0, 0.0], [3.0, 1.0]]).unwrap();
        let tables = tree.classify_batch(&points).unwrap();
        assert_eq!(tables[0], &[("hi", 1.0)]);
        assert_eq!(tables[1], &[("lo", 1.0)]);
        assert_eq!(tables[2], &[("hi", 1.0)]);
    }

    #[test]
    fn test_classify_short_point() {
        let tree = sample();
        // axis 1 is needed once the root sends the point to node 2
        assert!(matches!(
            tree.classify(&[5.0]),
            Err(WordspaceError::DimensionMismatch { expected: 2, got: 1 })
        ));
        assert!(tree.classify(&[-5.0]).is_ok());
    }

    #[test]
    fn test_finalize_rejects_malformed_trees() {
        let mut missing_child = TreeBuilder::new();
        missing_child.add_node(0, None, Some(Split::new(0, vec![1.0])), vec![(1, 1.0)]);
        missing_child.add_node(1, Some(0), None, vec![(1, 1.0)]);
        assert!(missing_child.finalize().is_err());

        let mut gap = TreeBuilder::new();
        gap.add_node(0, None, None, vec![(1, 1.0)]);
        gap.add_node(2, Some(0), None, vec![(1, 1.0)]);
        assert!(gap.finalize().is_err());

        let mut two_roots = TreeBuilder::new();
        two_roots.add_node(0, None, None, vec![(1, 1.0)]);
        two_roots.add_node(1, None, None, vec![(1, 1.0)]);
        assert!(two_roots.finalize().is_err());

        assert!(matches!(
            TreeBuilder::<i64>::new().finalize(),
            Err(WordspaceError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_display() {
        let rendered = sample().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "axis-0: <=0");
        assert_eq!(lines[1], "\t[lo: 1.000]");
        assert_eq!(lines[2], "axis-0: <=10");
        assert_eq!(lines[3], "\taxis-1: <=5");
        assert_eq!(lines[4], "\t\t[hi: 1.000]");
        assert_eq!(lines[5], "\taxis-1: >5");
        assert_eq!(lines[7], "axis-0: >10");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_serde_round_trip() {
        let tree = sample();
        let json = serde_json::to_string(&tree).unwrap();
        let back: DecisionTree<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), tree.len());
        assert_eq!(back.classify(&[20.0, 0.0]).unwrap()[0].0, "hi");
    }

    #[test]
    fn test_deserialize_rejects_malformed_trees() {
        let split_without_children = r#"{"nodes":[
            {"id":0,"parent":null,"split":{"axis":0,"thresholds":[1.0]},
             "probabilities":[[1,1.0]],"children":[]}]}"#;
        assert!(serde_json::from_str::<DecisionTree<i64>>(split_without_children).is_err());

        assert!(serde_json::from_str::<DecisionTree<i64>>(r#"{"nodes":[]}"#).is_err());

        // Child listed by the root but pointing at nobody
        let dangling = r#"{"nodes":[
            {"id":0,"parent":null,"split":{"axis":0,"thresholds":[1.0]},
             "probabilities":[[1,1.0]],"children":[1,7]},
            {"id":1,"parent":0,"split":null,"probabilities":[[1,1.0]],"children":[]}]}"#;
        assert!(serde_json::from_str::<DecisionTree<i64>>(dangling).is_err());

        // Node 3 claims the root as parent without being linked
        let unlinked = r#"{"nodes":[
            {"id":0,"parent":null,"split":{"axis":0,"thresholds":[1.0]},
             "probabilities":[[1,1.0]],"children":[1,2]},
            {"id":1,"parent":0,"split":null,"probabilities":[[1,1.0]],"children":[]},
            {"id":2,"parent":0,"split":null,"probabilities":[[1,1.0]],"children":[]},
            {"id":3,"parent":0,"split":null,"probabilities":[[1,1.0]],"children":[]}]}"#;
        assert!(serde_json::from_str::<DecisionTree<i64>>(unlinked).is_err());
    }
}
