//! Positional addressing helpers.
//!
//! Nodes have no back-references; ancestry is always derived from a
//! [`Path`]. Any structural op invalidates paths elsewhere in the tree, so
//! callers holding a path across an op must rebase it with
//! [`transform_path`].

use std::collections::BTreeSet;

use crate::core::Node;
use crate::ops::{Op, Path};

/// Path of the parent container. The document root is the empty path and
/// has no parent.
pub fn parent(path: &[usize]) -> Option<Path> {
    path.split_last().map(|(_, parent)| parent.to_vec())
}

pub fn next(path: &[usize]) -> Option<Path> {
    let (last, parent) = path.split_last()?;
    let mut next = parent.to_vec();
    next.push(last + 1);
    Some(next)
}

pub fn previous(path: &[usize]) -> Option<Path> {
    let (last, parent) = path.split_last()?;
    let mut prev = parent.to_vec();
    prev.push(last.checked_sub(1)?);
    Some(prev)
}

pub fn child(path: &[usize], index: usize) -> Path {
    let mut child = path.to_vec();
    child.push(index);
    child
}

/// True if `ancestor` strictly contains `path`.
pub fn is_ancestor(ancestor: &[usize], path: &[usize]) -> bool {
    ancestor.len() < path.len() && path.starts_with(ancestor)
}

pub fn is_sibling(a: &[usize], b: &[usize]) -> bool {
    match (a.split_last(), b.split_last()) {
        (Some((a_last, a_parent)), Some((b_last, b_parent))) => {
            a_parent == b_parent && a_last != b_last
        }
        _ => false,
    }
}

/// True if `path` is a preceding sibling of `another` or of one of its
/// ancestors.
pub fn ends_before(path: &[usize], another: &[usize]) -> bool {
    let Some((&last, prefix)) = path.split_last() else {
        return false;
    };
    let depth = prefix.len();
    another.len() > depth && &another[..depth] == prefix && last < another[depth]
}

pub fn common_ancestor(a: &[usize], b: &[usize]) -> Path {
    a.iter()
        .zip(b.iter())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| *x)
        .collect()
}

/// Every proper prefix of `path`, root first.
pub fn ancestors(path: &[usize]) -> Vec<Path> {
    (0..path.len()).map(|len| path[..len].to_vec()).collect()
}

/// Rebases `path` across `op`. Returns `None` when the op removed the node.
pub fn transform_path(path: &[usize], op: &Op) -> Option<Path> {
    let mut p = path.to_vec();
    match op {
        Op::InsertText { .. } | Op::RemoveText { .. } => {}
        Op::InsertNode { path: at, .. } => {
            if at.is_empty() {
                return Some(p);
            }
            if at.as_slice() == path || ends_before(at, path) || is_ancestor(at, path) {
                p[at.len() - 1] += 1;
            }
        }
        Op::RemoveNode { path: at } => {
            if at.is_empty() {
                return Some(p);
            }
            if at.as_slice() == path || is_ancestor(at, path) {
                return None;
            }
            if ends_before(at, path) {
                p[at.len() - 1] -= 1;
            }
        }
        Op::MoveNode {
            path: from,
            new_path: to,
        } => {
            if from == to || from.is_empty() || to.is_empty() {
                return Some(p);
            }
            if from.as_slice() == path || is_ancestor(from, path) {
                let mut moved = to.clone();
                if ends_before(from, to) && from.len() < to.len() {
                    moved[from.len() - 1] -= 1;
                }
                moved.extend_from_slice(&path[from.len()..]);
                return Some(moved);
            }
            if is_sibling(from, to) && (is_ancestor(to, path) || to.as_slice() == path) {
                if ends_before(from, path) {
                    p[from.len() - 1] -= 1;
                } else {
                    p[from.len() - 1] += 1;
                }
            } else if ends_before(to, path) || to.as_slice() == path || is_ancestor(to, path) {
                if ends_before(from, path) {
                    p[from.len() - 1] -= 1;
                }
                p[to.len() - 1] += 1;
            } else if ends_before(from, path) {
                p[from.len() - 1] -= 1;
            }
        }
    }
    Some(p)
}

/// Paths whose subtree shape may have changed since the last
/// normalization, kept in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyPaths {
    paths: BTreeSet<Path>,
}

impl DirtyPaths {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }

    pub fn insert(&mut self, path: Path) {
        self.paths.insert(path);
    }

    /// Rebases the tracked paths across `op` and marks what `op` touches.
    pub fn record(&mut self, op: &Op) {
        if op.is_structural() {
            self.paths = self
                .paths
                .iter()
                .filter_map(|p| transform_path(p, op))
                .collect();
        }
        self.paths.extend(touched_paths(op));
    }
}

fn levels(path: &[usize]) -> Vec<Path> {
    (0..=path.len()).map(|len| path[..len].to_vec()).collect()
}

fn touched_paths(op: &Op) -> Vec<Path> {
    match op {
        Op::InsertText { path, .. } | Op::RemoveText { path, .. } => levels(path),
        Op::InsertNode { path, node } => {
            let mut out = levels(path);
            fn descend(node: &Node, path: &mut Path, out: &mut Vec<Path>) {
                let Node::Element(el) = node else {
                    return;
                };
                for (ix, child) in el.children.iter().enumerate() {
                    path.push(ix);
                    out.push(path.clone());
                    descend(child, path, out);
                    path.pop();
                }
            }
            descend(node, &mut path.clone(), &mut out);
            out
        }
        Op::RemoveNode { path } => ancestors(path),
        Op::MoveNode { path, new_path } => {
            if path == new_path {
                return Vec::new();
            }
            let mut out: Vec<Path> = ancestors(path)
                .iter()
                .filter_map(|a| transform_path(a, op))
                .collect();
            let new_ancestors: Vec<Path> = ancestors(new_path)
                .iter()
                .filter_map(|a| transform_path(a, op))
                .collect();
            if let (Some(new_parent), Some(index)) = (new_ancestors.last(), new_path.last()) {
                out.push(child(new_parent, *index));
            }
            out.extend(new_ancestors);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(path: Path, new_path: Path) -> Op {
        Op::MoveNode { path, new_path }
    }

    #[test]
    fn insert_shifts_later_siblings_and_their_descendants() {
        let op = Op::InsertNode {
            path: vec![1],
            node: Node::paragraph(""),
        };
        assert_eq!(transform_path(&[0, 3], &op), Some(vec![0, 3]));
        assert_eq!(transform_path(&[1], &op), Some(vec![2]));
        assert_eq!(transform_path(&[2, 0], &op), Some(vec![3, 0]));
    }

    #[test]
    fn remove_drops_the_removed_subtree() {
        let op = Op::RemoveNode { path: vec![1] };
        assert_eq!(transform_path(&[1, 0], &op), None);
        assert_eq!(transform_path(&[2, 4], &op), Some(vec![1, 4]));
        assert_eq!(transform_path(&[0], &op), Some(vec![0]));
    }

    #[test]
    fn move_to_later_sibling_lands_on_new_path() {
        let op = mv(vec![0], vec![3]);
        assert_eq!(transform_path(&[0, 1], &op), Some(vec![3, 1]));
        assert_eq!(transform_path(&[1], &op), Some(vec![0]));
        assert_eq!(transform_path(&[3], &op), Some(vec![2]));
        assert_eq!(transform_path(&[4], &op), Some(vec![4]));
    }

    #[test]
    fn move_into_later_sibling_accounts_for_removal() {
        let op = mv(vec![0], vec![2, 0]);
        assert_eq!(transform_path(&[0], &op), Some(vec![1, 0]));
        assert_eq!(transform_path(&[2, 0], &op), Some(vec![1, 1]));
        assert_eq!(transform_path(&[1], &op), Some(vec![0]));
    }

    #[test]
    fn move_out_of_a_nested_parent() {
        let op = mv(vec![0, 1, 2], vec![1]);
        assert_eq!(transform_path(&[0, 1, 2, 0], &op), Some(vec![1, 0]));
        assert_eq!(transform_path(&[1], &op), Some(vec![2]));
        assert_eq!(transform_path(&[0, 1, 3], &op), Some(vec![0, 1, 2]));
    }

    #[test]
    fn ends_before_requires_shared_prefix() {
        assert!(ends_before(&[0], &[1, 2]));
        assert!(ends_before(&[1, 0], &[1, 1]));
        assert!(!ends_before(&[1, 0], &[2]));
        assert!(!ends_before(&[1], &[1, 0]));
    }

    #[test]
    fn dirty_paths_follow_later_ops() {
        let mut dirty = DirtyPaths::default();
        dirty.record(&Op::InsertText {
            path: vec![1, 0],
            offset: 0,
            text: "x".into(),
        });
        dirty.record(&Op::InsertNode {
            path: vec![0],
            node: Node::paragraph(""),
        });
        let paths: Vec<Path> = dirty.iter().cloned().collect();
        assert!(paths.contains(&vec![2, 0]));
        assert!(paths.contains(&vec![2]));
        assert!(paths.contains(&vec![0, 0]));
        assert!(paths.contains(&vec![]));
    }
}
