//! Composing primitive edits into one transaction.
//!
//! A [`Draft`] owns a working copy of the tree. Each primitive is applied
//! to that copy immediately and recorded, so lookups made between two
//! primitives always see current paths.

use std::ops::Range;

use crate::core::{
    ApplyError, Document, ElementNode, Node, Point, Selection, TextNode, apply_op_to,
    clamp_to_char_boundary,
};
use crate::ops::{Op, Path, Transaction};
use crate::path;

#[derive(Debug, Clone)]
pub struct Draft {
    doc: Document,
    selection: Option<Selection>,
    ops: Vec<Op>,
}

impl Draft {
    pub fn new(doc: Document, selection: Selection) -> Self {
        Self {
            doc,
            selection: Some(selection),
            ops: Vec::new(),
        }
    }

    /// A draft with no selection to maintain.
    pub fn detached(doc: Document) -> Self {
        Self {
            doc,
            selection: None,
            ops: Vec::new(),
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    pub fn into_transaction(self, source: impl Into<String>) -> Transaction {
        let mut tx = Transaction::new(self.ops).source(source);
        tx.selection_after = self.selection;
        tx
    }

    pub fn apply(&mut self, op: Op) -> Result<(), ApplyError> {
        apply_op_to(&mut self.doc, self.selection.as_mut(), op.clone())?;
        self.ops.push(op);
        Ok(())
    }

    pub fn select(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn insert_node(&mut self, path: Path, node: Node) -> Result<(), ApplyError> {
        self.apply(Op::InsertNode { path, node })
    }

    pub fn remove_node(&mut self, path: Path) -> Result<(), ApplyError> {
        self.apply(Op::RemoveNode { path })
    }

    pub fn move_node(&mut self, path: Path, new_path: Path) -> Result<(), ApplyError> {
        self.apply(Op::MoveNode { path, new_path })
    }

    pub fn insert_text(
        &mut self,
        path: Path,
        offset: usize,
        text: impl Into<String>,
    ) -> Result<(), ApplyError> {
        self.apply(Op::InsertText {
            path,
            offset,
            text: text.into(),
        })
    }

    pub fn remove_text(&mut self, path: Path, range: Range<usize>) -> Result<(), ApplyError> {
        if range.is_empty() {
            return Ok(());
        }
        self.apply(Op::RemoveText { path, range })
    }

    /// Wraps the children of `parent` in `range` into a new `wrapper`
    /// element. Returns the wrapper's path.
    pub fn wrap_nodes(
        &mut self,
        parent: &[usize],
        range: Range<usize>,
        wrapper: ElementNode,
    ) -> Result<Path, ApplyError> {
        let len = self.children_len(parent)?;
        if range.start > range.end || range.end > len {
            return Err(ApplyError::InvalidPath(format!(
                "Wrap range {range:?} out of bounds for {parent:?} ({len} children)"
            )));
        }
        let wrapper_path = path::child(parent, range.start);
        self.insert_node(wrapper_path.clone(), Node::Element(wrapper.shallow_clone()))?;
        for i in 0..range.len() {
            self.move_node(
                path::child(parent, range.start + 1),
                path::child(&wrapper_path, i),
            )?;
        }
        Ok(wrapper_path)
    }

    /// Replaces the element at `path` by its children.
    pub fn unwrap_node(&mut self, path: &[usize]) -> Result<(), ApplyError> {
        let Some((&index, parent)) = path.split_last() else {
            return Err(ApplyError::InvalidPath("Cannot unwrap the root".into()));
        };
        let count = self.children_len(path)?;
        for i in 0..count {
            self.move_node(path::child(path, 0), path::child(parent, index + 1 + i))?;
        }
        self.remove_node(path.to_vec())
    }

    /// Merges the node at `path` into its previous sibling.
    pub fn merge_node(&mut self, path: &[usize]) -> Result<(), ApplyError> {
        let prev = path::previous(path)
            .ok_or_else(|| ApplyError::InvalidPath(format!("No previous sibling for {path:?}")))?;
        match (self.doc.node(&prev), self.doc.node(path)) {
            (Some(Node::Text(left)), Some(Node::Text(right))) => {
                let offset = left.text.len();
                let text = right.text.clone();
                if !text.is_empty() {
                    self.insert_text(prev, offset, text)?;
                }
                self.remove_node(path.to_vec())
            }
            (Some(Node::Element(left)), Some(Node::Element(right))) => {
                let offset = left.children.len();
                let count = right.children.len();
                for i in 0..count {
                    self.move_node(path::child(path, 0), path::child(&prev, offset + i))?;
                }
                self.remove_node(path.to_vec())
            }
            _ => Err(ApplyError::InvalidPath(format!(
                "Cannot merge {path:?} into {prev:?}"
            ))),
        }
    }

    /// Splits the node at `path` at `position` (a text offset for text
    /// leaves, a child index for elements). Returns the path of the new
    /// right-hand node.
    pub fn split_node(&mut self, path: &[usize], position: usize) -> Result<Path, ApplyError> {
        let right_path = path::next(path)
            .ok_or_else(|| ApplyError::InvalidPath("Cannot split the root".into()))?;
        match self.doc.node(path) {
            Some(Node::Text(t)) => {
                let position = clamp_to_char_boundary(&t.text, position);
                let tail = Node::Text(TextNode {
                    text: t.text[position..].to_string(),
                    marks: t.marks.clone(),
                });
                let len = t.text.len();
                let moved_points = self.points_after(path, position);
                self.remove_text(path.to_vec(), position..len)?;
                self.insert_node(right_path.clone(), tail)?;
                if let Some(selection) = self.selection.as_mut() {
                    for (is_anchor, offset) in moved_points {
                        let point = Point::new(right_path.clone(), offset - position);
                        if is_anchor {
                            selection.anchor = point;
                        } else {
                            selection.focus = point;
                        }
                    }
                }
                Ok(right_path)
            }
            Some(Node::Element(el)) => {
                let position = position.min(el.children.len());
                let moved = el.children.len() - position;
                let shell = el.shallow_clone();
                self.insert_node(right_path.clone(), Node::Element(shell))?;
                for i in 0..moved {
                    self.move_node(path::child(path, position), path::child(&right_path, i))?;
                }
                Ok(right_path)
            }
            None => Err(ApplyError::InvalidPath(format!("No node at {path:?}"))),
        }
    }

    /// Splits every level from the text leaf at `point` up to and including
    /// the ancestor `top`. Returns the path of the new copy of `top`.
    pub fn split_nodes(&mut self, point: &Point, top: &[usize]) -> Result<Path, ApplyError> {
        if !path::is_ancestor(top, &point.path) {
            return Err(ApplyError::InvalidPath(format!(
                "{top:?} does not contain {:?}",
                point.path
            )));
        }
        let mut at = point.path.clone();
        let mut position = point.offset;
        loop {
            let right = self.split_node(&at, position)?;
            if at.as_slice() == top {
                return Ok(right);
            }
            position = right.last().copied().unwrap_or_default();
            at = path::parent(&at)
                .ok_or_else(|| ApplyError::InvalidPath("Split walked past the root".into()))?;
        }
    }

    fn children_len(&self, path: &[usize]) -> Result<usize, ApplyError> {
        self.doc
            .children(path)
            .map(<[Node]>::len)
            .ok_or_else(|| ApplyError::InvalidPath(format!("No container at {path:?}")))
    }

    fn points_after(&self, path: &[usize], offset: usize) -> Vec<(bool, usize)> {
        let Some(selection) = self.selection.as_ref() else {
            return Vec::new();
        };
        [(true, &selection.anchor), (false, &selection.focus)]
            .into_iter()
            .filter(|(_, p)| p.path == path && p.offset > offset)
            .map(|(is_anchor, p)| (is_anchor, p.offset))
            .collect()
    }
}
