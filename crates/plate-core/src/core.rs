use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::draft::Draft;
use crate::ops::{Op, Path, Transaction};
use crate::path::{self, DirtyPaths};
use crate::plugin::{CommandError, NormalizeScope, PluginRegistry, QueryError};

pub type Attrs = BTreeMap<String, serde_json::Value>;
pub type ElementKind = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        node_ref(self, path)
    }

    pub fn element(&self, path: &[usize]) -> Option<&ElementNode> {
        match self.node(path)? {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Children of the container at `path`; the empty path is the root.
    pub fn children(&self, path: &[usize]) -> Option<&[Node]> {
        if path.is_empty() {
            return Some(&self.children);
        }
        match self.node(path)? {
            Node::Element(el) => Some(&el.children),
            Node::Text(_) => None,
        }
    }

    /// Parent element of `path`, or `None` when the parent is the root.
    pub fn parent(&self, path: &[usize]) -> Option<(Path, &ElementNode)> {
        let parent_path = path::parent(path)?;
        let el = self.element(&parent_path)?;
        Some((parent_path, el))
    }

    /// Element ancestors of `path`, nearest first. The root is not included.
    pub fn ancestors(&self, path: &[usize]) -> Vec<(Path, &ElementNode)> {
        path::ancestors(path)
            .into_iter()
            .rev()
            .filter_map(|p| self.element(&p).map(|el| (p, el)))
            .collect()
    }

    /// Every text leaf in document order.
    pub fn text_leaves(&self) -> Vec<(Path, &TextNode)> {
        fn walk<'a>(children: &'a [Node], path: &mut Path, out: &mut Vec<(Path, &'a TextNode)>) {
            for (ix, node) in children.iter().enumerate() {
                path.push(ix);
                match node {
                    Node::Text(t) => out.push((path.clone(), t)),
                    Node::Element(el) => walk(&el.children, path, out),
                }
                path.pop();
            }
        }

        let mut out = Vec::new();
        walk(&self.children, &mut Vec::new(), &mut out);
        out
    }

    /// Root path followed by every element path in document order.
    pub fn element_paths(&self) -> Vec<Path> {
        fn walk(children: &[Node], path: &mut Path, out: &mut Vec<Path>) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                out.push(path.clone());
                walk(&el.children, path, out);
                path.pop();
            }
        }

        let mut out = vec![Vec::new()];
        walk(&self.children, &mut Vec::new(), &mut out);
        out
    }

    /// First text leaf at or below `path`.
    pub fn first_text_point(&self, path: &[usize]) -> Option<Point> {
        let node = self.node(path)?;
        let mut at = path.to_vec();
        first_text_descendant(node, &mut at)
    }
}

fn first_text_descendant(node: &Node, path: &mut Path) -> Option<Point> {
    match node {
        Node::Text(_) => Some(Point::new(path.clone(), 0)),
        Node::Element(el) => {
            for (ix, child) in el.children.iter().enumerate() {
                path.push(ix);
                let found = first_text_descendant(child, path);
                path.pop();
                if found.is_some() {
                    return found;
                }
            }
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::element("paragraph", vec![Node::text(text)])
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: kind.into(),
            attrs: Attrs::default(),
            children,
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks: Marks::default(),
        })
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.as_element().map(|el| el.kind.as_str())
    }

    /// Concatenated text of every leaf below this node.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            Node::Element(el) => el.children.iter().map(Node::text_content).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::default(),
            children: Vec::new(),
        }
    }

    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Same kind and attrs, no children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            attrs: self.attrs.clone(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

/// Opaque mark names carried by a text leaf. Leaves merge only when their
/// marks are equal; splits copy them to both halves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Marks(pub BTreeSet<String>);

impl Marks {
    pub fn with(mut self, mark: impl Into<String>) -> Self {
        self.0.insert(mark.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Anchor and focus in document order.
    pub fn ordered(&self) -> (&Point, &Point) {
        if self.focus < self.anchor {
            (&self.focus, &self.anchor)
        } else {
            (&self.anchor, &self.focus)
        }
    }
}

#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub inverse_ops: Vec<Op>,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

#[derive(Debug, Clone, Default)]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
}

impl EditorConfig {
    fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 100;
        }
        self
    }
}

pub struct Editor {
    doc: Document,
    selection: Selection,
    registry: PluginRegistry,
    config: EditorConfig,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
}

impl Editor {
    pub fn new(doc: Document, selection: Selection, registry: PluginRegistry) -> Self {
        Self::with_config(doc, selection, registry, EditorConfig::default())
    }

    pub fn with_config(
        doc: Document,
        selection: Selection,
        registry: PluginRegistry,
        config: EditorConfig,
    ) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry,
            config: config.with_defaults(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        };
        editor.normalize_in_place();
        editor
    }

    pub fn with_core_plugins() -> Self {
        let registry = PluginRegistry::core();
        let doc = Document {
            children: vec![Node::paragraph("")],
        };
        let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
        Self::new(doc, selection, registry)
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.normalize_selection_in_place();
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// A working copy of the document and selection for composing a
    /// single transaction out of primitive edits.
    pub fn draft(&self) -> Draft {
        Draft::new(self.doc.clone(), self.selection.clone())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;

        let redo_ops = self.replay(inverse_ops);

        self.selection = selection_before.clone();
        self.normalize_in_place();

        self.redo_stack.push(UndoRecord {
            selection_before,
            selection_after,
            inverse_ops: redo_ops,
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;

        let undo_ops = self.replay(inverse_ops);

        self.selection = selection_after.clone();
        self.normalize_in_place();

        self.undo_stack.push(UndoRecord {
            selection_before,
            selection_after,
            inverse_ops: undo_ops,
        });
        true
    }

    fn replay(&mut self, ops: Vec<Op>) -> Vec<Op> {
        let mut inverses: Vec<Op> = Vec::new();
        for op in ops {
            match apply_op_to(&mut self.doc, Some(&mut self.selection), op) {
                Ok(inv) => inverses.push(inv),
                Err(err) => {
                    // Stop mutating once the history no longer lines up with the tree.
                    tracing::warn!(error = %err, "history replay stopped");
                    break;
                }
            }
        }
        inverses.reverse();
        inverses
    }

    /// Applies `tx` and normalizes the result as one all-or-nothing edit.
    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let source = tx.meta.source.clone().unwrap_or_default();
        let selection_before = self.selection.clone();

        let mut doc = self.doc.clone();
        let mut selection = self.selection.clone();
        let mut dirty = DirtyPaths::default();
        let mut inverse_ops: Vec<Op> = Vec::new();
        let op_count = tx.ops.len();

        for op in tx.ops {
            dirty.record(&op);
            inverse_ops.push(apply_op_to(&mut doc, Some(&mut selection), op)?);
        }

        if let Some(sel) = tx.selection_after {
            selection = sel;
        }

        let mut repairs = normalize_to_fixed_point(
            &mut doc,
            &mut selection,
            &self.registry,
            self.config.max_normalize_iterations,
            NormalizeScope::Dirty(dirty),
        )?;
        let repair_count = repairs.len();
        inverse_ops.append(&mut repairs);
        inverse_ops.reverse();

        tracing::debug!(
            source = %source,
            ops = op_count,
            repairs = repair_count,
            "applied transaction"
        );

        self.doc = doc;
        self.selection = selection;
        self.normalize_selection_in_place();

        let selection_after = self.selection.clone();

        self.undo_stack.push(UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }

        Ok(())
    }

    /// Runs every normalize pass over the whole tree. Returns whether
    /// anything was repaired. Repairs made here are not recorded in history.
    pub fn normalize(&mut self) -> Result<bool, ApplyError> {
        let repairs = normalize_to_fixed_point(
            &mut self.doc,
            &mut self.selection,
            &self.registry,
            self.config.max_normalize_iterations,
            NormalizeScope::Full,
        )?;
        self.normalize_selection_in_place();
        Ok(!repairs.is_empty())
    }

    pub fn run_command(
        &mut self,
        id: &str,
        args: Option<serde_json::Value>,
    ) -> Result<(), CommandError> {
        let Some(command) = self.registry.command(id) else {
            return Err(CommandError::new(format!("Unknown command: {id}")));
        };
        (command.handler)(self, args)
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let Some(query) = self.registry.query(id) else {
            return Err(QueryError::new(format!("Unknown query: {id}")));
        };
        (query.handler)(self, args)
    }

    pub fn run_query<T>(&self, id: &str, args: Option<Value>) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value)
            .map_err(|err| QueryError::new(format!("Failed to decode query result: {err}")))
    }

    fn normalize_in_place(&mut self) {
        if let Err(err) = self.normalize() {
            tracing::warn!(error = %err, "normalization failed");
        }
        self.normalize_selection_in_place();
    }

    fn normalize_selection_in_place(&mut self) {
        self.selection = self
            .registry
            .normalize_selection(&self.doc, &self.selection);
    }
}

fn normalize_to_fixed_point(
    doc: &mut Document,
    selection: &mut Selection,
    registry: &PluginRegistry,
    max_iterations: usize,
    mut scope: NormalizeScope,
) -> Result<Vec<Op>, ApplyError> {
    let mut inverse_ops: Vec<Op> = Vec::new();
    for _ in 0..max_iterations {
        let ops = registry.normalize(doc, &scope)?;
        if ops.is_empty() {
            return Ok(inverse_ops);
        }
        let mut dirty = DirtyPaths::default();
        for op in ops {
            dirty.record(&op);
            inverse_ops.push(apply_op_to(doc, Some(selection), op)?);
        }
        scope = NormalizeScope::Dirty(dirty);
    }
    tracing::warn!(max_iterations, "normalization did not converge");
    Err(ApplyError::NormalizeDidNotConverge)
}

pub(crate) fn apply_op_to(
    doc: &mut Document,
    selection: Option<&mut Selection>,
    op: Op,
) -> Result<Op, ApplyError> {
    match op {
        Op::InsertText { path, offset, text } => {
            let text_node = node_text_mut(doc, &path)?;
            let offset = clamp_to_char_boundary(&text_node.text, offset);
            text_node.text.insert_str(offset, &text);
            if let Some(selection) = selection {
                transform_selection_insert_text(selection, &path, offset, text.len());
            }
            Ok(Op::RemoveText {
                path,
                range: offset..offset + text.len(),
            })
        }
        Op::RemoveText { path, range } => {
            let text_node = node_text_mut(doc, &path)?;
            let start =
                clamp_to_char_boundary(&text_node.text, range.start.min(text_node.text.len()));
            let end = clamp_to_char_boundary(&text_node.text, range.end.min(text_node.text.len()));
            if start >= end {
                return Ok(Op::InsertText {
                    path,
                    offset: start,
                    text: String::new(),
                });
            }
            let removed = text_node.text[start..end].to_string();
            text_node.text.replace_range(start..end, "");
            if let Some(selection) = selection {
                transform_selection_remove_text(selection, &path, start..end);
            }
            Ok(Op::InsertText {
                path,
                offset: start,
                text: removed,
            })
        }
        Op::InsertNode { path, node } => {
            insert_node(doc, &path, node)?;
            if let Some(selection) = selection {
                transform_selection_insert_node(selection, &path);
            }
            Ok(Op::RemoveNode { path })
        }
        Op::RemoveNode { path } => {
            let removed = remove_node(doc, &path)?;
            if let Some(selection) = selection {
                transform_selection_remove_node(selection, &path, &removed, doc);
            }
            Ok(Op::InsertNode {
                path,
                node: removed,
            })
        }
        Op::MoveNode { path, new_path } => {
            if path == new_path {
                return Ok(Op::MoveNode { path, new_path });
            }
            if new_path.starts_with(&path) {
                return Err(ApplyError::InvalidPath(format!(
                    "Cannot move {path:?} into its own subtree at {new_path:?}"
                )));
            }
            let op = Op::MoveNode {
                path: path.clone(),
                new_path: new_path.clone(),
            };
            let target = path::transform_path(&path, &op)
                .ok_or_else(|| ApplyError::InvalidPath(format!("Cannot move {path:?}")))?;

            let node = remove_node(doc, &path)?;
            insert_node(doc, &target, node)?;
            if let Some(selection) = selection {
                transform_selection_paths(selection, &op);
            }

            if path::is_sibling(&path, &new_path) {
                return Ok(Op::MoveNode {
                    path: new_path,
                    new_path: path,
                });
            }
            let inverse_path = target;
            let inverse_new_path = path::next(&path)
                .and_then(|next| path::transform_path(&next, &op))
                .ok_or_else(|| ApplyError::InvalidPath(format!("Cannot invert move of {path:?}")))?;
            Ok(Op::MoveNode {
                path: inverse_path,
                new_path: inverse_new_path,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("normalization did not converge")]
    NormalizeDidNotConverge,
}

impl From<PathError> for ApplyError {
    fn from(value: PathError) -> Self {
        ApplyError::InvalidPath(value.0)
    }
}

#[derive(Debug)]
pub struct PathError(pub String);

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

fn transform_selection_insert_text(
    selection: &mut Selection,
    path: &[usize],
    offset: usize,
    len: usize,
) {
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path == path && point.offset >= offset {
            point.offset = point.offset.saturating_add(len);
        }
    }
}

fn transform_selection_remove_text(
    selection: &mut Selection,
    path: &[usize],
    range: std::ops::Range<usize>,
) {
    let removed_len = range.end.saturating_sub(range.start);
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path != path {
            continue;
        }
        if point.offset <= range.start {
            continue;
        }
        if point.offset >= range.end {
            point.offset = point.offset.saturating_sub(removed_len);
        } else {
            point.offset = range.start;
        }
    }
}

fn transform_selection_insert_node(selection: &mut Selection, path: &[usize]) {
    let Some((&index, parent_path)) = path.split_last() else {
        return;
    };

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent_path.len() {
            continue;
        }
        if !point.path.starts_with(parent_path) {
            continue;
        }
        let depth = parent_path.len();
        if point.path[depth] >= index {
            point.path[depth] += 1;
        }
    }
}

fn transform_selection_paths(selection: &mut Selection, op: &Op) {
    for point in [&mut selection.anchor, &mut selection.focus] {
        if let Some(next) = path::transform_path(&point.path, op) {
            point.path = next;
        }
    }
}

fn transform_selection_remove_node(
    selection: &mut Selection,
    path: &[usize],
    removed: &Node,
    doc_after_remove: &Document,
) {
    if path.is_empty() {
        return;
    }
    let (parent_path, index) = path.split_at(path.len() - 1);
    let index = index[0];

    let merge_prefix_len = match (removed, index.checked_sub(1)) {
        (Node::Text(removed_text), Some(left_index)) => {
            let mut left_path = parent_path.to_vec();
            left_path.push(left_index);
            match node_ref(doc_after_remove, &left_path) {
                Some(Node::Text(left_text))
                    if left_text.marks == removed_text.marks
                        && left_text.text.ends_with(&removed_text.text) =>
                {
                    Some(left_text.text.len().saturating_sub(removed_text.text.len()))
                }
                _ => None,
            }
        }
        _ => None,
    };

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent_path.len() {
            continue;
        }
        if !point.path.starts_with(parent_path) {
            continue;
        }
        let depth = parent_path.len();
        let ix = point.path[depth];
        if ix > index {
            point.path[depth] = ix - 1;
            continue;
        }
        if ix < index {
            continue;
        }

        // Point was inside the removed subtree. Map it to a nearby point.
        if let (Some(prefix), Node::Text(removed_text), Some(left_index)) =
            (merge_prefix_len, removed, index.checked_sub(1))
        {
            point.path.truncate(depth + 1);
            point.path[depth] = left_index;
            point.offset = (prefix + point.offset).min(prefix + removed_text.text.len());
        } else {
            point.path.truncate(depth + 1);
            point.path[depth] = index.saturating_sub(1);
            point.offset = 0;
        }
    }
}

fn node_ref<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = doc.children.get(*first)?;
    for &ix in rest {
        node = match node {
            Node::Element(el) => el.children.get(ix)?,
            Node::Text(_) => return None,
        };
    }
    Some(node)
}

fn node_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut Node, PathError> {
    let Some((first, rest)) = path.split_first() else {
        return Err(PathError("Empty path".into()));
    };

    let len = doc.children.len();
    let mut node = doc
        .children
        .get_mut(*first)
        .ok_or_else(|| PathError(format!("Path out of bounds at depth 0: {first} >= {len}")))?;

    for (depth, &ix) in rest.iter().enumerate() {
        node = match node {
            Node::Element(el) => {
                let len = el.children.len();
                el.children.get_mut(ix).ok_or_else(|| {
                    PathError(format!(
                        "Path out of bounds at depth {}: {ix} >= {len}",
                        depth + 1
                    ))
                })?
            }
            Node::Text(_) => {
                return Err(PathError(format!("Non-container node at depth {depth}")));
            }
        };
    }
    Ok(node)
}

fn node_text_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut TextNode, PathError> {
    match node_mut(doc, path)? {
        Node::Text(t) => Ok(t),
        _ => Err(PathError("Expected Text node".into())),
    }
}

fn children_mut<'a>(
    doc: &'a mut Document,
    parent_path: &[usize],
) -> Result<&'a mut Vec<Node>, PathError> {
    if parent_path.is_empty() {
        return Ok(&mut doc.children);
    }
    match node_mut(doc, parent_path)? {
        Node::Element(el) => Ok(&mut el.children),
        Node::Text(_) => Err(PathError("Parent is not a container".into())),
    }
}

fn insert_node(doc: &mut Document, path: &[usize], node: Node) -> Result<(), PathError> {
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(PathError("Empty insert path".into()));
    };

    let children = children_mut(doc, parent_path)?;
    if index > children.len() {
        return Err(PathError(format!(
            "Insert index out of bounds: {index} > {}",
            children.len()
        )));
    }
    children.insert(index, node);
    Ok(())
}

fn remove_node(doc: &mut Document, path: &[usize]) -> Result<Node, PathError> {
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(PathError("Empty remove path".into()));
    };

    let children = children_mut(doc, parent_path)?;
    if index >= children.len() {
        return Err(PathError(format!(
            "Remove index out of bounds: {index} >= {}",
            children.len()
        )));
    }
    Ok(children.remove(index))
}
