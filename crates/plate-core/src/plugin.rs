use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{ApplyError, Document, Editor, Node, Point, Selection, apply_op_to};
use crate::draft::Draft;
use crate::ops::{Op, Path};
use crate::path::{self, DirtyPaths};

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ApplyError> for CommandError {
    fn from(value: ApplyError) -> Self {
        Self::new(value.to_string())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate node spec kind: {0}")]
    DuplicateNodeKind(String),
    #[error("duplicate command id: {0}")]
    DuplicateCommand(String),
    #[error("duplicate query id: {0}")]
    DuplicateQuery(String),
}

pub type CommandHandler =
    Arc<dyn Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync>;

pub type QueryHandler = Arc<dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: QueryHandler,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

/// What an element may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    BlockOnly,
    InlineOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub children: ChildConstraint,
}

impl NodeSpec {
    pub fn block(kind: impl Into<String>, children: ChildConstraint) -> Self {
        Self {
            kind: kind.into(),
            children,
        }
    }
}

/// Which part of the tree a normalize pass has to look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeScope {
    Full,
    Dirty(DirtyPaths),
}

impl NormalizeScope {
    /// Root and element paths in scope that still exist in `doc`, in
    /// document order.
    pub fn element_paths(&self, doc: &Document) -> Vec<Path> {
        match self {
            NormalizeScope::Full => doc.element_paths(),
            NormalizeScope::Dirty(dirty) => dirty
                .iter()
                .filter(|p| p.is_empty() || doc.element(p).is_some())
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizeScope::Dirty(dirty) if dirty.is_empty())
    }

    fn record(&mut self, op: &Op) {
        if let NormalizeScope::Dirty(dirty) = self {
            dirty.record(op);
        }
    }
}

/// A repair rule. `run` returns the ops that fix every violation it finds
/// within `scope`; they are applied in order against `doc`.
pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(
        &self,
        doc: &Document,
        registry: &PluginRegistry,
        scope: &NormalizeScope,
    ) -> Result<Vec<Op>, ApplyError>;
}

pub trait PlatePlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    node_specs: HashMap<String, NodeSpec>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

pub fn core_plugins() -> Vec<Box<dyn PlatePlugin>> {
    vec![Box::new(CoreParagraphPlugin), Box::new(CoreNormalizePlugin)]
}

impl PluginRegistry {
    pub fn new(
        plugins: impl IntoIterator<Item = Box<dyn PlatePlugin>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    pub fn core() -> Self {
        Self::new(core_plugins()).expect("core registry must be valid")
    }

    /// Core plugins followed by `plugins`.
    pub fn with_core(
        plugins: impl IntoIterator<Item = Box<dyn PlatePlugin>>,
    ) -> Result<Self, RegistryError> {
        Self::new(core_plugins().into_iter().chain(plugins))
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn PlatePlugin>) -> Result<(), RegistryError> {
        for spec in plugin.node_specs() {
            if self.node_specs.contains_key(&spec.kind) {
                return Err(RegistryError::DuplicateNodeKind(spec.kind));
            }
            self.node_specs.insert(spec.kind.clone(), spec);
        }

        self.normalize_passes.extend(plugin.normalize_passes());

        for cmd in plugin.commands() {
            if self.commands.contains_key(&cmd.id) {
                return Err(RegistryError::DuplicateCommand(cmd.id));
            }
            self.commands.insert(cmd.id.clone(), cmd);
        }

        for query in plugin.queries() {
            if self.queries.contains_key(&query.id) {
                return Err(RegistryError::DuplicateQuery(query.id));
            }
            self.queries.insert(query.id.clone(), query);
        }

        tracing::trace!(plugin = plugin.id(), "registered plugin");
        Ok(())
    }

    pub fn node_specs(&self) -> &HashMap<String, NodeSpec> {
        &self.node_specs
    }

    pub fn normalize_passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.normalize_passes
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn queries(&self) -> &HashMap<String, QuerySpec> {
        &self.queries
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }

    /// One normalization iteration. Passes run in registration order, each
    /// seeing the tree as the previous pass left it. Returns every repair
    /// op, in application order.
    pub fn normalize(&self, doc: &Document, scope: &NormalizeScope) -> Result<Vec<Op>, ApplyError> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }
        let mut work = doc.clone();
        let mut scope = scope.clone();
        let mut repairs: Vec<Op> = Vec::new();
        for pass in &self.normalize_passes {
            let ops = pass.run(&work, self, &scope)?;
            if ops.is_empty() {
                continue;
            }
            tracing::trace!(pass = pass.id(), repairs = ops.len(), "normalize pass");
            for op in ops {
                apply_op_to(&mut work, None, op.clone())?;
                scope.record(&op);
                repairs.push(op);
            }
        }
        Ok(repairs)
    }

    pub fn normalize_selection(&self, doc: &Document, selection: &Selection) -> Selection {
        let fallback = doc.first_text_point(&[]).unwrap_or(Point {
            path: vec![0],
            offset: 0,
        });

        let anchor =
            normalize_point_to_existing_text(doc, &selection.anchor).unwrap_or_else(|| {
                normalize_point_to_existing_text(doc, &selection.focus)
                    .unwrap_or_else(|| fallback.clone())
            });
        let focus = normalize_point_to_existing_text(doc, &selection.focus)
            .unwrap_or_else(|| anchor.clone());

        Selection { anchor, focus }
    }

    pub fn is_known_kind(&self, kind: &str) -> bool {
        self.node_specs.contains_key(kind)
    }

    pub fn child_constraint(&self, kind: &str) -> Option<&ChildConstraint> {
        self.node_specs.get(kind).map(|spec| &spec.children)
    }
}

fn normalize_point_to_existing_text(doc: &Document, point: &Point) -> Option<Point> {
    if point.path.is_empty() || doc.children.is_empty() {
        return None;
    }

    let mut resolved_path: Vec<usize> = Vec::new();
    let mut children: &[Node] = &doc.children;

    for &wanted in &point.path {
        if children.is_empty() {
            break;
        }
        let ix = wanted.min(children.len() - 1);
        resolved_path.push(ix);
        match &children[ix] {
            Node::Text(t) => {
                return Some(Point {
                    path: resolved_path,
                    offset: point.offset.min(t.text.len()),
                });
            }
            Node::Element(el) => {
                children = &el.children;
            }
        }
    }

    match doc.node(&resolved_path)? {
        Node::Text(t) => Some(Point {
            offset: point.offset.min(t.text.len()),
            path: resolved_path,
        }),
        Node::Element(_) => doc.first_text_point(&resolved_path),
    }
}

struct CoreParagraphPlugin;

impl PlatePlugin for CoreParagraphPlugin {
    fn id(&self) -> &'static str {
        "core.paragraph"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::block("paragraph", ChildConstraint::InlineOnly)]
    }
}

struct CoreNormalizePlugin;

impl PlatePlugin for CoreNormalizePlugin {
    fn id(&self) -> &'static str {
        "core.normalize"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(EnsureInlineBlocksHaveTextLeaf),
            Box::new(MergeAdjacentTextLeaves),
        ]
    }
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(
        &self,
        doc: &Document,
        _registry: &PluginRegistry,
        _scope: &NormalizeScope,
    ) -> Result<Vec<Op>, ApplyError> {
        if doc.children.is_empty() {
            return Ok(vec![Op::InsertNode {
                path: vec![0],
                node: Node::paragraph(""),
            }]);
        }
        Ok(Vec::new())
    }
}

struct EnsureInlineBlocksHaveTextLeaf;

impl NormalizePass for EnsureInlineBlocksHaveTextLeaf {
    fn id(&self) -> &'static str {
        "core.ensure_inline_only_blocks_have_text_leaf"
    }

    fn run(
        &self,
        doc: &Document,
        registry: &PluginRegistry,
        scope: &NormalizeScope,
    ) -> Result<Vec<Op>, ApplyError> {
        let mut ops = Vec::new();
        for at in scope.element_paths(doc) {
            let Some(el) = doc.element(&at) else {
                continue;
            };
            if registry.child_constraint(&el.kind) != Some(&ChildConstraint::InlineOnly) {
                continue;
            }
            if !el.children.iter().any(|n| matches!(n, Node::Text(_))) {
                ops.push(Op::InsertNode {
                    path: path::child(&at, 0),
                    node: Node::text(""),
                });
            }
        }
        Ok(ops)
    }
}

struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "core.merge_adjacent_text_leaves"
    }

    fn run(
        &self,
        doc: &Document,
        _registry: &PluginRegistry,
        scope: &NormalizeScope,
    ) -> Result<Vec<Op>, ApplyError> {
        let mut draft = Draft::detached(doc.clone());
        // Later elements first so merges never shift a pending path.
        for at in scope.element_paths(doc).into_iter().rev() {
            let Some(children) = draft.doc().children(&at) else {
                continue;
            };
            let mergeable: Vec<usize> = children
                .windows(2)
                .enumerate()
                .filter_map(|(ix, pair)| match pair {
                    [Node::Text(left), Node::Text(right)] if left.marks == right.marks => {
                        Some(ix + 1)
                    }
                    _ => None,
                })
                .collect();
            for ix in mergeable.into_iter().rev() {
                draft.merge_node(&path::child(&at, ix))?;
            }
        }
        Ok(draft.into_ops())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Marks, TextNode};

    #[test]
    fn merges_runs_of_equal_marks() {
        let doc = Document::new(vec![Node::element(
            "paragraph",
            vec![Node::text("a"), Node::text("b"), Node::text("c")],
        )]);
        let registry = PluginRegistry::core();
        let ops = registry.normalize(&doc, &NormalizeScope::Full).unwrap();

        let mut out = doc.clone();
        for op in ops {
            apply_op_to(&mut out, None, op).unwrap();
        }
        let Some(Node::Element(p)) = out.children.first() else {
            panic!("expected paragraph");
        };
        assert_eq!(p.children.len(), 1);
        assert_eq!(p.children[0].text_content(), "abc");
    }

    #[test]
    fn leaves_differently_marked_text_apart() {
        let bold = TextNode {
            text: "b".into(),
            marks: Marks::default().with("bold"),
        };
        let doc = Document::new(vec![Node::element(
            "paragraph",
            vec![Node::text("a"), Node::Text(bold)],
        )]);
        let ops = PluginRegistry::core()
            .normalize(&doc, &NormalizeScope::Full)
            .unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn empty_dirty_scope_does_nothing() {
        let ops = PluginRegistry::core()
            .normalize(&Document::default(), &NormalizeScope::Dirty(DirtyPaths::default()))
            .unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn duplicate_kinds_are_rejected() {
        let err = PluginRegistry::new(vec![
            Box::new(CoreParagraphPlugin) as Box<dyn PlatePlugin>,
            Box::new(CoreParagraphPlugin),
        ])
        .err();
        assert_eq!(
            err,
            Some(RegistryError::DuplicateNodeKind("paragraph".into()))
        );
    }
}
