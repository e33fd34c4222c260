//! Repair rules that keep list structure valid after every edit.
//!
//! Each pass only inspects the paths in its [`NormalizeScope`] and returns
//! the ops that fix what it found. Fixes are applied in reverse document
//! order so pending paths stay valid while the pass works.

use std::ops::Range;
use std::sync::Arc;

use plate_core::{
    ApplyError, Document, Draft, ElementNode, Node, NormalizePass, NormalizeScope, Op, Path,
    PluginRegistry, path,
};

use crate::options::ListOptions;
use crate::query;

/// Passes in the order they run within one iteration.
pub fn passes(options: &Arc<ListOptions>) -> Vec<Box<dyn NormalizePass>> {
    vec![
        Box::new(ItemChildrenAreElements(Arc::clone(options))),
        Box::new(ListChildrenAreItems(Arc::clone(options))),
        Box::new(OrphanItemsAreUnwrapped(Arc::clone(options))),
        Box::new(JoinAdjacentLists(Arc::clone(options))),
        Box::new(UnwrapListsOverDepthLimit(Arc::clone(options))),
    ]
}

fn element_kind<'a>(doc: &'a Document, at: &[usize]) -> Option<&'a str> {
    doc.element(at).map(|el| el.kind.as_str())
}

/// Maximal runs of text children.
fn text_runs(children: &[Node]) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    for (ix, child) in children.iter().enumerate() {
        if !matches!(child, Node::Text(_)) {
            continue;
        }
        match runs.last_mut() {
            Some(run) if run.end == ix => run.end += 1,
            _ => runs.push(ix..ix + 1),
        }
    }
    runs
}

/// Text directly inside an item is wrapped in a default block.
pub struct ItemChildrenAreElements(pub Arc<ListOptions>);

impl NormalizePass for ItemChildrenAreElements {
    fn id(&self) -> &'static str {
        "list.item_children_are_elements"
    }

    fn run(
        &self,
        doc: &Document,
        _registry: &PluginRegistry,
        scope: &NormalizeScope,
    ) -> Result<Vec<Op>, ApplyError> {
        let options = &self.0;
        let mut draft = Draft::detached(doc.clone());
        for at in scope.element_paths(doc).into_iter().rev() {
            let runs = match draft.doc().element(&at) {
                Some(el) if options.is_item_kind(&el.kind) => text_runs(&el.children),
                _ => continue,
            };
            for run in runs.into_iter().rev() {
                draft.wrap_nodes(&at, run, ElementNode::new(&options.type_default))?;
            }
        }
        Ok(draft.into_ops())
    }
}

/// Every child of a list is wrapped in its own item unless it is one.
pub struct ListChildrenAreItems(pub Arc<ListOptions>);

impl NormalizePass for ListChildrenAreItems {
    fn id(&self) -> &'static str {
        "list.children_are_items"
    }

    fn run(
        &self,
        doc: &Document,
        _registry: &PluginRegistry,
        scope: &NormalizeScope,
    ) -> Result<Vec<Op>, ApplyError> {
        let options = &self.0;
        let mut draft = Draft::detached(doc.clone());
        for at in scope.element_paths(doc).into_iter().rev() {
            let strays: Vec<usize> = match draft.doc().element(&at) {
                Some(el) if options.is_list_kind(&el.kind) => el
                    .children
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| !query::is_item(options, child))
                    .map(|(ix, _)| ix)
                    .collect(),
                _ => continue,
            };
            for ix in strays.into_iter().rev() {
                draft.wrap_nodes(&at, ix..ix + 1, ElementNode::new(&options.type_item))?;
            }
        }
        Ok(draft.into_ops())
    }
}

/// Items whose parent is not a list are replaced by their children.
pub struct OrphanItemsAreUnwrapped(pub Arc<ListOptions>);

impl NormalizePass for OrphanItemsAreUnwrapped {
    fn id(&self) -> &'static str {
        "list.orphan_items_are_unwrapped"
    }

    fn run(
        &self,
        doc: &Document,
        _registry: &PluginRegistry,
        scope: &NormalizeScope,
    ) -> Result<Vec<Op>, ApplyError> {
        let options = &self.0;
        let mut draft = Draft::detached(doc.clone());
        for at in scope.element_paths(doc).into_iter().rev() {
            if element_kind(draft.doc(), &at).is_some_and(|kind| options.is_list_kind(kind)) {
                continue;
            }
            let orphans: Vec<usize> = match draft.doc().children(&at) {
                Some(children) => children
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| query::is_item(options, child))
                    .map(|(ix, _)| ix)
                    .collect(),
                None => continue,
            };
            for ix in orphans.into_iter().rev() {
                draft.unwrap_node(&path::child(&at, ix))?;
            }
        }
        Ok(draft.into_ops())
    }
}

/// Adjacent sibling lists accepted by `can_merge` become one list.
pub struct JoinAdjacentLists(pub Arc<ListOptions>);

impl JoinAdjacentLists {
    fn joinable(&self, children: &[Node], ix: usize) -> bool {
        match (children.get(ix - 1), children.get(ix)) {
            (Some(Node::Element(a)), Some(Node::Element(b))) => {
                self.0.is_list_kind(&a.kind)
                    && self.0.is_list_kind(&b.kind)
                    && self.0.can_merge_lists(a, b)
            }
            _ => false,
        }
    }
}

impl NormalizePass for JoinAdjacentLists {
    fn id(&self) -> &'static str {
        "list.join_adjacent_lists"
    }

    fn run(
        &self,
        doc: &Document,
        _registry: &PluginRegistry,
        scope: &NormalizeScope,
    ) -> Result<Vec<Op>, ApplyError> {
        let mut draft = Draft::detached(doc.clone());
        for at in scope.element_paths(doc).into_iter().rev() {
            let mut ix = draft.doc().children(&at).map(<[Node]>::len).unwrap_or(0);
            while ix > 1 {
                ix -= 1;
                let joinable = draft
                    .doc()
                    .children(&at)
                    .is_some_and(|children| self.joinable(children, ix));
                if joinable {
                    draft.merge_node(&path::child(&at, ix))?;
                }
            }
        }
        Ok(draft.into_ops())
    }
}

/// Lists nested deeper than `max_depth` are unwrapped, innermost first.
pub struct UnwrapListsOverDepthLimit(pub Arc<ListOptions>);

impl UnwrapListsOverDepthLimit {
    fn collect(&self, node: &Node, at: &mut Path, depth: usize, out: &mut Vec<Path>) {
        let Node::Element(el) = node else {
            return;
        };
        let depth = depth + usize::from(self.0.is_list_kind(&el.kind));
        if depth > self.0.max_depth && self.0.is_list_kind(&el.kind) {
            out.push(at.clone());
        }
        for (ix, child) in el.children.iter().enumerate() {
            at.push(ix);
            self.collect(child, at, depth, out);
            at.pop();
        }
    }
}

impl NormalizePass for UnwrapListsOverDepthLimit {
    fn id(&self) -> &'static str {
        "list.unwrap_lists_over_depth_limit"
    }

    fn run(
        &self,
        doc: &Document,
        _registry: &PluginRegistry,
        scope: &NormalizeScope,
    ) -> Result<Vec<Op>, ApplyError> {
        // A moved subtree is dirty only at its own path, so whole subtrees
        // of dirty nodes are scanned. The root is skipped: any change
        // below it also dirties the top-level block it happened in.
        let mut roots: Vec<Path> = Vec::new();
        for at in scope.element_paths(doc) {
            if at.is_empty() || roots.iter().any(|root| path::is_ancestor(root, &at)) {
                continue;
            }
            roots.push(at);
        }

        let mut violations: Vec<Path> = Vec::new();
        for root in roots {
            let Some(node) = doc.node(&root) else {
                continue;
            };
            let above = doc
                .ancestors(&root)
                .iter()
                .filter(|(_, el)| self.0.is_list_kind(&el.kind))
                .count();
            let mut at = root.clone();
            self.collect(node, &mut at, above, &mut violations);
        }
        if violations.is_empty() {
            return Ok(Vec::new());
        }

        violations.sort();
        let mut draft = Draft::detached(doc.clone());
        for list in violations.into_iter().rev() {
            draft.unwrap_node(&list)?;
        }
        Ok(draft.into_ops())
    }
}
