//! Read-only questions about lists in a document.
//!
//! Every function takes the tree explicitly so it can be asked of an
//! editor's document or of a [`plate_core::Draft`] in the middle of a
//! command. Paths returned here are only valid until the next mutation.

use std::collections::BTreeSet;

use plate_core::{Document, Node, Path, Point, Selection, path};

use crate::options::ListOptions;

pub fn is_list(options: &ListOptions, node: &Node) -> bool {
    node.kind().is_some_and(|kind| options.is_list_kind(kind))
}

pub fn is_item(options: &ListOptions, node: &Node) -> bool {
    node.kind().is_some_and(|kind| options.is_item_kind(kind))
}

pub fn is_list_at(options: &ListOptions, doc: &Document, at: &[usize]) -> bool {
    doc.node(at).is_some_and(|node| is_list(options, node))
}

pub fn is_item_at(options: &ListOptions, doc: &Document, at: &[usize]) -> bool {
    doc.node(at).is_some_and(|node| is_item(options, node))
}

fn nearest_item(options: &ListOptions, doc: &Document, at: &[usize]) -> Option<Path> {
    doc.ancestors(at)
        .into_iter()
        .find(|(_, el)| options.is_item_kind(&el.kind))
        .map(|(p, _)| p)
}

/// Item enclosing the selection's anchor.
pub fn current_item(options: &ListOptions, doc: &Document, selection: &Selection) -> Option<Path> {
    nearest_item(options, doc, &selection.anchor.path)
}

/// List enclosing the selection's anchor.
pub fn current_list(options: &ListOptions, doc: &Document, selection: &Selection) -> Option<Path> {
    doc.ancestors(&selection.anchor.path)
        .into_iter()
        .find(|(_, el)| options.is_list_kind(&el.kind))
        .map(|(p, _)| p)
}

pub fn is_selection_in_list(options: &ListOptions, doc: &Document, selection: &Selection) -> bool {
    current_list(options, doc, selection).is_some()
}

/// Number of lists strictly containing `item`. Items of a top-level list
/// have depth 1.
pub fn item_depth(options: &ListOptions, doc: &Document, item: &[usize]) -> usize {
    doc.ancestors(item)
        .iter()
        .filter(|(_, el)| options.is_list_kind(&el.kind))
        .count()
}

/// Depth of the deepest item inside `item`'s subtree, `item` included.
pub fn subtree_deepest_depth(options: &ListOptions, doc: &Document, item: &[usize]) -> usize {
    fn nested_levels(options: &ListOptions, node: &Node) -> usize {
        let Node::Element(el) = node else {
            return 0;
        };
        el.children
            .iter()
            .map(|child| nested_levels(options, child) + usize::from(is_list(options, child)))
            .max()
            .unwrap_or(0)
    }

    let below = doc
        .node(item)
        .map(|node| nested_levels(options, node))
        .unwrap_or(0);
    item_depth(options, doc, item) + below
}

pub fn list_for_item(options: &ListOptions, doc: &Document, item: &[usize]) -> Option<Path> {
    let parent = path::parent(item)?;
    is_list_at(options, doc, &parent).then_some(parent)
}

/// The item visually preceding `item`: its previous sibling, or the last
/// item of that sibling's trailing sub-list, recursively.
pub fn previous_item(options: &ListOptions, doc: &Document, item: &[usize]) -> Option<Path> {
    let mut at = path::previous(item)?;
    if !is_item_at(options, doc, &at) {
        return None;
    }
    loop {
        let Some(last) = doc.element(&at).and_then(|el| el.children.len().checked_sub(1)) else {
            return Some(at);
        };
        let sub_list = path::child(&at, last);
        let Some(list) = doc.element(&sub_list).filter(|el| options.is_list_kind(&el.kind)) else {
            return Some(at);
        };
        let Some(last_item) = list.children.len().checked_sub(1) else {
            return Some(at);
        };
        let candidate = path::child(&sub_list, last_item);
        if !is_item_at(options, doc, &candidate) {
            return Some(at);
        }
        at = candidate;
    }
}

/// Every item that is the nearest item of some text leaf between the range
/// endpoints, in document order.
pub fn items_at_range(options: &ListOptions, doc: &Document, range: &Selection) -> Vec<Path> {
    let (start, end) = range.ordered();
    let mut items = BTreeSet::new();
    for (leaf, _) in doc.text_leaves() {
        if leaf < start.path || leaf > end.path {
            continue;
        }
        if let Some(item) = nearest_item(options, doc, &leaf) {
            items.insert(item);
        }
    }
    items.into_iter().collect()
}

/// Items at the range with no ancestor also at the range.
pub fn topmost_items_at_range(options: &ListOptions, doc: &Document, range: &Selection) -> Vec<Path> {
    let items = items_at_range(options, doc, range);
    items
        .iter()
        .filter(|item| !items.iter().any(|other| path::is_ancestor(other, item)))
        .cloned()
        .collect()
}

/// Deepest depth among the items at the range, or 0 when there are none.
pub fn deepest_item_depth(options: &ListOptions, doc: &Document, range: &Selection) -> usize {
    items_at_range(options, doc, range)
        .iter()
        .map(|item| item_depth(options, doc, item))
        .max()
        .unwrap_or(0)
}

pub fn is_item_empty(doc: &Document, item: &[usize]) -> bool {
    doc.node(item)
        .is_some_and(|node| node.text_content().is_empty())
}

/// True when `point` sits at offset 0 of the first text leaf of `item`.
pub fn is_at_start_of_item(doc: &Document, point: &Point, item: &[usize]) -> bool {
    point.offset == 0
        && doc
            .first_text_point(item)
            .is_some_and(|first| first.path == point.path)
}

/// A run of sibling items handled together by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGroup {
    pub list: Path,
    pub start: usize,
    pub len: usize,
}

impl ItemGroup {
    pub fn first(&self) -> Path {
        path::child(&self.list, self.start)
    }

    pub fn last(&self) -> Path {
        path::child(&self.list, self.start + self.len - 1)
    }

    pub fn items(&self) -> impl Iterator<Item = Path> + '_ {
        (self.start..self.start + self.len).map(|ix| path::child(&self.list, ix))
    }
}

/// Topmost items at the range, split into runs of adjacent siblings of the
/// same list. Items outside any list are dropped.
pub fn topmost_item_groups(options: &ListOptions, doc: &Document, range: &Selection) -> Vec<ItemGroup> {
    let mut groups: Vec<ItemGroup> = Vec::new();
    for item in topmost_items_at_range(options, doc, range) {
        let Some(list) = list_for_item(options, doc, &item) else {
            continue;
        };
        let Some(&index) = item.last() else {
            continue;
        };
        match groups.last_mut() {
            Some(group) if group.list == list && group.start + group.len == index => {
                group.len += 1;
            }
            _ => groups.push(ItemGroup {
                list,
                start: index,
                len: 1,
            }),
        }
    }
    groups
}
