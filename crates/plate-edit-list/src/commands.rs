//! Structural list edits.
//!
//! Each command composes document-model primitives on a [`Draft`]. The
//! draft is re-read after every primitive, so no path is held across a
//! mutation unless it is known to be unaffected by it. Groups of items are
//! handled last-to-first for the same reason.

use plate_core::{
    ApplyError, CommandError, Draft, Editor, ElementNode, Node, Path, Point, Selection, path,
};

use crate::options::ListOptions;
use crate::query::{self, ItemGroup};

fn invalid(message: impl Into<String>) -> ApplyError {
    ApplyError::InvalidPath(message.into())
}

/// Runs `edit` on a draft of `editor` and commits it as one transaction
/// with source `command:list.<name>`. Returns whether anything changed.
pub(crate) fn commit(
    editor: &mut Editor,
    name: &str,
    edit: impl FnOnce(&mut Draft) -> Result<(), ApplyError>,
) -> Result<bool, CommandError> {
    let mut draft = editor.draft();
    edit(&mut draft)?;
    if draft.is_empty() {
        tracing::debug!(command = name, "list command made no changes");
        return Ok(false);
    }
    let ops = draft.ops().len();
    editor.apply(draft.into_transaction(format!("command:list.{name}")))?;
    tracing::debug!(command = name, ops, "list command applied");
    Ok(true)
}

fn range_or_selection(draft: &Draft, at: Option<&Selection>) -> Option<Selection> {
    at.cloned().or_else(|| draft.selection().cloned())
}

/// Wraps the highest blocks of the range in a new list of `kind`, one item
/// per block. A block that is already a list contributes its items.
pub fn wrap_in_list(
    options: &ListOptions,
    draft: &mut Draft,
    kind: Option<&str>,
    at: Option<&Selection>,
) -> Result<(), ApplyError> {
    let Some(range) = range_or_selection(draft, at) else {
        return Ok(());
    };
    let kind = kind.unwrap_or_else(|| options.default_list_kind()).to_string();
    let (start, end) = range.ordered();
    let (Some(start_block), Some(end_block)) = (path::parent(&start.path), path::parent(&end.path))
    else {
        return Ok(());
    };
    if start_block.is_empty() || end_block.is_empty() {
        return Ok(());
    }

    if !options.is_list_kind(&kind) {
        tracing::debug!(kind = %kind, "not a list type");
        return Ok(());
    }

    let common = path::common_ancestor(&start_block, &end_block);
    let depth = common.len();
    let (parent, first, last) = if depth < start_block.len() && depth < end_block.len() {
        (common, start_block[depth], end_block[depth])
    } else {
        let Some((&ix, parent)) = common.split_last() else {
            return Ok(());
        };
        (parent.to_vec(), ix, ix)
    };

    let doc = draft.doc();
    let parent_kind = doc.element(&parent).map(|el| el.kind.as_str());
    if parent_kind.is_some_and(|k| options.is_item_kind(k) || options.is_list_kind(k)) {
        let current = doc
            .ancestors(&start.path)
            .into_iter()
            .find(|(_, el)| options.is_list_kind(&el.kind))
            .map(|(_, el)| el.kind.clone());
        tracing::debug!(
            requested = %kind,
            current = ?current,
            ?parent,
            "blocks are already inside a list; use toggle or unwrap to change its type"
        );
        return Ok(());
    }
    let Some(children) = doc.children(&parent) else {
        return Ok(());
    };
    let targets: Vec<Node> = children
        .get(first..=last)
        .map(<[Node]>::to_vec)
        .unwrap_or_default();
    if targets.is_empty() {
        return Ok(());
    }
    if let [Node::Element(only)] = targets.as_slice() {
        if only.kind == kind {
            return Ok(());
        }
    }

    let list = path::child(&parent, first);
    draft.insert_node(list.clone(), Node::Element(ElementNode::new(kind)))?;
    let source = path::child(&parent, first + 1);
    let mut count = 0;
    for target in &targets {
        if query::is_list(options, target) {
            let items = target.as_element().map_or(0, |el| el.children.len());
            for _ in 0..items {
                draft.move_node(path::child(&source, 0), path::child(&list, count))?;
                count += 1;
            }
            draft.remove_node(source.clone())?;
        } else {
            let item = path::child(&list, count);
            draft.insert_node(item.clone(), Node::element(&options.type_item, Vec::new()))?;
            draft.move_node(source.clone(), path::child(&item, 0))?;
            count += 1;
        }
    }
    Ok(())
}

/// Lifts the group out of its list, splitting the list around it, and
/// replaces each item by its children.
fn unwrap_group(draft: &mut Draft, group: &ItemGroup) -> Result<(), ApplyError> {
    let (&list_ix, parent) = group
        .list
        .split_last()
        .ok_or_else(|| invalid("list at the root"))?;
    let list_len = draft
        .doc()
        .children(&group.list)
        .map_or(0, <[Node]>::len);
    let after = group.start + group.len;
    if after < list_len {
        draft.split_node(&group.list, after)?;
    }
    for j in 0..group.len {
        draft.move_node(
            group.first(),
            path::child(parent, list_ix + 1 + j),
        )?;
    }
    let first = if group.start == 0 {
        draft.remove_node(group.list.clone())?;
        list_ix
    } else {
        list_ix + 1
    };
    for j in (0..group.len).rev() {
        draft.unwrap_node(&path::child(parent, first + j))?;
    }
    Ok(())
}

/// Unwraps every topmost item at the range out of its list.
pub fn unwrap_list(
    options: &ListOptions,
    draft: &mut Draft,
    at: Option<&Selection>,
) -> Result<(), ApplyError> {
    let Some(range) = range_or_selection(draft, at) else {
        return Ok(());
    };
    let groups = query::topmost_item_groups(options, draft.doc(), &range);
    for group in groups.iter().rev() {
        unwrap_group(draft, group)?;
    }
    Ok(())
}

pub fn toggle_list(
    options: &ListOptions,
    draft: &mut Draft,
    kind: Option<&str>,
) -> Result<(), ApplyError> {
    let Some(selection) = draft.selection().cloned() else {
        return Ok(());
    };
    if query::is_selection_in_list(options, draft.doc(), &selection) {
        unwrap_list(options, draft, None)
    } else {
        wrap_in_list(options, draft, kind, None)
    }
}

/// Nests each selected group under the item before it.
pub fn increase_item_depth(options: &ListOptions, draft: &mut Draft) -> Result<(), ApplyError> {
    let Some(selection) = draft.selection().cloned() else {
        return Ok(());
    };
    let groups = query::topmost_item_groups(options, draft.doc(), &selection);
    for group in groups.iter().rev() {
        let Some(prev_ix) = group.start.checked_sub(1) else {
            tracing::debug!(list = ?group.list, "no previous item to nest under");
            continue;
        };
        let doc = draft.doc();
        let deepest = group
            .items()
            .map(|item| query::subtree_deepest_depth(options, doc, &item))
            .max()
            .unwrap_or(0);
        if deepest + 1 > options.max_depth {
            tracing::debug!(deepest, max_depth = options.max_depth, "items already at max depth");
            continue;
        }
        let prev = path::child(&group.list, prev_ix);
        if !query::is_item_at(options, doc, &prev) {
            continue;
        }
        let Some(list_el) = doc.element(&group.list) else {
            continue;
        };
        let new_list = list_el.shallow_clone();
        let prev_len = doc.children(&prev).map_or(0, <[Node]>::len);
        let trailing = prev_len
            .checked_sub(1)
            .map(|last| path::child(&prev, last))
            .filter(|sub| query::is_list_at(options, doc, sub));

        let (sub_list, offset) = match trailing {
            Some(sub) => {
                let len = doc.children(&sub).map_or(0, <[Node]>::len);
                (sub, len)
            }
            None => {
                let sub = path::child(&prev, prev_len);
                draft.insert_node(sub.clone(), Node::Element(new_list))?;
                (sub, 0)
            }
        };
        for j in 0..group.len {
            draft.move_node(group.first(), path::child(&sub_list, offset + j))?;
        }
    }
    Ok(())
}

/// Lifts each selected group one level. Groups at depth 1 are unwrapped.
pub fn decrease_item_depth(options: &ListOptions, draft: &mut Draft) -> Result<(), ApplyError> {
    let Some(selection) = draft.selection().cloned() else {
        return Ok(());
    };
    let groups = query::topmost_item_groups(options, draft.doc(), &selection);
    for group in groups.iter().rev() {
        let depth = query::item_depth(options, draft.doc(), &group.first());
        if depth <= 1 {
            unwrap_group(draft, group)?;
            continue;
        }
        lift_group(options, draft, group)?;
    }
    Ok(())
}

fn lift_group(options: &ListOptions, draft: &mut Draft, group: &ItemGroup) -> Result<(), ApplyError> {
    let Some(parent_item) = path::parent(&group.list) else {
        return Ok(());
    };
    if !query::is_item_at(options, draft.doc(), &parent_item) {
        tracing::debug!(list = ?group.list, "nested list is not inside an item");
        return Ok(());
    }
    let (&parent_ix, outer_list) = parent_item
        .split_last()
        .ok_or_else(|| invalid("item at the root"))?;
    let outer_list: Path = outer_list.to_vec();

    // Items after the group stay below the last lifted item.
    let list_len = draft.doc().children(&group.list).map_or(0, <[Node]>::len);
    let after = group.start + group.len;
    let followers = list_len.saturating_sub(after);
    if followers > 0 {
        let last = group.last();
        let last_len = draft.doc().children(&last).map_or(0, <[Node]>::len);
        let trailing = last_len
            .checked_sub(1)
            .map(|ix| path::child(&last, ix))
            .filter(|sub| query::is_list_at(options, draft.doc(), sub));
        let (sub_list, offset) = match trailing {
            Some(sub) => {
                let len = draft.doc().children(&sub).map_or(0, <[Node]>::len);
                (sub, len)
            }
            None => {
                let shell = draft
                    .doc()
                    .element(&group.list)
                    .map(ElementNode::shallow_clone)
                    .ok_or_else(|| invalid("list vanished while lifting"))?;
                let sub = path::child(&last, last_len);
                draft.insert_node(sub.clone(), Node::Element(shell))?;
                (sub, 0)
            }
        };
        for k in 0..followers {
            draft.move_node(
                path::child(&group.list, after),
                path::child(&sub_list, offset + k),
            )?;
        }
    }

    for j in 0..group.len {
        draft.move_node(
            group.first(),
            path::child(&outer_list, parent_ix + 1 + j),
        )?;
    }

    if draft.doc().children(&group.list).is_some_and(<[Node]>::is_empty) {
        draft.remove_node(group.list.clone())?;
        if draft.doc().children(&parent_item).is_some_and(<[Node]>::is_empty) {
            draft.remove_node(parent_item)?;
        }
    }
    Ok(())
}

/// Splits the current item at the cursor. The cursor moves to the start of
/// the new item.
pub fn split_list_item(options: &ListOptions, draft: &mut Draft) -> Result<(), ApplyError> {
    let Some(mut selection) = draft.selection().cloned() else {
        return Ok(());
    };
    if !selection.is_collapsed() {
        if selection.anchor.path != selection.focus.path {
            tracing::debug!("selection spans several leaves; not splitting");
            return Ok(());
        }
        let (start, end) = selection.ordered();
        let (start, end) = (start.clone(), end.clone());
        draft.remove_text(start.path.clone(), start.offset..end.offset)?;
        selection = Selection::collapsed(start);
        draft.select(selection.clone());
    }

    let Some(item) = query::current_item(options, draft.doc(), &selection) else {
        return Ok(());
    };
    if query::is_item_empty(draft.doc(), &item) {
        return decrease_item_depth(options, draft);
    }

    let point: Point = selection.focus.clone();
    let new_item = draft.split_nodes(&point, &item)?;
    if let Some(cursor) = draft.doc().first_text_point(&new_item) {
        draft.select(Selection::collapsed(cursor));
    }
    Ok(())
}
