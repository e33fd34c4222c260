#![allow(dead_code)]

use plate_core::{Document, Editor, Node, Point, Selection};
use plate_edit_list::{EditList, ListOptions};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn p(text: &str) -> Node {
    Node::paragraph(text)
}

pub fn li(children: Vec<Node>) -> Node {
    Node::element("list_item", children)
}

/// An item holding a single paragraph.
pub fn item(text: &str) -> Node {
    li(vec![p(text)])
}

pub fn ul(items: Vec<Node>) -> Node {
    Node::element("ul_list", items)
}

pub fn ol(items: Vec<Node>) -> Node {
    Node::element("ol_list", items)
}

pub fn cursor(path: &[usize], offset: usize) -> Selection {
    Selection::collapsed(Point::new(path.to_vec(), offset))
}

pub fn range(anchor: &[usize], anchor_offset: usize, focus: &[usize], focus_offset: usize) -> Selection {
    Selection::new(
        Point::new(anchor.to_vec(), anchor_offset),
        Point::new(focus.to_vec(), focus_offset),
    )
}

pub fn setup_with(options: ListOptions, children: Vec<Node>, selection: Selection) -> (EditList, Editor) {
    init_tracing();
    let list = EditList::new(options).expect("valid options");
    let editor = list
        .editor(Document::new(children), selection)
        .expect("valid registry");
    (list, editor)
}

pub fn setup(children: Vec<Node>, selection: Selection) -> (EditList, Editor) {
    setup_with(ListOptions::default(), children, selection)
}

/// Indented `kind "text"` lines, one per element, for readable diffs.
pub fn outline(doc: &Document) -> Vec<String> {
    fn walk(nodes: &[Node], depth: usize, out: &mut Vec<String>) {
        for node in nodes {
            let Node::Element(el) = node else {
                continue;
            };
            let pad = "  ".repeat(depth);
            if el.children.iter().all(|c| matches!(c, Node::Text(_))) {
                out.push(format!("{pad}{} {:?}", el.kind, node.text_content()));
            } else {
                out.push(format!("{pad}{}", el.kind));
                walk(&el.children, depth + 1, out);
            }
        }
    }

    let mut out = Vec::new();
    walk(&doc.children, 0, &mut out);
    out
}

/// Checks the list invariants, returning the first violation found.
pub fn check_invariants(options: &ListOptions, doc: &Document) -> Result<(), String> {
    fn walk(
        options: &ListOptions,
        nodes: &[Node],
        parent_kind: Option<&str>,
        depth: usize,
        out: &mut Vec<String>,
    ) {
        let parent_is_list = parent_kind.is_some_and(|k| options.is_list_kind(k));
        let parent_is_item = parent_kind.is_some_and(|k| options.is_item_kind(k));
        for (ix, node) in nodes.iter().enumerate() {
            let kind = node.kind();
            let is_list = kind.is_some_and(|k| options.is_list_kind(k));
            let is_item = kind.is_some_and(|k| options.is_item_kind(k));
            if parent_is_list && !is_item {
                out.push(format!("list child {ix} is not an item"));
            }
            if parent_is_item && kind.is_none() {
                out.push(format!("item child {ix} is text"));
            }
            if is_item && !parent_is_list {
                out.push(format!("item {ix} outside a list"));
            }
            if is_item && depth > options.max_depth {
                out.push(format!("item {ix} at depth {depth}"));
            }
            if ix > 0 && is_list {
                if let (Some(Node::Element(a)), Node::Element(b)) = (nodes.get(ix - 1), node) {
                    if options.is_list_kind(&a.kind) && options.can_merge_lists(a, b) {
                        out.push(format!("lists {} and {ix} should be joined", ix - 1));
                    }
                }
            }
            if let Node::Element(el) = node {
                walk(options, &el.children, kind, depth + usize::from(is_list), out);
            }
        }
    }

    let mut out = Vec::new();
    walk(options, &doc.children, None, 0, &mut out);
    match out.into_iter().next() {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}
