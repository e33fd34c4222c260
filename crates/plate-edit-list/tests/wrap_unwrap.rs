mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn wrapping_a_paragraph_makes_a_one_item_list() {
    let (list, mut editor) = setup(vec![p("Buy milk")], cursor(&[0, 0], 3));

    assert!(list.wrap_in_list(&mut editor, None, None).unwrap());
    assert_eq!(
        outline(editor.doc()),
        vec!["ul_list", "  list_item", "    paragraph \"Buy milk\""]
    );
    assert_eq!(editor.selection().focus.path, vec![0, 0, 0, 0]);
    assert_eq!(editor.selection().focus.offset, 3);
}

#[test]
fn wrapping_a_range_makes_one_item_per_block() {
    let (list, mut editor) = setup(
        vec![p("a"), p("b"), p("c")],
        range(&[0, 0], 0, &[1, 0], 1),
    );

    assert!(list.wrap_in_list(&mut editor, Some("ol_list"), None).unwrap());
    assert_eq!(
        outline(editor.doc()),
        vec![
            "ol_list",
            "  list_item",
            "    paragraph \"a\"",
            "  list_item",
            "    paragraph \"b\"",
            "paragraph \"c\"",
        ]
    );
}

#[test]
fn wrapping_next_to_a_list_of_the_same_type_joins_it() {
    let (list, mut editor) = setup(vec![ul(vec![item("a")]), p("b")], cursor(&[1, 0], 0));

    assert!(list.wrap_in_list(&mut editor, None, None).unwrap());
    assert_eq!(
        outline(editor.doc()),
        vec![
            "ul_list",
            "  list_item",
            "    paragraph \"a\"",
            "  list_item",
            "    paragraph \"b\"",
        ]
    );
    assert_eq!(editor.selection().focus.path, vec![0, 1, 0, 0]);
}

#[test]
fn wrapped_lists_contribute_their_items() {
    let (list, mut editor) = setup(
        vec![p("a"), ul(vec![item("b")])],
        range(&[0, 0], 0, &[1, 0, 0, 0], 1),
    );

    assert!(list.wrap_in_list(&mut editor, Some("ol_list"), None).unwrap());
    assert_eq!(
        outline(editor.doc()),
        vec![
            "ol_list",
            "  list_item",
            "    paragraph \"a\"",
            "  list_item",
            "    paragraph \"b\"",
        ]
    );
}

#[test]
fn wrapping_inside_a_list_or_with_an_unknown_type_does_nothing() {
    let (list, mut editor) = setup(vec![ul(vec![item("a")]), p("b")], cursor(&[0, 0, 0, 0], 0));
    let before = editor.doc().clone();

    assert!(!list.wrap_in_list(&mut editor, None, None).unwrap());
    assert_eq!(editor.doc(), &before);

    assert!(!list.wrap_in_list(&mut editor, Some("ol_list"), None).unwrap());
    assert_eq!(editor.doc(), &before);

    let elsewhere = cursor(&[1, 0], 0);
    assert!(!list.wrap_in_list(&mut editor, Some("heading"), Some(&elsewhere)).unwrap());
    assert_eq!(editor.doc(), &before);
    assert!(!editor.can_undo());
}

#[test]
fn unwrapping_a_middle_item_splits_the_list() {
    let (list, mut editor) = setup(
        vec![ul(vec![
            item("1"),
            item("2"),
            item("3"),
            item("4"),
            item("5"),
        ])],
        cursor(&[0, 2, 0, 0], 1),
    );

    assert!(list.unwrap_list(&mut editor, None).unwrap());
    assert_eq!(
        outline(editor.doc()),
        vec![
            "ul_list",
            "  list_item",
            "    paragraph \"1\"",
            "  list_item",
            "    paragraph \"2\"",
            "paragraph \"3\"",
            "ul_list",
            "  list_item",
            "    paragraph \"4\"",
            "  list_item",
            "    paragraph \"5\"",
        ]
    );
    assert_eq!(editor.selection().focus.path, vec![1, 0]);
    assert_eq!(editor.selection().focus.offset, 1);
}

#[test]
fn unwrapping_every_item_removes_the_list() {
    let (list, mut editor) = setup(
        vec![ul(vec![item("a"), item("b")])],
        range(&[0, 0, 0, 0], 0, &[0, 1, 0, 0], 1),
    );

    assert!(list.unwrap_list(&mut editor, None).unwrap());
    assert_eq!(
        outline(editor.doc()),
        vec!["paragraph \"a\"", "paragraph \"b\""]
    );
}

#[test]
fn unwrapping_a_nested_item_leaves_its_blocks_in_the_parent_item() {
    let (list, mut editor) = setup(
        vec![ul(vec![li(vec![p("a"), ul(vec![item("b")])])])],
        cursor(&[0, 0, 1, 0, 0, 0], 0),
    );

    assert!(list.unwrap_list(&mut editor, None).unwrap());
    assert_eq!(
        outline(editor.doc()),
        vec![
            "ul_list",
            "  list_item",
            "    paragraph \"a\"",
            "    paragraph \"b\"",
        ]
    );
}

#[test]
fn unwrapping_across_sibling_lists_lifts_each_group() {
    let (list, mut editor) = setup(
        vec![
            ul(vec![item("a"), item("b")]),
            ol(vec![item("c"), item("d")]),
        ],
        range(&[0, 1, 0, 0], 0, &[1, 0, 0, 0], 1),
    );

    assert!(list.unwrap_list(&mut editor, None).unwrap());
    assert_eq!(
        outline(editor.doc()),
        vec![
            "ul_list",
            "  list_item",
            "    paragraph \"a\"",
            "paragraph \"b\"",
            "paragraph \"c\"",
            "ol_list",
            "  list_item",
            "    paragraph \"d\"",
        ]
    );
}

#[test]
fn toggle_wraps_then_unwraps() {
    let (list, mut editor) = setup(vec![p("x")], cursor(&[0, 0], 0));

    assert!(list.toggle_list(&mut editor, Some("ol_list")).unwrap());
    assert_eq!(
        outline(editor.doc()),
        vec!["ol_list", "  list_item", "    paragraph \"x\""]
    );

    assert!(list.toggle_list(&mut editor, Some("ol_list")).unwrap());
    assert_eq!(outline(editor.doc()), vec!["paragraph \"x\""]);
}

#[test]
fn wrap_is_undone_in_one_step() {
    let (list, mut editor) = setup(vec![p("x"), p("y")], range(&[0, 0], 0, &[1, 0], 1));
    let before = editor.doc().clone();

    assert!(list.wrap_in_list(&mut editor, None, None).unwrap());
    assert!(editor.undo());
    assert_eq!(editor.doc(), &before);
    assert!(!editor.can_undo());

    assert!(editor.redo());
    assert_eq!(editor.doc().children.len(), 1);
}

#[test]
fn registry_commands_accept_a_list_type() -> anyhow::Result<()> {
    let (_list, mut editor) = setup(vec![p("x")], cursor(&[0, 0], 0));

    editor.run_command("list.toggle_list", Some(json!({ "type": "ol_list" })))?;
    assert_eq!(editor.doc().children[0].kind(), Some("ol_list"));

    editor.run_command("list.unwrap_list", None)?;
    assert_eq!(outline(editor.doc()), vec!["paragraph \"x\""]);

    editor.run_command("list.wrap_in_list", None)?;
    assert_eq!(editor.doc().children[0].kind(), Some("ul_list"));
    Ok(())
}
