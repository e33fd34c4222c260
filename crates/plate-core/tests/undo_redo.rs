use plate_core::{Document, Editor, Node, Op, PluginRegistry, Point, Selection, Transaction};
use pretty_assertions::assert_eq;

fn editor_with_blocks(texts: &[&str]) -> Editor {
    let doc = Document::new(texts.iter().map(|t| Node::paragraph(*t)).collect());
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(doc, selection, PluginRegistry::core())
}

#[test]
fn undo_redo_handles_multi_op_insert_order() {
    let mut editor = editor_with_blocks(&[""]);

    let tx = Transaction::new(vec![
        Op::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "a".to_string(),
        },
        Op::InsertText {
            path: vec![0, 0],
            offset: 1,
            text: "b".to_string(),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(vec![0, 0], 2)))
    .source("test:multi_insert");

    editor.apply(tx).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(editor.selection().focus.offset, 2);

    assert!(editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert_eq!(editor.selection().focus.offset, 0);

    assert!(editor.redo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(editor.selection().focus.offset, 2);
}

#[test]
fn undo_restores_moved_nodes() {
    let mut editor = editor_with_blocks(&["a", "b", "c"]);
    let before = editor.doc().clone();

    editor
        .apply(
            Transaction::new(vec![Op::MoveNode {
                path: vec![0],
                new_path: vec![2],
            }])
            .source("test:move"),
        )
        .unwrap();
    let texts: Vec<String> = editor.doc().children.iter().map(Node::text_content).collect();
    assert_eq!(texts, vec!["b", "c", "a"]);
    assert_eq!(editor.selection().focus.path, vec![2, 0]);

    assert!(editor.undo());
    assert_eq!(editor.doc(), &before);
    assert!(editor.redo());
    let texts: Vec<String> = editor.doc().children.iter().map(Node::text_content).collect();
    assert_eq!(texts, vec!["b", "c", "a"]);
}

#[test]
fn undo_reverts_normalization_repairs_together_with_the_edit() {
    let mut editor = editor_with_blocks(&["ab"]);
    let before = editor.doc().clone();

    editor
        .apply(Transaction::new(vec![Op::InsertNode {
            path: vec![0, 1],
            node: Node::text("cd"),
        }]))
        .unwrap();
    // The new leaf is merged into its equal-marked neighbour.
    assert_eq!(editor.doc().children, vec![Node::paragraph("abcd")]);

    assert!(editor.undo());
    assert_eq!(editor.doc(), &before);
    assert!(!editor.can_undo());
    assert!(editor.can_redo());
}

#[test]
fn moving_a_node_into_itself_is_rejected() {
    let mut editor = editor_with_blocks(&["a"]);
    let err = editor
        .apply(Transaction::new(vec![Op::MoveNode {
            path: vec![0],
            new_path: vec![0, 1],
        }]))
        .unwrap_err();
    assert!(matches!(err, plate_core::ApplyError::InvalidPath(_)));
    assert!(!editor.can_undo());
}

#[test]
fn a_fresh_editor_has_nothing_to_undo() {
    let mut editor = Editor::with_core_plugins();
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert!(!editor.can_undo());
    assert!(!editor.undo());
    assert!(!editor.redo());
}
