mod common;

use common::*;
use plate_core::{Editor, Node, Point, Selection};
use plate_edit_list::{EditList, KeyEvent, ListOptions};
use proptest::prelude::*;
use proptest::sample::Index;

#[derive(Debug, Clone)]
enum Action {
    Select {
        anchor: (Index, Index),
        focus: (Index, Index),
    },
    Wrap(bool),
    Unwrap,
    Toggle,
    Indent,
    Outdent,
    Split,
    Key(&'static str),
}

fn paragraphs() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec("[a-z]{0,4}", 1..7)
        .prop_map(|texts| texts.iter().map(|t| p(t)).collect())
}

fn point() -> impl Strategy<Value = (Index, Index)> {
    (any::<Index>(), any::<Index>())
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (point(), point()).prop_map(|(anchor, focus)| Action::Select { anchor, focus }),
        2 => any::<bool>().prop_map(Action::Wrap),
        1 => Just(Action::Unwrap),
        1 => Just(Action::Toggle),
        2 => Just(Action::Indent),
        2 => Just(Action::Outdent),
        1 => Just(Action::Split),
        2 => prop::sample::select(vec!["enter", "tab", "shift-tab", "backspace"]).prop_map(Action::Key),
    ]
}

fn resolve(editor: &Editor, (leaf, offset): &(Index, Index)) -> Point {
    let leaves = editor.doc().text_leaves();
    let (path, text) = &leaves[leaf.index(leaves.len())];
    Point::new(path.clone(), offset.index(text.text.len() + 1))
}

fn perform(list: &EditList, editor: &mut Editor, action: &Action) -> Result<(), TestCaseError> {
    let outcome = match action {
        Action::Select { anchor, focus } => {
            let selection = Selection::new(resolve(editor, anchor), resolve(editor, focus));
            editor.set_selection(selection);
            Ok(true)
        }
        Action::Wrap(ordered) => {
            let kind = if *ordered { "ol_list" } else { "ul_list" };
            list.wrap_in_list(editor, Some(kind), None)
        }
        Action::Unwrap => list.unwrap_list(editor, None),
        Action::Toggle => list.toggle_list(editor, None),
        Action::Indent => list.increase_item_depth(editor),
        Action::Outdent => list.decrease_item_depth(editor),
        Action::Split => list.split_list_item(editor),
        Action::Key(binding) => {
            let event: KeyEvent = binding
                .parse()
                .map_err(|err| TestCaseError::fail(format!("{err}")))?;
            list.on_key_down(editor, &event)
        }
    };
    prop_assert!(outcome.is_ok(), "{action:?} failed: {outcome:?}");
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn commands_keep_lists_well_formed(
        children in paragraphs(),
        actions in prop::collection::vec(action(), 1..24),
    ) {
        let options = ListOptions::default().max_depth(3);
        let (list, mut editor) = setup_with(options.clone(), children, cursor(&[0, 0], 0));

        for action in &actions {
            perform(&list, &mut editor, action)?;
            let checked = check_invariants(&options, editor.doc());
            prop_assert!(checked.is_ok(), "after {action:?}: {checked:?}\n{:#?}", outline(editor.doc()));
            prop_assert!(list.deepest_item_depth(&editor, None) <= options.max_depth);
        }

        let settled = editor.doc().clone();
        prop_assert_eq!(editor.normalize().ok(), Some(false));
        prop_assert_eq!(editor.doc(), &settled);
    }

    #[test]
    fn wrapping_then_unwrapping_paragraphs_restores_them(
        children in paragraphs(),
        from in any::<Index>(),
        to in any::<Index>(),
    ) {
        let (list, mut editor) = setup(children, cursor(&[0, 0], 0));
        let before = editor.doc().clone();
        let count = before.children.len();
        let selection = Selection::new(
            Point::new(vec![from.index(count), 0], 0),
            Point::new(vec![to.index(count), 0], 0),
        );
        editor.set_selection(selection);

        prop_assert_eq!(list.wrap_in_list(&mut editor, None, None).ok(), Some(true));
        prop_assert!(list.is_selection_in_list(&editor));
        prop_assert_eq!(list.unwrap_list(&mut editor, None).ok(), Some(true));
        prop_assert_eq!(editor.doc(), &before);
    }

    #[test]
    fn undoing_everything_returns_to_the_start(
        children in paragraphs(),
        actions in prop::collection::vec(action(), 1..12),
    ) {
        let (list, mut editor) = setup(children, cursor(&[0, 0], 0));
        let initial = editor.doc().clone();
        for action in &actions {
            perform(&list, &mut editor, action)?;
        }

        while editor.undo() {}
        prop_assert_eq!(editor.doc(), &initial);
    }
}
