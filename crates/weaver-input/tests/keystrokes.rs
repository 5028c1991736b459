//! Keydown handling: removing the selection before the browser types over it.

mod support;

use support::harness::Editor;
use support::logging_buffer::BufferCall;
use weaver_input::{
    ChangeBuffer, GateState, KeyEvent, KeydownOutcome, ModelPosition, ModelRange, MutationRecord,
    SelectionOutcome, UndoManager,
};

const KEY_Y: u32 = 89;

#[test]
fn test_removes_selected_contents() {
    let mut editor = Editor::new("<paragraph>fo[ob]ar</paragraph>");
    let outcome = editor.keydown(KeyEvent::new(KEY_Y)).unwrap();

    assert_eq!(
        outcome,
        KeydownOutcome::SelectionDeleted(ModelRange::new(
            ModelPosition::new(0, 2),
            ModelPosition::new(0, 4)
        ))
    );
    assert_eq!(editor.markup(), "<paragraph>fo[]ar</paragraph>");
    assert_eq!(
        editor.handler.buffer().calls(),
        &[
            BufferCall::Lock,
            BufferCall::SelectionChanged,
            BufferCall::Unlock
        ]
    );
}

#[test]
fn test_merges_blocks_then_accepts_typing() {
    let mut editor = Editor::new("<paragraph>fo[o</paragraph><paragraph>b]ar</paragraph>");
    editor.keydown(KeyEvent::new(KEY_Y)).unwrap();
    assert_eq!(editor.markup(), "<paragraph>fo[]ar</paragraph>");
    assert_eq!(editor.handler.gate_state(), GateState::AwaitingMutation);

    editor
        .mutate(&[MutationRecord::text("p-0-t0", "foar", "foyar")], None)
        .unwrap();
    assert_eq!(editor.markup(), "<paragraph>foy[]ar</paragraph>");
    assert_eq!(editor.handler.gate_state(), GateState::Idle);

    insta::assert_debug_snapshot!(editor.op_lines(), @r#"
    [
        "remove 0:2..1:1",
        "merge 0",
        "select 0:2..0:2",
        "insert 0:2 \"y\"",
        "select 0:3..0:3",
    ]
    "#);

    // Deletion and typing share one undo step.
    assert!(editor.model.undo());
    assert_eq!(
        editor.markup(),
        "<paragraph>fo[o</paragraph><paragraph>b]ar</paragraph>"
    );
}

#[test]
fn test_non_printable_keys_do_nothing() {
    let markup = "<paragraph>fo[ob]ar</paragraph>";
    let keys = [
        KeyEvent::new(37),
        KeyEvent::new(38),
        KeyEvent::new(39),
        KeyEvent::new(40),
        KeyEvent::new(KEY_Y).with_ctrl(),
        KeyEvent::new(KEY_Y).with_meta(),
        KeyEvent::new(16).with_shift(),
        KeyEvent::new(35),
        KeyEvent::new(112),
        KeyEvent::new(9),
    ];

    let mut editor = Editor::new(markup);
    for key in keys {
        let outcome = editor.keydown(key).unwrap();
        assert_eq!(outcome, KeydownOutcome::NonPrintable, "{key:?}");
        assert_eq!(editor.markup(), markup);
    }
    assert!(editor.handler.buffer().calls().is_empty());
}

#[test]
fn test_composition_keydown_does_nothing() {
    let markup = "<paragraph>fo[ob]ar</paragraph>";
    let mut editor = Editor::new(markup);
    let outcome = editor.keydown(KeyEvent::new(229)).unwrap();

    assert_eq!(outcome, KeydownOutcome::Composing);
    assert_eq!(editor.markup(), markup);
    assert_eq!(editor.handler.gate_state(), GateState::Composing);

    // Still suppressed until the composition ends.
    assert_eq!(
        editor.keydown(KeyEvent::new(KEY_Y)).unwrap(),
        KeydownOutcome::Composing
    );
    editor.handler.composition_end();
    assert_eq!(
        editor.keydown(KeyEvent::new(KEY_Y)).unwrap(),
        KeydownOutcome::SelectionDeleted(ModelRange::new(
            ModelPosition::new(0, 2),
            ModelPosition::new(0, 4)
        ))
    );
}

#[test]
fn test_late_composition_keydown_after_end_is_ignored() {
    let markup = "<paragraph>fo[ob]ar</paragraph>";
    let mut editor = Editor::new(markup);
    editor.handler.composition_start();
    editor.handler.composition_end();

    assert_eq!(
        editor.keydown(KeyEvent::new(229)).unwrap(),
        KeydownOutcome::NonPrintable
    );
    assert_eq!(editor.handler.gate_state(), GateState::Idle);
    assert_eq!(editor.markup(), markup);
}

#[test]
fn test_alt_combination_is_printable() {
    let mut editor = Editor::new("<paragraph>fo[ob]ar</paragraph>");
    editor.keydown(KeyEvent::new(KEY_Y).with_alt()).unwrap();
    assert_eq!(editor.markup(), "<paragraph>fo[]ar</paragraph>");
}

#[test]
fn test_collapsed_selection_takes_no_lock() {
    let mut editor = Editor::new("<paragraph>foo[]bar</paragraph>");
    let outcome = editor.keydown(KeyEvent::new(KEY_Y)).unwrap();

    assert_eq!(outcome, KeydownOutcome::CollapsedSelection);
    assert_eq!(editor.handler.buffer().count(BufferCall::Lock), 0);
    assert_eq!(editor.handler.buffer().count(BufferCall::Unlock), 0);
    assert!(editor.ops().is_empty());
}

#[test]
fn test_non_collapsed_selection_locks_once() {
    let mut editor = Editor::new("<paragraph>fo[ob]ar</paragraph>");
    editor.keydown(KeyEvent::new(KEY_Y)).unwrap();

    assert_eq!(editor.handler.buffer().count(BufferCall::Lock), 1);
    assert_eq!(editor.handler.buffer().count(BufferCall::Unlock), 1);
    assert!(!editor.handler.buffer().is_locked());
}

#[test]
fn test_disabled_command_changes_nothing() {
    for markup in [
        "<paragraph>fo[ob]ar</paragraph>",
        "<paragraph>foo[]bar</paragraph>",
    ] {
        let mut editor = Editor::new(markup);
        editor.handler.command_mut().set_enabled(false);

        assert_eq!(
            editor.keydown(KeyEvent::new(KEY_Y)).unwrap(),
            KeydownOutcome::Ignored
        );
        assert_eq!(editor.markup(), markup);
        assert!(editor.handler.buffer().calls().is_empty());
    }
}

#[test]
fn test_removal_and_typing_undo_together_despite_selection_sync() {
    let mut editor = Editor::new("<paragraph>foo[]bar</paragraph>");
    editor
        .mutate(&[MutationRecord::text("p-0-t0", "foobar", "fooxbar")], None)
        .unwrap();
    let outcome = editor.select(ModelPosition::new(0, 2), ModelPosition::new(0, 4));
    assert_eq!(outcome, SelectionOutcome::Moved);

    editor.keydown(KeyEvent::new(KEY_Y)).unwrap();
    // The host writing the collapsed selection back to the view.
    assert_eq!(
        editor.move_caret(ModelPosition::new(0, 2)),
        SelectionOutcome::OwnChange
    );
    editor
        .mutate(&[MutationRecord::text("p-0-t0", "fobar", "foybar")], None)
        .unwrap();
    assert_eq!(editor.markup(), "<paragraph>foy[]bar</paragraph>");

    assert!(editor.model.undo());
    assert_eq!(editor.markup(), "<paragraph>fo[ox]bar</paragraph>");
    assert!(editor.model.undo());
    assert_eq!(editor.markup(), "<paragraph>foo[]bar</paragraph>");
    assert!(!editor.model.can_undo());
}

#[test]
fn test_cancelled_insertion_does_not_stick() {
    let mut editor = Editor::new("<paragraph>fo[ob]ar</paragraph>");
    editor.keydown(KeyEvent::new(KEY_Y)).unwrap();
    assert_eq!(editor.handler.gate_state(), GateState::AwaitingMutation);

    // No insertion arrived; the next selection is handled from scratch.
    editor.select(ModelPosition::new(0, 0), ModelPosition::new(0, 2));
    assert_eq!(
        editor.keydown(KeyEvent::new(KEY_Y)).unwrap(),
        KeydownOutcome::SelectionDeleted(ModelRange::new(
            ModelPosition::new(0, 0),
            ModelPosition::new(0, 2)
        ))
    );
    assert_eq!(editor.markup(), "<paragraph>[]ar</paragraph>");
    assert_eq!(editor.handler.gate_state(), GateState::AwaitingMutation);
}
