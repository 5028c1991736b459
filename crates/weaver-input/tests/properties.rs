use proptest::prelude::*;

mod support;
use support::harness::Editor;

// Plain text without selection markers or markup characters, with
// repeated letters so prefix and suffix trims interact.
fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[ab ]{1,12}",
        "[a-z ]{1,24}",
        "[a-zé你 ]{1,16}",
    ]
}

fn paragraph(text: &str) -> String {
    format!("<paragraph>{text}[]</paragraph>")
}

proptest! {
    #[test]
    fn prop_text_mutation_reproduces_observed_text(
        old in "[a-zé你 ]{1,16}",
        new in text_strategy(),
    ) {
        let mut editor = Editor::new(&paragraph(&old));
        editor
            .mutate(&[weaver_input::MutationRecord::text("p-0-t0", &old, &new)], None)
            .unwrap();

        prop_assert_eq!(editor.model.text(0), Some(new.clone()));
        let view_text = editor
            .view
            .text_node(0, 0)
            .and_then(|node| editor.view.text_of(&node).map(str::to_string))
            .unwrap_or_default();
        prop_assert_eq!(view_text, new);
    }

    #[test]
    fn prop_at_most_one_remove_and_one_insert(
        old in "[a-z]{1,16}",
        new in "[a-z]{0,16}",
    ) {
        let mut editor = Editor::new(&paragraph(&old));
        editor
            .mutate(&[weaver_input::MutationRecord::text("p-0-t0", &old, &new)], None)
            .unwrap();

        let removes = editor.ops().iter().filter(|op| op.is_remove()).count();
        let inserts = editor.ops().iter().filter(|op| op.is_insert()).count();
        prop_assert!(removes <= 1);
        prop_assert!(inserts <= 1);
        if let Some(first_insert) = editor.ops().iter().position(|op| op.is_insert()) {
            if let Some(first_remove) = editor.ops().iter().position(|op| op.is_remove()) {
                prop_assert!(first_remove < first_insert);
            }
        }
    }

    #[test]
    fn prop_caret_lands_after_inserted_text(
        prefix in "[a-z]{0,8}",
        inserted in "[A-Z]{1,4}",
        suffix in "[a-z]{0,8}",
    ) {
        let old = format!("{prefix}{suffix}");
        let new = format!("{prefix}{inserted}{suffix}");
        let mut editor = Editor::new(&format!("<paragraph>{prefix}[]{suffix}</paragraph>"));
        if old.is_empty() {
            editor
                .mutate(
                    &[weaver_input::MutationRecord::children(
                        "p-0",
                        vec![],
                        vec![weaver_input::ViewNode::text(new.as_str())],
                    )],
                    None,
                )
                .unwrap();
        } else {
            editor
                .mutate(&[weaver_input::MutationRecord::text("p-0-t0", &old, &new)], None)
                .unwrap();
        }

        let expected = format!("<paragraph>{prefix}{inserted}[]{suffix}</paragraph>");
        prop_assert_eq!(editor.markup(), expected);
    }
}
