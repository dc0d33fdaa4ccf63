use pretty_assertions::assert_eq;
use rstest::rstest;
use textflow_engine::editing::{Cmd, Editor, StyleChange};
use textflow_engine::{BufferError, TextAlignment};

fn editor(text: &str) -> Editor {
    let mut editor = Editor::default();
    editor.set_text(text);
    editor
}

fn select(editor: &mut Editor, anchor: usize, caret: usize) -> Result<(), BufferError> {
    editor.apply(Cmd::SetSelection { anchor, caret })?;
    Ok(())
}

fn type_text(editor: &mut Editor, text: &str) -> Result<(), BufferError> {
    editor.apply(Cmd::InsertText {
        text: text.to_string(),
    })?;
    Ok(())
}

#[test]
fn test_typing_session_with_formatting() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut editor = Editor::default();

    type_text(&mut editor, "Hello")?;
    editor.apply(Cmd::Style(StyleChange::ToggleBold))?;
    type_text(&mut editor, " world")?;
    select(&mut editor, 0, 5)?;
    editor.apply(Cmd::Style(StyleChange::ToggleItalic))?;

    let runs: Vec<(&str, bool, bool)> = editor
        .buffer()
        .runs()
        .iter()
        .map(|run| (run.text(), run.style.is_bold(), run.style.is_italic()))
        .collect();
    assert_eq!(runs, vec![("Hello", false, true), (" world", true, false)]);
    Ok(())
}

#[test]
fn test_restore_undoes_a_delete() -> anyhow::Result<()> {
    let mut editor = editor("Hello world");
    select(&mut editor, 6, 11)?;
    editor.apply(Cmd::Style(StyleChange::ToggleUnderline))?;
    let saved = editor.buffer().clone();

    select(&mut editor, 0, 6)?;
    editor.apply(Cmd::DeleteSelection)?;
    assert_eq!(editor.text(), "world");

    editor.restore(&saved);
    assert_eq!(editor.text(), "Hello world");
    assert_eq!(editor.buffer().runs().len(), 2);
    assert!(editor.selection().end <= editor.buffer().len());
    Ok(())
}

#[test]
fn test_selection_ending_after_newline_skips_next_line() -> anyhow::Result<()> {
    let mut editor = editor("a\nb\nc");
    select(&mut editor, 0, 4)?;

    editor.apply(Cmd::ToggleBulletList)?;

    assert_eq!(editor.text(), "• a\n• b\nc");
    assert_eq!(editor.selection(), 0..7);
    Ok(())
}

#[test]
fn test_numbered_list_counts_from_one() -> anyhow::Result<()> {
    let mut editor = editor("x\ny\nz");
    select(&mut editor, 0, 5)?;

    let patch = editor.apply(Cmd::ToggleNumberedList)?;

    assert_eq!(editor.text(), "1. x\n2. y\n3. z");
    assert_eq!(patch.new_selection, 0..14);
    assert_eq!(patch.changed, vec![0..14]);
    Ok(())
}

#[test]
fn test_alignment_applies_to_every_selected_line() -> anyhow::Result<()> {
    let mut editor = editor("a\nb\nc");
    select(&mut editor, 0, 5)?;

    let patch = editor.apply(Cmd::SetAlignment(TextAlignment::Right))?;

    assert_eq!(patch.changed, vec![0..1, 2..3, 4..5]);
    for start in [0, 2, 4] {
        assert_eq!(
            editor.buffer().paragraph_alignment(start),
            Some(TextAlignment::Right)
        );
    }

    let again = editor.apply(Cmd::SetAlignment(TextAlignment::Right))?;
    assert!(again.changed.is_empty());
    Ok(())
}

#[rstest]
#[case::tab("\tx", "x")]
#[case::two_spaces("  x", "x")]
#[case::six_spaces("      x", "  x")]
#[case::nothing_to_remove("x", "x")]
fn test_decrease_indent(#[case] text: &str, #[case] expected: &str) -> anyhow::Result<()> {
    let mut editor = editor(text);
    let len = editor.buffer().len();
    select(&mut editor, 0, len)?;

    editor.apply(Cmd::DecreaseIndent)?;

    assert_eq!(editor.text(), expected);
    Ok(())
}

#[test]
fn test_typing_after_table_keeps_table_range() -> anyhow::Result<()> {
    let mut editor = Editor::default();

    editor.apply(Cmd::InsertTable {
        rows: 2,
        columns: 2,
    })?;
    type_text(&mut editor, "after")?;

    let table = &editor.buffer().tables()[0];
    assert_eq!((table.start, table.len), (0, 49));
    assert!(editor.text().ends_with("Column 2\nafter"));
    assert_eq!(editor.caret(), editor.buffer().len());
    Ok(())
}

#[test]
fn test_backspace_removes_whole_character() -> anyhow::Result<()> {
    let mut editor = editor("naïve");
    select(&mut editor, 3, 3)?;

    editor.apply(Cmd::DeleteBackward)?;

    assert_eq!(editor.text(), "nave");
    assert_eq!(editor.caret(), 2);
    Ok(())
}
