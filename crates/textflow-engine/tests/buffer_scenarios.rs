use pretty_assertions::assert_eq;
use rstest::rstest;
use textflow_engine::editing::{RichTextBuffer, RichTextStyle, StyledRun};
use textflow_engine::{BufferError, TextAlignment};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_invariants(buffer: &RichTextBuffer) {
    let joined: String = buffer.runs().iter().map(StyledRun::text).collect();
    assert_eq!(joined, buffer.text());
    assert_eq!(buffer.text().chars().count(), buffer.len());
    assert!(buffer.runs().iter().all(|run| !run.is_empty()));
    for pair in buffer.runs().windows(2) {
        assert_ne!(pair[0].style, pair[1].style, "adjacent runs share a style");
    }
}

#[test]
fn test_insert_into_empty_buffer() -> anyhow::Result<()> {
    init_logging();
    let mut buffer = RichTextBuffer::new();

    buffer.insert_text(0, "Hello", RichTextStyle::default())?;

    assert_eq!(buffer.text(), "Hello");
    assert_eq!(buffer.len(), 5);
    assert_invariants(&buffer);
    Ok(())
}

#[test]
fn test_delete_range_from_word() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::from_text("Avalonia", RichTextStyle::default());

    buffer.delete_range(1, 3)?;

    assert_eq!(buffer.text(), "Aonia");
    assert_eq!(buffer.len(), 5);
    Ok(())
}

#[test]
fn test_apply_bold_to_second_half() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::from_text("RichText", RichTextStyle::default());

    buffer.apply_style(4, 4, |style| style.clone().bold())?;

    assert!(!buffer.style_at(1)?.is_bold());
    assert!(buffer.style_at(5)?.is_bold());
    assert_invariants(&buffer);
    Ok(())
}

#[test]
fn test_insert_table_into_empty_buffer() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::new();

    buffer.insert_table(0, 3, 3)?;

    let table = &buffer.tables()[0];
    let grid = buffer.text_range(table.start, table.len)?;
    let rows: Vec<Vec<&str>> = grid.split('\n').map(|row| row.split('\t').collect()).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.len() == 3));
    assert_eq!(table.columns, 3);
    assert_eq!(table.header_row_count, 1);
    Ok(())
}

#[test]
fn test_mixed_edits_keep_runs_merged() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::from_text("The quick brown fox", RichTextStyle::default());
    let italic = |style: &RichTextStyle| {
        style
            .clone()
            .with_font_style(textflow_engine::FontStyle::Italic)
    };

    buffer.apply_style(4, 5, |style| style.clone().bold())?;
    buffer.apply_style(6, 8, italic)?;
    buffer.insert_text(9, " red", RichTextStyle::default().bold())?;
    assert_invariants(&buffer);

    buffer.delete_range(3, 10)?;
    assert_invariants(&buffer);

    buffer.apply_style(0, buffer.len(), |_| RichTextStyle::default())?;
    assert_eq!(buffer.runs().len(), 1);
    assert_eq!(buffer.text(), "The brown fox");
    Ok(())
}

#[rstest]
#[case::insert_past_end(|b: &mut RichTextBuffer| b.insert_text(9, "x", RichTextStyle::default()))]
#[case::delete_past_end(|b: &mut RichTextBuffer| b.delete_range(2, 9))]
#[case::style_at_length(|b: &mut RichTextBuffer| b.apply_style(3, 1, |s| s.clone()))]
fn test_failed_edits_leave_buffer_untouched(
    #[case] edit: fn(&mut RichTextBuffer) -> Result<(), BufferError>,
) {
    let mut buffer = RichTextBuffer::from_text("abc", RichTextStyle::default());
    let revision = buffer.revision();

    assert!(matches!(
        edit(&mut buffer),
        Err(BufferError::OffsetOutOfRange { .. })
    ));
    assert_eq!(buffer.text(), "abc");
    assert_eq!(buffer.revision(), revision);
}

#[test]
fn test_paragraph_alignment_survives_edits_around_it() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::from_text("one\ntwo\nthree", RichTextStyle::default());
    assert!(buffer.set_paragraph_alignment(&[(4, 3)], TextAlignment::Right));

    buffer.delete_range(0, 4)?;
    assert_eq!(buffer.paragraph_alignment(0), Some(TextAlignment::Right));

    buffer.insert_text(1, "w", RichTextStyle::default())?;
    let entries: Vec<(usize, usize)> = buffer
        .paragraph_properties()
        .map(|info| (info.start, info.len))
        .collect();
    assert_eq!(entries, vec![(0, 4)]);

    buffer.delete_range(0, 4)?;
    assert_eq!(buffer.paragraph_properties().count(), 0);
    Ok(())
}

#[test]
fn test_table_range_shifts_and_drops() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::from_text("title\n", RichTextStyle::default());
    buffer.insert_table(6, 2, 2)?;
    let start = buffer.tables()[0].start;

    buffer.insert_text(0, "big ", RichTextStyle::default())?;
    assert_eq!(buffer.tables()[0].start, start + 4);

    let table = buffer.tables()[0].clone();
    buffer.delete_range(table.start, table.len)?;
    assert!(buffer.tables().is_empty());
    Ok(())
}

#[test]
fn test_clone_restores_after_edits() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::from_text("keep me", RichTextStyle::default());
    let saved = buffer.clone();

    buffer.delete_range(0, 5)?;
    buffer.insert_table(0, 1, 1)?;
    buffer.restore_from(&saved);

    assert_eq!(buffer.text(), "keep me");
    assert!(buffer.tables().is_empty());
    assert!(buffer.revision() > saved.revision());
    Ok(())
}
