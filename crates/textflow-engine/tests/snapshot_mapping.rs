use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use textflow_engine::document::resolve_formats;
use textflow_engine::{
    Collection, FlowSnapshot, FontWeight, IndentConfig, RichTextBuffer, RichTextStyle,
    TextAlignment,
};

const TEXT: &str = "Title\n\tindented\n\nlast";

#[fixture]
fn snapshot() -> FlowSnapshot {
    let buffer = RichTextBuffer::from_text(TEXT, RichTextStyle::default());
    FlowSnapshot::build(&buffer, TextAlignment::Left, &IndentConfig::default()).unwrap()
}

/// One line per paragraph: buffer range, flow range, trimmed indent, left
/// margin, line ending and plain text.
fn dump(snapshot: &FlowSnapshot) -> String {
    let doc = snapshot.document();
    snapshot
        .paragraphs()
        .iter()
        .map(|p| {
            let element = doc.element(p.node).unwrap();
            format!(
                "{}: doc {}+{} flow {}+{} trim {} margin {} {} {:?}",
                p.index,
                p.doc_start,
                p.doc_len,
                p.flow_start,
                p.flow_len,
                p.leading_trim,
                element.margin.left,
                if p.has_trailing_newline { "newline" } else { "end" },
                doc.plain_text(p.node).unwrap(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[rstest]
fn test_paragraph_layout_of_snapshot(snapshot: FlowSnapshot) {
    insta::assert_snapshot!(dump(&snapshot), @r#"
    0: doc 0+5 flow 0+5 trim 0 margin 0 newline "Title"
    1: doc 6+9 flow 6+8 trim 1 margin 24 newline "indented"
    2: doc 16+0 flow 15+0 trim 0 margin 0 newline ""
    3: doc 17+4 flow 16+4 trim 0 margin 0 end "last"
    "#);
    assert_eq!(snapshot.doc_len(), TEXT.chars().count());
    assert_eq!(snapshot.flow_len(), 20);
}

#[rstest]
#[case::start(0, 0)]
#[case::end_of_first_line(5, 5)]
#[case::start_of_indent(6, 6)]
#[case::inside_indent(7, 6)]
#[case::after_indent(8, 7)]
#[case::end_of_indented_line(15, 14)]
#[case::blank_line(16, 15)]
#[case::last_line(17, 16)]
#[case::document_end(21, 20)]
#[case::past_end(99, 20)]
fn test_to_flow_offset(snapshot: FlowSnapshot, #[case] offset: usize, #[case] expected: usize) {
    assert_eq!(snapshot.to_flow_offset(offset), expected);
}

#[rstest]
#[case::start(0, 0)]
#[case::end_of_first_line(5, 5)]
#[case::indented_start_skips_indent(6, 7)]
#[case::end_of_indented_line(14, 15)]
#[case::blank_line(15, 16)]
#[case::last_line(16, 17)]
#[case::flow_end(20, 21)]
#[case::past_end(99, 21)]
fn test_to_document_offset(
    snapshot: FlowSnapshot,
    #[case] offset: usize,
    #[case] expected: usize,
) {
    assert_eq!(snapshot.to_document_offset(offset), expected);
}

#[rstest]
fn test_flow_offsets_are_monotonic(snapshot: FlowSnapshot) {
    let flows: Vec<usize> = (0..=snapshot.doc_len())
        .map(|offset| snapshot.to_flow_offset(offset))
        .collect();

    assert!(flows.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(flows.last().copied(), Some(snapshot.flow_len()));
}

#[rstest]
fn test_every_flow_offset_maps_back_to_itself(snapshot: FlowSnapshot) {
    for flow in 0..=snapshot.flow_len() {
        let offset = snapshot.to_document_offset(flow);
        assert_eq!(snapshot.to_flow_offset(offset), flow, "flow offset {flow}");
    }
}

#[test]
fn test_bold_run_survives_into_the_document() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::from_text("plain", RichTextStyle::default());
    buffer.insert_text(5, " loud", RichTextStyle::default().bold())?;

    let snapshot = FlowSnapshot::build(&buffer, TextAlignment::Left, &IndentConfig::default())?;
    let formats = resolve_formats(snapshot.document());
    let paragraph = snapshot.paragraphs()[0].node;
    let runs = snapshot
        .document()
        .children(paragraph, Collection::Inlines)?;

    assert_eq!(runs.len(), 2);
    assert_eq!(formats.get(runs[0]).font_weight, FontWeight::NORMAL);
    assert_eq!(formats.get(runs[1]).font_weight, FontWeight::BOLD);
    Ok(())
}
