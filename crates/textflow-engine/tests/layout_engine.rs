use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use textflow_engine::document::{Collection, Element, FlowDocument, Owner};
use textflow_engine::layout::{EntryContent, ShapedText, TextRequest, TextShaper};
use textflow_engine::{
    FlowSnapshot, FontWeight, IndentConfig, LayoutEngine, MonospaceShaper, RichTextBuffer,
    RichTextStyle, Size, TextAlignment, Thickness,
};

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    text: String,
    runs: Vec<(usize, usize, FontWeight)>,
    alignment: TextAlignment,
    max_width: f64,
    line_height: Option<f64>,
}

/// Monospace shaping that remembers every request it saw.
#[derive(Default)]
struct RecordingShaper {
    requests: RefCell<Vec<Recorded>>,
}

impl RecordingShaper {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.borrow().clone()
    }
}

impl TextShaper for RecordingShaper {
    fn shape(&self, request: &TextRequest<'_>) -> Rc<dyn ShapedText> {
        self.requests.borrow_mut().push(Recorded {
            text: request.text.to_string(),
            runs: request
                .runs
                .iter()
                .map(|run| (run.start, run.len, run.format.font_weight))
                .collect(),
            alignment: request.alignment,
            max_width: request.max_width,
            line_height: request.line_height,
        });
        MonospaceShaper.shape(request)
    }
}

fn attach(doc: &mut FlowDocument, block: textflow_engine::NodeId) {
    doc.append(Owner::Document, Collection::Blocks, block)
        .unwrap();
}

#[test]
fn test_paragraph_runs_reach_the_shaper() {
    let mut doc = FlowDocument::new();
    let paragraph = doc.create(
        Element::paragraph()
            .with_alignment(TextAlignment::Center)
            .with_line_height(30.0),
    );
    let plain = doc.create(Element::run("plain "));
    let bold = doc.create(Element::bold());
    let strong = doc.create(Element::run("strong"));
    doc.append(bold, Collection::Inlines, strong).unwrap();
    doc.append(paragraph, Collection::Inlines, plain).unwrap();
    doc.append(paragraph, Collection::Inlines, bold).unwrap();
    attach(&mut doc, paragraph);
    let mut engine = LayoutEngine::new(RecordingShaper::default());

    engine.layout(&doc, 400.0);

    assert_eq!(
        engine.shaper().requests(),
        vec![Recorded {
            text: "plain strong".to_string(),
            runs: vec![(0, 6, FontWeight::NORMAL), (6, 6, FontWeight::BOLD)],
            alignment: TextAlignment::Center,
            max_width: 352.0,
            line_height: Some(30.0),
        }]
    );
}

#[test]
fn test_section_margin_narrows_nested_text() {
    let mut doc = FlowDocument::new();
    let section = doc.create(Element::section().with_margin(Thickness::new(20.0, 0.0, 0.0, 0.0)));
    let paragraph = doc.create(Element::paragraph());
    let run = doc.create(Element::run("nested"));
    doc.append(paragraph, Collection::Inlines, run).unwrap();
    doc.append(section, Collection::Blocks, paragraph).unwrap();
    attach(&mut doc, section);
    let mut engine = LayoutEngine::new(RecordingShaper::default());

    let layout = engine.layout(&doc, 400.0);

    assert_eq!(engine.shaper().requests()[0].max_width, 332.0);
    assert_eq!(layout.entries[0].margin.left, 20.0);
}

#[test]
fn test_cached_layout_skips_shaping() {
    let mut doc = FlowDocument::new();
    let paragraph = doc.create(Element::paragraph());
    let run = doc.create(Element::run("once"));
    doc.append(paragraph, Collection::Inlines, run).unwrap();
    attach(&mut doc, paragraph);
    let mut engine = LayoutEngine::new(RecordingShaper::default());

    engine.layout(&doc, 300.0);
    engine.layout(&doc, 300.0);
    assert_eq!(engine.shaper().requests().len(), 1);

    engine.invalidate();
    engine.layout(&doc, 300.0);
    assert_eq!(engine.shaper().requests().len(), 2);
}

#[test]
fn test_snapshot_of_styled_buffer_lays_out_per_line() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::from_text("ab", RichTextStyle::default());
    buffer.insert_text(2, "cd\nnext", RichTextStyle::default().bold())?;
    let snapshot = FlowSnapshot::build(&buffer, TextAlignment::Left, &IndentConfig::default())?;
    let mut engine = LayoutEngine::new(RecordingShaper::default());

    let layout = engine.layout(snapshot.document(), f64::INFINITY);

    let requests = engine.shaper().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].text, "abcd");
    assert_eq!(
        requests[0].runs,
        vec![(0, 2, FontWeight::NORMAL), (2, 2, FontWeight::BOLD)]
    );
    assert_eq!(requests[1].text, "next");
    assert!(requests.iter().all(|request| request.max_width.is_infinite()));
    assert!(
        layout
            .entries
            .iter()
            .all(|entry| matches!(entry.content, EntryContent::Text(_)))
    );
    Ok(())
}

#[test]
fn test_table_snapshot_paints_grid_and_cells() -> anyhow::Result<()> {
    let mut buffer = RichTextBuffer::new();
    buffer.insert_table(0, 2, 2)?;
    let snapshot = FlowSnapshot::build(&buffer, TextAlignment::Left, &IndentConfig::default())?;
    let mut engine = LayoutEngine::new(MonospaceShaper);

    let layout = engine.layout(snapshot.document(), 600.0);
    let tables = layout
        .entries
        .iter()
        .filter(|entry| matches!(entry.content, EntryContent::Table(_)))
        .count();
    let commands = layout.paint(Size::new(600.0, 400.0));

    assert_eq!(tables, 1);
    assert!(commands.iter().any(|command| command.text() == Some("Header 1")));
    assert!(commands.iter().any(|command| command.text().is_none()));
    Ok(())
}
