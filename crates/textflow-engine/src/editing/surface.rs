use std::ops::Range;
use std::rc::Rc;

use log::{trace, warn};
use textflow_config::Config;

use super::commands::Cmd;
use super::editor::Editor;
use super::error::BufferError;
use super::patch::Patch;
use super::snapshot::{FlowSnapshot, ParagraphSnapshot};
use super::style::RichTextStyle;
use crate::document::format::{Color, FontStyle, FontWeight, TextAlignment};
use crate::geometry::{Point, Rect, Size};
use crate::layout::{DocumentLayout, LayoutEngine, PaintCommand, TextBlockVisual, TextShaper};

/// Document-wide presentation applied to every snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub foreground: Option<Color>,
    pub line_height: Option<f64>,
    pub alignment: TextAlignment,
}

impl Default for Presentation {
    fn default() -> Self {
        let style = RichTextStyle::default();
        Self {
            font_family: style.font_family,
            font_size: style.font_size,
            font_weight: style.font_weight,
            font_style: style.font_style,
            foreground: style.foreground,
            line_height: None,
            alignment: TextAlignment::Left,
        }
    }
}

/// An [`Editor`] bound to a layout engine: maps pointer positions to buffer
/// offsets and buffer offsets to caret and selection geometry.
///
/// The snapshot is rebuilt lazily, at most once per buffer revision or
/// presentation change, by the first query that needs it.
pub struct EditorSurface<S: TextShaper> {
    editor: Editor,
    engine: LayoutEngine<S>,
    presentation: Presentation,
    presentation_revision: u64,
    caret_width: f64,
    width: f64,
    snapshot: Option<FlowSnapshot>,
    snapshot_key: Option<(u64, u64)>,
}

impl<S: TextShaper> EditorSurface<S> {
    pub fn new(shaper: S, config: &Config) -> Self {
        Self {
            editor: Editor::new(config.indent.clone()),
            engine: LayoutEngine::with_config(shaper, config.layout.clone()),
            presentation: Presentation::default(),
            presentation_revision: 0,
            caret_width: config.editor.caret_width,
            width: f64::INFINITY,
            snapshot: None,
            snapshot_key: None,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, BufferError> {
        self.editor.apply(cmd)
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn set_presentation(&mut self, presentation: Presentation) {
        if presentation != self.presentation {
            self.presentation = presentation;
            self.presentation_revision += 1;
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Available layout width; infinite for unbounded.
    pub fn set_width(&mut self, width: f64) {
        self.width = width;
    }

    /// Current snapshot, rebuilt first if the buffer or presentation changed.
    pub fn snapshot(&mut self) -> Option<&FlowSnapshot> {
        self.refresh();
        self.snapshot.as_ref()
    }

    pub fn layout(&mut self) -> Option<Rc<DocumentLayout>> {
        self.refresh();
        let snapshot = self.snapshot.as_ref()?;
        Some(self.engine.layout(snapshot.document(), self.width))
    }

    pub fn paint(&mut self, bounds: Size) -> Vec<PaintCommand> {
        self.layout()
            .map(|layout| layout.paint(bounds))
            .unwrap_or_default()
    }

    pub fn text_block_visuals(&mut self) -> Vec<TextBlockVisual> {
        self.layout()
            .map(|layout| layout.text_block_visuals())
            .unwrap_or_default()
    }

    /// Buffer offset closest to `point`, in surface coordinates.
    pub fn offset_from_point(&mut self, point: Point) -> usize {
        let visuals = self.text_block_visuals();
        let Some(snapshot) = self.snapshot.as_ref() else {
            return 0;
        };
        if visuals.is_empty() {
            return 0;
        }

        for visual in &visuals {
            let Some(paragraph) = snapshot.paragraph_for_node(visual.node) else {
                continue;
            };
            if point.y < visual.top || point.y < visual.text_top {
                return paragraph.doc_start;
            }
            if point.y <= visual.text_bottom {
                let local = Point::new(
                    point.x - visual.text_origin.x,
                    (point.y - visual.text_top).clamp(0.0, visual.layout.height().max(0.0)),
                );
                let hit = visual.layout.hit_test_point(local).min(paragraph.flow_len);
                return snapshot.to_document_offset(paragraph.flow_start + hit);
            }
            if point.y <= visual.bottom {
                return offset_after(snapshot, paragraph);
            }
        }

        visuals
            .last()
            .and_then(|visual| snapshot.paragraph_for_node(visual.node))
            .map_or(snapshot.doc_len(), |paragraph| offset_after(snapshot, paragraph))
    }

    /// Caret geometry for buffer offset `offset`, at least one pixel wide and
    /// as tall as the line.
    pub fn caret_rectangle(&mut self, offset: usize) -> Option<Rect> {
        let visuals = self.text_block_visuals();
        let snapshot = self.snapshot.as_ref()?;
        let offset = offset.min(snapshot.doc_len());
        let paragraph = snapshot.find_paragraph(offset)?;
        let visual = visuals.iter().find(|visual| visual.node == paragraph.node)?;

        let flow = snapshot
            .to_flow_offset(offset)
            .clamp(paragraph.flow_start, paragraph.flow_end());
        let hit = visual
            .layout
            .hit_test_text_position(flow - paragraph.flow_start);
        Some(Rect::new(
            visual.text_origin.x + hit.x,
            visual.text_origin.y + hit.y,
            self.caret_width.max(1.0),
            hit.height.max(visual.layout.height()),
        ))
    }

    /// Highlight rectangles for the buffer range `range`, in either order.
    pub fn selection_rectangles(&mut self, range: Range<usize>) -> Vec<Rect> {
        let visuals = self.text_block_visuals();
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Vec::new();
        };
        let (a, b) = (
            snapshot.to_flow_offset(range.start),
            snapshot.to_flow_offset(range.end),
        );
        let (start, end) = (a.min(b), a.max(b));
        if start == end {
            return Vec::new();
        }

        let mut rects = Vec::new();
        for visual in &visuals {
            let Some(paragraph) = snapshot.paragraph_for_node(visual.node) else {
                continue;
            };
            if end <= paragraph.flow_start || start >= paragraph.flow_end() {
                continue;
            }
            let local_start = start.saturating_sub(paragraph.flow_start);
            let local_end = end.min(paragraph.flow_end()) - paragraph.flow_start;
            if local_end <= local_start {
                continue;
            }
            rects.extend(
                visual
                    .layout
                    .hit_test_text_range(local_start, local_end - local_start)
                    .into_iter()
                    .filter(|rect| rect.width > 0.0 || rect.height > 0.0)
                    .map(|rect| rect.translate(visual.text_origin)),
            );
        }
        rects
    }

    fn refresh(&mut self) {
        let key = (self.editor.buffer().revision(), self.presentation_revision);
        if self.snapshot.is_some() && self.snapshot_key == Some(key) {
            return;
        }
        trace!("snapshot stale: {:?} -> {:?}", self.snapshot_key, key);

        match FlowSnapshot::build(
            self.editor.buffer(),
            self.presentation.alignment,
            self.editor.indent(),
        ) {
            Ok(mut snapshot) => {
                let presentation = &self.presentation;
                snapshot.document_mut().set_defaults(|defaults| {
                    defaults.font_family = presentation.font_family.clone();
                    defaults.font_size = presentation.font_size;
                    defaults.font_weight = presentation.font_weight;
                    defaults.font_style = presentation.font_style;
                    defaults.foreground = presentation.foreground;
                    defaults.line_height = presentation.line_height;
                    defaults.alignment = presentation.alignment;
                });
                self.snapshot = Some(snapshot);
                self.snapshot_key = Some(key);
            }
            Err(err) => {
                warn!("failed to build snapshot: {err}");
                self.snapshot = None;
                self.snapshot_key = None;
            }
        }
    }
}

/// Offset for a point below a paragraph's text: the start of the next
/// paragraph after a newline, else the paragraph end.
fn offset_after(snapshot: &FlowSnapshot, paragraph: &ParagraphSnapshot) -> usize {
    if paragraph.has_trailing_newline
        && let Some(next) = snapshot.paragraphs().get(paragraph.index + 1)
    {
        return next.doc_start;
    }
    paragraph.doc_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MonospaceShaper;
    use pretty_assertions::assert_eq;

    fn surface(text: &str) -> EditorSurface<MonospaceShaper> {
        let mut surface = EditorSurface::new(MonospaceShaper, &Config::default());
        surface.editor_mut().set_text(text);
        surface
    }

    #[test]
    fn test_snapshot_is_reused_until_buffer_changes() {
        let mut surface = surface("abc");
        let first = surface.snapshot().map(FlowSnapshot::revision);
        let second = surface.snapshot().map(FlowSnapshot::revision);
        assert_eq!(first, second);

        surface
            .apply(Cmd::InsertText {
                text: "d".to_string(),
            })
            .unwrap();

        assert_ne!(surface.snapshot().map(FlowSnapshot::revision), first);
    }

    #[test]
    fn test_presentation_reaches_document_defaults() {
        let mut surface = surface("abc");
        surface.set_presentation(Presentation {
            font_size: 20.0,
            line_height: Some(30.0),
            alignment: TextAlignment::Center,
            ..Presentation::default()
        });

        let defaults = surface.snapshot().unwrap().document().defaults().clone();

        assert_eq!(defaults.font_size, 20.0);
        assert_eq!(defaults.line_height, Some(30.0));
        assert_eq!(defaults.alignment, TextAlignment::Center);
    }

    #[test]
    fn test_caret_rect_is_at_least_one_pixel_wide() {
        let mut surface = surface("abc");

        let caret = surface.caret_rectangle(2).unwrap();

        // page padding 24, 7px per character, 21px lines
        assert_eq!(caret, Rect::new(38.0, 24.0, 1.0, 21.0));
    }

    #[test]
    fn test_point_above_text_maps_to_start() {
        let mut surface = surface("abc\ndef");

        assert_eq!(surface.offset_from_point(Point::new(100.0, 0.0)), 0);
        assert_eq!(surface.offset_from_point(Point::new(24.0 + 7.0, 30.0)), 1);
    }
}
