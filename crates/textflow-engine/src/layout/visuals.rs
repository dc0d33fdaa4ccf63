use std::rc::Rc;

use super::engine::DocumentLayout;
use super::entry::EntryContent;
use super::shaping::ShapedText;
use crate::document::NodeId;
use crate::geometry::{Point, Rect, Thickness};

/// Geometry of one top-level text entry, used for hit testing and caret
/// placement.
#[derive(Debug, Clone)]
pub struct TextBlockVisual {
    pub node: NodeId,
    pub layout: Rc<dyn ShapedText>,
    pub text_origin: Point,
    pub text_bounds: Rect,
    /// Top of the slot, before the entry's top margin.
    pub top: f64,
    pub text_top: f64,
    pub text_bottom: f64,
    /// Bottom of the slot, after the entry's bottom margin.
    pub bottom: f64,
    pub content_left: f64,
    pub content_right: f64,
    pub marker_indent: f64,
    pub margin: Thickness,
}

impl DocumentLayout {
    /// Visual records for the top-level text entries, in document order.
    /// Tables and anchored blocks advance the vertical cursor but produce no
    /// record.
    pub fn text_block_visuals(&self) -> Vec<TextBlockVisual> {
        let base_x = self.page_padding.left;
        let mut y = self.page_padding.top;
        let mut visuals = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            let block_top = y + entry.margin.top;
            let layout = match &entry.content {
                EntryContent::Table(table) => {
                    y = block_top + table.height + entry.margin.bottom;
                    continue;
                }
                EntryContent::Anchored(anchored) => {
                    y = block_top + anchored.vertical_offset + anchored.height + entry.margin.bottom;
                    continue;
                }
                EntryContent::Text(layout) => layout,
            };

            let content_left = base_x + entry.margin.left;
            let marker_indent = entry.content_indent;
            let text_origin = Point::new(content_left + marker_indent, block_top);
            let text_bottom = block_top + layout.height();
            let bottom = text_bottom + entry.margin.bottom;

            visuals.push(TextBlockVisual {
                node: entry.node,
                layout: Rc::clone(layout),
                text_origin,
                text_bounds: Rect::new(text_origin.x, text_origin.y, layout.width(), layout.height()),
                top: y,
                text_top: block_top,
                text_bottom,
                bottom,
                content_left,
                content_right: content_left + marker_indent + layout.width(),
                marker_indent,
                margin: entry.margin,
            });
            y = bottom;
        }

        visuals
    }
}
