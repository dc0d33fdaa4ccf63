use std::rc::Rc;

use crate::document::NodeId;
use crate::document::format::Color;
use crate::geometry::{Size, Thickness};
use crate::layout::ShapedText;

/// A list marker column in front of a text or anchored entry.
#[derive(Debug, Clone)]
pub struct MarkerInfo {
    pub layout: Rc<dyn ShapedText>,
    /// Reserved width, at least the marker text plus padding.
    pub width: f64,
    pub visible: bool,
}

impl MarkerInfo {
    pub fn as_hidden(&self) -> MarkerInfo {
        MarkerInfo {
            visible: false,
            ..self.clone()
        }
    }
}

/// Hidden copies of `markers`, or `None` when there are none.
pub(crate) fn hidden_markers(markers: &[MarkerInfo]) -> Option<Vec<MarkerInfo>> {
    if markers.is_empty() {
        return None;
    }
    Some(markers.iter().map(MarkerInfo::as_hidden).collect())
}

#[derive(Debug, Clone)]
pub enum EntryContent {
    Text(Rc<dyn ShapedText>),
    Table(TableLayout),
    Anchored(AnchoredLayout),
}

/// One paint-ready record in document order.
#[derive(Debug, Clone)]
pub struct LayoutEntry {
    /// The block (or anchored inline) this entry renders.
    pub node: NodeId,
    pub content: EntryContent,
    pub margin: Thickness,
    pub markers: Vec<MarkerInfo>,
    /// Sum of the reserved marker widths.
    pub content_indent: f64,
}

impl LayoutEntry {
    pub fn text(node: NodeId, layout: Rc<dyn ShapedText>, margin: Thickness) -> Self {
        Self {
            node,
            content: EntryContent::Text(layout),
            margin,
            markers: Vec::new(),
            content_indent: 0.0,
        }
    }

    pub fn with_markers(mut self, markers: Option<Vec<MarkerInfo>>) -> Self {
        self.markers = markers.unwrap_or_default();
        self.content_indent = self.markers.iter().map(|marker| marker.width).sum();
        self
    }

    pub fn add_margin(&mut self, left: f64, top: f64, right: f64, bottom: f64) {
        self.margin = self.margin.add(left, top, right, bottom);
    }

    pub fn content_width(&self) -> f64 {
        match &self.content {
            EntryContent::Text(layout) => layout.width(),
            EntryContent::Table(table) => table.width,
            EntryContent::Anchored(anchored) => anchored.width,
        }
    }

    pub fn content_height(&self) -> f64 {
        match &self.content {
            EntryContent::Text(layout) => layout.height(),
            EntryContent::Table(table) => table.height,
            EntryContent::Anchored(anchored) => anchored.height,
        }
    }

    pub fn text_layout(&self) -> Option<&Rc<dyn ShapedText>> {
        match &self.content {
            EntryContent::Text(layout) => Some(layout),
            _ => None,
        }
    }
}

/// Width of the widest entry (margins and indent included) and the summed
/// height of all entries.
pub fn extent(entries: &[LayoutEntry]) -> Size {
    entries.iter().fold(Size::ZERO, |size, entry| {
        let width = entry.margin.left + entry.content_indent + entry.content_width() + entry.margin.right;
        Size::new(
            size.width.max(width),
            size.height + entry.margin.top + entry.content_height() + entry.margin.bottom,
        )
    })
}

#[derive(Debug, Clone)]
pub struct TableLayout {
    pub width: f64,
    pub height: f64,
    pub cell_spacing: f64,
    pub column_widths: Vec<f64>,
    pub rows: Vec<TableRowLayout>,
    pub grid_lines_brush: Option<Color>,
    pub grid_lines_thickness: f64,
    pub background: Option<Color>,
}

#[derive(Debug, Clone)]
pub struct TableRowLayout {
    pub height: f64,
    pub cells: Vec<TableCellLayout>,
}

#[derive(Debug, Clone)]
pub struct TableCellLayout {
    /// `None` for a column the row has no cell for.
    pub cell: Option<NodeId>,
    pub content: Vec<LayoutEntry>,
    pub content_size: Size,
    pub column_width: f64,
    pub padding: Thickness,
    pub border_thickness: Thickness,
    pub border_brush: Option<Color>,
    pub background: Option<Color>,
}

impl TableCellLayout {
    pub fn desired_height(&self) -> f64 {
        self.content_size.height + self.padding.vertical()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchoredAlignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone)]
pub struct AnchoredLayout {
    pub content: Vec<LayoutEntry>,
    pub content_extent: Size,
    pub padding: Thickness,
    pub background: Option<Color>,
    pub width: f64,
    pub height: f64,
    /// Width the block was placed in; infinite when unbounded.
    pub available_width: f64,
    pub alignment: AnchoredAlignment,
    pub horizontal_offset: f64,
    pub vertical_offset: f64,
}

impl AnchoredLayout {
    /// Horizontal shift inside the available width for the alignment.
    pub fn alignment_offset(&self) -> f64 {
        if !self.available_width.is_finite() || self.available_width <= self.width {
            return 0.0;
        }
        let remaining = self.available_width - self.width;
        match self.alignment {
            AnchoredAlignment::Left => 0.0,
            AnchoredAlignment::Center => remaining / 2.0,
            AnchoredAlignment::Right => remaining,
        }
    }
}
