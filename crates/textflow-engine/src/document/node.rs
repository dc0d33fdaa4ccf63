//! Element kinds and their kind-specific properties.

use serde::{Deserialize, Serialize};

use super::NodeId;
use super::format::{
    Color, FontStyle, FontWeight, TextAlignment, TextDecorations, TextProperties,
};
use crate::geometry::Thickness;

/// Default margin of every block-level element.
pub const DEFAULT_BLOCK_MARGIN: Thickness = Thickness::new(0.0, 0.0, 0.0, 12.0);
/// Default padding inside anchored figures and floaters.
pub const DEFAULT_ANCHORED_PADDING: Thickness = Thickness::new(12.0, 8.0, 12.0, 8.0);
/// Default padding inside table cells.
pub const DEFAULT_CELL_PADDING: Thickness = Thickness::new(8.0, 4.0, 8.0, 4.0);

// ────────────────────────────────────────────────────────────────────────────
// Kind-specific properties
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListMarkerStyle {
    #[default]
    Disc,
    Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListProps {
    pub marker_style: ListMarkerStyle,
    pub start_index: i32,
    pub marker_offset: f64,
}

impl ListProps {
    /// Index of the first item; never below 1.
    pub fn first_index(&self) -> i32 {
        self.start_index.max(1)
    }

    pub fn marker_text(&self, index: i32) -> String {
        match self.marker_style {
            ListMarkerStyle::Decimal => format!("{index}."),
            ListMarkerStyle::Disc => "•".to_string(),
        }
    }
}

impl Default for ListProps {
    fn default() -> Self {
        Self {
            marker_style: ListMarkerStyle::Disc,
            start_index: 1,
            marker_offset: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProps {
    pub cell_spacing: f64,
    pub grid_lines_brush: Option<Color>,
    pub grid_lines_thickness: f64,
}

impl Default for TableProps {
    fn default() -> Self {
        Self {
            cell_spacing: 6.0,
            grid_lines_brush: Some(Color::LIGHT_GRAY),
            grid_lines_thickness: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellProps {
    pub padding: Thickness,
    pub border_brush: Option<Color>,
    pub border_thickness: Thickness,
}

impl Default for CellProps {
    fn default() -> Self {
        Self {
            padding: DEFAULT_CELL_PADDING,
            border_brush: None,
            border_thickness: Thickness::ZERO,
        }
    }
}

/// Formatting preset carried by a span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanPreset {
    #[default]
    Plain,
    Bold,
    Italic,
    Underline,
}

impl SpanPreset {
    fn format(self) -> TextProperties {
        match self {
            SpanPreset::Plain => TextProperties::default(),
            SpanPreset::Bold => TextProperties::default().with_font_weight(FontWeight::BOLD),
            SpanPreset::Italic => TextProperties::default().with_font_style(FontStyle::Italic),
            SpanPreset::Underline => {
                TextProperties::default().with_decorations(TextDecorations::UNDERLINE)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FigureUnit {
    #[default]
    Auto,
    Pixel,
    Column,
    Content,
    Page,
}

/// Figure width or height policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FigureLength {
    pub value: f64,
    pub unit: FigureUnit,
}

impl FigureLength {
    /// A length in `unit`; non-finite or negative values become 0.
    pub fn new(value: f64, unit: FigureUnit) -> Self {
        let value = if unit == FigureUnit::Auto || !value.is_finite() {
            0.0
        } else {
            value.max(0.0)
        };
        Self { value, unit }
    }

    pub fn auto() -> Self {
        Self::new(0.0, FigureUnit::Auto)
    }

    pub fn pixels(value: f64) -> Self {
        Self::new(value, FigureUnit::Pixel)
    }

    /// Resolves against `available`. Relative units fill it, auto is NaN.
    pub fn resolve(&self, available: f64) -> f64 {
        match self.unit {
            FigureUnit::Pixel => self.value,
            FigureUnit::Page | FigureUnit::Content | FigureUnit::Column => {
                if available.is_finite() {
                    available
                } else {
                    f64::NAN
                }
            }
            FigureUnit::Auto => f64::NAN,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FigureHorizontalAnchor {
    PageLeft,
    PageCenter,
    PageRight,
    #[default]
    ContentLeft,
    ContentCenter,
    ContentRight,
    ColumnLeft,
    ColumnCenter,
    ColumnRight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FigureVerticalAnchor {
    PageTop,
    PageCenter,
    PageBottom,
    #[default]
    ParagraphTop,
    ParagraphCenter,
    ParagraphBottom,
    ContentTop,
    ContentCenter,
    ContentBottom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FigureProps {
    pub width: FigureLength,
    pub height: FigureLength,
    pub horizontal_anchor: FigureHorizontalAnchor,
    pub vertical_anchor: FigureVerticalAnchor,
    pub horizontal_offset: f64,
    pub vertical_offset: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
    Stretch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloaterProps {
    pub alignment: HorizontalAlignment,
    /// Desired width, NaN for auto.
    pub width: f64,
    /// Desired height, NaN for auto.
    pub height: f64,
}

impl Default for FloaterProps {
    fn default() -> Self {
        Self {
            alignment: HorizontalAlignment::Left,
            width: f64::NAN,
            height: f64::NAN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnchorPlacement {
    Figure(FigureProps),
    Floater(FloaterProps),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredProps {
    pub placement: AnchorPlacement,
    pub padding: Thickness,
}

// ────────────────────────────────────────────────────────────────────────────
// NodeKind
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Paragraph,
    Section,
    List(ListProps),
    ListItem,
    Table(TableProps),
    /// Width hint, NaN for auto.
    TableColumn {
        width: f64,
    },
    TableRowGroup,
    TableRow,
    TableCell(CellProps),
    Run {
        text: String,
    },
    Span(SpanPreset),
    LineBreak,
    Anchored(AnchoredProps),
    /// A block this engine has no layout for; rendered as a paragraph of `text`.
    Opaque {
        tag: String,
        text: String,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Paragraph => "Paragraph",
            NodeKind::Section => "Section",
            NodeKind::List(_) => "List",
            NodeKind::ListItem => "ListItem",
            NodeKind::Table(_) => "Table",
            NodeKind::TableColumn { .. } => "TableColumn",
            NodeKind::TableRowGroup => "TableRowGroup",
            NodeKind::TableRow => "TableRow",
            NodeKind::TableCell(_) => "TableCell",
            NodeKind::Run { .. } => "Run",
            NodeKind::Span(_) => "Span",
            NodeKind::LineBreak => "LineBreak",
            NodeKind::Anchored(AnchoredProps {
                placement: AnchorPlacement::Figure(_),
                ..
            }) => "Figure",
            NodeKind::Anchored(AnchoredProps {
                placement: AnchorPlacement::Floater(_),
                ..
            }) => "Floater",
            NodeKind::Opaque { .. } => "Opaque",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Section
                | NodeKind::List(_)
                | NodeKind::Table(_)
                | NodeKind::Opaque { .. }
        )
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Run { .. } | NodeKind::Span(_) | NodeKind::LineBreak | NodeKind::Anchored(_)
        )
    }

    /// Child collections this kind owns, in document order.
    pub fn collections(&self) -> &'static [Collection] {
        match self {
            NodeKind::Paragraph | NodeKind::Span(_) => &[Collection::Inlines],
            NodeKind::Section | NodeKind::ListItem | NodeKind::TableCell(_) => {
                &[Collection::Blocks]
            }
            NodeKind::Anchored(_) => &[Collection::Blocks],
            NodeKind::List(_) => &[Collection::ListItems],
            NodeKind::Table(_) => &[Collection::Columns, Collection::RowGroups],
            NodeKind::TableRowGroup => &[Collection::Rows],
            NodeKind::TableRow => &[Collection::Cells],
            NodeKind::TableColumn { .. }
            | NodeKind::Run { .. }
            | NodeKind::LineBreak
            | NodeKind::Opaque { .. } => &[],
        }
    }

    pub fn has_collection(&self, collection: Collection) -> bool {
        self.collections().contains(&collection)
    }
}

/// A typed child list on a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Blocks,
    Inlines,
    ListItems,
    Columns,
    RowGroups,
    Rows,
    Cells,
}

impl Collection {
    pub(crate) const COUNT: usize = 7;

    pub(crate) fn slot(self) -> usize {
        self as usize
    }

    pub fn accepts(self, kind: &NodeKind) -> bool {
        match self {
            Collection::Blocks => kind.is_block(),
            Collection::Inlines => kind.is_inline(),
            Collection::ListItems => matches!(kind, NodeKind::ListItem),
            Collection::Columns => matches!(kind, NodeKind::TableColumn { .. }),
            Collection::RowGroups => matches!(kind, NodeKind::TableRowGroup),
            Collection::Rows => matches!(kind, NodeKind::TableRow),
            Collection::Cells => matches!(kind, NodeKind::TableCell(_)),
        }
    }
}

/// Whoever owns a collection: the document root or a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Document,
    Node(NodeId),
}

impl From<NodeId> for Owner {
    fn from(id: NodeId) -> Self {
        Owner::Node(id)
    }
}

/// Back reference from a child to the collection holding it. Non-owning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent {
    pub owner: Owner,
    pub collection: Collection,
}

// ────────────────────────────────────────────────────────────────────────────
// Element
// ────────────────────────────────────────────────────────────────────────────

/// Node payload: kind plus the formatting shared by every kind.
///
/// `margin`, `alignment` and `line_height` are read for blocks, row groups
/// (margin only) and anchored inlines (margin only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: NodeKind,
    pub format: TextProperties,
    pub margin: Thickness,
    pub alignment: Option<TextAlignment>,
    pub line_height: Option<f64>,
}

impl Element {
    pub fn new(kind: NodeKind) -> Self {
        let margin = if kind.is_block() {
            DEFAULT_BLOCK_MARGIN
        } else {
            Thickness::ZERO
        };
        let format = match &kind {
            NodeKind::Span(preset) => preset.format(),
            _ => TextProperties::default(),
        };
        Self {
            kind,
            format,
            margin,
            alignment: None,
            line_height: None,
        }
    }

    pub fn paragraph() -> Self {
        Self::new(NodeKind::Paragraph)
    }

    pub fn section() -> Self {
        Self::new(NodeKind::Section)
    }

    pub fn list(props: ListProps) -> Self {
        Self::new(NodeKind::List(props))
    }

    pub fn list_item() -> Self {
        Self::new(NodeKind::ListItem)
    }

    pub fn table(props: TableProps) -> Self {
        Self::new(NodeKind::Table(props))
    }

    pub fn table_column(width: f64) -> Self {
        Self::new(NodeKind::TableColumn { width })
    }

    pub fn row_group() -> Self {
        Self::new(NodeKind::TableRowGroup)
    }

    pub fn row() -> Self {
        Self::new(NodeKind::TableRow)
    }

    pub fn cell(props: CellProps) -> Self {
        Self::new(NodeKind::TableCell(props))
    }

    pub fn run(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Run { text: text.into() })
    }

    pub fn span() -> Self {
        Self::new(NodeKind::Span(SpanPreset::Plain))
    }

    pub fn bold() -> Self {
        Self::new(NodeKind::Span(SpanPreset::Bold))
    }

    pub fn italic() -> Self {
        Self::new(NodeKind::Span(SpanPreset::Italic))
    }

    pub fn underline() -> Self {
        Self::new(NodeKind::Span(SpanPreset::Underline))
    }

    pub fn line_break() -> Self {
        Self::new(NodeKind::LineBreak)
    }

    pub fn figure(props: FigureProps) -> Self {
        Self::new(NodeKind::Anchored(AnchoredProps {
            placement: AnchorPlacement::Figure(props),
            padding: DEFAULT_ANCHORED_PADDING,
        }))
    }

    pub fn floater(props: FloaterProps) -> Self {
        Self::new(NodeKind::Anchored(AnchoredProps {
            placement: AnchorPlacement::Floater(props),
            padding: DEFAULT_ANCHORED_PADDING,
        }))
    }

    pub fn opaque(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NodeKind::Opaque {
            tag: tag.into(),
            text: text.into(),
        })
    }

    pub fn with_margin(mut self, margin: Thickness) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_alignment(mut self, alignment: TextAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = Some(line_height);
        self
    }

    /// Replaces the formatting overrides, keeping any span preset values not
    /// overridden by `format`.
    pub fn with_format(mut self, format: TextProperties) -> Self {
        let preset = std::mem::take(&mut self.format);
        self.format = TextProperties {
            font_family: format.font_family.or(preset.font_family),
            font_size: format.font_size.or(preset.font_size),
            font_style: format.font_style.or(preset.font_style),
            font_weight: format.font_weight.or(preset.font_weight),
            font_stretch: format.font_stretch.or(preset.font_stretch),
            foreground: format.foreground.or(preset.foreground),
            background: format.background.or(preset.background),
            decorations: format.decorations.or(preset.decorations),
        };
        self
    }
}
