//! Block layout over a [`FlowDocument`](crate::document::FlowDocument).
//!
//! [`LayoutEngine`] turns the document tree into a flat list of
//! [`LayoutEntry`] records: text, tables and anchored blocks, each with its
//! margin and list-marker columns. The result can be painted into
//! [`PaintCommand`]s or queried for [`TextBlockVisual`]s by an editor.

mod engine;
mod entry;
mod paint;
mod shaping;
mod table;
mod visuals;

pub use engine::{DocumentLayout, LayoutEngine};
pub use entry::{
    AnchoredAlignment, AnchoredLayout, EntryContent, LayoutEntry, MarkerInfo, TableCellLayout,
    TableLayout, TableRowLayout, extent,
};
pub use paint::PaintCommand;
pub use shaping::{
    MonospaceLayout, MonospaceShaper, ShapedText, StyledRange, TextRequest, TextShaper,
    TextWrapping,
};
pub use visuals::TextBlockVisual;
