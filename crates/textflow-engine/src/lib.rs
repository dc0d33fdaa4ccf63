pub mod document;
pub mod editing;
pub mod geometry;
pub mod layout;

// Re-export key types for easier usage
pub use document::{
    Collection, Element, FlowDocument, NodeId, NodeKind, Owner, TreeError, format::*,
};
pub use editing::{
    BufferError, Cmd, Editor, EditorSurface, FlowSnapshot, ParagraphSnapshot, Patch,
    RichTextBuffer, RichTextStyle, StyleChange,
};
pub use geometry::{Point, Rect, Size, Thickness};
pub use layout::{
    DocumentLayout, LayoutEngine, LayoutEntry, MonospaceShaper, PaintCommand, ShapedText,
    TextBlockVisual, TextShaper,
};
pub use textflow_config::{Config, EditorConfig, IndentConfig, LayoutConfig};
