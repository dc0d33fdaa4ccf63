/*!
 * # Editing
 *
 * Rich-text editing on top of the document tree.
 *
 * ## Architecture
 *
 * ### 1. Single source of truth: the styled buffer
 * - [`RichTextBuffer`] stores the text as ordered `(text, style)` runs
 * - Offsets are character offsets into LF-normalized text
 * - Paragraph alignment and embedded tables are metadata anchored at buffer
 *   offsets; every edit shifts, grows, shrinks or drops them
 *
 * ### 2. Command-based editing
 * - All edits are [`Cmd`]s applied through [`Editor::apply`]
 * - Each command returns a [`Patch`] with the changed ranges, the new
 *   selection and the editor version
 * - Character formatting is a [`StyleChange`], applied per run to the
 *   selection or to the pending insertion style
 *
 * ### 3. Read API: immutable snapshots
 * - [`FlowSnapshot`] projects one buffer revision into a
 *   [`FlowDocument`](crate::document::FlowDocument): one paragraph per line,
 *   one table per table range
 * - Leading indentation becomes left margin, so the snapshot maps buffer
 *   offsets to flow offsets and back
 *
 * ### 4. Surface
 * - [`EditorSurface`] lays the snapshot out and answers hit-testing queries:
 *   point to offset, caret rectangle, selection rectangles
 * - The snapshot is rebuilt lazily, once per buffer revision or presentation
 *   change
 *
 * ## Usage
 *
 * ```rust
 * use textflow_engine::editing::*;
 * use textflow_engine::layout::MonospaceShaper;
 * use textflow_engine::{Config, Point};
 *
 * let mut surface = EditorSurface::new(MonospaceShaper, &Config::default());
 * surface.apply(Cmd::InsertText { text: "Hello".to_string() }).unwrap();
 * surface.apply(Cmd::SetSelection { anchor: 0, caret: 5 }).unwrap();
 * surface.apply(Cmd::Style(StyleChange::ToggleBold)).unwrap();
 *
 * assert!(surface.editor().buffer().style_at(0).unwrap().is_bold());
 * assert_eq!(surface.offset_from_point(Point::new(0.0, 0.0)), 0);
 * ```
 */

pub mod buffer;
pub mod commands;
pub mod editor;
pub mod error;
pub mod metadata;
pub mod patch;
pub mod snapshot;
pub mod style;
pub mod surface;

pub use buffer::{RichTextBuffer, StyledRun};
pub use commands::{Cmd, LineRange, StyleChange};
pub use editor::Editor;
pub use error::BufferError;
pub use metadata::{ParagraphProperties, TableRange};
pub use patch::Patch;
pub use snapshot::{FlowSnapshot, ParagraphSnapshot};
pub use style::RichTextStyle;
pub use surface::{EditorSurface, Presentation};
