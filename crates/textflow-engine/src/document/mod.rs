/*!
# Document tree

A reflowable document is a tree of typed elements stored in a generational
arena owned by [`FlowDocument`]. Containers hold ordered lists of
[`NodeId`] handles in typed [`Collection`]s:

| Kind            | Collections             |
|-----------------|-------------------------|
| Paragraph, Span | `Inlines`               |
| Section, ListItem, TableCell, Figure/Floater | `Blocks` |
| List            | `ListItems`             |
| Table           | `Columns`, `RowGroups`  |
| TableRowGroup   | `Rows`                  |
| TableRow        | `Cells`                 |

## Ownership

A node is created free-standing with [`FlowDocument::create`] and has at most
one owner. Inserting it into a second collection fails with
[`TreeError::AlreadyOwned`]; inserting a node below itself fails with
[`TreeError::Cycle`]. A node is *attached* when its owner chain reaches the
document root.

## Change tracking

Every mutation of an attached node bumps the document revision and raises a
single dirty flag. Detached subtrees can be built freely without touching
either. Layout caches key on `(document id, revision, width)`.

## Formatting

Formatting lives in nullable [`TextProperties`] overrides on each element.
[`resolve_formats`] walks the attached tree once, top-down, and produces a
[`FormatCache`] of fully inherited [`ResolvedFormat`]s.

```rust
# use textflow_engine::document::{Collection, Element, FlowDocument, Owner};
let mut doc = FlowDocument::new();
let paragraph = doc.create(Element::paragraph());
let run = doc.create(Element::run("Hello"));
doc.append(paragraph, Collection::Inlines, run).unwrap();
doc.append(Owner::Document, Collection::Blocks, paragraph).unwrap();

assert_eq!(doc.text(), "Hello");
assert_eq!(doc.revision(), 1);
```
*/

mod arena;
mod error;
pub mod format;
mod node;
mod tree;

pub use arena::NodeId;
pub use error::TreeError;
pub use format::{FormatCache, ResolvedFormat, TextProperties, resolve_formats};
pub use node::{
    AnchorPlacement, AnchoredProps, CellProps, Collection, DEFAULT_ANCHORED_PADDING,
    DEFAULT_BLOCK_MARGIN, DEFAULT_CELL_PADDING, Element, FigureHorizontalAnchor, FigureLength,
    FigureProps, FigureUnit, FigureVerticalAnchor, FloaterProps, HorizontalAlignment,
    ListMarkerStyle, ListProps, NodeKind, Owner, Parent, SpanPreset, TableProps,
};
pub use tree::{DocumentDefaults, DocumentId, FlowDocument};
