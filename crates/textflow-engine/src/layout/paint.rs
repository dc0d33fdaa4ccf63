//! Flattens a [`DocumentLayout`] into backend-neutral draw commands.

use std::rc::Rc;

use super::engine::DocumentLayout;
use super::entry::{AnchoredLayout, EntryContent, LayoutEntry, TableLayout};
use super::shaping::ShapedText;
use crate::document::format::Color;
use crate::geometry::{Point, Rect, Size, Thickness};

/// One drawing primitive, in document coordinates.
#[derive(Debug, Clone)]
pub enum PaintCommand {
    FillRect { rect: Rect, color: Color },
    DrawText {
        origin: Point,
        layout: Rc<dyn ShapedText>,
    },
}

impl PaintCommand {
    /// The text drawn by this command, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            PaintCommand::DrawText { layout, .. } => Some(layout.text()),
            PaintCommand::FillRect { .. } => None,
        }
    }
}

impl DocumentLayout {
    /// Paint commands in back-to-front order. `bounds` is the surface size the
    /// document background fills.
    pub fn paint(&self, bounds: Size) -> Vec<PaintCommand> {
        let mut painter = Painter {
            commands: Vec::new(),
            marker_padding: self.marker_padding,
        };
        if let Some(color) = self.background {
            painter.fill(Rect::from_origin(Point::ZERO, bounds), color);
        }
        let origin = Point::new(self.page_padding.left, self.page_padding.top);
        painter.blocks(origin, &self.entries);
        painter.commands
    }
}

struct Painter {
    commands: Vec<PaintCommand>,
    marker_padding: f64,
}

impl Painter {
    fn fill(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::FillRect { rect, color });
    }

    fn text(&mut self, origin: Point, layout: &Rc<dyn ShapedText>) {
        self.commands.push(PaintCommand::DrawText {
            origin,
            layout: Rc::clone(layout),
        });
    }

    fn blocks(&mut self, origin: Point, entries: &[LayoutEntry]) {
        let mut y = origin.y;
        for entry in entries {
            y += entry.margin.top;
            match &entry.content {
                EntryContent::Table(table) => {
                    self.table(Point::new(origin.x + entry.margin.left, y), table);
                    y += table.height + entry.margin.bottom;
                }
                EntryContent::Anchored(anchored) => {
                    let x = origin.x + entry.margin.left + entry.content_indent;
                    let bottom = self.anchored(Point::new(x, y), anchored);
                    y = bottom + entry.margin.bottom;
                }
                EntryContent::Text(layout) => {
                    let mut x = origin.x + entry.margin.left;
                    for marker in &entry.markers {
                        let spare = marker.width - marker.layout.width();
                        let marker_x = if spare > self.marker_padding {
                            x + spare - self.marker_padding
                        } else {
                            x
                        };
                        if marker.visible {
                            let marker_y = y + ((layout.height() - marker.layout.height()) / 2.0).max(0.0);
                            self.text(Point::new(marker_x, marker_y), &marker.layout);
                        }
                        x += marker.width;
                    }
                    self.text(Point::new(x, y), layout);
                    y += layout.height() + entry.margin.bottom;
                }
            }
        }
    }

    /// Paints an anchored block whose slot starts at `origin`, returning the
    /// bottom edge of the painted box.
    fn anchored(&mut self, origin: Point, anchored: &AnchoredLayout) -> f64 {
        let rect = Rect::new(
            origin.x + anchored.alignment_offset() + anchored.horizontal_offset,
            origin.y + anchored.vertical_offset,
            anchored.width,
            anchored.height,
        );
        if let Some(color) = anchored.background {
            self.fill(rect, color);
        }
        let content = Point::new(rect.x + anchored.padding.left, rect.y + anchored.padding.top);
        self.blocks(content, &anchored.content);
        rect.bottom()
    }

    fn table(&mut self, origin: Point, table: &TableLayout) {
        if let Some(color) = table.background {
            self.fill(Rect::new(origin.x, origin.y, table.width, table.height), color);
        }

        let grid_thickness = table.grid_lines_thickness.max(0.0);
        let mut y = origin.y + table.cell_spacing;
        for row in &table.rows {
            let mut x = origin.x + table.cell_spacing;
            for cell in &row.cells {
                let rect = Rect::new(x, y, cell.column_width, row.height);
                if let Some(color) = cell.background {
                    self.fill(rect, color);
                }
                let content = Point::new(rect.x + cell.padding.left, rect.y + cell.padding.top);
                self.blocks(content, &cell.content);

                let thickness = normalize_border(cell.border_thickness, grid_thickness);
                if let Some(color) = cell.border_brush.or(table.grid_lines_brush)
                    && has_border(thickness)
                {
                    self.border(rect, thickness, color);
                }
                x += cell.column_width + table.cell_spacing;
            }
            y += row.height + table.cell_spacing;
        }
    }

    /// Draws each border side as a filled strip inside `rect`.
    fn border(&mut self, rect: Rect, thickness: Thickness, color: Color) {
        let left = thickness.left.min(rect.width);
        if left > 0.0 {
            self.fill(Rect::new(rect.x, rect.y, left, rect.height), color);
        }
        let top = thickness.top.min(rect.height);
        if top > 0.0 {
            self.fill(Rect::new(rect.x, rect.y, rect.width, top), color);
        }
        let right = thickness.right.min(rect.width);
        if right > 0.0 {
            self.fill(Rect::new(rect.right() - right, rect.y, right, rect.height), color);
        }
        let bottom = thickness.bottom.min(rect.height);
        if bottom > 0.0 {
            self.fill(Rect::new(rect.x, rect.bottom() - bottom, rect.width, bottom), color);
        }
    }
}

fn has_border(thickness: Thickness) -> bool {
    thickness.left > 0.0 || thickness.top > 0.0 || thickness.right > 0.0 || thickness.bottom > 0.0
}

/// A cell without its own border falls back to the table's grid lines.
fn normalize_border(thickness: Thickness, grid: f64) -> Thickness {
    if has_border(thickness) {
        thickness
    } else if grid > 0.0 {
        Thickness::uniform(grid)
    } else {
        Thickness::ZERO
    }
}
