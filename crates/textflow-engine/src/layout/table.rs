//! Table measurement: column sizing and row/cell layout.

use super::engine::LayoutPass;
use super::entry::{
    EntryContent, LayoutEntry, TableCellLayout, TableLayout, TableRowLayout, extent,
};
use super::shaping::TextShaper;
use crate::document::{CellProps, Collection, Element, NodeId, NodeKind, Owner, TableProps};
use crate::geometry::{Size, Thickness, shrink_width};

/// Width given to every auto column of an unbounded table with nothing
/// measured, as a multiple of the minimum column width.
const UNMEASURED_COLUMN_FACTOR: f64 = 2.0;

/// Sizes the columns of one table.
///
/// `fixed[i]` is the explicit width of column `i`, `desired[i]` the widest
/// measured cell of an auto column (0 when it has no cells).
pub(crate) fn size_columns(
    fixed: &[Option<f64>],
    desired: &[f64],
    width_for_columns: f64,
    minimum: f64,
) -> Vec<f64> {
    let count = fixed.len();
    let mut widths: Vec<f64> = (0..count)
        .map(|i| match fixed[i] {
            Some(width) => width.max(minimum),
            None if desired[i] > 0.0 => desired[i],
            None => minimum,
        })
        .collect();

    let mut total_fixed: f64 = (0..count)
        .filter(|i| fixed[*i].is_some())
        .map(|i| widths[i])
        .sum();
    if width_for_columns.is_finite() && total_fixed > width_for_columns && total_fixed > 0.0 {
        let scale = width_for_columns / total_fixed;
        for i in (0..count).filter(|i| fixed[*i].is_some()) {
            widths[i] *= scale;
        }
        total_fixed = width_for_columns;
    }

    let auto: Vec<usize> = (0..count).filter(|i| fixed[*i].is_none()).collect();
    if auto.is_empty() {
        return widths;
    }

    let measured: f64 = auto.iter().map(|i| desired[*i].max(0.0)).sum();
    if !width_for_columns.is_finite() {
        if measured <= 0.0 {
            for i in &auto {
                widths[*i] = minimum * UNMEASURED_COLUMN_FACTOR;
            }
        }
        return widths;
    }

    let remaining = (width_for_columns - total_fixed).max(0.0);
    if measured <= 0.0 {
        let equal = (remaining / auto.len() as f64).max(minimum);
        for i in &auto {
            widths[*i] = equal;
        }
        return widths;
    }

    let auto_sum: f64 = auto.iter().map(|i| widths[*i]).sum();
    let scale = if remaining > 0.0 { remaining / auto_sum } else { 0.0 };
    for i in &auto {
        widths[*i] = (widths[*i] * scale).max(minimum);
    }
    widths
}

impl<S: TextShaper> LayoutPass<'_, S> {
    pub(crate) fn table_entry(
        &self,
        table: NodeId,
        element: &Element,
        props: &TableProps,
        constraint: f64,
        left_indent: f64,
        right_indent: f64,
    ) -> LayoutEntry {
        let margin = element.margin.add(left_indent, 0.0, right_indent, 0.0);
        let available = shrink_width(constraint, margin.horizontal());
        LayoutEntry {
            node: table,
            content: EntryContent::Table(self.table_layout(table, element, props, available)),
            margin,
            markers: Vec::new(),
            content_indent: 0.0,
        }
    }

    fn table_layout(
        &self,
        table: NodeId,
        element: &Element,
        props: &TableProps,
        available: f64,
    ) -> TableLayout {
        let spacing = props.cell_spacing.max(0.0);
        let columns = self.doc.child_slice(Owner::Node(table), Collection::Columns);
        let groups: Vec<(Thickness, Vec<NodeId>)> = self
            .doc
            .child_slice(Owner::Node(table), Collection::RowGroups)
            .iter()
            .map(|group| {
                let margin = self.doc.get(*group).map(|g| g.margin).unwrap_or_default();
                let rows = self.doc.child_slice(Owner::Node(*group), Collection::Rows);
                (margin, rows.to_vec())
            })
            .collect();

        let cells_of = |row: NodeId| self.doc.child_slice(Owner::Node(row), Collection::Cells);
        let widest_row = groups
            .iter()
            .flat_map(|(_, rows)| rows.iter())
            .map(|row| cells_of(*row).len())
            .max()
            .unwrap_or(0);
        let column_count = columns.len().max(widest_row);

        let mut layout = TableLayout {
            width: spacing * 2.0,
            height: spacing * 2.0,
            cell_spacing: spacing,
            column_widths: Vec::new(),
            rows: Vec::new(),
            grid_lines_brush: props.grid_lines_brush,
            grid_lines_thickness: props.grid_lines_thickness,
            background: element.format.background,
        };
        if column_count == 0 {
            return layout;
        }

        let fixed: Vec<Option<f64>> = (0..column_count)
            .map(|i| {
                let hint = columns.get(i).and_then(|column| self.doc.get(*column));
                match hint.map(|column| &column.kind) {
                    Some(NodeKind::TableColumn { width }) if *width > 0.0 => Some(*width),
                    _ => None,
                }
            })
            .collect();

        let minimum = self.config.minimum_column_width;
        let mut desired = vec![0.0_f64; column_count];
        for row in groups.iter().flat_map(|(_, rows)| rows.iter()) {
            for (i, cell) in cells_of(*row).iter().enumerate() {
                if fixed[i].is_none() {
                    desired[i] = desired[i].max(self.cell_desired_width(*cell).max(minimum));
                }
            }
        }

        let width_for_columns = shrink_width(available, spacing * (column_count as f64 + 1.0));
        layout.column_widths = size_columns(&fixed, &desired, width_for_columns, minimum);
        layout.width = spacing * (column_count as f64 + 1.0) + layout.column_widths.iter().sum::<f64>();

        let mut height = spacing;
        for (group_margin, rows) in &groups {
            height += group_margin.top;
            for row in rows {
                let row_layout = self.row_layout(cells_of(*row), &layout.column_widths);
                height += row_layout.height + spacing;
                layout.rows.push(row_layout);
            }
            height += group_margin.bottom;
        }
        layout.height = if layout.rows.is_empty() {
            spacing * 2.0
        } else {
            height
        };
        layout
    }

    fn row_layout(&self, cells: &[NodeId], column_widths: &[f64]) -> TableRowLayout {
        let cells: Vec<TableCellLayout> = column_widths
            .iter()
            .enumerate()
            .map(|(i, column_width)| match cells.get(i) {
                Some(cell) => self.cell_layout(*cell, *column_width),
                None => TableCellLayout {
                    cell: None,
                    content: Vec::new(),
                    content_size: Size::ZERO,
                    column_width: *column_width,
                    padding: Thickness::ZERO,
                    border_thickness: Thickness::ZERO,
                    border_brush: None,
                    background: None,
                },
            })
            .collect();
        let height = cells
            .iter()
            .map(TableCellLayout::desired_height)
            .fold(0.0, f64::max);
        TableRowLayout { height, cells }
    }

    fn cell_layout(&self, cell: NodeId, column_width: f64) -> TableCellLayout {
        let element = self.doc.get(cell);
        let props = match element.map(|element| &element.kind) {
            Some(NodeKind::TableCell(props)) => props.clone(),
            _ => CellProps::default(),
        };
        let content = self.cell_entries(cell, shrink_width(column_width, props.padding.horizontal()));
        TableCellLayout {
            cell: Some(cell),
            content_size: extent(&content),
            content,
            column_width,
            padding: props.padding,
            border_thickness: props.border_thickness,
            border_brush: props.border_brush,
            background: element.and_then(|element| element.format.background),
        }
    }

    fn cell_desired_width(&self, cell: NodeId) -> f64 {
        let padding = match self.doc.get(cell).map(|element| &element.kind) {
            Some(NodeKind::TableCell(props)) => props.padding,
            _ => CellProps::default().padding,
        };
        extent(&self.cell_entries(cell, f64::INFINITY)).width + padding.horizontal()
    }

    fn cell_entries(&self, cell: NodeId, constraint: f64) -> Vec<LayoutEntry> {
        let constraint = if constraint > 0.0 { constraint } else { 0.0 };
        let mut entries = Vec::new();
        for block in self.doc.child_slice(Owner::Node(cell), Collection::Blocks) {
            self.append_block(*block, constraint, &mut entries, 0.0, 0.0, &mut None);
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FlowDocument;
    use crate::layout::{LayoutEngine, MonospaceShaper};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::fixed_fits(&[Some(100.0), Some(60.0)], &[0.0, 0.0], 400.0, vec![100.0, 60.0])]
    #[case::fixed_scaled(&[Some(300.0), Some(100.0)], &[0.0, 0.0], 200.0, vec![150.0, 50.0])]
    #[case::fixed_raised_to_minimum(&[Some(10.0)], &[0.0], 400.0, vec![48.0])]
    #[case::auto_proportional(&[None, None], &[100.0, 300.0], 200.0, vec![50.0, 150.0])]
    #[case::auto_minimum_wins(&[None, None], &[100.0, 300.0], 80.0, vec![48.0, 60.0])]
    #[case::auto_equal_when_unmeasured(&[None, None], &[0.0, 0.0], 300.0, vec![150.0, 150.0])]
    #[case::auto_gets_remainder(&[Some(100.0), None], &[0.0, 50.0], 300.0, vec![100.0, 200.0])]
    #[case::unbounded_keeps_desired(&[None, None], &[70.0, 0.0], f64::INFINITY, vec![70.0, 48.0])]
    #[case::unbounded_unmeasured(&[None, None], &[0.0, 0.0], f64::INFINITY, vec![96.0, 96.0])]
    fn test_size_columns(
        #[case] fixed: &[Option<f64>],
        #[case] desired: &[f64],
        #[case] width: f64,
        #[case] expected: Vec<f64>,
    ) {
        assert_eq!(size_columns(fixed, desired, width, 48.0), expected);
    }

    fn table_with_cells(doc: &mut FlowDocument, rows: &[&[&str]]) -> NodeId {
        let table = doc.create(Element::table(TableProps::default()));
        let group = doc.create(Element::row_group());
        doc.append(table, Collection::RowGroups, group).unwrap();
        for texts in rows {
            let row = doc.create(Element::row());
            doc.append(group, Collection::Rows, row).unwrap();
            for text in *texts {
                let cell = doc.create(Element::cell(CellProps::default()));
                let paragraph = doc.create(Element::paragraph().with_margin(Thickness::ZERO));
                let run = doc.create(Element::run(*text));
                doc.append(paragraph, Collection::Inlines, run).unwrap();
                doc.append(cell, Collection::Blocks, paragraph).unwrap();
                doc.append(row, Collection::Cells, cell).unwrap();
            }
        }
        table
    }

    fn table_of(layout: &crate::layout::DocumentLayout) -> &TableLayout {
        match &layout.entries[0].content {
            EntryContent::Table(table) => table,
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn test_ragged_rows_get_empty_cells() {
        let mut doc = FlowDocument::new();
        let table = table_with_cells(&mut doc, &[&["a", "b"], &["c"]]);
        doc.append(Owner::Document, Collection::Blocks, table)
            .unwrap();
        let mut engine = LayoutEngine::new(MonospaceShaper);

        let layout = engine.layout(&doc, f64::INFINITY);
        let table = table_of(&layout);

        assert_eq!(table.column_widths.len(), 2);
        assert_eq!(table.rows[1].cells.len(), 2);
        assert_eq!(table.rows[1].cells[1].cell, None);
        // two rows of 21px text + 4+4 padding, three spacings
        assert_eq!(table.height, 6.0 + 29.0 + 6.0 + 29.0 + 6.0);
    }

    #[test]
    fn test_table_without_cells_is_spacing_only() {
        let mut doc = FlowDocument::new();
        let table = doc.create(Element::table(TableProps::default()));
        doc.append(Owner::Document, Collection::Blocks, table)
            .unwrap();
        let mut engine = LayoutEngine::new(MonospaceShaper);

        let layout = engine.layout(&doc, 400.0);
        let table = table_of(&layout);

        assert_eq!((table.width, table.height), (12.0, 12.0));
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_table_fills_bounded_width() {
        let mut doc = FlowDocument::new();
        let table = table_with_cells(&mut doc, &[&["short", "a much longer cell"]]);
        doc.update(table, |element| element.margin = Thickness::ZERO)
            .unwrap();
        doc.append(Owner::Document, Collection::Blocks, table)
            .unwrap();
        let mut engine = LayoutEngine::new(MonospaceShaper);

        let layout = engine.layout(&doc, 400.0);
        let table = table_of(&layout);

        // 400 - 48 page padding
        assert!((table.width - 352.0).abs() < 1e-9);
        assert!(table.column_widths[1] > table.column_widths[0]);
    }
}
