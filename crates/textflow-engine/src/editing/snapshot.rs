//! Projection of a [`RichTextBuffer`] into a [`FlowDocument`], with the
//! mapping between buffer offsets and flow offsets.
//!
//! Flow offsets count the characters of the projected paragraphs in order.
//! Two consecutive paragraphs whose buffer ranges are separated by a newline
//! or cell tab are one flow position apart; indentation trimmed into the
//! paragraph margin does not exist in flow space.

use std::collections::{HashMap, VecDeque};

use log::debug;
use textflow_config::IndentConfig;

use super::buffer::RichTextBuffer;
use super::error::BufferError;
use super::metadata::TableRange;
use super::style::RichTextStyle;
use crate::document::format::TextAlignment;
use crate::document::{CellProps, Collection, Element, FlowDocument, NodeId, Owner, TableProps};
use crate::geometry::Thickness;

/// One projected paragraph: a top-level text block or a table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphSnapshot {
    pub node: NodeId,
    pub doc_start: usize,
    /// Content length, excluding the trailing newline.
    pub doc_len: usize,
    pub has_trailing_newline: bool,
    pub flow_start: usize,
    pub flow_len: usize,
    /// Indentation characters moved into the left margin.
    pub leading_trim: usize,
    pub index: usize,
}

impl ParagraphSnapshot {
    pub fn doc_end(&self) -> usize {
        self.doc_start + self.doc_len
    }

    pub fn flow_end(&self) -> usize {
        self.flow_start + self.flow_len
    }
}

/// Immutable projection of one buffer revision.
#[derive(Debug)]
pub struct FlowSnapshot {
    document: FlowDocument,
    paragraphs: Vec<ParagraphSnapshot>,
    by_node: HashMap<NodeId, usize>,
    doc_len: usize,
    flow_len: usize,
    revision: u64,
}

impl FlowSnapshot {
    pub fn build(
        buffer: &RichTextBuffer,
        alignment: TextAlignment,
        indent: &IndentConfig,
    ) -> Result<FlowSnapshot, BufferError> {
        let mut builder = SnapshotBuilder::new(buffer, alignment, indent);
        builder.build()?;
        let SnapshotBuilder {
            document,
            paragraphs,
            ..
        } = builder;

        let flow_len = paragraphs.last().map_or(0, ParagraphSnapshot::flow_end);
        let by_node = paragraphs
            .iter()
            .map(|paragraph| (paragraph.node, paragraph.index))
            .collect();
        debug!(
            "built snapshot of revision {}: {} paragraphs, {} buffer chars, {} flow chars",
            buffer.revision(),
            paragraphs.len(),
            buffer.len(),
            flow_len
        );

        Ok(FlowSnapshot {
            document,
            paragraphs,
            by_node,
            doc_len: buffer.len(),
            flow_len,
            revision: buffer.revision(),
        })
    }

    pub fn document(&self) -> &FlowDocument {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut FlowDocument {
        &mut self.document
    }

    pub fn paragraphs(&self) -> &[ParagraphSnapshot] {
        &self.paragraphs
    }

    pub fn paragraph_for_node(&self, node: NodeId) -> Option<&ParagraphSnapshot> {
        self.by_node
            .get(&node)
            .and_then(|index| self.paragraphs.get(*index))
    }

    /// Buffer revision this snapshot was built from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn doc_len(&self) -> usize {
        self.doc_len
    }

    pub fn flow_len(&self) -> usize {
        self.flow_len
    }

    /// Paragraph holding buffer offset `offset`. An offset just past a
    /// trailing newline belongs to the following paragraph.
    pub fn find_paragraph(&self, offset: usize) -> Option<&ParagraphSnapshot> {
        let offset = offset.min(self.doc_len);
        for (index, paragraph) in self.paragraphs.iter().enumerate() {
            if offset < paragraph.doc_start || offset <= paragraph.doc_end() {
                return Some(paragraph);
            }
            if paragraph.has_trailing_newline && offset == paragraph.doc_end() + 1 {
                return Some(self.paragraphs.get(index + 1).unwrap_or(paragraph));
            }
        }
        self.paragraphs.last()
    }

    pub fn to_flow_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.doc_len);
        for (index, paragraph) in self.paragraphs.iter().enumerate() {
            if offset < paragraph.doc_start {
                return paragraph.flow_start;
            }
            if offset < paragraph.doc_end() {
                let local = offset - paragraph.doc_start;
                if local <= paragraph.leading_trim {
                    return paragraph.flow_start;
                }
                return (paragraph.flow_start + local - paragraph.leading_trim)
                    .min(paragraph.flow_end());
            }
            if offset == paragraph.doc_end() {
                return paragraph.flow_end();
            }
            if paragraph.has_trailing_newline && offset == paragraph.doc_end() + 1 {
                return self
                    .paragraphs
                    .get(index + 1)
                    .map_or(paragraph.flow_end(), |next| next.flow_start);
            }
        }
        self.flow_len
    }

    pub fn to_document_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.flow_len);
        for (index, paragraph) in self.paragraphs.iter().enumerate() {
            if offset < paragraph.flow_start {
                return paragraph.doc_start;
            }
            if offset <= paragraph.flow_end() {
                if offset == paragraph.flow_end()
                    && paragraph.flow_len == 0
                    && let Some(next) = self.paragraphs.get(index + 1)
                    && next.flow_start == offset
                {
                    return next.doc_start;
                }
                let local = offset - paragraph.flow_start;
                return (paragraph.doc_start + paragraph.leading_trim + local)
                    .clamp(paragraph.doc_start, paragraph.doc_end());
            }
        }
        self.doc_len
    }
}

/// Contiguous buffer range that becomes one block.
enum BlockSlice<'a> {
    Text { start: usize, len: usize },
    Table(&'a TableRange),
}

struct SnapshotBuilder<'a> {
    buffer: &'a RichTextBuffer,
    chars: Vec<char>,
    indent: &'a IndentConfig,
    document: FlowDocument,
    paragraphs: Vec<ParagraphSnapshot>,
}

impl<'a> SnapshotBuilder<'a> {
    fn new(buffer: &'a RichTextBuffer, alignment: TextAlignment, indent: &'a IndentConfig) -> Self {
        let mut document = FlowDocument::new();
        let style = RichTextStyle::default();
        document.set_defaults(|defaults| {
            defaults.font_family = style.font_family.clone();
            defaults.font_size = style.font_size;
            defaults.font_weight = style.font_weight;
            defaults.font_style = style.font_style;
            defaults.foreground = style.foreground;
            defaults.background = style.background;
            defaults.alignment = alignment;
        });
        Self {
            buffer,
            chars: buffer.text().chars().collect(),
            indent,
            document,
            paragraphs: Vec::new(),
        }
    }

    fn build(&mut self) -> Result<(), BufferError> {
        if self.buffer.is_empty() {
            let paragraph = self.paragraph(0, 0, false, false)?;
            self.document
                .append(Owner::Document, Collection::Blocks, paragraph)?;
            return Ok(());
        }

        for slice in self.slices() {
            let block = match slice {
                BlockSlice::Text { start, len } => self.text_block(start, len)?,
                BlockSlice::Table(table) => self.table_block(table)?,
            };
            self.document
                .append(Owner::Document, Collection::Blocks, block)?;
        }
        Ok(())
    }

    fn slices(&self) -> Vec<BlockSlice<'a>> {
        let len = self.chars.len();
        let mut tables: VecDeque<&'a TableRange> = self
            .buffer
            .tables()
            .iter()
            .filter(|table| table.len > 0)
            .collect();
        let mut slices = Vec::new();
        let mut cursor = 0;

        while cursor < len {
            if let Some(table) = tables.front().copied()
                && table.start == cursor
            {
                slices.push(BlockSlice::Table(table));
                cursor = table.end();
                tables.pop_front();
                continue;
            }

            let next_table = tables.front().map_or(len, |table| table.start);
            let newline = self.chars[cursor..]
                .iter()
                .position(|ch| *ch == '\n')
                .map(|position| cursor + position);
            let end = match newline {
                Some(newline) if newline < next_table => newline + 1,
                _ => {
                    let end = next_table.min(len);
                    if end == cursor { (cursor + 1).min(len) } else { end }
                }
            };
            slices.push(BlockSlice::Text {
                start: cursor,
                len: end - cursor,
            });
            cursor = end;
        }

        if cursor == len && self.chars.last() == Some(&'\n') {
            slices.push(BlockSlice::Text { start: len, len: 0 });
        }
        slices
    }

    fn text_block(&mut self, start: usize, len: usize) -> Result<NodeId, BufferError> {
        let has_trailing_newline = len > 0 && self.chars.get(start + len - 1) == Some(&'\n');
        let content_len = if has_trailing_newline { len - 1 } else { len };
        self.paragraph(start, content_len, has_trailing_newline, true)
    }

    fn table_block(&mut self, table: &TableRange) -> Result<NodeId, BufferError> {
        let mut rows = self.table_rows(table);
        if rows.is_empty() {
            rows.push(vec![(table.start, 0)]);
        }
        let columns = rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(table.columns)
            .max(1);

        let node = self.document.create(Element::table(TableProps {
            cell_spacing: table.cell_spacing,
            grid_lines_brush: table.grid_lines_brush,
            grid_lines_thickness: table.grid_lines_thickness,
        }));
        for _ in 0..columns {
            let column = self.document.create(Element::table_column(f64::NAN));
            self.document.append(node, Collection::Columns, column)?;
        }

        let header_rows = table.header_row_count.min(rows.len());
        let header = self.document.create(Element::row_group());
        let body = self.document.create(Element::row_group());
        for (index, cells) in rows.iter().enumerate() {
            let row = self.document.create(Element::row());
            for column in 0..columns {
                let (start, len) = cells.get(column).copied().unwrap_or_else(|| {
                    let fallback = cells.last().map_or(table.start, |(start, len)| start + len);
                    (fallback, 0)
                });
                let cell = self.document.create(Element::cell(CellProps {
                    padding: table.cell_padding,
                    border_brush: table.grid_lines_brush,
                    border_thickness: Thickness::uniform(table.grid_lines_thickness),
                }));
                let paragraph = self.paragraph(start, len, false, false)?;
                self.document
                    .update(paragraph, |element| element.margin = Thickness::ZERO)?;
                self.document.append(cell, Collection::Blocks, paragraph)?;
                self.document.append(row, Collection::Cells, cell)?;
            }
            let group = if index < header_rows { header } else { body };
            self.document.append(group, Collection::Rows, row)?;
        }

        for group in [header, body] {
            if self.document.children(group, Collection::Rows)?.is_empty() {
                self.document.delete(group)?;
            } else {
                self.document.append(node, Collection::RowGroups, group)?;
            }
        }
        Ok(node)
    }

    /// Cell ranges per row: cells split on tabs, rows on newlines.
    fn table_rows(&self, table: &TableRange) -> Vec<Vec<(usize, usize)>> {
        let end = table.end().min(self.chars.len());
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut cell_start = table.start;

        for cursor in table.start..end {
            let ch = self.chars[cursor];
            if ch == '\t' || ch == '\n' {
                row.push((cell_start, cursor - cell_start));
                if ch == '\n' {
                    rows.push(std::mem::take(&mut row));
                }
                cell_start = cursor + 1;
            }
        }
        if cell_start <= end {
            row.push((cell_start, end - cell_start));
        }
        if !row.is_empty() {
            rows.push(row);
        }
        rows
    }

    /// Creates a detached paragraph for `[start, start + len)` and records
    /// its snapshot entry.
    fn paragraph(
        &mut self,
        start: usize,
        len: usize,
        has_trailing_newline: bool,
        trim_indent: bool,
    ) -> Result<NodeId, BufferError> {
        let mut segments = self.buffer.segments(start, len);
        let (leading_trim, columns) = if trim_indent {
            self.indentation(&segments)
        } else {
            (0, 0)
        };
        trim_leading(&mut segments, leading_trim);

        let mut element = Element::paragraph();
        element.margin.left += columns as f64 * self.indent.column_width();
        element.alignment = self.buffer.paragraph_alignment(start);
        let paragraph = self.document.create(element);

        let mut flow_len = 0;
        for (text, style) in segments.into_iter().filter(|(text, _)| !text.is_empty()) {
            flow_len += text.chars().count();
            let run = self
                .document
                .create(Element::run(text).with_format(style.to_properties()));
            self.document.append(paragraph, Collection::Inlines, run)?;
        }
        if flow_len == 0 {
            let run = self.document.create(Element::run(""));
            self.document.append(paragraph, Collection::Inlines, run)?;
        }

        let flow_start = match self.paragraphs.last() {
            Some(previous) => previous.flow_end() + usize::from(start > previous.doc_end()),
            None => 0,
        };
        let index = self.paragraphs.len();
        self.paragraphs.push(ParagraphSnapshot {
            node: paragraph,
            doc_start: start,
            doc_len: len,
            has_trailing_newline,
            flow_start,
            flow_len,
            leading_trim,
            index,
        });
        Ok(paragraph)
    }

    /// Leading whitespace as `(characters, columns)`.
    fn indentation(&self, segments: &[(String, RichTextStyle)]) -> (usize, usize) {
        let mut trimmed = 0;
        let mut column = 0;
        for ch in segments.iter().flat_map(|(text, _)| text.chars()) {
            match ch {
                ' ' => column += 1,
                '\t' => column = self.indent.next_tab_stop(column),
                _ => break,
            }
            trimmed += 1;
        }
        (trimmed, column)
    }
}

fn trim_leading(segments: &mut Vec<(String, RichTextStyle)>, count: usize) {
    let mut remaining = count;
    segments.retain_mut(|(text, _)| {
        if remaining == 0 {
            return true;
        }
        let len = text.chars().count();
        if len <= remaining {
            remaining -= len;
            return false;
        }
        *text = text.chars().skip(remaining).collect();
        remaining = 0;
        true
    });
}
