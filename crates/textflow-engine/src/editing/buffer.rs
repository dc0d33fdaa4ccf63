use std::ops::Range;

use log::{debug, trace};

use super::error::BufferError;
use super::metadata::{ParagraphMap, ParagraphProperties, TableRange, TableRanges};
use super::style::RichTextStyle;
use crate::document::format::TextAlignment;

/// A maximal stretch of text sharing one style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    text: String,
    pub style: RichTextStyle,
    len: usize,
}

impl StyledRun {
    fn new(text: String, style: RichTextStyle) -> Self {
        let len = text.chars().count();
        Self { text, style, len }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Splits off everything from character `at` onwards.
    fn split_off(&mut self, at: usize) -> StyledRun {
        let tail = self.text.split_off(char_to_byte(&self.text, at));
        self.len = at;
        StyledRun::new(tail, self.style.clone())
    }
}

/// Ordered styled runs plus the paragraph and table metadata anchored in them.
///
/// All offsets are character offsets into the normalized text: CRLF and lone
/// CR are stored as LF. Adjacent runs never share a style and no run is empty.
#[derive(Debug, Clone, Default)]
pub struct RichTextBuffer {
    runs: Vec<StyledRun>,
    paragraphs: ParagraphMap,
    tables: TableRanges,
    text: String,
    len: usize,
    revision: u64,
}

impl RichTextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str, style: RichTextStyle) -> Self {
        let mut buffer = Self::new();
        buffer.set_text(text, style);
        buffer
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    pub fn tables(&self) -> &[TableRange] {
        self.tables.as_slice()
    }

    pub fn paragraph_properties(&self) -> impl Iterator<Item = &ParagraphProperties> {
        self.paragraphs.iter()
    }

    /// Bumped by every mutation that changes text, styles or metadata.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_text(&mut self, text: &str, style: RichTextStyle) {
        self.runs.clear();
        self.paragraphs.clear();
        self.tables.clear();
        let text = normalize_newlines(text);
        if !text.is_empty() {
            self.runs.push(StyledRun::new(text, style));
        }
        self.touch("set_text");
    }

    pub fn clear(&mut self) {
        if self.runs.is_empty() {
            return;
        }
        self.runs.clear();
        self.paragraphs.clear();
        self.tables.clear();
        self.touch("clear");
    }

    pub fn insert_text(
        &mut self,
        offset: usize,
        text: &str,
        style: RichTextStyle,
    ) -> Result<(), BufferError> {
        self.check_offset(offset, true)?;
        let text = normalize_newlines(text);
        if text.is_empty() {
            return Ok(());
        }
        let inserted = text.chars().count();

        let index = self.split_at(offset);
        self.runs.insert(index, StyledRun::new(text, style));
        self.merge_adjacent();
        self.paragraphs.shift_on_insert(offset, inserted);
        self.tables.shift_on_insert(offset, inserted);
        self.touch("insert_text");
        Ok(())
    }

    pub fn delete_range(&mut self, start: usize, len: usize) -> Result<(), BufferError> {
        if len == 0 || self.len == 0 {
            return Ok(());
        }
        let covered = self.covered_runs(start, len)?;
        self.runs.drain(covered);
        self.merge_adjacent();
        self.paragraphs.shift_on_delete(start, len);
        self.tables.shift_on_delete(start, len);
        self.touch("delete_range");
        Ok(())
    }

    pub fn replace_range(
        &mut self,
        start: usize,
        len: usize,
        text: &str,
        style: RichTextStyle,
    ) -> Result<(), BufferError> {
        self.delete_range(start, len)?;
        self.insert_text(start, text, style)
    }

    /// Restyles `[start, start + len)` with `update` applied to each run's
    /// current style.
    pub fn apply_style(
        &mut self,
        start: usize,
        len: usize,
        update: impl Fn(&RichTextStyle) -> RichTextStyle,
    ) -> Result<(), BufferError> {
        if len == 0 || self.len == 0 {
            return Ok(());
        }
        let covered = self.covered_runs(start, len)?;
        for run in &mut self.runs[covered] {
            run.style = update(&run.style);
        }
        self.merge_adjacent();
        self.touch("apply_style");
        Ok(())
    }

    /// Style a character inserted at `offset` would continue. The last run's
    /// style at the end of the buffer, the default style when empty.
    pub fn style_at(&self, offset: usize) -> Result<RichTextStyle, BufferError> {
        if self.len == 0 {
            return Ok(RichTextStyle::default());
        }
        self.check_offset(offset, true)?;
        let style = self
            .run_ranges()
            .find(|(range, _)| offset < range.end)
            .or_else(|| self.run_ranges().last())
            .map(|(_, run)| run.style.clone())
            .unwrap_or_default();
        Ok(style)
    }

    pub fn text_range(&self, start: usize, len: usize) -> Result<String, BufferError> {
        if len == 0 || self.len == 0 {
            return Ok(String::new());
        }
        self.check_range(start, len)?;
        Ok(self.text.chars().skip(start).take(len).collect())
    }

    /// Sets the alignment of each `(start, len)` paragraph. Returns whether
    /// any entry changed.
    pub fn set_paragraph_alignment(
        &mut self,
        paragraphs: &[(usize, usize)],
        alignment: TextAlignment,
    ) -> bool {
        if self.len == 0 {
            return false;
        }
        let mut changed = false;
        for &(start, len) in paragraphs {
            let (start, len) = self.clamp_paragraph(start, len);
            changed |= self.paragraphs.set(start, len, alignment);
        }
        if changed {
            self.touch("set_paragraph_alignment");
        }
        changed
    }

    pub fn clear_paragraph_alignment(&mut self, paragraphs: &[(usize, usize)]) -> bool {
        if self.paragraphs.is_empty() {
            return false;
        }
        let mut changed = false;
        for &(start, _) in paragraphs {
            changed |= self.paragraphs.remove_at(start);
        }
        if changed {
            self.touch("clear_paragraph_alignment");
        }
        changed
    }

    pub fn paragraph_alignment(&self, start: usize) -> Option<TextAlignment> {
        self.paragraphs.alignment_at(start)
    }

    /// Inserts a `rows × columns` placeholder grid at `offset`, padded with
    /// newlines so it occupies whole lines, and registers it as a table.
    /// Returns the number of characters inserted.
    pub fn insert_table(
        &mut self,
        offset: usize,
        rows: usize,
        columns: usize,
    ) -> Result<usize, BufferError> {
        if rows == 0 {
            return Err(BufferError::InvalidArgument {
                name: "rows",
                reason: "must be at least 1",
            });
        }
        if columns == 0 {
            return Err(BufferError::InvalidArgument {
                name: "columns",
                reason: "must be at least 1",
            });
        }

        let offset = offset.min(self.len);
        let style = if self.len == 0 {
            RichTextStyle::default()
        } else {
            self.style_at(if offset < self.len { offset } else { offset - 1 })?
        };

        let leading = offset > 0 && self.char_at(offset - 1) != Some('\n');
        let trailing = self.len == 0 || offset == self.len || self.char_at(offset) != Some('\n');

        let content = placeholder_grid(rows, columns);
        let content_len = content.chars().count();
        let mut text = String::with_capacity(content.len() + 2);
        if leading {
            text.push('\n');
        }
        text.push_str(&content);
        if trailing {
            text.push('\n');
        }
        let inserted = text.chars().count();

        self.insert_text(offset, &text, style)?;
        let start = offset + usize::from(leading);
        self.tables
            .insert(TableRange::new(start, content_len, columns, rows.min(1)));
        self.revision += 1;
        debug!("inserted {rows}x{columns} table at {start} ({content_len} chars)");
        Ok(inserted)
    }

    /// Replaces this buffer's content and metadata with a copy of `other`.
    pub fn restore_from(&mut self, other: &RichTextBuffer) {
        self.runs = other.runs.clone();
        self.paragraphs = other.paragraphs.clone();
        self.tables = other.tables.clone();
        self.touch("restore_from");
    }

    /// Runs with their character ranges.
    pub(crate) fn run_ranges(&self) -> impl Iterator<Item = (Range<usize>, &StyledRun)> {
        self.runs.iter().scan(0, |position, run| {
            let start = *position;
            *position += run.len();
            Some((start..*position, run))
        })
    }

    /// Styled pieces of `[start, start + len)`; empty for an empty range.
    pub(crate) fn segments(&self, start: usize, len: usize) -> Vec<(String, RichTextStyle)> {
        let end = start.saturating_add(len);
        self.run_ranges()
            .filter(|(range, _)| range.start < end && range.end > start)
            .filter_map(|(range, run)| {
                let from = start.max(range.start) - range.start;
                let to = end.min(range.end) - range.start;
                (to > from).then(|| {
                    let text: String = run.text().chars().skip(from).take(to - from).collect();
                    (text, run.style.clone())
                })
            })
            .collect()
    }

    pub(crate) fn char_at(&self, offset: usize) -> Option<char> {
        self.text.chars().nth(offset)
    }

    fn check_offset(&self, offset: usize, allow_end: bool) -> Result<(), BufferError> {
        let in_range = if allow_end {
            offset <= self.len
        } else {
            offset < self.len
        };
        if in_range {
            Ok(())
        } else {
            Err(BufferError::OffsetOutOfRange {
                offset,
                len: self.len,
            })
        }
    }

    /// Validates `[start, start + len)` and returns its end. A length that
    /// overflows reports the saturated end.
    fn check_range(&self, start: usize, len: usize) -> Result<usize, BufferError> {
        self.check_offset(start, false)?;
        let end = start.saturating_add(len);
        self.check_offset(end, true)?;
        Ok(end)
    }

    /// Splits runs at both ends of `[start, start + len)` and returns the
    /// index range of the runs it covers.
    fn covered_runs(&mut self, start: usize, len: usize) -> Result<Range<usize>, BufferError> {
        let end = self.check_range(start, len)?;
        let first = self.split_at(start);
        let end = self.split_at(end);
        Ok(first..end)
    }

    /// Ensures a run boundary at `offset` and returns the index of the run
    /// that starts there.
    fn split_at(&mut self, offset: usize) -> usize {
        let mut position = 0;
        for index in 0..self.runs.len() {
            if offset == position {
                return index;
            }
            let len = self.runs[index].len();
            if offset < position + len {
                trace!("splitting run {index} at {}", offset - position);
                let tail = self.runs[index].split_off(offset - position);
                self.runs.insert(index + 1, tail);
                return index + 1;
            }
            position += len;
        }
        self.runs.len()
    }

    fn merge_adjacent(&mut self) {
        self.runs.retain(|run| !run.is_empty());
        let mut merged: Vec<StyledRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            match merged.last_mut() {
                Some(previous) if previous.style == run.style => {
                    previous.text.push_str(&run.text);
                    previous.len += run.len;
                }
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    fn clamp_paragraph(&self, start: usize, len: usize) -> (usize, usize) {
        let start = start.min(self.len - 1);
        let available = self.len - start;
        let len = match len.min(available) {
            0 => available.min(1),
            len => len,
        };
        (start, len)
    }

    fn touch(&mut self, operation: &str) {
        self.text = self.runs.iter().map(StyledRun::text).collect();
        self.len = self.runs.iter().map(StyledRun::len).sum();
        self.revision += 1;
        trace!(
            "{operation}: {} runs, {} chars, revision {}",
            self.runs.len(),
            self.len,
            self.revision
        );
    }
}

/// Placeholder text for a new table: a header row, then numbered body rows.
fn placeholder_grid(rows: usize, columns: usize) -> String {
    (0..rows)
        .map(|row| {
            (1..=columns)
                .map(|column| {
                    if row == 0 {
                        format!("Header {column}")
                    } else {
                        format!("Row {row}, Column {column}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(index, _)| index)
}
