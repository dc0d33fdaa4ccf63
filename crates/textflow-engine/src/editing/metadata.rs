//! Offset-anchored metadata carried alongside the buffer text: paragraph
//! alignment overrides and embedded table regions. Both shift with every edit.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::document::format::{Color, TextAlignment};
use crate::geometry::Thickness;

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphProperties {
    pub start: usize,
    pub len: usize,
    pub alignment: Option<TextAlignment>,
}

impl ParagraphProperties {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    fn covers(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }
}

/// Paragraph overrides keyed by paragraph start.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParagraphMap {
    entries: BTreeMap<usize, ParagraphProperties>,
}

impl ParagraphMap {
    pub fn iter(&self) -> impl Iterator<Item = &ParagraphProperties> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Key of the entry starting at, or covering, `start`.
    pub fn find(&self, start: usize) -> Option<usize> {
        if self.entries.contains_key(&start) {
            return Some(start);
        }
        self.entries
            .iter()
            .find(|(_, info)| info.covers(start))
            .map(|(key, _)| *key)
    }

    /// Sets the alignment of the paragraph `[start, start + len)`, reusing an
    /// entry that already covers `start`. Returns whether anything changed.
    pub fn set(&mut self, start: usize, len: usize, alignment: TextAlignment) -> bool {
        let info = ParagraphProperties {
            start,
            len,
            alignment: Some(alignment),
        };
        match self.find(start) {
            Some(key) => {
                let previous = self.entries.remove(&key);
                let changed = previous.as_ref() != Some(&info);
                self.entries.insert(start, info);
                changed
            }
            None => {
                self.entries.insert(start, info);
                true
            }
        }
    }

    pub fn remove_at(&mut self, start: usize) -> bool {
        match self.find(start) {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn alignment_at(&self, start: usize) -> Option<TextAlignment> {
        if let Some(alignment) = self.entries.get(&start).and_then(|info| info.alignment) {
            return Some(alignment);
        }
        self.entries
            .values()
            .filter(|info| info.alignment.is_some())
            .find(|info| (info.len == 0 && info.start == start) || info.covers(start))
            .and_then(|info| info.alignment)
    }

    pub fn shift_on_insert(&mut self, offset: usize, delta: usize) {
        if delta == 0 || self.entries.is_empty() {
            return;
        }
        self.rekey(|info| {
            if offset <= info.start {
                info.start += delta;
            } else if offset < info.end() {
                info.len += delta;
            }
            true
        });
    }

    pub fn shift_on_delete(&mut self, start: usize, len: usize) {
        if len == 0 || self.entries.is_empty() {
            return;
        }
        let end = start + len;
        self.rekey(|info| {
            let info_end = info.end();
            if end <= info.start {
                info.start -= len;
                return true;
            }
            if start >= info_end {
                return true;
            }
            let overlap = end.min(info_end) - start.max(info.start);
            if start < info.start {
                info.start = start;
            }
            info.len = info.len.saturating_sub(overlap);
            info.len > 0
        });
    }

    /// Applies `edit` to every entry, dropping those it rejects, and rebuilds
    /// the keys from the edited starts. Entries that land on the same start
    /// keep the longer one.
    fn rekey(&mut self, mut edit: impl FnMut(&mut ParagraphProperties) -> bool) {
        let entries = std::mem::take(&mut self.entries);
        for (_, mut info) in entries {
            if !edit(&mut info) {
                continue;
            }
            match self.entries.entry(info.start) {
                Entry::Vacant(slot) => {
                    slot.insert(info);
                }
                Entry::Occupied(mut slot) => {
                    if info.len > slot.get().len {
                        slot.insert(info);
                    }
                }
            }
        }
    }
}

/// A tab/newline separated grid embedded in the buffer text.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRange {
    pub start: usize,
    pub len: usize,
    pub columns: usize,
    pub header_row_count: usize,
    pub cell_spacing: f64,
    pub grid_lines_brush: Option<Color>,
    pub grid_lines_thickness: f64,
    pub cell_padding: Thickness,
}

impl TableRange {
    pub fn new(start: usize, len: usize, columns: usize, header_row_count: usize) -> Self {
        Self {
            start,
            len,
            columns,
            header_row_count,
            cell_spacing: 6.0,
            grid_lines_brush: Some(Color::LIGHT_GRAY),
            grid_lines_thickness: 1.0,
            cell_padding: Thickness::new(12.0, 8.0, 12.0, 8.0),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    fn overlaps(&self, other: &TableRange) -> bool {
        self.start < other.end() && self.end() > other.start
    }
}

/// Sorted, non-overlapping table regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TableRanges {
    ranges: Vec<TableRange>,
}

impl TableRanges {
    pub fn as_slice(&self) -> &[TableRange] {
        &self.ranges
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Registers `range`, replacing any region it overlaps.
    pub fn insert(&mut self, range: TableRange) {
        if range.len == 0 {
            return;
        }
        self.ranges.retain(|existing| !existing.overlaps(&range));
        let index = self
            .ranges
            .iter()
            .position(|existing| range.start < existing.start)
            .unwrap_or(self.ranges.len());
        self.ranges.insert(index, range);
    }

    pub fn shift_on_insert(&mut self, offset: usize, delta: usize) {
        for table in &mut self.ranges {
            if offset <= table.start {
                table.start += delta;
            } else if offset < table.end() {
                table.len += delta;
            }
        }
    }

    pub fn shift_on_delete(&mut self, start: usize, len: usize) {
        if len == 0 {
            return;
        }
        let end = start + len;
        self.ranges.retain_mut(|table| {
            let table_end = table.end();
            if end <= table.start {
                table.start -= len;
                return true;
            }
            if start >= table_end {
                return true;
            }
            let overlap = end.min(table_end) - start.max(table.start);
            if start < table.start {
                table.start = start;
            }
            table.len = table.len.saturating_sub(overlap);
            table.len > 0
        });
    }
}
