use std::ops::Range;

use log::trace;
use textflow_config::IndentConfig;

use super::buffer::RichTextBuffer;
use super::commands::{
    BULLET_PREFIX, Cmd, LineRange, StyleChange, bullet_prefix_len, indent_removal,
    number_prefix_len, selected_lines, starts_with_bullet,
};
use super::error::BufferError;
use super::patch::Patch;
use super::style::RichTextStyle;
use crate::document::format::TextAlignment;

/// A buffer plus the selection and pending insertion style that commands act on.
#[derive(Debug, Clone)]
pub struct Editor {
    buffer: RichTextBuffer,
    anchor: usize,
    caret: usize,
    pending_style: RichTextStyle,
    version: u64,
    indent: IndentConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(IndentConfig::default())
    }
}

impl Editor {
    pub fn new(indent: IndentConfig) -> Self {
        Self::from_buffer(RichTextBuffer::new(), indent)
    }

    pub fn from_buffer(buffer: RichTextBuffer, indent: IndentConfig) -> Self {
        let mut editor = Self {
            buffer,
            anchor: 0,
            caret: 0,
            pending_style: RichTextStyle::default(),
            version: 0,
            indent,
        };
        editor.refresh_pending_style();
        editor
    }

    pub fn buffer(&self) -> &RichTextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    /// Ordered selection range; empty when only a caret is shown.
    pub fn selection(&self) -> Range<usize> {
        self.anchor.min(self.caret)..self.anchor.max(self.caret)
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Style the next inserted text will carry.
    pub fn pending_style(&self) -> &RichTextStyle {
        &self.pending_style
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn indent(&self) -> &IndentConfig {
        &self.indent
    }

    /// Replaces the whole text and puts the caret at the start.
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text, RichTextStyle::default());
        self.collapse_to(0);
        self.refresh_pending_style();
        self.version += 1;
    }

    /// Restores a buffer saved earlier with `buffer().clone()`.
    pub fn restore(&mut self, saved: &RichTextBuffer) {
        self.buffer.restore_from(saved);
        let len = self.buffer.len();
        self.anchor = self.anchor.min(len);
        self.caret = self.caret.min(len);
        self.refresh_pending_style();
        self.version += 1;
    }

    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, BufferError> {
        trace!("applying {cmd:?} at selection {:?}", self.selection());
        let mut changed = Vec::new();

        match cmd {
            Cmd::InsertText { text } => {
                let at = self.delete_selection(&mut changed)?;
                let before = self.buffer.len();
                self.buffer
                    .insert_text(at, &text, self.pending_style.clone())?;
                let end = at + (self.buffer.len() - before);
                if end > at {
                    changed.push(at..end);
                }
                self.collapse_to(end);
            }
            Cmd::DeleteBackward => {
                if self.selection().is_empty() {
                    if self.caret > 0 {
                        let at = self.caret - 1;
                        self.buffer.delete_range(at, 1)?;
                        changed.push(at..at);
                        self.collapse_to(at);
                    }
                } else {
                    self.delete_selection(&mut changed)?;
                }
                self.refresh_pending_style();
            }
            Cmd::DeleteForward => {
                if self.selection().is_empty() {
                    if self.caret < self.buffer.len() {
                        self.buffer.delete_range(self.caret, 1)?;
                        changed.push(self.caret..self.caret);
                    }
                } else {
                    self.delete_selection(&mut changed)?;
                }
                self.refresh_pending_style();
            }
            Cmd::DeleteSelection => {
                self.delete_selection(&mut changed)?;
                self.refresh_pending_style();
            }
            Cmd::SetSelection { anchor, caret } => {
                let len = self.buffer.len();
                self.anchor = anchor.min(len);
                self.caret = caret.min(len);
                self.refresh_pending_style();
            }
            Cmd::Style(change) => self.apply_style(&change, &mut changed)?,
            Cmd::IncreaseIndent => self.increase_indent(&mut changed)?,
            Cmd::DecreaseIndent => self.decrease_indent(&mut changed)?,
            Cmd::ToggleBulletList => self.toggle_bullet_list(&mut changed)?,
            Cmd::ToggleNumberedList => self.toggle_numbered_list(&mut changed)?,
            Cmd::SetAlignment(alignment) => self.set_alignment(alignment, &mut changed),
            Cmd::InsertTable { rows, columns } => {
                let at = self.delete_selection(&mut changed)?;
                let inserted = self.buffer.insert_table(at, rows.max(1), columns.max(1))?;
                changed.push(at..at + inserted);
                self.collapse_to(at + inserted);
                self.refresh_pending_style();
            }
        }

        self.version += 1;
        Ok(Patch {
            changed,
            new_selection: self.selection(),
            version: self.version,
        })
    }

    pub fn selection_has_bullet_list(&self) -> bool {
        let chars = self.chars();
        selected_lines(&chars, &self.selection())
            .iter()
            .all(|line| starts_with_bullet(&chars, line))
    }

    pub fn selection_has_numbered_list(&self) -> bool {
        let chars = self.chars();
        selected_lines(&chars, &self.selection())
            .iter()
            .all(|line| number_prefix_len(&chars, line).is_some())
    }

    /// Deletes a non-empty selection and returns where the caret ends up.
    fn delete_selection(&mut self, changed: &mut Vec<Range<usize>>) -> Result<usize, BufferError> {
        let selection = self.selection();
        if !selection.is_empty() {
            self.buffer.delete_range(selection.start, selection.len())?;
            changed.push(selection.start..selection.start);
            self.collapse_to(selection.start);
        }
        Ok(self.caret)
    }

    fn apply_style(
        &mut self,
        change: &StyleChange,
        changed: &mut Vec<Range<usize>>,
    ) -> Result<(), BufferError> {
        if !change.is_valid() {
            return Ok(());
        }
        let selection = self.selection();
        if selection.is_empty() {
            self.pending_style = change.apply(&self.pending_style);
        } else {
            self.buffer
                .apply_style(selection.start, selection.len(), |style| change.apply(style))?;
            changed.push(selection);
        }
        Ok(())
    }

    fn increase_indent(&mut self, changed: &mut Vec<Range<usize>>) -> Result<(), BufferError> {
        let lines = self.selected_lines();
        let indent = " ".repeat(self.indent.spaces_per_tab);
        let step = indent.chars().count();

        for line in lines.iter().rev() {
            let style = self.style_for_insertion(line.start)?;
            self.buffer.insert_text(line.start, &indent, style)?;
        }
        for (index, line) in lines.iter().enumerate() {
            let start = line.start + index * step;
            changed.push(start..start + step);
        }
        self.select_lines(&lines, (lines.len() * step) as isize);
        Ok(())
    }

    fn decrease_indent(&mut self, changed: &mut Vec<Range<usize>>) -> Result<(), BufferError> {
        let lines = self.selected_lines();
        let chars = self.chars();
        let removals: Vec<usize> = lines
            .iter()
            .map(|line| indent_removal(&chars, line, self.indent.spaces_per_tab))
            .collect();

        for (line, removal) in lines.iter().zip(&removals).rev() {
            if *removal > 0 {
                self.buffer.delete_range(line.start, *removal)?;
            }
        }
        let mut removed = 0;
        for (line, removal) in lines.iter().zip(&removals) {
            if *removal > 0 {
                let start = line.start - removed;
                changed.push(start..start);
                removed += removal;
            }
        }
        self.select_lines(&lines, -(removed as isize));
        Ok(())
    }

    fn toggle_bullet_list(&mut self, changed: &mut Vec<Range<usize>>) -> Result<(), BufferError> {
        let lines = self.selected_lines();
        let chars = self.chars();
        let all_bulleted = lines.iter().all(|line| starts_with_bullet(&chars, line));
        let mut delta: isize = 0;

        for line in lines.iter().rev() {
            if all_bulleted {
                let removal = bullet_prefix_len(&chars, line);
                self.buffer.delete_range(line.start, removal)?;
                delta -= removal as isize;
            } else {
                let style = self.style_for_insertion(line.start)?;
                self.buffer.insert_text(line.start, BULLET_PREFIX, style)?;
                delta += BULLET_PREFIX.chars().count() as isize;
            }
        }
        self.record_prefix_edits(&lines, delta, changed);
        self.select_lines(&lines, delta);
        Ok(())
    }

    fn toggle_numbered_list(&mut self, changed: &mut Vec<Range<usize>>) -> Result<(), BufferError> {
        let lines = self.selected_lines();
        let chars = self.chars();
        let all_numbered = lines
            .iter()
            .all(|line| number_prefix_len(&chars, line).is_some());
        let mut delta: isize = 0;

        for (index, line) in lines.iter().enumerate().rev() {
            let existing = if starts_with_bullet(&chars, line) {
                bullet_prefix_len(&chars, line)
            } else {
                number_prefix_len(&chars, line).unwrap_or(0)
            };
            if existing > 0 {
                self.buffer.delete_range(line.start, existing)?;
                delta -= existing as isize;
            }
            if !all_numbered {
                let prefix = format!("{}. ", index + 1);
                let style = self.style_for_insertion(line.start)?;
                self.buffer.insert_text(line.start, &prefix, style)?;
                delta += prefix.chars().count() as isize;
            }
        }
        self.record_prefix_edits(&lines, delta, changed);
        self.select_lines(&lines, delta);
        Ok(())
    }

    fn set_alignment(&mut self, alignment: TextAlignment, changed: &mut Vec<Range<usize>>) {
        let lines = self.selected_lines();
        let paragraphs: Vec<(usize, usize)> =
            lines.iter().map(|line| (line.start, line.len)).collect();
        let updated = if alignment == TextAlignment::Left {
            self.buffer.clear_paragraph_alignment(&paragraphs)
        } else {
            self.buffer.set_paragraph_alignment(&paragraphs, alignment)
        };
        if updated {
            changed.extend(lines.iter().map(|line| line.start..line.end()));
        }
    }

    /// Records the span from the first selected line to the end of the last
    /// one after a prefix edit.
    fn record_prefix_edits(&self, lines: &[LineRange], delta: isize, changed: &mut Vec<Range<usize>>) {
        if let (Some(first), Some(last)) = (lines.first(), lines.last()) {
            let end = (last.end() as isize + delta).max(first.start as isize) as usize;
            changed.push(first.start..end);
        }
    }

    /// Selects from the first line's start to the last line's original end
    /// shifted by `delta`, with the caret at the end.
    fn select_lines(&mut self, lines: &[LineRange], delta: isize) {
        let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
            return;
        };
        let end = (last.end() as isize + delta).max(first.start as isize) as usize;
        self.anchor = first.start;
        self.caret = end.min(self.buffer.len());
        self.refresh_pending_style();
    }

    fn selected_lines(&self) -> Vec<LineRange> {
        selected_lines(&self.chars(), &self.selection())
    }

    fn chars(&self) -> Vec<char> {
        self.buffer.text().chars().collect()
    }

    fn style_for_insertion(&self, offset: usize) -> Result<RichTextStyle, BufferError> {
        if self.buffer.is_empty() {
            return Ok(self.pending_style.clone());
        }
        self.buffer.style_at(offset.min(self.buffer.len() - 1))
    }

    fn collapse_to(&mut self, offset: usize) {
        self.anchor = offset;
        self.caret = offset;
    }

    /// The pending style follows the character before the caret.
    fn refresh_pending_style(&mut self) {
        let len = self.buffer.len();
        self.pending_style = if len == 0 {
            RichTextStyle::default()
        } else {
            let offset = self.caret.saturating_sub(1).min(len - 1);
            self.buffer.style_at(offset).unwrap_or_default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor(text: &str) -> Editor {
        let mut editor = Editor::default();
        editor.set_text(text);
        editor
    }

    fn select(editor: &mut Editor, anchor: usize, caret: usize) {
        editor.apply(Cmd::SetSelection { anchor, caret }).unwrap();
    }

    #[test]
    fn test_typing_replaces_selection() {
        let mut editor = editor("Hello world");
        select(&mut editor, 6, 11);

        let patch = editor
            .apply(Cmd::InsertText {
                text: "there".to_string(),
            })
            .unwrap();

        assert_eq!(editor.text(), "Hello there");
        assert_eq!(patch.new_selection, 11..11);
        assert_eq!(patch.changed, vec![6..6, 6..11]);
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut editor = editor("abc");
        select(&mut editor, 2, 2);

        editor.apply(Cmd::DeleteBackward).unwrap();
        assert_eq!((editor.text(), editor.caret()), ("ac", 1));

        editor.apply(Cmd::DeleteForward).unwrap();
        assert_eq!((editor.text(), editor.caret()), ("a", 1));

        let patch = editor.apply(Cmd::DeleteForward).unwrap();
        assert!(patch.is_noop());
        assert_eq!(editor.text(), "a");
    }

    #[test]
    fn test_bold_without_selection_sets_pending_style() {
        let mut editor = editor("ab");
        select(&mut editor, 2, 2);

        editor.apply(Cmd::Style(StyleChange::ToggleBold)).unwrap();
        editor
            .apply(Cmd::InsertText {
                text: "c".to_string(),
            })
            .unwrap();

        assert_eq!(editor.buffer().runs().len(), 2);
        assert!(editor.buffer().style_at(2).unwrap().is_bold());
        assert!(editor.pending_style().is_bold());
    }

    #[test]
    fn test_invalid_font_size_is_ignored() {
        let mut editor = editor("ab");
        select(&mut editor, 0, 2);

        let patch = editor
            .apply(Cmd::Style(StyleChange::FontSize(-3.0)))
            .unwrap();

        assert!(patch.is_noop());
        assert_eq!(editor.buffer().runs().len(), 1);
    }

    #[test]
    fn test_indent_round_trip() {
        let mut editor = editor("one\ntwo");
        select(&mut editor, 0, 7);

        editor.apply(Cmd::IncreaseIndent).unwrap();
        assert_eq!(editor.text(), "    one\n    two");
        assert_eq!(editor.selection(), 0..15);

        editor.apply(Cmd::DecreaseIndent).unwrap();
        assert_eq!(editor.text(), "one\ntwo");
        assert_eq!(editor.selection(), 0..7);
    }

    #[test]
    fn test_bullet_list_toggles() {
        let mut editor = editor("a\nb");
        select(&mut editor, 0, 3);

        editor.apply(Cmd::ToggleBulletList).unwrap();
        assert_eq!(editor.text(), "• a\n• b");
        assert!(editor.selection_has_bullet_list());

        editor.apply(Cmd::ToggleBulletList).unwrap();
        assert_eq!(editor.text(), "a\nb");
        assert!(!editor.selection_has_bullet_list());
    }

    #[test]
    fn test_numbered_list_replaces_bullets() {
        let mut editor = editor("• a\nb");
        select(&mut editor, 0, 5);

        editor.apply(Cmd::ToggleNumberedList).unwrap();
        assert_eq!(editor.text(), "1. a\n2. b");
        assert!(editor.selection_has_numbered_list());
        assert_eq!(editor.selection(), 0..9);

        editor.apply(Cmd::ToggleNumberedList).unwrap();
        assert_eq!(editor.text(), "a\nb");
    }

    #[test]
    fn test_left_alignment_clears_override() {
        let mut editor = editor("a\nb");
        select(&mut editor, 2, 2);

        editor
            .apply(Cmd::SetAlignment(TextAlignment::Center))
            .unwrap();
        assert_eq!(
            editor.buffer().paragraph_alignment(2),
            Some(TextAlignment::Center)
        );

        editor.apply(Cmd::SetAlignment(TextAlignment::Left)).unwrap();
        assert_eq!(editor.buffer().paragraph_alignment(2), None);
    }

    #[test]
    fn test_insert_table_clamps_dimensions() {
        let mut editor = editor("");

        let patch = editor
            .apply(Cmd::InsertTable {
                rows: 0,
                columns: 0,
            })
            .unwrap();

        assert_eq!(editor.text(), "Header 1\n");
        assert_eq!(patch.new_selection, 9..9);
        assert_eq!(editor.buffer().tables().len(), 1);
    }

    #[test]
    fn test_versions_increase() {
        let mut editor = editor("x");
        let before = editor.version();

        let first = editor.apply(Cmd::DeleteSelection).unwrap();
        let second = editor.apply(Cmd::DeleteSelection).unwrap();

        assert_eq!(first.version, before + 1);
        assert_eq!(second.version, before + 2);
    }
}
