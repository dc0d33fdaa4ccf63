use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use super::style::RichTextStyle;
use crate::document::format::{Color, FontStyle, FontWeight, TextAlignment};

pub(crate) const BULLET: char = '•';
pub(crate) const BULLET_PREFIX: &str = "• ";

/// Editing commands understood by [`Editor::apply`](super::Editor::apply).
///
/// Commands act on the editor's current selection; offsets are character
/// offsets into the buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Replaces the selection with `text` in the pending style.
    InsertText { text: String },
    DeleteBackward,
    DeleteForward,
    DeleteSelection,
    /// Selects from `anchor` to `caret`, clamped to the buffer.
    SetSelection { anchor: usize, caret: usize },
    Style(StyleChange),
    IncreaseIndent,
    DecreaseIndent,
    ToggleBulletList,
    ToggleNumberedList,
    SetAlignment(TextAlignment),
    InsertTable { rows: usize, columns: usize },
}

/// A character-format edit, applied per run to a selection or to the pending
/// insertion style.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleChange {
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    FontFamily(String),
    /// Ignored unless finite and positive.
    FontSize(f64),
    Foreground(Option<Color>),
    Background(Option<Color>),
}

impl StyleChange {
    pub fn is_valid(&self) -> bool {
        match self {
            StyleChange::FontSize(size) => size.is_finite() && *size > 0.0,
            _ => true,
        }
    }

    pub fn apply(&self, style: &RichTextStyle) -> RichTextStyle {
        let style = style.clone();
        match self {
            StyleChange::ToggleBold => {
                let weight = if style.font_weight == FontWeight::BOLD {
                    FontWeight::NORMAL
                } else {
                    FontWeight::BOLD
                };
                style.with_font_weight(weight)
            }
            StyleChange::ToggleItalic => {
                let font_style = if style.is_italic() {
                    FontStyle::Normal
                } else {
                    FontStyle::Italic
                };
                style.with_font_style(font_style)
            }
            StyleChange::ToggleUnderline => {
                let underline = !style.underline;
                style.with_underline(underline)
            }
            StyleChange::FontFamily(family) => style.with_font_family(family.clone()),
            StyleChange::FontSize(size) => style.with_font_size(*size),
            StyleChange::Foreground(color) => style.with_foreground(*color),
            StyleChange::Background(color) => style.with_background(*color),
        }
    }
}

/// A line of buffer text: its start and length, excluding the newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub len: usize,
}

impl LineRange {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Every line of `chars`. Empty text is one empty line.
pub(crate) fn lines(chars: &[char]) -> Vec<LineRange> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (index, ch) in chars.iter().enumerate() {
        if *ch == '\n' {
            lines.push(LineRange {
                start,
                len: index - start,
            });
            start = index + 1;
        }
    }
    lines.push(LineRange {
        start,
        len: chars.len() - start,
    });
    lines
}

/// Lines touched by `selection`. A selection ending right after a newline
/// does not include the following line.
pub(crate) fn selected_lines(chars: &[char], selection: &Range<usize>) -> Vec<LineRange> {
    let len = chars.len();
    let start = selection.start.min(len);
    let end = selection.end.min(len);
    let last = if end > start { end - 1 } else { start };

    let line_of = |offset: usize| chars[..offset].iter().filter(|ch| **ch == '\n').count();
    let (first_line, last_line) = (line_of(start), line_of(last));
    lines(chars)
        .into_iter()
        .skip(first_line)
        .take(last_line - first_line + 1)
        .collect()
}

fn line_chars<'a>(chars: &'a [char], line: &LineRange) -> &'a [char] {
    &chars[line.start..line.end()]
}

pub(crate) fn starts_with_bullet(chars: &[char], line: &LineRange) -> bool {
    match line_chars(chars, line) {
        [first] => *first == BULLET,
        [first, second, ..] => *first == BULLET && *second == ' ',
        [] => false,
    }
}

/// Characters to delete to drop a bullet prefix.
pub(crate) fn bullet_prefix_len(chars: &[char], line: &LineRange) -> usize {
    if !starts_with_bullet(chars, line) {
        return 0;
    }
    if line.len > 1 { 2 } else { 1 }
}

/// Length of a `"{n}. "` prefix at the start of the line.
pub(crate) fn number_prefix_len(chars: &[char], line: &LineRange) -> Option<usize> {
    static NUMBER_PREFIX: OnceLock<Regex> = OnceLock::new();
    let regex = NUMBER_PREFIX
        .get_or_init(|| Regex::new(r"^\d+\. ").expect("Invalid number prefix regex"));
    let text: String = line_chars(chars, line).iter().collect();
    regex
        .find(&text)
        .map(|found| found.as_str().chars().count())
}

/// Leading indentation removed by one outdent step: a single tab, or up to
/// `spaces_per_tab` spaces.
pub(crate) fn indent_removal(chars: &[char], line: &LineRange, spaces_per_tab: usize) -> usize {
    let content = line_chars(chars, line);
    if content.first() == Some(&'\t') {
        return 1;
    }
    content
        .iter()
        .take(spaces_per_tab)
        .take_while(|ch| **ch == ' ')
        .count()
}
