//! The text-shaping contract consumed by the layout engine, plus a
//! deterministic monospace implementation.
//!
//! Positions are character (Unicode scalar) indices into the shaped text.

use std::fmt::Debug;
use std::rc::Rc;

use crate::document::format::{FlowDirection, ResolvedFormat, TextAlignment};
use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextWrapping {
    #[default]
    Wrap,
    NoWrap,
}

/// Formatting override for `len` characters starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRange {
    pub start: usize,
    pub len: usize,
    pub format: ResolvedFormat,
}

/// Everything a shaper needs to lay out one block of text.
#[derive(Debug, Clone)]
pub struct TextRequest<'a> {
    pub text: &'a str,
    pub format: &'a ResolvedFormat,
    pub alignment: TextAlignment,
    pub wrapping: TextWrapping,
    /// Maximum line width; `f64::INFINITY` for unbounded.
    pub max_width: f64,
    /// Explicit line height; `None` lets the shaper pick one from the font.
    pub line_height: Option<f64>,
    pub flow_direction: FlowDirection,
    pub runs: &'a [StyledRange],
}

/// Shaped, immutable text ready to measure, hit-test and paint.
pub trait ShapedText: Debug {
    fn text(&self) -> &str;
    /// Number of characters in [`text`](Self::text).
    fn text_length(&self) -> usize;
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    /// Character position closest to `point`, in layout-local coordinates.
    fn hit_test_point(&self, point: Point) -> usize;
    /// Caret rectangle for `position`, zero width.
    fn hit_test_text_position(&self, position: usize) -> Rect;
    /// Rectangles covering `len` characters from `start`, one per line.
    fn hit_test_text_range(&self, start: usize, len: usize) -> Vec<Rect>;
}

pub trait TextShaper {
    fn shape(&self, request: &TextRequest<'_>) -> Rc<dyn ShapedText>;
}

// ────────────────────────────────────────────────────────────────────────────
// MonospaceShaper
// ────────────────────────────────────────────────────────────────────────────

/// Fixed-advance shaper: every character is `0.5 × font size` wide and a line
/// is `1.5 × font size` tall unless the request sets a line height.
///
/// Only the base format's size is used; run overrides do not change metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonospaceShaper;

impl MonospaceShaper {
    pub const ADVANCE_RATIO: f64 = 0.5;
    pub const LINE_HEIGHT_RATIO: f64 = 1.5;
}

impl TextShaper for MonospaceShaper {
    fn shape(&self, request: &TextRequest<'_>) -> Rc<dyn ShapedText> {
        Rc::new(MonospaceLayout::new(request))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LineSpan {
    /// First character of the line.
    start: usize,
    /// One past the last character shown on the line (excludes a hard break).
    end: usize,
    /// Characters drawn, excluding trailing spaces of a soft-wrapped line.
    visible: usize,
    x: f64,
}

#[derive(Debug, Clone)]
pub struct MonospaceLayout {
    text: String,
    length: usize,
    lines: Vec<LineSpan>,
    advance: f64,
    line_height: f64,
    width: f64,
}

impl MonospaceLayout {
    fn new(request: &TextRequest<'_>) -> Self {
        let size = request.format.font_size;
        let advance = size * MonospaceShaper::ADVANCE_RATIO;
        let line_height = request
            .line_height
            .filter(|height| height.is_finite() && *height > 0.0)
            .unwrap_or(size * MonospaceShaper::LINE_HEIGHT_RATIO);

        let chars: Vec<char> = request.text.chars().collect();
        let max_chars = match request.wrapping {
            TextWrapping::Wrap if request.max_width.is_finite() && advance > 0.0 => {
                Some(((request.max_width / advance).floor() as usize).max(1))
            }
            _ => None,
        };

        let mut lines = Vec::new();
        let mut line_start = 0;
        for (index, ch) in chars.iter().enumerate() {
            if *ch == '\n' {
                wrap_line(&chars, line_start, index, max_chars, &mut lines);
                line_start = index + 1;
            }
        }
        wrap_line(&chars, line_start, chars.len(), max_chars, &mut lines);

        let width = lines
            .iter()
            .map(|line| line.visible as f64 * advance)
            .fold(0.0, f64::max);
        let frame = if request.max_width.is_finite() {
            request.max_width.max(width)
        } else {
            width
        };
        let factor = request.alignment.offset_factor();
        for line in &mut lines {
            line.x = (frame - line.visible as f64 * advance) * factor;
        }

        Self {
            text: request.text.to_string(),
            length: chars.len(),
            lines,
            advance,
            line_height,
            width,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_for_position(&self, position: usize) -> usize {
        self.lines
            .iter()
            .rposition(|line| line.start <= position)
            .unwrap_or(0)
    }

    fn x_of(&self, line: &LineSpan, position: usize) -> f64 {
        let column = position.clamp(line.start, line.end) - line.start;
        line.x + column as f64 * self.advance
    }
}

/// Appends the lines of the hard line `[start, end)`, soft-wrapping at the
/// last space that fits, or mid-word when none does.
fn wrap_line(
    chars: &[char],
    start: usize,
    end: usize,
    max_chars: Option<usize>,
    lines: &mut Vec<LineSpan>,
) {
    let mut line_start = start;
    loop {
        let remaining = end - line_start;
        let limit = match max_chars {
            Some(limit) if remaining > limit => limit,
            _ => {
                lines.push(LineSpan {
                    start: line_start,
                    end,
                    visible: remaining,
                    x: 0.0,
                });
                return;
            }
        };

        let break_at = (line_start + 1..line_start + limit)
            .rev()
            .find(|index| chars[*index] == ' ')
            .map(|space| space + 1)
            .unwrap_or(line_start + limit);
        let visible = chars[line_start..break_at]
            .iter()
            .rev()
            .skip_while(|ch| **ch == ' ')
            .count();
        lines.push(LineSpan {
            start: line_start,
            end: break_at,
            visible,
            x: 0.0,
        });
        line_start = break_at;
    }
}

impl ShapedText for MonospaceLayout {
    fn text(&self) -> &str {
        &self.text
    }

    fn text_length(&self) -> usize {
        self.length
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height
    }

    fn hit_test_point(&self, point: Point) -> usize {
        let row = if point.y <= 0.0 || self.line_height <= 0.0 {
            0
        } else {
            ((point.y / self.line_height).floor() as usize).min(self.lines.len() - 1)
        };
        let line = &self.lines[row];
        if self.advance <= 0.0 {
            return line.start;
        }
        let column = ((point.x - line.x) / self.advance).round().max(0.0) as usize;
        line.start + column.min(line.end - line.start)
    }

    fn hit_test_text_position(&self, position: usize) -> Rect {
        let position = position.min(self.length);
        let row = self.line_for_position(position);
        let line = &self.lines[row];
        Rect::new(
            self.x_of(line, position),
            row as f64 * self.line_height,
            0.0,
            self.line_height,
        )
    }

    fn hit_test_text_range(&self, start: usize, len: usize) -> Vec<Rect> {
        let end = start.saturating_add(len).min(self.length);
        let start = start.min(self.length);
        let mut rects = Vec::new();
        for (row, line) in self.lines.iter().enumerate() {
            let from = start.max(line.start);
            let to = end.min(line.end);
            let y = row as f64 * self.line_height;
            if from < to {
                let x = self.x_of(line, from);
                rects.push(Rect::new(
                    x,
                    y,
                    (to - from) as f64 * self.advance,
                    self.line_height,
                ));
            } else if line.start >= start && line.start < end {
                rects.push(Rect::new(line.x, y, 0.0, self.line_height));
            }
        }
        rects
    }
}
