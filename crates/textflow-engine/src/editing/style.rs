use serde::{Deserialize, Serialize};

use crate::document::format::{Color, FontStyle, FontWeight, TextDecorations, TextProperties};

/// Character formatting of one run in a [`RichTextBuffer`](super::RichTextBuffer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextStyle {
    /// Empty means the platform default family.
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub underline: bool,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

impl Default for RichTextStyle {
    fn default() -> Self {
        Self {
            font_family: String::new(),
            font_size: 14.0,
            font_weight: FontWeight::NORMAL,
            font_style: FontStyle::Normal,
            underline: false,
            foreground: Some(Color::BLACK),
            background: None,
        }
    }
}

impl RichTextStyle {
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_font_weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = weight;
        self
    }

    pub fn with_font_style(mut self, style: FontStyle) -> Self {
        self.font_style = style;
        self
    }

    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    pub fn with_foreground(mut self, color: Option<Color>) -> Self {
        self.foreground = color;
        self
    }

    pub fn with_background(mut self, color: Option<Color>) -> Self {
        self.background = color;
        self
    }

    pub fn bold(self) -> Self {
        self.with_font_weight(FontWeight::BOLD)
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight >= FontWeight::BOLD
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }

    /// Element overrides for a run carrying this style.
    pub(crate) fn to_properties(&self) -> TextProperties {
        let family = (!self.font_family.is_empty()).then(|| self.font_family.clone());
        TextProperties {
            font_family: family,
            font_size: Some(self.font_size),
            font_style: Some(self.font_style),
            font_weight: Some(self.font_weight),
            font_stretch: None,
            foreground: self.foreground,
            background: self.background,
            decorations: self.underline.then_some(TextDecorations::UNDERLINE),
        }
    }
}
