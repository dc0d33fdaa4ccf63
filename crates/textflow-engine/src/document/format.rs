//! Text formatting values and top-down inheritance resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Collection, FlowDocument, NodeId, Owner};

/// 8-bit sRGB colour with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const LIGHT_GRAY: Color = Color::rgb(211, 211, 211);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Numeric font weight on the usual 100..=900 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontStretch {
    Condensed,
    #[default]
    Normal,
    Expanded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextDecorations {
    pub underline: bool,
    pub strikethrough: bool,
    pub overline: bool,
}

impl TextDecorations {
    pub const NONE: TextDecorations = TextDecorations {
        underline: false,
        strikethrough: false,
        overline: false,
    };

    pub const UNDERLINE: TextDecorations = TextDecorations {
        underline: true,
        strikethrough: false,
        overline: false,
    };

    pub fn is_empty(&self) -> bool {
        !self.underline && !self.strikethrough && !self.overline
    }

    pub fn union(self, other: TextDecorations) -> TextDecorations {
        TextDecorations {
            underline: self.underline || other.underline,
            strikethrough: self.strikethrough || other.strikethrough,
            overline: self.overline || other.overline,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlignment {
    /// Share of the spare horizontal space placed before the content.
    pub fn offset_factor(self) -> f64 {
        match self {
            TextAlignment::Left | TextAlignment::Justify => 0.0,
            TextAlignment::Center => 0.5,
            TextAlignment::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// Per-node formatting overrides. `None` inherits from the nearest ancestor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextProperties {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_style: Option<FontStyle>,
    pub font_weight: Option<FontWeight>,
    pub font_stretch: Option<FontStretch>,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub decorations: Option<TextDecorations>,
}

impl TextProperties {
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn with_font_style(mut self, style: FontStyle) -> Self {
        self.font_style = Some(style);
        self
    }

    pub fn with_font_weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = Some(weight);
        self
    }

    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_decorations(mut self, decorations: TextDecorations) -> Self {
        self.decorations = Some(decorations);
        self
    }
}

/// Fully inherited formatting for one node, as handed to the text shaper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFormat {
    pub font_family: String,
    pub font_size: f64,
    pub font_style: FontStyle,
    pub font_weight: FontWeight,
    pub font_stretch: FontStretch,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub decorations: TextDecorations,
}

impl Default for ResolvedFormat {
    fn default() -> Self {
        Self {
            font_family: String::new(),
            font_size: 14.0,
            font_style: FontStyle::Normal,
            font_weight: FontWeight::NORMAL,
            font_stretch: FontStretch::Normal,
            foreground: Some(Color::BLACK),
            background: None,
            decorations: TextDecorations::NONE,
        }
    }
}

impl ResolvedFormat {
    /// Applies `overrides` on top of this (inherited) format. Decorations
    /// accumulate down the tree instead of replacing each other.
    pub fn derive(&self, overrides: &TextProperties) -> ResolvedFormat {
        ResolvedFormat {
            font_family: overrides
                .font_family
                .clone()
                .unwrap_or_else(|| self.font_family.clone()),
            font_size: overrides
                .font_size
                .filter(|size| size.is_finite() && *size > 0.0)
                .unwrap_or(self.font_size),
            font_style: overrides.font_style.unwrap_or(self.font_style),
            font_weight: overrides.font_weight.unwrap_or(self.font_weight),
            font_stretch: overrides.font_stretch.unwrap_or(self.font_stretch),
            foreground: overrides.foreground.or(self.foreground),
            background: overrides.background.or(self.background),
            decorations: overrides
                .decorations
                .map(|decorations| self.decorations.union(decorations))
                .unwrap_or(self.decorations),
        }
    }
}

/// Resolved format of every attached node, computed once per layout pass.
#[derive(Debug, Default)]
pub struct FormatCache {
    root: ResolvedFormat,
    formats: HashMap<NodeId, ResolvedFormat>,
}

impl FormatCache {
    /// Format for `node`, falling back to the document defaults for nodes
    /// that were not reachable when the cache was built.
    pub fn get(&self, node: NodeId) -> &ResolvedFormat {
        self.formats.get(&node).unwrap_or(&self.root)
    }

    pub fn root(&self) -> &ResolvedFormat {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

/// Walks the attached tree once and resolves inheritance for every node.
pub fn resolve_formats(doc: &FlowDocument) -> FormatCache {
    let root = doc.defaults().resolved_format();
    let mut cache = FormatCache {
        root: root.clone(),
        formats: HashMap::new(),
    };

    let mut stack: Vec<(NodeId, ResolvedFormat)> = doc
        .child_slice(Owner::Document, Collection::Blocks)
        .iter()
        .rev()
        .map(|id| (*id, root.clone()))
        .collect();

    while let Some((id, inherited)) = stack.pop() {
        let Some(element) = doc.get(id) else {
            continue;
        };
        let resolved = inherited.derive(&element.format);
        for collection in element.kind.collections() {
            for child in doc.child_slice(Owner::Node(id), *collection).iter().rev() {
                stack.push((*child, resolved.clone()));
            }
        }
        cache.formats.insert(id, resolved);
    }

    cache
}
