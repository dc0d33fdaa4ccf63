use std::rc::Rc;

use textflow_config::LayoutConfig;

use super::entry::{
    AnchoredAlignment, AnchoredLayout, EntryContent, LayoutEntry, MarkerInfo, extent,
    hidden_markers,
};
use super::shaping::{ShapedText, StyledRange, TextRequest, TextShaper, TextWrapping};
use crate::document::format::{Color, ResolvedFormat, TextAlignment};
use crate::document::{
    AnchorPlacement, AnchoredProps, Collection, DocumentId, Element, FigureHorizontalAnchor,
    FlowDocument, FormatCache, HorizontalAlignment, ListProps, NodeId, NodeKind, Owner,
    resolve_formats,
};
use crate::geometry::{Size, Thickness, shrink_width};

/// Result of one layout pass: entries in paint order plus page metrics.
#[derive(Debug)]
pub struct DocumentLayout {
    pub entries: Vec<LayoutEntry>,
    pub page_padding: Thickness,
    pub background: Option<Color>,
    /// Width the caller laid out for; infinite when unbounded.
    pub viewport_width: f64,
    /// Width available to blocks after the page padding.
    pub width_constraint: f64,
    pub(crate) marker_padding: f64,
}

impl DocumentLayout {
    /// Desired size of the whole document, page padding included.
    pub fn size(&self) -> Size {
        let content = extent(&self.entries);
        Size::new(
            content.width + self.page_padding.horizontal(),
            content.height + self.page_padding.vertical(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    document: DocumentId,
    revision: u64,
    width: u64,
}

/// Lays out a [`FlowDocument`] against an available width.
///
/// The last result is cached and reused until the document revision or the
/// width changes.
pub struct LayoutEngine<S: TextShaper> {
    shaper: S,
    config: LayoutConfig,
    cache: Option<(CacheKey, Rc<DocumentLayout>)>,
}

impl<S: TextShaper> LayoutEngine<S> {
    pub fn new(shaper: S) -> Self {
        Self::with_config(shaper, LayoutConfig::default())
    }

    pub fn with_config(shaper: S, config: LayoutConfig) -> Self {
        Self {
            shaper,
            config,
            cache: None,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn shaper(&self) -> &S {
        &self.shaper
    }

    /// Drops the cached layout so the next call runs a full pass.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn layout(&mut self, doc: &FlowDocument, width: f64) -> Rc<DocumentLayout> {
        let width = normalize_width(width);
        let key = CacheKey {
            document: doc.id(),
            revision: doc.revision(),
            width: width.to_bits(),
        };
        if let Some((cached_key, layout)) = &self.cache
            && *cached_key == key
        {
            return Rc::clone(layout);
        }

        let layout = Rc::new(self.run_pass(doc, width));
        self.cache = Some((key, Rc::clone(&layout)));
        layout
    }

    fn run_pass(&self, doc: &FlowDocument, width: f64) -> DocumentLayout {
        let defaults = doc.defaults();
        let padding = defaults.page_padding;
        let width_constraint = shrink_width(width, padding.horizontal());
        log::debug!(
            "layout pass: {} top-level blocks, width constraint {width_constraint}",
            doc.blocks().len()
        );

        let pass = LayoutPass {
            doc,
            shaper: &self.shaper,
            config: &self.config,
            formats: resolve_formats(doc),
        };
        let mut entries = Vec::new();
        for block in doc.blocks() {
            let mut pending = None;
            pass.append_block(*block, width_constraint, &mut entries, 0.0, 0.0, &mut pending);
        }

        DocumentLayout {
            entries,
            page_padding: padding,
            background: defaults.background,
            viewport_width: width,
            width_constraint,
            marker_padding: self.config.marker_padding,
        }
    }
}

/// NaN and infinity mean unbounded; negative widths clamp to zero.
fn normalize_width(width: f64) -> f64 {
    if width.is_nan() {
        log::warn!("layout width is NaN, laying out unbounded");
        return f64::INFINITY;
    }
    if width < 0.0 {
        log::warn!("negative layout width {width} clamped to zero");
        return 0.0;
    }
    width
}

// ────────────────────────────────────────────────────────────────────────────
// LayoutPass
// ────────────────────────────────────────────────────────────────────────────

/// State shared by one pass over the tree.
pub(crate) struct LayoutPass<'a, S: TextShaper> {
    pub doc: &'a FlowDocument,
    pub shaper: &'a S,
    pub config: &'a LayoutConfig,
    pub formats: FormatCache,
}

enum ParagraphContent<'a> {
    Inlines(&'a [NodeId]),
    Text(&'a str),
}

/// Text accumulated between anchored blocks, with per-run formats.
#[derive(Default)]
struct TextSegment {
    text: String,
    len: usize,
    runs: Vec<StyledRange>,
}

impl TextSegment {
    fn push(&mut self, text: &str, format: &ResolvedFormat) {
        if text.is_empty() {
            return;
        }
        let len = text.chars().count();
        self.runs.push(StyledRange {
            start: self.len,
            len,
            format: format.clone(),
        });
        self.text.push_str(text);
        self.len += len;
    }
}

struct ParagraphBuilder {
    node: NodeId,
    format: ResolvedFormat,
    alignment: TextAlignment,
    line_height: Option<f64>,
    text_constraint: f64,
    base_margin: Thickness,
    visible: Option<Vec<MarkerInfo>>,
    hidden: Option<Vec<MarkerInfo>>,
    segment: TextSegment,
    entries: Vec<LayoutEntry>,
    emitted_text: bool,
}

impl ParagraphBuilder {
    fn flush<S: TextShaper>(&mut self, pass: &LayoutPass<'_, S>) {
        if self.segment.text.is_empty() {
            return;
        }
        let segment = std::mem::take(&mut self.segment);
        let layout = pass.shape(
            &segment.text,
            &self.format,
            self.alignment,
            TextWrapping::Wrap,
            self.text_constraint,
            self.line_height,
            &segment.runs,
        );
        let markers = if self.emitted_text {
            self.hidden.clone()
        } else {
            self.visible.clone()
        };
        self.entries
            .push(LayoutEntry::text(self.node, layout, self.base_margin).with_markers(markers));
        self.emitted_text = true;
    }
}

impl<S: TextShaper> LayoutPass<'_, S> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn shape(
        &self,
        text: &str,
        format: &ResolvedFormat,
        alignment: TextAlignment,
        wrapping: TextWrapping,
        max_width: f64,
        line_height: Option<f64>,
        runs: &[StyledRange],
    ) -> Rc<dyn ShapedText> {
        self.shaper.shape(&TextRequest {
            text,
            format,
            alignment,
            wrapping,
            max_width,
            line_height,
            flow_direction: self.doc.defaults().flow_direction,
            runs,
        })
    }

    /// Appends the entries for `block` to `out`. `pending` carries list
    /// markers waiting for the next text entry and is updated in place.
    pub(crate) fn append_block(
        &self,
        block: NodeId,
        constraint: f64,
        out: &mut Vec<LayoutEntry>,
        left_indent: f64,
        right_indent: f64,
        pending: &mut Option<Vec<MarkerInfo>>,
    ) {
        let Some(element) = self.doc.get(block) else {
            return;
        };
        match &element.kind {
            NodeKind::Paragraph => {
                let markers = pending.take().filter(|markers| !markers.is_empty());
                let inlines = self.doc.child_slice(Owner::Node(block), Collection::Inlines);
                out.extend(self.paragraph_entries(
                    block,
                    element,
                    ParagraphContent::Inlines(inlines),
                    constraint,
                    left_indent,
                    right_indent,
                    markers,
                ));
            }
            NodeKind::Section => self.append_section(
                block,
                element,
                constraint,
                out,
                left_indent,
                right_indent,
                pending,
            ),
            NodeKind::List(props) => self.append_list(
                block,
                element,
                props,
                constraint,
                out,
                left_indent,
                right_indent,
                pending,
            ),
            NodeKind::Table(props) => {
                out.push(self.table_entry(block, element, props, constraint, left_indent, right_indent));
                *pending = None;
            }
            NodeKind::Opaque { text, .. } => {
                if text.is_empty() {
                    return;
                }
                let markers = pending.take().filter(|markers| !markers.is_empty());
                out.extend(self.paragraph_entries(
                    block,
                    element,
                    ParagraphContent::Text(text),
                    constraint,
                    left_indent,
                    right_indent,
                    markers,
                ));
            }
            other => log::warn!("{} node {block} is not a block, skipped", other.name()),
        }
    }

    fn append_section(
        &self,
        section: NodeId,
        element: &Element,
        constraint: f64,
        out: &mut Vec<LayoutEntry>,
        left_indent: f64,
        right_indent: f64,
        pending: &mut Option<Vec<MarkerInfo>>,
    ) {
        let start = out.len();
        let child_left = left_indent + element.margin.left;
        let child_right = right_indent + element.margin.right;

        let template = pending.clone().filter(|markers| !markers.is_empty());
        let hidden = template.as_deref().and_then(hidden_markers);
        let mut needs_visible = template.is_some();
        let mut local = pending.take();

        for child in self.doc.child_slice(Owner::Node(section), Collection::Blocks) {
            let mut for_child = if needs_visible {
                template.clone()
            } else {
                hidden.clone()
            };
            self.append_block(*child, constraint, out, child_left, child_right, &mut for_child);
            needs_visible = for_child.is_some();
            local = for_child;
        }

        *pending = local;
        apply_container_margin(&mut out[start..], element.margin);
    }

    #[allow(clippy::too_many_arguments)]
    fn append_list(
        &self,
        list: NodeId,
        element: &Element,
        props: &ListProps,
        constraint: f64,
        out: &mut Vec<LayoutEntry>,
        left_indent: f64,
        right_indent: f64,
        pending: &mut Option<Vec<MarkerInfo>>,
    ) {
        let start = out.len();
        let child_left = left_indent + element.margin.left;
        let child_right = right_indent + element.margin.right;

        let mut outer = pending.take();
        let mut index = props.first_index();

        for item in self.doc.child_slice(Owner::Node(list), Collection::ListItems) {
            let mut visible = outer.clone().unwrap_or_default();
            visible.push(self.list_marker(list, props, index));
            let hidden = hidden_markers(&visible);
            let mut needs_visible = true;

            let blocks = self.doc.child_slice(Owner::Node(*item), Collection::Blocks);
            for block in blocks {
                let mut for_block = if needs_visible {
                    Some(visible.clone())
                } else {
                    hidden.clone()
                };
                self.append_block(*block, constraint, out, child_left, child_right, &mut for_block);
                if outer.is_some() {
                    outer = for_block.clone();
                }
                needs_visible = for_block.is_some();
            }

            if blocks.is_empty() {
                outer = Some(visible);
            }
            index += 1;
        }

        *pending = outer;
        apply_container_margin(&mut out[start..], element.margin);
    }

    fn list_marker(&self, list: NodeId, props: &ListProps, index: i32) -> MarkerInfo {
        let layout = self.shape(
            &props.marker_text(index),
            self.formats.get(list),
            TextAlignment::Left,
            TextWrapping::NoWrap,
            f64::INFINITY,
            None,
            &[],
        );
        let width = props
            .marker_offset
            .max(layout.width() + self.config.marker_padding);
        MarkerInfo {
            layout,
            width,
            visible: true,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn paragraph_entries(
        &self,
        node: NodeId,
        element: &Element,
        content: ParagraphContent<'_>,
        constraint: f64,
        left_indent: f64,
        right_indent: f64,
        markers: Option<Vec<MarkerInfo>>,
    ) -> Vec<LayoutEntry> {
        let defaults = self.doc.defaults();
        let margin = element.margin.add(left_indent, 0.0, right_indent, 0.0);
        let marker_indent: f64 = markers.iter().flatten().map(|marker| marker.width).sum();

        let mut builder = ParagraphBuilder {
            node,
            format: self.formats.get(node).clone(),
            alignment: element.alignment.unwrap_or(defaults.alignment),
            line_height: element.line_height.or(defaults.line_height),
            text_constraint: shrink_width(constraint, margin.horizontal() + marker_indent),
            base_margin: Thickness::new(margin.left, 0.0, margin.right, 0.0),
            hidden: markers.as_deref().and_then(hidden_markers),
            visible: markers,
            segment: TextSegment::default(),
            entries: Vec::new(),
            emitted_text: false,
        };

        match content {
            ParagraphContent::Inlines(inlines) => {
                for inline in inlines {
                    let Some(child) = self.doc.get(*inline) else {
                        continue;
                    };
                    if let NodeKind::Anchored(props) = &child.kind {
                        builder.flush(self);
                        let entry = self.anchored_entry(
                            *inline,
                            child,
                            props,
                            constraint,
                            builder.base_margin,
                            builder.hidden.clone(),
                        );
                        builder.entries.push(entry);
                        continue;
                    }
                    self.append_inline(*inline, &mut builder.segment);
                }
            }
            ParagraphContent::Text(text) => {
                let format = builder.format.clone();
                builder.segment.push(text, &format);
            }
        }
        builder.flush(self);

        if builder.entries.is_empty() {
            let layout = self.shape(
                "",
                &builder.format,
                builder.alignment,
                TextWrapping::Wrap,
                builder.text_constraint,
                builder.line_height,
                &[],
            );
            builder.entries.push(
                LayoutEntry::text(node, layout, builder.base_margin)
                    .with_markers(builder.visible.clone()),
            );
        }

        let mut entries = builder.entries;
        if let Some(first) = entries.first_mut() {
            first.add_margin(0.0, margin.top, 0.0, 0.0);
        }
        if let Some(last) = entries.last_mut() {
            last.add_margin(0.0, 0.0, 0.0, margin.bottom);
        }
        entries
    }

    fn append_inline(&self, inline: NodeId, segment: &mut TextSegment) {
        let Some(element) = self.doc.get(inline) else {
            return;
        };
        let format = self.formats.get(inline);
        match &element.kind {
            NodeKind::Run { text } => segment.push(text, format),
            NodeKind::LineBreak => segment.push("\n", format),
            NodeKind::Span(_) => {
                for child in self.doc.child_slice(Owner::Node(inline), Collection::Inlines) {
                    self.append_inline(*child, segment);
                }
            }
            _ => {
                if let Ok(text) = self.doc.plain_text(inline) {
                    segment.push(&text, format);
                }
            }
        }
    }

    fn anchored_entry(
        &self,
        node: NodeId,
        element: &Element,
        props: &AnchoredProps,
        constraint: f64,
        paragraph_margin: Thickness,
        markers: Option<Vec<MarkerInfo>>,
    ) -> LayoutEntry {
        let own = element.margin;
        let margin = Thickness::new(
            paragraph_margin.left + own.left,
            own.top,
            paragraph_margin.right + own.right,
            own.bottom,
        );

        let mut available = shrink_width(constraint, margin.horizontal());
        let indent: f64 = markers.iter().flatten().map(|marker| marker.width).sum();
        if available.is_finite() && indent > 0.0 {
            available = (available - indent).max(0.0);
        }

        let layout = self.anchored_layout(node, element, props, available);
        LayoutEntry {
            node,
            content: EntryContent::Anchored(layout),
            margin,
            markers: Vec::new(),
            content_indent: 0.0,
        }
        .with_markers(markers)
    }

    fn anchored_layout(
        &self,
        node: NodeId,
        element: &Element,
        props: &AnchoredProps,
        available: f64,
    ) -> AnchoredLayout {
        let padding = props.padding;
        let content_available = shrink_width(available, padding.horizontal());

        let (resolved_width, resolved_height) = match &props.placement {
            AnchorPlacement::Figure(figure) => (
                figure.width.resolve(available),
                figure.height.resolve(f64::INFINITY),
            ),
            AnchorPlacement::Floater(floater) => {
                (floater_length(floater.width), floater_length(floater.height))
            }
        };

        let mut child_constraint = content_available;
        if !resolved_width.is_nan() {
            let inner = (resolved_width - padding.horizontal()).max(0.0);
            if inner.is_finite() {
                child_constraint = content_available.min(inner);
            }
        }

        let mut content = Vec::new();
        for block in self.doc.child_slice(Owner::Node(node), Collection::Blocks) {
            self.append_block(*block, child_constraint, &mut content, 0.0, 0.0, &mut None);
        }
        let content_extent = extent(&content);

        let mut content_width = content_extent.width;
        if child_constraint.is_finite() {
            content_width = content_width.min(child_constraint);
        }
        let mut width = content_width + padding.horizontal();
        if !resolved_width.is_nan() {
            let inner = (resolved_width - padding.horizontal()).max(0.0);
            width = (content_width.max(inner) + padding.horizontal()).max(resolved_width);
        }

        let mut height = content_extent.height + padding.vertical();
        if !resolved_height.is_nan() {
            height = height.max(resolved_height);
        }

        let (alignment, horizontal_offset, vertical_offset) = match &props.placement {
            AnchorPlacement::Figure(figure) => (
                figure_alignment(figure.horizontal_anchor),
                figure.horizontal_offset,
                figure.vertical_offset,
            ),
            AnchorPlacement::Floater(floater) => {
                let alignment = match floater.alignment {
                    HorizontalAlignment::Center => AnchoredAlignment::Center,
                    HorizontalAlignment::Right => AnchoredAlignment::Right,
                    _ => AnchoredAlignment::Left,
                };
                (alignment, 0.0, 0.0)
            }
        };

        AnchoredLayout {
            content,
            content_extent,
            padding,
            background: element.format.background,
            width,
            height,
            available_width: available,
            alignment,
            horizontal_offset,
            vertical_offset,
        }
    }
}

fn apply_container_margin(produced: &mut [LayoutEntry], margin: Thickness) {
    if let Some(first) = produced.first_mut() {
        first.add_margin(0.0, margin.top, 0.0, 0.0);
    }
    if let Some(last) = produced.last_mut() {
        last.add_margin(0.0, 0.0, 0.0, margin.bottom);
    }
}

fn floater_length(value: f64) -> f64 {
    if value.is_nan() { f64::NAN } else { value.max(0.0) }
}

fn figure_alignment(anchor: FigureHorizontalAnchor) -> AnchoredAlignment {
    use FigureHorizontalAnchor::*;
    match anchor {
        PageCenter | ContentCenter | ColumnCenter => AnchoredAlignment::Center,
        PageRight | ContentRight | ColumnRight => AnchoredAlignment::Right,
        PageLeft | ContentLeft | ColumnLeft => AnchoredAlignment::Left,
    }
}
