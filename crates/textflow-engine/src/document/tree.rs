use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::format::{
    Color, FlowDirection, FontStretch, FontStyle, FontWeight, ResolvedFormat, TextAlignment,
    TextDecorations,
};
use super::{Collection, Element, NodeId, NodeKind, Owner, Parent, TreeError};
use crate::geometry::Thickness;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`FlowDocument`], used to key layout caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Document-wide formatting, the root of every inheritance chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDefaults {
    pub font_family: String,
    pub font_size: f64,
    pub font_style: FontStyle,
    pub font_weight: FontWeight,
    pub font_stretch: FontStretch,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub decorations: TextDecorations,
    pub alignment: TextAlignment,
    pub flow_direction: FlowDirection,
    /// Explicit line height; `None` lets the shaper decide.
    pub line_height: Option<f64>,
    pub page_padding: Thickness,
}

impl Default for DocumentDefaults {
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
            alignment: TextAlignment::Left,
            flow_direction: FlowDirection::LeftToRight,
            line_height: None,
            page_padding: Thickness::uniform(24.0),
        }
    }
}

impl DocumentDefaults {
    pub fn resolved_format(&self) -> ResolvedFormat {
        ResolvedFormat {
            font_family: self.font_family.clone(),
            font_size: if self.font_size.is_finite() && self.font_size > 0.0 {
                self.font_size
            } else {
                14.0
            },
            font_style: self.font_style,
            font_weight: self.font_weight,
            font_stretch: self.font_stretch,
            foreground: self.foreground,
            background: None,
            decorations: self.decorations,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    element: Element,
    parent: Option<Parent>,
    children: [Vec<NodeId>; Collection::COUNT],
}

/// Root of a reflowable document: an arena of nodes plus the top-level blocks.
///
/// Every node has at most one owner. Mutating an attached part of the tree
/// bumps [`revision`](Self::revision) and raises the dirty flag, which
/// consumers drain with [`take_changed`](Self::take_changed).
#[derive(Debug)]
pub struct FlowDocument {
    id: DocumentId,
    nodes: Arena<Node>,
    blocks: Vec<NodeId>,
    defaults: DocumentDefaults,
    revision: u64,
    dirty: bool,
}

impl Default for FlowDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowDocument {
    pub fn new() -> Self {
        Self {
            id: DocumentId::next(),
            nodes: Arena::new(),
            blocks: Vec::new(),
            defaults: DocumentDefaults::default(),
            revision: 0,
            dirty: false,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` still names a live node. Handles of deleted nodes miss.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn defaults(&self) -> &DocumentDefaults {
        &self.defaults
    }

    pub fn set_defaults(&mut self, update: impl FnOnce(&mut DocumentDefaults)) {
        let before = self.defaults.clone();
        update(&mut self.defaults);
        if self.defaults != before {
            self.touch("defaults");
        }
    }

    /// Creates a free-standing node. It joins the document once inserted
    /// into an attached collection.
    pub fn create(&mut self, element: Element) -> NodeId {
        self.nodes.allocate(Node {
            element,
            parent: None,
            children: Default::default(),
        })
    }

    pub fn element(&self, id: NodeId) -> Result<&Element, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id).map(|node| &node.element)
    }

    /// Edits a node in place. The node kind may change its properties but not
    /// its variant.
    pub fn update(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut Element),
    ) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(id).ok_or(TreeError::UnknownNode(id))?;
        let mut element = node.element.clone();
        edit(&mut element);
        if std::mem::discriminant(&element.kind) != std::mem::discriminant(&node.element.kind) {
            return Err(TreeError::KindChanged {
                from: node.element.kind.name(),
                to: element.kind.name(),
            });
        }
        if element == node.element {
            return Ok(());
        }
        node.element = element;
        if self.is_attached(id) {
            self.touch("update");
        }
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<Parent> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// A node is attached when its owner chain reaches the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            match self.parent(current) {
                Some(Parent {
                    owner: Owner::Document,
                    ..
                }) => return true,
                Some(Parent {
                    owner: Owner::Node(owner),
                    ..
                }) => current = owner,
                None => return false,
            }
        }
    }

    pub fn children(
        &self,
        owner: impl Into<Owner>,
        collection: Collection,
    ) -> Result<&[NodeId], TreeError> {
        let owner = owner.into();
        self.check_collection(owner, collection)?;
        Ok(self.child_slice(owner, collection))
    }

    /// Children without validation; empty for unknown owners or collections.
    pub(crate) fn child_slice(&self, owner: Owner, collection: Collection) -> &[NodeId] {
        match owner {
            Owner::Document if collection == Collection::Blocks => &self.blocks,
            Owner::Document => &[],
            Owner::Node(id) => self
                .nodes
                .get(id)
                .map(|node| node.children[collection.slot()].as_slice())
                .unwrap_or(&[]),
        }
    }

    pub fn blocks(&self) -> &[NodeId] {
        &self.blocks
    }

    pub fn append(
        &mut self,
        owner: impl Into<Owner>,
        collection: Collection,
        child: NodeId,
    ) -> Result<(), TreeError> {
        let owner = owner.into();
        let index = self.children(owner, collection)?.len();
        self.insert(owner, collection, index, child)
    }

    pub fn insert(
        &mut self,
        owner: impl Into<Owner>,
        collection: Collection,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        let owner = owner.into();
        self.check_insertable(owner, collection, child)?;
        let len = self.child_slice(owner, collection).len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }

        self.list_mut(owner, collection)?.insert(index, child);
        self.set_parent(child, Some(Parent { owner, collection }));
        if self.owner_attached(owner) {
            self.touch("insert");
        }
        Ok(())
    }

    /// Detaches `child` from the collection. The node stays alive and may be
    /// inserted elsewhere.
    pub fn remove(
        &mut self,
        owner: impl Into<Owner>,
        collection: Collection,
        child: NodeId,
    ) -> Result<(), TreeError> {
        let owner = owner.into();
        let index = self
            .children(owner, collection)?
            .iter()
            .position(|id| *id == child)
            .ok_or(TreeError::NotAChild { child })?;
        self.remove_at(owner, collection, index).map(|_| ())
    }

    pub fn remove_at(
        &mut self,
        owner: impl Into<Owner>,
        collection: Collection,
        index: usize,
    ) -> Result<NodeId, TreeError> {
        let owner = owner.into();
        let len = self.children(owner, collection)?.len();
        if index >= len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }

        let attached = self.owner_attached(owner);
        let child = self.list_mut(owner, collection)?.remove(index);
        self.set_parent(child, None);
        if attached {
            self.touch("remove");
        }
        Ok(child)
    }

    /// Swaps the child at `index` for `child`, returning the detached node.
    pub fn replace(
        &mut self,
        owner: impl Into<Owner>,
        collection: Collection,
        index: usize,
        child: NodeId,
    ) -> Result<NodeId, TreeError> {
        let owner = owner.into();
        let len = self.children(owner, collection)?.len();
        if index >= len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        self.check_insertable(owner, collection, child)?;

        let list = self.list_mut(owner, collection)?;
        let previous = std::mem::replace(&mut list[index], child);
        self.set_parent(previous, None);
        self.set_parent(child, Some(Parent { owner, collection }));
        if self.owner_attached(owner) {
            self.touch("replace");
        }
        Ok(previous)
    }

    /// Detaches every child of the collection and returns them in order.
    pub fn clear(
        &mut self,
        owner: impl Into<Owner>,
        collection: Collection,
    ) -> Result<Vec<NodeId>, TreeError> {
        let owner = owner.into();
        self.check_collection(owner, collection)?;
        let removed = std::mem::take(self.list_mut(owner, collection)?);
        for child in &removed {
            self.set_parent(*child, None);
        }
        if !removed.is_empty() && self.owner_attached(owner) {
            self.touch("clear");
        }
        Ok(removed)
    }

    /// Frees a detached node and its whole subtree.
    pub fn delete(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.nodes.get(id).ok_or(TreeError::UnknownNode(id))?;
        if node.parent.is_some() {
            return Err(TreeError::StillOwned { node: id });
        }

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.deallocate(current) {
                pending.extend(node.children.into_iter().flatten());
            }
        }
        Ok(())
    }

    /// Plain-text projection of the whole document.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            self.collect_text(*block, &mut out);
        }
        out
    }

    /// Plain-text projection of one node.
    ///
    /// Line breaks become `"\n"`, list items get their marker prefix and a
    /// trailing newline, and tables contribute nothing.
    pub fn plain_text(&self, id: NodeId) -> Result<String, TreeError> {
        self.element(id)?;
        let mut out = String::new();
        self.collect_text(id, &mut out);
        Ok(out)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(element) = self.get(id) else {
            return;
        };
        let owner = Owner::Node(id);
        match &element.kind {
            NodeKind::Run { text } => out.push_str(text),
            NodeKind::LineBreak => out.push('\n'),
            NodeKind::Opaque { text, .. } => out.push_str(text),
            NodeKind::List(props) => {
                let mut index = props.first_index();
                for item in self.child_slice(owner, Collection::ListItems) {
                    out.push_str(&props.marker_text(index));
                    out.push(' ');
                    self.collect_text(*item, out);
                    out.push('\n');
                    index += 1;
                }
            }
            NodeKind::Table(_) | NodeKind::TableColumn { .. } => {}
            kind => {
                for collection in kind.collections() {
                    for child in self.child_slice(owner, *collection) {
                        self.collect_text(*child, out);
                    }
                }
            }
        }
    }

    fn check_collection(&self, owner: Owner, collection: Collection) -> Result<(), TreeError> {
        match owner {
            Owner::Document if collection == Collection::Blocks => Ok(()),
            Owner::Document => Err(TreeError::NoSuchCollection {
                collection,
                kind: "FlowDocument",
            }),
            Owner::Node(id) => {
                let kind = &self.element(id)?.kind;
                if kind.has_collection(collection) {
                    Ok(())
                } else {
                    Err(TreeError::NoSuchCollection {
                        collection,
                        kind: kind.name(),
                    })
                }
            }
        }
    }

    fn check_insertable(
        &self,
        owner: Owner,
        collection: Collection,
        child: NodeId,
    ) -> Result<(), TreeError> {
        self.check_collection(owner, collection)?;
        let node = self.nodes.get(child).ok_or(TreeError::UnknownNode(child))?;
        if !collection.accepts(&node.element.kind) {
            return Err(TreeError::WrongKind {
                collection,
                kind: node.element.kind.name(),
            });
        }
        if node.parent.is_some() {
            return Err(TreeError::AlreadyOwned { child });
        }

        let mut ancestor = owner;
        while let Owner::Node(id) = ancestor {
            if id == child {
                return Err(TreeError::Cycle { child });
            }
            ancestor = match self.parent(id) {
                Some(parent) => parent.owner,
                None => break,
            };
        }
        Ok(())
    }

    fn list_mut(
        &mut self,
        owner: Owner,
        collection: Collection,
    ) -> Result<&mut Vec<NodeId>, TreeError> {
        match owner {
            Owner::Document => Ok(&mut self.blocks),
            Owner::Node(id) => self
                .nodes
                .get_mut(id)
                .map(|node| &mut node.children[collection.slot()])
                .ok_or(TreeError::UnknownNode(id)),
        }
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<Parent>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
    }

    fn owner_attached(&self, owner: Owner) -> bool {
        match owner {
            Owner::Document => true,
            Owner::Node(id) => self.is_attached(id),
        }
    }

    fn touch(&mut self, reason: &str) {
        self.revision += 1;
        self.dirty = true;
        log::trace!("document {:?} changed ({reason}), revision {}", self.id, self.revision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ListProps;
    use pretty_assertions::assert_eq;

    fn paragraph_with(doc: &mut FlowDocument, text: &str) -> NodeId {
        let paragraph = doc.create(Element::paragraph());
        let run = doc.create(Element::run(text));
        doc.append(paragraph, Collection::Inlines, run).unwrap();
        paragraph
    }

    #[test]
    fn test_detached_edits_do_not_touch_revision() {
        let mut doc = FlowDocument::new();
        let paragraph = paragraph_with(&mut doc, "free");

        assert_eq!(doc.revision(), 0);
        assert!(!doc.is_attached(paragraph));

        doc.append(Owner::Document, Collection::Blocks, paragraph)
            .unwrap();

        assert_eq!(doc.revision(), 1);
        assert!(doc.take_changed());
        assert!(!doc.take_changed());
    }

    #[test]
    fn test_nested_mutation_bubbles_to_root() {
        let mut doc = FlowDocument::new();
        let section = doc.create(Element::section());
        doc.append(Owner::Document, Collection::Blocks, section)
            .unwrap();
        let paragraph = paragraph_with(&mut doc, "x");
        doc.append(section, Collection::Blocks, paragraph).unwrap();
        doc.take_changed();

        let run = doc.children(paragraph, Collection::Inlines).unwrap()[0];
        doc.update(run, |element| element.kind = NodeKind::Run { text: "y".into() })
            .unwrap();

        assert!(doc.is_dirty());
        assert_eq!(doc.text(), "y");
    }

    #[test]
    fn test_second_owner_is_rejected() {
        let mut doc = FlowDocument::new();
        let first = doc.create(Element::section());
        let second = doc.create(Element::section());
        let paragraph = doc.create(Element::paragraph());
        doc.append(first, Collection::Blocks, paragraph).unwrap();

        let err = doc.append(second, Collection::Blocks, paragraph).unwrap_err();

        assert_eq!(err, TreeError::AlreadyOwned { child: paragraph });

        doc.remove(first, Collection::Blocks, paragraph).unwrap();
        doc.append(second, Collection::Blocks, paragraph).unwrap();
        assert_eq!(doc.parent(paragraph).map(|p| p.owner), Some(Owner::Node(second)));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut doc = FlowDocument::new();
        let outer = doc.create(Element::section());
        let inner = doc.create(Element::section());
        doc.append(outer, Collection::Blocks, inner).unwrap();

        assert_eq!(
            doc.append(inner, Collection::Blocks, outer),
            Err(TreeError::Cycle { child: outer })
        );
        assert_eq!(
            doc.append(outer, Collection::Blocks, outer),
            Err(TreeError::Cycle { child: outer })
        );
    }

    #[test]
    fn test_wrong_kind_and_collection() {
        let mut doc = FlowDocument::new();
        let paragraph = doc.create(Element::paragraph());
        let nested = doc.create(Element::paragraph());
        let run = doc.create(Element::run("r"));

        assert_eq!(
            doc.append(paragraph, Collection::Inlines, nested),
            Err(TreeError::WrongKind {
                collection: Collection::Inlines,
                kind: "Paragraph"
            })
        );
        assert_eq!(
            doc.append(run, Collection::Inlines, nested),
            Err(TreeError::NoSuchCollection {
                collection: Collection::Inlines,
                kind: "Run"
            })
        );
    }

    #[test]
    fn test_update_rejects_kind_change() {
        let mut doc = FlowDocument::new();
        let run = doc.create(Element::run("r"));

        let err = doc
            .update(run, |element| element.kind = NodeKind::LineBreak)
            .unwrap_err();

        assert_eq!(
            err,
            TreeError::KindChanged {
                from: "Run",
                to: "LineBreak"
            }
        );
        assert_eq!(doc.plain_text(run).unwrap(), "r");
    }

    #[test]
    fn test_list_plain_text() {
        let mut doc = FlowDocument::new();
        let list = doc.create(Element::list(ListProps {
            marker_style: crate::document::ListMarkerStyle::Decimal,
            start_index: 3,
            ..ListProps::default()
        }));
        for text in ["a", "b"] {
            let item = doc.create(Element::list_item());
            let paragraph = paragraph_with(&mut doc, text);
            doc.append(item, Collection::Blocks, paragraph).unwrap();
            doc.append(list, Collection::ListItems, item).unwrap();
        }

        assert_eq!(doc.plain_text(list).unwrap(), "3. a\n4. b\n");
    }

    #[test]
    fn test_delete_frees_subtree() {
        let mut doc = FlowDocument::new();
        let paragraph = paragraph_with(&mut doc, "gone");
        let run = doc.children(paragraph, Collection::Inlines).unwrap()[0];

        assert!(doc.contains(run));
        doc.delete(paragraph).unwrap();

        assert_eq!(doc.node_count(), 0);
        assert!(!doc.contains(paragraph));
        assert!(!doc.contains(run));
        assert_eq!(doc.element(run), Err(TreeError::UnknownNode(run)));
    }

    #[test]
    fn test_delete_refuses_owned_node() {
        let mut doc = FlowDocument::new();
        let paragraph = paragraph_with(&mut doc, "kept");
        doc.append(Owner::Document, Collection::Blocks, paragraph)
            .unwrap();

        assert_eq!(
            doc.delete(paragraph),
            Err(TreeError::StillOwned { node: paragraph })
        );
    }

    #[test]
    fn test_replace_and_clear() {
        let mut doc = FlowDocument::new();
        let first = paragraph_with(&mut doc, "one");
        let second = paragraph_with(&mut doc, "two");
        doc.append(Owner::Document, Collection::Blocks, first)
            .unwrap();

        let previous = doc
            .replace(Owner::Document, Collection::Blocks, 0, second)
            .unwrap();

        assert_eq!(previous, first);
        assert_eq!(doc.parent(first), None);
        assert_eq!(doc.text(), "two");

        let removed = doc.clear(Owner::Document, Collection::Blocks).unwrap();
        assert_eq!(removed, vec![second]);
        assert_eq!(doc.text(), "");
    }
}
