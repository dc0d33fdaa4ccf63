use super::{Collection, NodeId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
    #[error("Node {child} already belongs to a container")]
    AlreadyOwned { child: NodeId },
    #[error("Inserting node {child} would make it its own ancestor")]
    Cycle { child: NodeId },
    #[error("A {collection:?} collection cannot hold a {kind} node")]
    WrongKind {
        collection: Collection,
        kind: &'static str,
    },
    #[error("A {kind} node has no {collection:?} collection")]
    NoSuchCollection {
        collection: Collection,
        kind: &'static str,
    },
    #[error("Index {index} out of range for a collection of {len} children")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Node {child} is not in this collection")]
    NotAChild { child: NodeId },
    #[error("Node {node} is still owned and cannot be deleted")]
    StillOwned { node: NodeId },
    #[error("Node kind cannot change from {from} to {to}")]
    KindChanged {
        from: &'static str,
        to: &'static str,
    },
}
