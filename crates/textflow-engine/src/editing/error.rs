use thiserror::Error;

use crate::document::TreeError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BufferError {
    #[error("offset {offset} is out of range for a buffer of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("invalid argument {name}: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },

    /// Building the snapshot tree failed.
    #[error(transparent)]
    Tree(#[from] TreeError),
}
