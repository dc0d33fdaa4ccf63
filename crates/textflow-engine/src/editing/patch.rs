use std::ops::Range;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Buffer ranges written by the command, in post-edit offsets.
    pub changed: Vec<Range<usize>>,
    pub new_selection: Range<usize>,
    /// Editor version after the command.
    pub version: u64,
}

impl Patch {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}
