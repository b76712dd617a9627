//! Engine Errors

use thiserror::Error;

/// Errors surfaced by reads of reactive nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A memo was read from inside its own evaluation before a first value
    /// existed. The engine refuses to recurse into a node whose tracking
    /// frame is already on the stack; normally such a read falls back to the
    /// previous cached value, but on the very first run there is none.
    #[error("expression read itself before computing its first value")]
    NotYetComputed,
}
