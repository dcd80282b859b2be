//! Error types for the entity model

use crate::ids::FurnitureId;

/// Errors raised by entity-level edits and parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A textual rating or classifier did not match any known value
    #[error("unknown {kind}: {value}")]
    UnknownValue {
        kind: &'static str,
        value: String,
    },

    /// The furniture item is not part of the room
    #[error("furniture item not found: {0}")]
    UnknownItem(FurnitureId),

    /// Room completion refused by the completion invariant
    #[error("room {room} cannot be completed: {pending} of {total} item(s) pending")]
    NotCompletable {
        room: String,
        pending: usize,
        total: usize,
    },

    /// Picture index past the end of the current pictures
    #[error("picture index {index} out of range (len {len})")]
    PictureIndexOutOfRange { index: usize, len: usize },
}
