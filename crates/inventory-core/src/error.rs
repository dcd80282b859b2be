//! Error types for the inventory engine
//!
//! Every error except photo encoding failures is surfaced to the caller and
//! leaves engine state unchanged. Encoding failures are absorbed per photo
//! inside the codec.

use crate::api::ApiError;
use inventory_model::{CycleType, ModelError, RoomId};

/// Where a duplicate name was detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameScope {
    /// Among the rooms of the walkthrough
    Rooms,
    /// Among the furniture of one room
    Furniture(RoomId),
}

impl std::fmt::Display for NameScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameScope::Rooms => f.write_str("rooms"),
            NameScope::Furniture(room) => write!(f, "furniture of room {room}"),
        }
    }
}

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// Name already used in the same scope (exact, case-sensitive match)
    #[error("duplicate name {name:?} in {scope}")]
    DuplicateName { name: String, scope: NameScope },

    /// Backend failed to create a room
    #[error("room creation failed: {0}")]
    RoomCreation(#[source] ApiError),

    /// Backend failed to create a furniture item
    #[error("furniture creation failed: {0}")]
    FurnitureCreation(#[source] ApiError),

    /// Confirmation refused: some rooms are not completed
    #[error("walkthrough not completed; pending rooms: {}", incomplete.join(", "))]
    NotAllCompleted { incomplete: Vec<String> },

    /// Report submission failed; the walkthrough stays open
    #[error("report submission failed: {0}")]
    Submission(#[source] ApiError),

    /// A walkthrough is already open for this property
    #[error("{current} walkthrough already open")]
    AlreadyOpen { current: CycleType },

    /// Operation needs an open walkthrough
    #[error("no walkthrough is open")]
    NotOpen,

    /// Room session belongs to a walkthrough that has since ended
    #[error("room session belongs to an ended walkthrough")]
    StaleSession,

    /// Requested report does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Room id is not part of the walkthrough
    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),

    /// Baseline could not be loaded when starting a walkthrough
    #[error("baseline fetch failed: {0}")]
    Fetch(#[source] ApiError),

    /// Field edit rejected by the entity model
    #[error("edit rejected: {0}")]
    Edit(#[from] ModelError),

    /// Invalid engine configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Background work was cancelled before it finished
    #[error("operation cancelled: {0}")]
    Cancelled(String),
}

impl InventoryError {
    /// Check if the failed operation may succeed when retried as-is
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RoomCreation(e)
            | Self::FurnitureCreation(e)
            | Self::Submission(e)
            | Self::Fetch(e) => e.is_transient(),
            Self::Cancelled(_) => true,
            _ => false,
        }
    }

    /// Check if the error stems from user input rather than the system
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName { .. }
                | Self::NotAllCompleted { .. }
                | Self::AlreadyOpen { .. }
                | Self::Edit(_)
        )
    }
}
