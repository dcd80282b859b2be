//! Identifier newtypes
//!
//! Room and furniture ids are assigned by the backend and are authoritative
//! across cycles. An empty id marks an entity that has not been persisted yet.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier
            #[inline]
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the raw identifier
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the backend has assigned this id
            #[inline]
            #[must_use]
            pub fn is_persisted(&self) -> bool {
                !self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Identifier of a room within a property
    RoomId
);

string_id!(
    /// Identifier of a furniture item within a room
    FurnitureId
);

string_id!(
    /// Identifier of a managed property
    PropertyId
);

string_id!(
    /// Identifier of the lease an inventory report is filed against
    LeaseId
);

string_id!(
    /// Identifier of a persisted inventory report
    ReportId
);
