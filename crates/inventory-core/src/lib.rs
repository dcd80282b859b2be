//! Inventory Core - walkthrough reconciliation engine
//!
//! Keeps a property's room/furniture tree in sync with the backend during an
//! entry or exit walkthrough:
//! - Seeds the walkthrough from the previous report or the property layout
//! - Creates rooms and furniture through the backend, refusing duplicates
//! - Enforces room completion before submission
//! - Carries this cycle's photos forward as the next cycle's reference
//!
//! # Example
//!
//! ```rust,ignore
//! use inventory_core::prelude::*;
//!
//! # async fn example(api: std::sync::Arc<dyn InventoryApi>) -> Result<(), InventoryError> {
//! let controller = WalkthroughController::new(
//!     EngineConfig::new(),
//!     PropertyId::new("prop-1"),
//!     LeaseId::new("lease-1"),
//!     api,
//!     std::sync::Arc::new(Base64FileEncoder::new()),
//! )?;
//!
//! controller.start_walkthrough(CycleType::Entry).await?;
//! let kitchen = controller.add_room("Kitchen", RoomType::Kitchen).await?;
//! controller.add_furniture(&kitchen, "Oven").await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod room_detail;
pub mod store;

pub use api::{ApiError, FurnitureSummary, InventoryApi, ReportSelector, RoomSummary};
pub use config::EngineConfig;
pub use error::{InventoryError, NameScope};
pub use lifecycle::{WalkthroughController, WalkthroughPhase};
pub use room_detail::RoomDetailSession;
pub use store::{ReconciliationStore, StoreEvent};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a walkthrough
    pub use crate::{
        EngineConfig, InventoryApi, InventoryError, ReportSelector, RoomDetailSession,
        WalkthroughController, WalkthroughPhase,
    };
    pub use inventory_codec::{Base64FileEncoder, ImageEncoder};
    pub use inventory_model::{
        CycleType, FieldEdit, FurnitureId, LeaseId, PropertyId, Room, RoomId, RoomType,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
