//! Inventory Model - walkthrough entities
//!
//! Value types shared by every layer of the inventory engine:
//! - Live walkthrough tree: [`Room`] and [`FurnitureItem`]
//! - Submission payload: [`InventoryReport`], [`ReportRoom`], [`ReportFurniture`]
//! - Ratings and identifiers
//!
//! Two entities are the same logical entity across cycles when their ids match.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod picture;
pub mod rating;
pub mod report;
pub mod room;

pub use error::ModelError;
pub use ids::{FurnitureId, LeaseId, PropertyId, ReportId, RoomId};
pub use picture::{EncodedImage, ImageRef};
pub use rating::{Cleanliness, Condition, CycleType, RoomType};
pub use report::{InventoryReport, ReportFurniture, ReportRoom};
pub use room::{FieldEdit, FurnitureItem, PriorBaseline, Room};
