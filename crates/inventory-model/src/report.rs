//! Submission payload
//!
//! An [`InventoryReport`] is a snapshot built once per confirmation and never
//! mutated afterwards. Photos are fully encoded; client-side bookkeeping flags
//! (`completed`, `isNewThisCycle`) are not part of the wire shape.

use crate::ids::{FurnitureId, RoomId};
use crate::picture::EncodedImage;
use crate::rating::{Cleanliness, Condition, CycleType};
use serde::{Deserialize, Serialize};

/// Wire shape of a furniture item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportFurniture {
    pub id: FurnitureId,
    pub name: String,
    pub comment: String,
    pub condition: Condition,
    pub cleanliness: Cleanliness,
    pub pictures: Vec<EncodedImage>,
}

/// Wire shape of a room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRoom {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub condition: Condition,
    pub cleanliness: Cleanliness,
    pub pictures: Vec<EncodedImage>,
    pub furnitures: Vec<ReportFurniture>,
}

/// Inventory report submitted at the end of a walkthrough
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub cycle_type: CycleType,
    pub rooms: Vec<ReportRoom>,
}

impl InventoryReport {
    #[inline]
    #[must_use]
    pub fn new(cycle_type: CycleType, rooms: Vec<ReportRoom>) -> Self {
        Self { cycle_type, rooms }
    }

    /// Total number of encoded photos across rooms and furniture
    #[must_use]
    pub fn picture_count(&self) -> usize {
        self.rooms
            .iter()
            .map(|r| r.pictures.len() + r.furnitures.iter().map(|f| f.pictures.len()).sum::<usize>())
            .sum()
    }
}
