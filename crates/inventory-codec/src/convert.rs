//! Live ↔ report conversions
//!
//! Only photos captured in the current cycle are sent as evidence. Prior-cycle
//! photos are reference material for the walkthrough and stay on the device.

use crate::encoder::{encode_pictures, ImageEncoder};
use inventory_model::{
    Cleanliness, Condition, CycleType, FurnitureItem, InventoryReport, ReportFurniture, ReportRoom,
    Room, RoomType,
};

/// Convert one furniture item to its wire shape
#[must_use]
pub fn to_report_furniture(item: &FurnitureItem, encoder: &dyn ImageEncoder) -> ReportFurniture {
    ReportFurniture {
        id: item.id.clone(),
        name: item.name.clone(),
        comment: item.comment.clone(),
        condition: item.condition,
        cleanliness: item.cleanliness,
        pictures: encode_pictures(&item.current_pictures, encoder),
    }
}

/// Convert one room and all of its items to their wire shape
#[must_use]
pub fn to_report_room(room: &Room, encoder: &dyn ImageEncoder) -> ReportRoom {
    ReportRoom {
        id: room.id.clone(),
        name: room.name.clone(),
        description: room.description.clone(),
        condition: room.condition,
        cleanliness: room.cleanliness,
        pictures: encode_pictures(&room.current_pictures, encoder),
        furnitures: room
            .items()
            .iter()
            .map(|item| to_report_furniture(item, encoder))
            .collect(),
    }
}

/// Build the immutable submission payload for a walkthrough
#[must_use]
pub fn build_report(cycle: CycleType, rooms: &[Room], encoder: &dyn ImageEncoder) -> InventoryReport {
    let report = InventoryReport::new(
        cycle,
        rooms.iter().map(|room| to_report_room(room, encoder)).collect(),
    );
    tracing::debug!(
        cycle = %cycle,
        rooms = report.rooms.len(),
        pictures = report.picture_count(),
        "built inventory report"
    );
    report
}

/// Rebuild an editable item from a previous report
///
/// With `blank` the recorded evaluation is dropped so a new cycle can start
/// from the old layout. The report's photos become the prior-cycle pictures
/// in both modes.
#[must_use]
pub fn from_report_furniture(item: &ReportFurniture, blank: bool) -> FurnitureItem {
    let (comment, condition, cleanliness) = if blank {
        (String::new(), Condition::NotSet, Cleanliness::NotSet)
    } else {
        (item.comment.clone(), item.condition, item.cleanliness)
    };

    FurnitureItem {
        id: item.id.clone(),
        name: item.name.clone(),
        completed: false,
        comment,
        condition,
        cleanliness,
        is_new_this_cycle: false,
        current_pictures: Vec::new(),
        prior_cycle_pictures: item.pictures.clone(),
    }
}

/// Rebuild an editable room from a previous report
///
/// The report does not carry the room type; rooms come back as
/// [`RoomType::Other`] unless the caller knows better.
#[must_use]
pub fn from_report_room(room: &ReportRoom, blank: bool) -> Room {
    let mut rebuilt = Room::new(room.id.clone(), room.name.clone(), RoomType::Other).with_items(
        room.furnitures
            .iter()
            .map(|item| from_report_furniture(item, blank))
            .collect(),
    );

    if !blank {
        rebuilt.description = room.description.clone();
        rebuilt.condition = room.condition;
        rebuilt.cleanliness = room.cleanliness;
    }
    rebuilt.prior_cycle_pictures = room.pictures.clone();
    rebuilt
}
