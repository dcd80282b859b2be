//! Live walkthrough entities
//!
//! A walkthrough is a tree of [`Room`]s, each holding [`FurnitureItem`]s.
//! Rooms guard the completion invariant: a room can only be completed when
//! it has at least one item and every item is completed. Any mutation that
//! would break this clears the room's completed flag.

use crate::error::ModelError;
use crate::ids::{FurnitureId, RoomId};
use crate::picture::{EncodedImage, ImageRef};
use crate::rating::{Cleanliness, Condition, RoomType};
use serde::{Deserialize, Serialize};

/// Single edit applied to a room or a furniture item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    /// Free-text comment (a room's description)
    Comment(String),
    Condition(Condition),
    Cleanliness(Cleanliness),
    /// Attach a photo captured this cycle
    AddPicture(ImageRef),
    /// Drop a photo captured this cycle, by position
    RemovePicture(usize),
    Completed(bool),
}

/// Reference state an entity is compared against during a walkthrough
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorBaseline<'a> {
    /// Entity was added this cycle; there is nothing to compare against
    None,
    /// Photos carried over from the previous submitted cycle (may be empty)
    Pictures(&'a [EncodedImage]),
}

impl PriorBaseline<'_> {
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, PriorBaseline::None)
    }
}

/// One tracked object inside a room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureItem {
    pub id: FurnitureId,
    pub name: String,
    pub completed: bool,
    pub comment: String,
    pub condition: Condition,
    pub cleanliness: Cleanliness,
    pub is_new_this_cycle: bool,
    /// Photos captured this cycle (local, unencoded)
    pub current_pictures: Vec<ImageRef>,
    /// Photos carried over from the previous submitted cycle
    pub prior_cycle_pictures: Vec<EncodedImage>,
}

impl FurnitureItem {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<FurnitureId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Item created during the current walkthrough
    #[inline]
    #[must_use]
    pub fn new_this_cycle(id: impl Into<FurnitureId>, name: impl Into<String>) -> Self {
        Self {
            is_new_this_cycle: true,
            ..Self::new(id, name)
        }
    }

    #[must_use]
    pub fn prior_baseline(&self) -> PriorBaseline<'_> {
        if self.is_new_this_cycle {
            PriorBaseline::None
        } else {
            PriorBaseline::Pictures(&self.prior_cycle_pictures)
        }
    }

    /// Apply a single field edit
    ///
    /// # Errors
    /// `ModelError::PictureIndexOutOfRange` when removing a missing picture.
    pub fn apply(&mut self, edit: FieldEdit) -> Result<(), ModelError> {
        match edit {
            FieldEdit::Comment(text) => self.comment = text,
            FieldEdit::Condition(c) => self.condition = c,
            FieldEdit::Cleanliness(c) => self.cleanliness = c,
            FieldEdit::AddPicture(image) => self.current_pictures.push(image),
            FieldEdit::RemovePicture(index) => {
                remove_picture(&mut self.current_pictures, index)?;
            }
            FieldEdit::Completed(done) => self.completed = done,
        }
        Ok(())
    }
}

/// One physical room being inventoried
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub room_type: RoomType,
    pub description: String,
    pub cleanliness: Cleanliness,
    pub condition: Condition,
    pub is_new_this_cycle: bool,
    /// Photos captured this cycle (local, unencoded)
    pub current_pictures: Vec<ImageRef>,
    /// Photos carried over from the previous submitted cycle
    pub prior_cycle_pictures: Vec<EncodedImage>,
    completed: bool,
    items: Vec<FurnitureItem>,
}

impl Room {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<RoomId>, name: impl Into<String>, room_type: RoomType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            room_type,
            ..Default::default()
        }
    }

    /// Room created during the current walkthrough
    #[inline]
    #[must_use]
    pub fn new_this_cycle(
        id: impl Into<RoomId>,
        name: impl Into<String>,
        room_type: RoomType,
    ) -> Self {
        Self {
            is_new_this_cycle: true,
            ..Self::new(id, name, room_type)
        }
    }

    /// Replace the item list
    #[must_use]
    pub fn with_items(mut self, items: Vec<FurnitureItem>) -> Self {
        self.items = items;
        self.reconcile_completion();
        self
    }

    #[inline]
    #[must_use]
    pub fn items(&self) -> &[FurnitureItem] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, id: &FurnitureId) -> Option<&FurnitureItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Exact, case-sensitive name lookup
    #[must_use]
    pub fn has_item_named(&self, name: &str) -> bool {
        self.items.iter().any(|i| i.name == name)
    }

    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Whether the room could be marked completed right now
    #[must_use]
    pub fn can_complete(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.completed)
    }

    /// Number of items not yet completed
    #[must_use]
    pub fn pending_items(&self) -> usize {
        self.items.iter().filter(|i| !i.completed).count()
    }

    /// Mark the room completed; refused (returns `false`) when the room has
    /// no items or any item is still pending.
    pub fn mark_completed(&mut self) -> bool {
        self.completed = self.can_complete();
        self.completed
    }

    pub fn clear_completed(&mut self) {
        self.completed = false;
    }

    /// Append an item; an incomplete item re-opens the room
    pub fn push_item(&mut self, item: FurnitureItem) {
        self.items.push(item);
        self.reconcile_completion();
    }

    /// Apply an edit to one item
    ///
    /// # Errors
    /// `ModelError::UnknownItem` when the item is not in this room, or the
    /// item's own edit error.
    pub fn update_item(&mut self, id: &FurnitureId, edit: FieldEdit) -> Result<(), ModelError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| ModelError::UnknownItem(id.clone()))?;
        item.apply(edit)?;
        self.reconcile_completion();
        Ok(())
    }

    pub fn remove_item(&mut self, id: &FurnitureId) -> Option<FurnitureItem> {
        let idx = self.items.iter().position(|i| &i.id == id)?;
        let removed = self.items.remove(idx);
        self.reconcile_completion();
        Some(removed)
    }

    /// Apply a single field edit to the room itself
    ///
    /// # Errors
    /// - `ModelError::NotCompletable` when `Completed(true)` is refused
    /// - `ModelError::PictureIndexOutOfRange` when removing a missing picture
    pub fn apply(&mut self, edit: FieldEdit) -> Result<(), ModelError> {
        match edit {
            FieldEdit::Comment(text) => self.description = text,
            FieldEdit::Condition(c) => self.condition = c,
            FieldEdit::Cleanliness(c) => self.cleanliness = c,
            FieldEdit::AddPicture(image) => self.current_pictures.push(image),
            FieldEdit::RemovePicture(index) => {
                remove_picture(&mut self.current_pictures, index)?;
            }
            FieldEdit::Completed(true) => {
                if !self.mark_completed() {
                    return Err(ModelError::NotCompletable {
                        room: self.name.clone(),
                        pending: self.pending_items(),
                        total: self.items.len(),
                    });
                }
            }
            FieldEdit::Completed(false) => self.clear_completed(),
        }
        Ok(())
    }

    #[must_use]
    pub fn prior_baseline(&self) -> PriorBaseline<'_> {
        if self.is_new_this_cycle {
            PriorBaseline::None
        } else {
            PriorBaseline::Pictures(&self.prior_cycle_pictures)
        }
    }

    fn reconcile_completion(&mut self) {
        if self.completed && !self.can_complete() {
            self.completed = false;
        }
    }
}

fn remove_picture(pictures: &mut Vec<ImageRef>, index: usize) -> Result<ImageRef, ModelError> {
    if index >= pictures.len() {
        return Err(ModelError::PictureIndexOutOfRange {
            index,
            len: pictures.len(),
        });
    }
    Ok(pictures.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done_item(id: &str) -> FurnitureItem {
        FurnitureItem {
            completed: true,
            ..FurnitureItem::new(id, id)
        }
    }

    #[test]
    fn empty_room_cannot_complete() {
        let mut room = Room::new("r1", "Kitchen", RoomType::Kitchen);
        assert!(!room.mark_completed());
        assert!(!room.is_completed());

        let err = room.apply(FieldEdit::Completed(true)).unwrap_err();
        assert!(matches!(err, ModelError::NotCompletable { pending: 0, total: 0, .. }));
    }

    #[test]
    fn room_completes_when_all_items_done() {
        let mut room = Room::new("r1", "Kitchen", RoomType::Kitchen)
            .with_items(vec![done_item("f1"), FurnitureItem::new("f2", "Oven")]);
        assert!(!room.mark_completed());
        assert_eq!(room.pending_items(), 1);

        room.update_item(&"f2".into(), FieldEdit::Completed(true)).unwrap();
        assert!(room.mark_completed());
    }

    #[test]
    fn pushing_incomplete_item_reopens_room() {
        let mut room = Room::new("r1", "Bedroom", RoomType::Bedroom).with_items(vec![done_item("f1")]);
        assert!(room.mark_completed());

        room.push_item(FurnitureItem::new_this_cycle("f2", "Lamp"));
        assert!(!room.is_completed());
    }

    #[test]
    fn uncompleting_item_reopens_room() {
        let mut room = Room::new("r1", "Bedroom", RoomType::Bedroom).with_items(vec![done_item("f1")]);
        assert!(room.mark_completed());

        room.update_item(&"f1".into(), FieldEdit::Completed(false)).unwrap();
        assert!(!room.is_completed());
    }

    #[test]
    fn removing_last_item_reopens_room() {
        let mut room = Room::new("r1", "Bedroom", RoomType::Bedroom).with_items(vec![done_item("f1")]);
        assert!(room.mark_completed());

        assert!(room.remove_item(&"f1".into()).is_some());
        assert!(!room.is_completed());
        assert!(room.remove_item(&"f1".into()).is_none());
    }

    #[test]
    fn update_unknown_item_fails() {
        let mut room = Room::new("r1", "Hall", RoomType::Hallway);
        let err = room
            .update_item(&"missing".into(), FieldEdit::Comment("x".into()))
            .unwrap_err();
        assert_eq!(err, ModelError::UnknownItem("missing".into()));
    }

    #[test]
    fn field_edits_apply_to_room() {
        let mut room = Room::new("r1", "Hall", RoomType::Hallway);
        room.apply(FieldEdit::Comment("scuffed skirting".into())).unwrap();
        room.apply(FieldEdit::Condition(Condition::Medium)).unwrap();
        room.apply(FieldEdit::Cleanliness(Cleanliness::Clean)).unwrap();
        room.apply(FieldEdit::AddPicture("file:///a.jpg".into())).unwrap();
        room.apply(FieldEdit::AddPicture("file:///b.jpg".into())).unwrap();
        room.apply(FieldEdit::RemovePicture(0)).unwrap();

        assert_eq!(room.description, "scuffed skirting");
        assert_eq!(room.condition, Condition::Medium);
        assert_eq!(room.cleanliness, Cleanliness::Clean);
        assert_eq!(room.current_pictures, vec![ImageRef::new("file:///b.jpg")]);

        let err = room.apply(FieldEdit::RemovePicture(5)).unwrap_err();
        assert_eq!(err, ModelError::PictureIndexOutOfRange { index: 5, len: 1 });
    }

    #[test]
    fn new_entities_have_no_prior_baseline() {
        let room = Room::new_this_cycle("r9", "Attic", RoomType::Other);
        assert!(room.prior_baseline().is_none());

        let mut item = FurnitureItem::new("f1", "Sofa");
        item.prior_cycle_pictures.push(EncodedImage::new("abc"));
        assert_eq!(
            item.prior_baseline(),
            PriorBaseline::Pictures(&[EncodedImage::new("abc")])
        );
        assert!(FurnitureItem::new_this_cycle("f2", "Rug").prior_baseline().is_none());
    }
}
