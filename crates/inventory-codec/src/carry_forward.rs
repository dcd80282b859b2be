//! Carry-forward transform
//!
//! Run once per room right after a successful submission. The evaluation is
//! cleared and this cycle's photos become the next cycle's reference photos,
//! so the exit walkthrough can show how each room looked at entry.
//!
//! Reference photos always come from the most recent cycle that took any,
//! matching what a baseline refetched from that cycle's report would hold.

use crate::encoder::{encode_pictures, ImageEncoder};
use inventory_model::{Cleanliness, Condition, EncodedImage, FurnitureItem, ImageRef, Room};

/// Reset one item for the next cycle
#[must_use]
pub fn reset_item_for_next_cycle(item: &FurnitureItem, encoder: &dyn ImageEncoder) -> FurnitureItem {
    let prior = next_prior(&item.prior_cycle_pictures, &item.current_pictures, encoder);

    FurnitureItem {
        id: item.id.clone(),
        name: item.name.clone(),
        completed: false,
        comment: String::new(),
        condition: Condition::NotSet,
        cleanliness: Cleanliness::NotSet,
        is_new_this_cycle: false,
        current_pictures: Vec::new(),
        prior_cycle_pictures: prior,
    }
}

/// Reset a room and all of its items for the next cycle
///
/// Current pictures, once encoded, replace the prior-cycle pictures; photos
/// that fail to encode are dropped. Entities photographed nothing this cycle
/// keep their earlier reference.
#[must_use]
pub fn reset_for_next_cycle(room: &Room, encoder: &dyn ImageEncoder) -> Room {
    let items = room
        .items()
        .iter()
        .map(|item| reset_item_for_next_cycle(item, encoder))
        .collect();

    let mut next = Room::new(room.id.clone(), room.name.clone(), room.room_type).with_items(items);
    next.prior_cycle_pictures = next_prior(&room.prior_cycle_pictures, &room.current_pictures, encoder);
    next
}

fn next_prior(
    prior: &[EncodedImage],
    current: &[ImageRef],
    encoder: &dyn ImageEncoder,
) -> Vec<EncodedImage> {
    if current.is_empty() {
        prior.to_vec()
    } else {
        encode_pictures(current, encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::EncodingError;
    use inventory_model::{FieldEdit, RoomType};

    fn identity(image: &ImageRef) -> Result<EncodedImage, EncodingError> {
        Ok(EncodedImage::new(format!("enc:{image}")))
    }

    fn evaluated_room() -> Room {
        let mut item = FurnitureItem::new_this_cycle("f1", "Wardrobe");
        item.apply(FieldEdit::Comment("door sticks".into())).unwrap();
        item.apply(FieldEdit::Condition(Condition::NeedsRepair)).unwrap();
        item.apply(FieldEdit::Cleanliness(Cleanliness::Medium)).unwrap();
        item.apply(FieldEdit::AddPicture("wardrobe.jpg".into())).unwrap();
        item.apply(FieldEdit::Completed(true)).unwrap();

        let mut room = Room::new_this_cycle("r1", "Bedroom", RoomType::Bedroom).with_items(vec![item]);
        room.apply(FieldEdit::Condition(Condition::Good)).unwrap();
        room.apply(FieldEdit::AddPicture("bedroom.jpg".into())).unwrap();
        room.apply(FieldEdit::Completed(true)).unwrap();
        room
    }

    #[test]
    fn reset_clears_evaluation_and_moves_photos() {
        let next = reset_for_next_cycle(&evaluated_room(), &identity);

        assert!(!next.is_completed());
        assert!(!next.is_new_this_cycle);
        assert_eq!(next.condition, Condition::NotSet);
        assert_eq!(next.room_type, RoomType::Bedroom);
        assert!(next.current_pictures.is_empty());
        assert_eq!(next.prior_cycle_pictures, vec![EncodedImage::new("enc:bedroom.jpg")]);

        let item = &next.items()[0];
        assert!(!item.completed);
        assert!(!item.is_new_this_cycle);
        assert_eq!(item.comment, "");
        assert_eq!(item.condition, Condition::NotSet);
        assert_eq!(item.cleanliness, Cleanliness::NotSet);
        assert!(item.current_pictures.is_empty());
        assert_eq!(item.prior_cycle_pictures, vec![EncodedImage::new("enc:wardrobe.jpg")]);
    }

    #[test]
    fn new_photos_replace_older_reference() {
        let mut room = evaluated_room();
        room.prior_cycle_pictures = vec![EncodedImage::new("enc:older.jpg")];

        let next = reset_for_next_cycle(&room, &identity);
        assert_eq!(next.prior_cycle_pictures, vec![EncodedImage::new("enc:bedroom.jpg")]);
    }

    #[test]
    fn unphotographed_room_keeps_its_reference() {
        let mut room = Room::new("r1", "Hall", RoomType::Hallway);
        room.prior_cycle_pictures = vec![EncodedImage::new("enc:older.jpg")];

        let next = reset_for_next_cycle(&room, &identity);
        assert_eq!(next.prior_cycle_pictures, room.prior_cycle_pictures);
    }

    #[test]
    fn second_reset_is_a_no_op() {
        let once = reset_for_next_cycle(&evaluated_room(), &identity);
        let twice = reset_for_next_cycle(&once, &identity);
        assert_eq!(once, twice);
    }
}
