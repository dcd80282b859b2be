//! Reconciliation store
//!
//! Single source of truth for an in-progress walkthrough:
//! - `active`: the live, user-editable room tree
//! - `baseline`: snapshot of the last load or submission, restored on discard
//!
//! Mutations go through the command methods below and are announced on a
//! broadcast feed. Network-backed commands only touch the room lists after
//! the backend has answered, so a cancelled or failed call leaves the store
//! unchanged. A room or item the backend created before a cancellation is
//! not rolled back.

use crate::api::InventoryApi;
use crate::error::{InventoryError, NameScope};
use inventory_model::{FurnitureId, FurnitureItem, PropertyId, Room, RoomId, RoomType};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Change notification published after every store mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    BaselineLoaded { rooms: usize },
    RoomAdded(RoomId),
    RoomRemoved(RoomId),
    RoomReplaced(RoomId),
    FurnitureAdded { room: RoomId, item: FurnitureId },
    Discarded,
    Committed { rooms: usize },
}

#[derive(Debug, Default)]
struct StoreState {
    active: Vec<Room>,
    baseline: Vec<Room>,
}

/// Room/furniture store for one property
pub struct ReconciliationStore {
    property: PropertyId,
    api: Arc<dyn InventoryApi>,
    furniture_quantity: u32,
    state: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl std::fmt::Debug for ReconciliationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ReconciliationStore")
            .field("property", &self.property)
            .field("active", &state.active.len())
            .field("baseline", &state.baseline.len())
            .finish_non_exhaustive()
    }
}

impl ReconciliationStore {
    /// Create an empty store
    ///
    /// `event_capacity` must be non-zero.
    #[must_use]
    pub fn new(
        property: PropertyId,
        api: Arc<dyn InventoryApi>,
        furniture_quantity: u32,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            property,
            api,
            furniture_quantity,
            state: Mutex::new(StoreState::default()),
            events,
        }
    }

    #[inline]
    #[must_use]
    pub fn property(&self) -> &PropertyId {
        &self.property
    }

    /// Subscribe to change notifications
    ///
    /// Slow subscribers lag and miss events; they never block mutations.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Replace both the live tree and the baseline with `rooms`
    pub fn load_baseline(&self, rooms: Vec<Room>) {
        let count = rooms.len();
        {
            let mut state = self.state.lock();
            state.baseline.clone_from(&rooms);
            state.active = rooms;
        }
        tracing::debug!(property = %self.property, rooms = count, "baseline loaded");
        self.publish(StoreEvent::BaselineLoaded { rooms: count });
    }

    /// Create a room through the backend and append it to the live tree
    ///
    /// # Errors
    /// - `DuplicateName` if a live room already has this exact name
    /// - `RoomCreation` if the backend call fails or returns an empty id
    #[tracing::instrument(skip(self), fields(property = %self.property))]
    pub async fn add_room(&self, name: &str, room_type: RoomType) -> Result<RoomId, InventoryError> {
        self.ensure_room_name_free(name)?;

        let id = self
            .api
            .create_room(&self.property, name, room_type)
            .await
            .map_err(InventoryError::RoomCreation)?;
        if !id.is_persisted() {
            return Err(InventoryError::RoomCreation(
                crate::api::ApiError::InvalidResponse("empty room id".into()),
            ));
        }

        {
            let mut state = self.state.lock();
            // Another add with the same name may have landed while we waited.
            if state.active.iter().any(|r| r.name == name) {
                tracing::warn!(room_id = %id, name, "room created twice under one name; backend copy is orphaned");
                return Err(duplicate_room(name));
            }
            state.active.push(Room::new_this_cycle(id.clone(), name, room_type));
        }

        tracing::debug!(room_id = %id, name, "room added");
        self.publish(StoreEvent::RoomAdded(id.clone()));
        Ok(id)
    }

    /// Remove a room from the live tree; returns whether one was removed
    pub fn remove_room(&self, id: &RoomId) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let before = state.active.len();
            state.active.retain(|r| &r.id != id);
            state.active.len() != before
        };

        if removed {
            tracing::debug!(room_id = %id, "room removed");
            self.publish(StoreEvent::RoomRemoved(id.clone()));
        }
        removed
    }

    /// Replace a live room wholesale; returns whether the id was found
    pub fn replace_room(&self, id: &RoomId, room: Room) -> bool {
        let replaced = {
            let mut state = self.state.lock();
            match state.active.iter_mut().find(|r| &r.id == id) {
                Some(slot) => {
                    *slot = room;
                    true
                }
                None => false,
            }
        };

        if replaced {
            self.publish(StoreEvent::RoomReplaced(id.clone()));
        }
        replaced
    }

    /// Fold an edited working copy back into the live room
    ///
    /// Room fields and items known to the working copy come from `working`.
    /// Items that reached the live room by other means are kept.
    pub(crate) fn merge_room(&self, id: &RoomId, working: Room) -> bool {
        let merged = {
            let mut state = self.state.lock();
            match state.active.iter_mut().find(|r| &r.id == id) {
                Some(slot) => {
                    let mut room = working;
                    for item in slot.items() {
                        if room.item(&item.id).is_none() {
                            room.push_item(item.clone());
                        }
                    }
                    *slot = room;
                    true
                }
                None => false,
            }
        };

        if merged {
            tracing::debug!(room_id = %id, "room detail applied");
            self.publish(StoreEvent::RoomReplaced(id.clone()));
        }
        merged
    }

    /// Create a furniture item through the backend and append it to a room
    ///
    /// # Errors
    /// - `UnknownRoom` if the room is not in the live tree
    /// - `DuplicateName` if the room already holds an item with this name
    /// - `FurnitureCreation` if the backend call fails or returns an empty id
    #[tracing::instrument(skip(self), fields(property = %self.property))]
    pub async fn add_furniture(
        &self,
        room_id: &RoomId,
        name: &str,
    ) -> Result<FurnitureId, InventoryError> {
        self.with_room(room_id, |room| ensure_item_name_free(room, name))??;

        let id = self
            .api
            .create_furniture(&self.property, room_id, name, self.furniture_quantity)
            .await
            .map_err(InventoryError::FurnitureCreation)?;
        if !id.is_persisted() {
            return Err(InventoryError::FurnitureCreation(
                crate::api::ApiError::InvalidResponse("empty furniture id".into()),
            ));
        }

        {
            let mut state = self.state.lock();
            let room = state
                .active
                .iter_mut()
                .find(|r| &r.id == room_id)
                .ok_or_else(|| InventoryError::UnknownRoom(room_id.clone()))?;
            ensure_item_name_free(room, name)?;
            room.push_item(FurnitureItem::new_this_cycle(id.clone(), name));
        }

        tracing::debug!(room_id = %room_id, item_id = %id, name, "furniture added");
        self.publish(StoreEvent::FurnitureAdded {
            room: room_id.clone(),
            item: id.clone(),
        });
        Ok(id)
    }

    /// Every room is completed (and therefore has at least one item)
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.state
            .lock()
            .active
            .iter()
            .all(|r| r.is_completed() && r.can_complete())
    }

    /// Names of rooms blocking confirmation, in walkthrough order
    #[must_use]
    pub fn incomplete_rooms(&self) -> Vec<String> {
        self.state
            .lock()
            .active
            .iter()
            .filter(|r| !(r.is_completed() && r.can_complete()))
            .map(|r| r.name.clone())
            .collect()
    }

    /// Restore the live tree from the baseline
    pub fn discard(&self) {
        {
            let mut state = self.state.lock();
            let baseline = state.baseline.clone();
            state.active = baseline;
        }
        tracing::debug!(property = %self.property, "edits discarded");
        self.publish(StoreEvent::Discarded);
    }

    /// Snapshot the live tree as the new baseline
    pub fn commit(&self) {
        let count = {
            let mut state = self.state.lock();
            let active = state.active.clone();
            state.baseline = active;
            state.baseline.len()
        };
        self.publish(StoreEvent::Committed { rooms: count });
    }

    /// Install `rooms` as both the live tree and the baseline
    pub fn commit_with(&self, rooms: Vec<Room>) {
        let count = rooms.len();
        {
            let mut state = self.state.lock();
            state.baseline.clone_from(&rooms);
            state.active = rooms;
        }
        tracing::debug!(property = %self.property, rooms = count, "carry-forward committed");
        self.publish(StoreEvent::Committed { rooms: count });
    }

    /// Copy of the live tree
    #[must_use]
    pub fn rooms(&self) -> Vec<Room> {
        self.state.lock().active.clone()
    }

    /// Copy of the baseline
    #[must_use]
    pub fn baseline(&self) -> Vec<Room> {
        self.state.lock().baseline.clone()
    }

    /// Copy of one live room
    #[must_use]
    pub fn room(&self, id: &RoomId) -> Option<Room> {
        self.state.lock().active.iter().find(|r| &r.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().active.is_empty()
    }

    fn with_room<T>(&self, id: &RoomId, f: impl FnOnce(&Room) -> T) -> Result<T, InventoryError> {
        let state = self.state.lock();
        state
            .active
            .iter()
            .find(|r| &r.id == id)
            .map(f)
            .ok_or_else(|| InventoryError::UnknownRoom(id.clone()))
    }

    fn ensure_room_name_free(&self, name: &str) -> Result<(), InventoryError> {
        if self.state.lock().active.iter().any(|r| r.name == name) {
            return Err(duplicate_room(name));
        }
        Ok(())
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

fn duplicate_room(name: &str) -> InventoryError {
    InventoryError::DuplicateName {
        name: name.to_string(),
        scope: NameScope::Rooms,
    }
}

fn ensure_item_name_free(room: &Room, name: &str) -> Result<(), InventoryError> {
    if room.has_item_named(name) {
        return Err(InventoryError::DuplicateName {
            name: name.to_string(),
            scope: NameScope::Furniture(room.id.clone()),
        });
    }
    Ok(())
}
