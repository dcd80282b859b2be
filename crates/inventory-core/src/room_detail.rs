//! Room detail session
//!
//! Edits one room on a private working copy. [`RoomDetailSession::close`]
//! folds the copy back into the store; [`RoomDetailSession::cancel`] drops
//! it. Adding furniture is the exception: it goes through the store right
//! away, because the backend has already persisted the item.
//!
//! A session is bound to the walkthrough that opened it. Writes to the store
//! take the controller's phase lock and are refused once that walkthrough
//! has been confirmed or abandoned.

use crate::error::InventoryError;
use crate::lifecycle::ControllerState;
use crate::store::ReconciliationStore;
use inventory_model::{FieldEdit, FurnitureId, FurnitureItem, Room, RoomId};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Editing session on a single room
#[derive(Debug)]
pub struct RoomDetailSession {
    store: Arc<ReconciliationStore>,
    state: Arc<Mutex<ControllerState>>,
    epoch: u64,
    working: Room,
}

impl RoomDetailSession {
    pub(crate) fn new(
        store: Arc<ReconciliationStore>,
        state: Arc<Mutex<ControllerState>>,
        epoch: u64,
        room: Room,
    ) -> Self {
        Self {
            store,
            state,
            epoch,
            working: room,
        }
    }

    /// Working copy, including edits not yet applied to the store
    #[inline]
    #[must_use]
    pub fn room(&self) -> &Room {
        &self.working
    }

    #[inline]
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.working.id
    }

    /// Create a furniture item in this room
    ///
    /// # Errors
    /// - `NotOpen` or `StaleSession` if the walkthrough has ended
    /// - any error of [`ReconciliationStore::add_furniture`]
    pub async fn add_furniture(&mut self, name: &str) -> Result<FurnitureId, InventoryError> {
        let state = self.state.lock().await;
        state.admit(self.epoch)?;

        let room_id = self.working.id.clone();
        let id = self.store.add_furniture(&room_id, name).await?;
        drop(state);

        self.working
            .push_item(FurnitureItem::new_this_cycle(id.clone(), name));
        Ok(id)
    }

    /// Edit one furniture item of the working copy
    ///
    /// # Errors
    /// `Edit` if the item is unknown or the edit is invalid.
    pub fn edit_furniture(&mut self, id: &FurnitureId, edit: FieldEdit) -> Result<(), InventoryError> {
        self.working.update_item(id, edit)?;
        Ok(())
    }

    /// Edit the room's own fields
    ///
    /// # Errors
    /// `Edit` if the edit is invalid, including a refused `Completed(true)`.
    pub fn edit_room(&mut self, edit: FieldEdit) -> Result<(), InventoryError> {
        self.working.apply(edit)?;
        Ok(())
    }

    /// Try to mark the room completed; `false` when refused
    pub fn mark_room_completed(&mut self) -> bool {
        let accepted = self.working.mark_completed();
        if !accepted {
            tracing::debug!(
                room_id = %self.working.id,
                pending = self.working.pending_items(),
                "room completion refused"
            );
        }
        accepted
    }

    /// Apply the working copy to the store
    ///
    /// Returns `Ok(false)` if the room was removed from the walkthrough
    /// meanwhile.
    ///
    /// # Errors
    /// `NotOpen` or `StaleSession` if the walkthrough has ended; the working
    /// copy is dropped.
    pub async fn close(self) -> Result<bool, InventoryError> {
        let state = self.state.lock().await;
        if let Err(e) = state.admit(self.epoch) {
            tracing::warn!(room_id = %self.working.id, error = %e, "room detail write-back refused");
            return Err(e);
        }

        let id = self.working.id.clone();
        Ok(self.store.merge_room(&id, self.working))
    }

    /// Drop the working copy
    pub fn cancel(self) {
        tracing::trace!(room_id = %self.working.id, "room detail cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MockInventoryApi};
    use crate::lifecycle::WalkthroughPhase;
    use inventory_model::{Condition, ModelError, PropertyId, RoomType};

    fn store(api: MockInventoryApi) -> Arc<ReconciliationStore> {
        let store = ReconciliationStore::new(PropertyId::new("p1"), Arc::new(api), 1, 8);
        store.load_baseline(vec![Room::new("r1", "Bedroom", RoomType::Bedroom)
            .with_items(vec![FurnitureItem::new("f1", "Bed")])]);
        Arc::new(store)
    }

    fn entry_state() -> Arc<Mutex<ControllerState>> {
        Arc::new(Mutex::new(ControllerState {
            phase: WalkthroughPhase::Entry,
            epoch: 1,
            ..ControllerState::default()
        }))
    }

    fn open_in(store: &Arc<ReconciliationStore>, state: &Arc<Mutex<ControllerState>>) -> RoomDetailSession {
        let room = store.room(&RoomId::new("r1")).unwrap();
        RoomDetailSession::new(Arc::clone(store), Arc::clone(state), 1, room)
    }

    fn open(store: &Arc<ReconciliationStore>) -> RoomDetailSession {
        open_in(store, &entry_state())
    }

    #[tokio::test]
    async fn edits_stay_private_until_close() {
        let store = store(MockInventoryApi::new());
        let mut session = open(&store);

        session
            .edit_furniture(&FurnitureId::new("f1"), FieldEdit::Condition(Condition::Good))
            .unwrap();
        session.edit_room(FieldEdit::Comment("sunny".into())).unwrap();
        assert_eq!(store.room(&RoomId::new("r1")).unwrap().description, "");

        assert!(session.close().await.unwrap());
        let room = store.room(&RoomId::new("r1")).unwrap();
        assert_eq!(room.description, "sunny");
        assert_eq!(room.items()[0].condition, Condition::Good);
    }

    #[test]
    fn cancel_discards_edits() {
        let store = store(MockInventoryApi::new());
        let mut session = open(&store);

        session.edit_room(FieldEdit::Comment("sunny".into())).unwrap();
        session.cancel();

        assert_eq!(store.room(&RoomId::new("r1")).unwrap().description, "");
    }

    #[tokio::test]
    async fn completion_refused_while_items_pending() {
        let store = store(MockInventoryApi::new());
        let mut session = open(&store);

        assert!(!session.mark_room_completed());
        let err = session.edit_room(FieldEdit::Completed(true)).unwrap_err();
        assert!(matches!(err, InventoryError::Edit(ModelError::NotCompletable { pending: 1, .. })));

        session
            .edit_furniture(&FurnitureId::new("f1"), FieldEdit::Completed(true))
            .unwrap();
        assert!(session.mark_room_completed());
        assert!(session.close().await.unwrap());
        assert!(store.all_completed());
    }

    #[test]
    fn unknown_item_edit_is_rejected() {
        let store = store(MockInventoryApi::new());
        let mut session = open(&store);

        let err = session
            .edit_furniture(&FurnitureId::new("nope"), FieldEdit::Completed(true))
            .unwrap_err();
        assert!(matches!(err, InventoryError::Edit(ModelError::UnknownItem(_))));
    }

    #[tokio::test]
    async fn added_furniture_lands_in_store_and_working_copy() {
        let mut api = MockInventoryApi::new();
        api.expect_create_furniture()
            .returning(|_, _, _, _| Ok(FurnitureId::new("f2")));
        let store = store(api);
        let mut session = open(&store);

        let id = session.add_furniture("Wardrobe").await.unwrap();

        assert!(session.room().item(&id).is_some());
        assert!(store.room(&RoomId::new("r1")).unwrap().item(&id).is_some());

        session.cancel();
        assert!(store.room(&RoomId::new("r1")).unwrap().item(&id).is_some());
    }

    #[tokio::test]
    async fn failed_add_leaves_working_copy_unchanged() {
        let mut api = MockInventoryApi::new();
        api.expect_create_furniture()
            .returning(|_, _, _, _| Err(ApiError::Network("offline".into())));
        let store = store(api);
        let mut session = open(&store);

        assert!(session.add_furniture("Wardrobe").await.is_err());
        assert_eq!(session.room().items().len(), 1);
    }

    #[tokio::test]
    async fn close_after_room_removed_reports_false() {
        let store = store(MockInventoryApi::new());
        let session = open(&store);

        store.remove_room(&RoomId::new("r1"));
        assert!(!session.close().await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn closed_walkthrough_refuses_write_back() {
        let store = store(MockInventoryApi::new());
        let state = entry_state();
        let mut session = open_in(&store, &state);
        session.edit_room(FieldEdit::Comment("late".into())).unwrap();

        state.lock().await.end_walkthrough();

        assert!(matches!(session.close().await, Err(InventoryError::NotOpen)));
        assert_eq!(store.room(&RoomId::new("r1")).unwrap().description, "");
    }

    #[tokio::test]
    async fn session_from_earlier_walkthrough_is_stale() {
        let mut api = MockInventoryApi::new();
        api.expect_create_furniture().never();
        let store = store(api);
        let state = entry_state();
        let mut session = open_in(&store, &state);

        {
            let mut state = state.lock().await;
            state.end_walkthrough();
            state.phase = WalkthroughPhase::Exit;
            state.epoch += 1;
        }

        let err = session.add_furniture("Lamp").await.unwrap_err();
        assert!(matches!(err, InventoryError::StaleSession));
        assert_eq!(session.room().items().len(), 1);
        assert!(matches!(session.close().await, Err(InventoryError::StaleSession)));
    }
}
