//! Walkthrough lifecycle controller
//!
//! Drives one property's walkthrough through its phases:
//!
//! ```text
//! Closed --start(entry)--> Entry --confirm|abandon--> Closed
//! Closed --start(exit)---> Exit  --confirm|abandon--> Closed
//! ```
//!
//! Every controller operation holds the phase lock for its whole duration,
//! so operations are applied strictly in call order and confirmation always
//! observes the mutations issued before it. Room detail sessions take the
//! same lock to write back, and only while the walkthrough that opened them
//! is still open. A failed or cancelled operation
//! leaves both the phase and the store as they were. Backend side effects
//! that completed before a cancellation (a created room, a submitted report)
//! are not rolled back; callers get at-least-once semantics.

use crate::api::{ApiError, InventoryApi, ReportSelector};
use crate::config::EngineConfig;
use crate::error::InventoryError;
use crate::room_detail::RoomDetailSession;
use crate::store::{ReconciliationStore, StoreEvent};
use inventory_codec::{build_report, from_report_room, reset_for_next_cycle, ImageEncoder};
use inventory_model::{
    CycleType, FurnitureId, FurnitureItem, LeaseId, PropertyId, ReportId, Room, RoomId, RoomType,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// Walkthrough phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalkthroughPhase {
    #[default]
    Closed,
    Entry,
    Exit,
}

impl WalkthroughPhase {
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        self != WalkthroughPhase::Closed
    }

    /// Cycle being walked, if any
    #[inline]
    #[must_use]
    pub fn cycle(self) -> Option<CycleType> {
        match self {
            WalkthroughPhase::Closed => None,
            WalkthroughPhase::Entry => Some(CycleType::Entry),
            WalkthroughPhase::Exit => Some(CycleType::Exit),
        }
    }
}

impl From<CycleType> for WalkthroughPhase {
    fn from(cycle: CycleType) -> Self {
        match cycle {
            CycleType::Entry => WalkthroughPhase::Entry,
            CycleType::Exit => WalkthroughPhase::Exit,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ControllerState {
    pub(crate) phase: WalkthroughPhase,
    /// Store holds the carried-forward rooms of a confirmed cycle
    pub(crate) carried_forward: bool,
    /// Bumped whenever a walkthrough starts or ends
    pub(crate) epoch: u64,
}

impl ControllerState {
    pub(crate) fn end_walkthrough(&mut self) {
        self.phase = WalkthroughPhase::Closed;
        self.epoch += 1;
    }

    /// Check that a session opened at `epoch` may still write back
    pub(crate) fn admit(&self, epoch: u64) -> Result<(), InventoryError> {
        if !self.phase.is_open() {
            Err(InventoryError::NotOpen)
        } else if self.epoch != epoch {
            Err(InventoryError::StaleSession)
        } else {
            Ok(())
        }
    }
}

/// Lifecycle controller for one property and lease
pub struct WalkthroughController {
    config: EngineConfig,
    property: PropertyId,
    lease: LeaseId,
    api: Arc<dyn InventoryApi>,
    encoder: Arc<dyn ImageEncoder>,
    store: Arc<ReconciliationStore>,
    state: Arc<Mutex<ControllerState>>,
}

impl std::fmt::Debug for WalkthroughController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkthroughController")
            .field("config", &self.config)
            .field("property", &self.property)
            .field("lease", &self.lease)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl WalkthroughController {
    /// Create a controller in the `Closed` phase
    ///
    /// # Errors
    /// `InventoryError::Config` if `config` does not validate.
    pub fn new(
        config: EngineConfig,
        property: PropertyId,
        lease: LeaseId,
        api: Arc<dyn InventoryApi>,
        encoder: Arc<dyn ImageEncoder>,
    ) -> Result<Self, InventoryError> {
        config.validate()?;
        let store = Arc::new(ReconciliationStore::new(
            property.clone(),
            Arc::clone(&api),
            config.default_furniture_quantity,
            config.event_capacity,
        ));

        Ok(Self {
            config,
            property,
            lease,
            api,
            encoder,
            store,
            state: Arc::new(Mutex::new(ControllerState::default())),
        })
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn property(&self) -> &PropertyId {
        &self.property
    }

    /// Current phase; waits for an in-flight operation to finish
    pub async fn phase(&self) -> WalkthroughPhase {
        self.state.lock().await.phase
    }

    /// Subscribe to store change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Open a walkthrough for `cycle`
    ///
    /// Seeds the store from the carried-forward baseline when one is held and
    /// reuse is enabled, otherwise from the backend: the latest report for
    /// an entry, the latest entry report for an exit, or the property layout
    /// when no such report exists.
    ///
    /// # Errors
    /// - `AlreadyOpen` if a walkthrough is open
    /// - `Fetch` if the baseline cannot be loaded
    #[tracing::instrument(skip(self), fields(property = %self.property))]
    pub async fn start_walkthrough(&self, cycle: CycleType) -> Result<(), InventoryError> {
        let mut state = self.state.lock().await;
        if let Some(current) = state.phase.cycle() {
            tracing::warn!(%current, requested = %cycle, "walkthrough already open");
            return Err(InventoryError::AlreadyOpen { current });
        }

        if self.config.reuse_carry_forward && state.carried_forward {
            tracing::debug!("starting from carried-forward baseline");
            self.store.discard();
        } else {
            let rooms = self.fetch_baseline(cycle).await?;
            self.store.load_baseline(rooms);
        }

        state.phase = cycle.into();
        state.epoch += 1;
        tracing::info!(%cycle, rooms = self.store.len(), "walkthrough started");
        Ok(())
    }

    /// Close the walkthrough without saving, restoring the baseline
    ///
    /// # Errors
    /// `NotOpen` if no walkthrough is open.
    #[tracing::instrument(skip(self), fields(property = %self.property))]
    pub async fn abandon(&self) -> Result<(), InventoryError> {
        let mut state = self.state.lock().await;
        let cycle = state.phase.cycle().ok_or(InventoryError::NotOpen)?;

        self.store.discard();
        state.end_walkthrough();
        tracing::info!(%cycle, "walkthrough abandoned");
        Ok(())
    }

    /// Submit the walkthrough and carry its state forward
    ///
    /// On success the store holds the reset rooms (this cycle's photos moved
    /// to the prior-cycle pictures) as both live tree and baseline, and the
    /// phase is `Closed`.
    ///
    /// # Errors
    /// - `NotOpen` if no walkthrough is open
    /// - `NotAllCompleted` if any room is not completed; nothing is submitted
    /// - `Submission` if the backend rejects the report; the walkthrough stays open
    #[tracing::instrument(skip(self), fields(property = %self.property))]
    pub async fn confirm(&self) -> Result<ReportId, InventoryError> {
        let mut state = self.state.lock().await;
        let cycle = state.phase.cycle().ok_or(InventoryError::NotOpen)?;

        if !self.store.all_completed() {
            let incomplete = self.store.incomplete_rooms();
            tracing::warn!(%cycle, pending = incomplete.len(), "confirmation refused");
            return Err(InventoryError::NotAllCompleted { incomplete });
        }

        let rooms = self.store.rooms();
        let snapshot = rooms.clone();
        let report = self
            .run_encoding(move |encoder| build_report(cycle, &snapshot, encoder))
            .await?;

        let report_id = self
            .api
            .submit_report(&self.property, &self.lease, &report)
            .await
            .map_err(|e| {
                tracing::error!(%cycle, error = %e, "report submission failed");
                InventoryError::Submission(e)
            })?;

        let next = self
            .run_encoding(move |encoder| {
                rooms
                    .iter()
                    .map(|room| reset_for_next_cycle(room, encoder))
                    .collect::<Vec<_>>()
            })
            .await?;

        self.store.commit_with(next);
        state.carried_forward = true;
        state.end_walkthrough();
        tracing::info!(%cycle, report_id = %report_id, "walkthrough confirmed");
        Ok(report_id)
    }

    /// Add a room to the open walkthrough
    ///
    /// # Errors
    /// `NotOpen`, or any error of [`ReconciliationStore::add_room`].
    pub async fn add_room(&self, name: &str, room_type: RoomType) -> Result<RoomId, InventoryError> {
        let _state = self.open_state().await?;
        self.store.add_room(name, room_type).await
    }

    /// Remove a room from the open walkthrough; unknown ids are ignored
    ///
    /// # Errors
    /// `NotOpen` if no walkthrough is open.
    pub async fn remove_room(&self, id: &RoomId) -> Result<bool, InventoryError> {
        let _state = self.open_state().await?;
        Ok(self.store.remove_room(id))
    }

    /// Add a furniture item to a room of the open walkthrough
    ///
    /// # Errors
    /// `NotOpen`, or any error of [`ReconciliationStore::add_furniture`].
    pub async fn add_furniture(
        &self,
        room_id: &RoomId,
        name: &str,
    ) -> Result<FurnitureId, InventoryError> {
        let _state = self.open_state().await?;
        self.store.add_furniture(room_id, name).await
    }

    /// Open a detail session on one room of the open walkthrough
    ///
    /// The session is bound to this walkthrough: once it is confirmed or
    /// abandoned, the session can no longer write to the store.
    ///
    /// # Errors
    /// `NotOpen` or `UnknownRoom`.
    pub async fn open_room(&self, id: &RoomId) -> Result<RoomDetailSession, InventoryError> {
        let state = self.open_state().await?;
        let room = self
            .store
            .room(id)
            .ok_or_else(|| InventoryError::UnknownRoom(id.clone()))?;
        Ok(RoomDetailSession::new(
            Arc::clone(&self.store),
            Arc::clone(&self.state),
            state.epoch,
            room,
        ))
    }

    /// Copy of the live room tree
    #[must_use]
    pub fn get_rooms(&self) -> Vec<Room> {
        self.store.rooms()
    }

    #[must_use]
    pub fn is_all_completed(&self) -> bool {
        self.store.all_completed()
    }

    /// Load a submitted report for read-only display
    ///
    /// # Errors
    /// - `NotFound` if no report matches
    /// - `Fetch` on any other backend failure
    #[tracing::instrument(skip(self), fields(property = %self.property))]
    pub async fn view_report(&self, selector: ReportSelector) -> Result<Vec<Room>, InventoryError> {
        match self.api.fetch_report(&self.property, selector.clone()).await {
            Ok(report) => Ok(report
                .rooms
                .iter()
                .map(|room| from_report_room(room, false))
                .collect()),
            Err(ApiError::NotFound(_)) => Err(InventoryError::NotFound(selector.to_string())),
            Err(e) => Err(InventoryError::Fetch(e)),
        }
    }

    async fn open_state(&self) -> Result<tokio::sync::MutexGuard<'_, ControllerState>, InventoryError> {
        let state = self.state.lock().await;
        if state.phase.is_open() {
            Ok(state)
        } else {
            Err(InventoryError::NotOpen)
        }
    }

    async fn fetch_baseline(&self, cycle: CycleType) -> Result<Vec<Room>, InventoryError> {
        let selector = match cycle {
            CycleType::Entry => ReportSelector::Latest,
            CycleType::Exit => ReportSelector::LatestOf(CycleType::Entry),
        };

        match self.api.fetch_report(&self.property, selector).await {
            Ok(report) => {
                tracing::debug!(from = %report.cycle_type, rooms = report.rooms.len(), "seeding from previous report");
                Ok(report
                    .rooms
                    .iter()
                    .map(|room| from_report_room(room, true))
                    .collect())
            }
            Err(ApiError::NotFound(_)) => self.seed_from_layout().await,
            Err(e) => Err(InventoryError::Fetch(e)),
        }
    }

    async fn seed_from_layout(&self) -> Result<Vec<Room>, InventoryError> {
        let summaries = self
            .api
            .fetch_rooms(&self.property)
            .await
            .map_err(InventoryError::Fetch)?;

        let mut rooms = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let furniture = self
                .api
                .fetch_furniture(&self.property, &summary.id)
                .await
                .map_err(InventoryError::Fetch)?;
            let items = furniture
                .into_iter()
                .map(|f| FurnitureItem::new(f.id, f.name))
                .collect();
            rooms.push(Room::new(summary.id, summary.name, summary.room_type).with_items(items));
        }

        tracing::debug!(rooms = rooms.len(), "seeding from property layout");
        Ok(rooms)
    }

    async fn run_encoding<T, F>(&self, job: F) -> Result<T, InventoryError>
    where
        F: FnOnce(&dyn ImageEncoder) -> T + Send + 'static,
        T: Send + 'static,
    {
        let encoder = Arc::clone(&self.encoder);
        if !self.config.offload_encoding {
            return Ok(job(encoder.as_ref()));
        }

        match tokio::task::spawn_blocking(move || job(encoder.as_ref())).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(InventoryError::Cancelled(e.to_string())),
        }
    }
}
