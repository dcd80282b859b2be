//! Testing utilities for the inventory workspace
//!
//! In-memory backend, deterministic encoders and walkthrough fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use inventory_codec::{EncodingError, ImageEncoder};
use inventory_core::{
    ApiError, EngineConfig, FurnitureSummary, InventoryApi, InventoryError, ReportSelector,
    RoomSummary, WalkthroughController,
};
use inventory_model::{
    CycleType, EncodedImage, FieldEdit, FurnitureId, ImageRef, InventoryReport, LeaseId,
    PropertyId, ReportId, RoomId, RoomType,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Backend operation, for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    FetchRooms,
    FetchFurniture,
    CreateRoom,
    CreateFurniture,
    FetchReport,
    SubmitReport,
}

#[derive(Debug, Clone)]
struct LayoutRoom {
    summary: RoomSummary,
    furniture: Vec<FurnitureSummary>,
}

#[derive(Debug, Default)]
struct Backend {
    layout: Vec<LayoutRoom>,
    reports: Vec<(ReportId, LeaseId, InventoryReport)>,
    next_id: u64,
    calls: HashMap<ApiCall, usize>,
    failures: HashMap<ApiCall, Vec<ApiError>>,
}

impl Backend {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn enter(&mut self, call: ApiCall) -> Result<(), ApiError> {
        *self.calls.entry(call).or_default() += 1;
        match self.failures.get_mut(&call) {
            Some(queue) if !queue.is_empty() => Err(queue.remove(0)),
            _ => Ok(()),
        }
    }
}

/// In-memory property backend
///
/// Side effects are applied before the configured latency elapses, so a
/// caller that gives up while waiting still leaves them behind.
#[derive(Debug, Default)]
pub struct InMemoryInventoryApi {
    backend: Mutex<Backend>,
    latency: Mutex<Option<Duration>>,
}

impl InMemoryInventoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layout room with the given furniture names
    #[must_use]
    pub fn with_layout_room(self, name: &str, room_type: RoomType, furniture: &[&str]) -> Self {
        {
            let mut backend = self.backend.lock();
            let id = RoomId::new(backend.next_id("room"));
            let furniture = furniture
                .iter()
                .map(|name| FurnitureSummary {
                    id: FurnitureId::new(backend.next_id("furniture")),
                    name: (*name).to_string(),
                    quantity: 1,
                })
                .collect();
            backend.layout.push(LayoutRoom {
                summary: RoomSummary {
                    id,
                    name: name.to_string(),
                    room_type,
                },
                furniture,
            });
        }
        self
    }

    /// Store a report as if it had been submitted earlier
    #[must_use]
    pub fn with_report(self, report: InventoryReport) -> Self {
        {
            let mut backend = self.backend.lock();
            let id = ReportId::new(backend.next_id("report"));
            backend.reports.push((id, LeaseId::new("seed"), report));
        }
        self
    }

    /// Delay every response by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Fail the next `call` with `error`; queued errors are used in order
    pub fn fail_next(&self, call: ApiCall, error: ApiError) {
        self.backend
            .lock()
            .failures
            .entry(call)
            .or_default()
            .push(error);
    }

    /// Number of times `call` was invoked, failed calls included
    #[must_use]
    pub fn calls(&self, call: ApiCall) -> usize {
        self.backend.lock().calls.get(&call).copied().unwrap_or(0)
    }

    /// Submitted reports, oldest first
    #[must_use]
    pub fn reports(&self) -> Vec<InventoryReport> {
        self.backend
            .lock()
            .reports
            .iter()
            .map(|(_, _, report)| report.clone())
            .collect()
    }

    #[must_use]
    pub fn last_report(&self) -> Option<InventoryReport> {
        self.backend.lock().reports.last().map(|(_, _, r)| r.clone())
    }

    /// Names of rooms persisted in the layout
    #[must_use]
    pub fn room_names(&self) -> Vec<String> {
        self.backend
            .lock()
            .layout
            .iter()
            .map(|r| r.summary.name.clone())
            .collect()
    }

    async fn respond(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl InventoryApi for InMemoryInventoryApi {
    async fn fetch_rooms(&self, _property: &PropertyId) -> Result<Vec<RoomSummary>, ApiError> {
        let result = {
            let mut backend = self.backend.lock();
            backend.enter(ApiCall::FetchRooms).map(|()| {
                backend.layout.iter().map(|r| r.summary.clone()).collect()
            })
        };
        self.respond().await;
        result
    }

    async fn fetch_furniture(
        &self,
        _property: &PropertyId,
        room: &RoomId,
    ) -> Result<Vec<FurnitureSummary>, ApiError> {
        let result = {
            let mut backend = self.backend.lock();
            backend.enter(ApiCall::FetchFurniture).and_then(|()| {
                backend
                    .layout
                    .iter()
                    .find(|r| &r.summary.id == room)
                    .map(|r| r.furniture.clone())
                    .ok_or_else(|| ApiError::NotFound(format!("room {room}")))
            })
        };
        self.respond().await;
        result
    }

    async fn create_room(
        &self,
        _property: &PropertyId,
        name: &str,
        room_type: RoomType,
    ) -> Result<RoomId, ApiError> {
        let result = {
            let mut backend = self.backend.lock();
            backend.enter(ApiCall::CreateRoom).map(|()| {
                let id = RoomId::new(backend.next_id("room"));
                backend.layout.push(LayoutRoom {
                    summary: RoomSummary {
                        id: id.clone(),
                        name: name.to_string(),
                        room_type,
                    },
                    furniture: Vec::new(),
                });
                id
            })
        };
        self.respond().await;
        result
    }

    async fn create_furniture(
        &self,
        _property: &PropertyId,
        room: &RoomId,
        name: &str,
        quantity: u32,
    ) -> Result<FurnitureId, ApiError> {
        let result = {
            let mut backend = self.backend.lock();
            backend.enter(ApiCall::CreateFurniture).and_then(|()| {
                let id = FurnitureId::new(backend.next_id("furniture"));
                let layout_room = backend
                    .layout
                    .iter_mut()
                    .find(|r| &r.summary.id == room)
                    .ok_or_else(|| ApiError::NotFound(format!("room {room}")))?;
                layout_room.furniture.push(FurnitureSummary {
                    id: id.clone(),
                    name: name.to_string(),
                    quantity,
                });
                Ok(id)
            })
        };
        self.respond().await;
        result
    }

    async fn fetch_report(
        &self,
        _property: &PropertyId,
        selector: ReportSelector,
    ) -> Result<InventoryReport, ApiError> {
        let result = {
            let mut backend = self.backend.lock();
            backend.enter(ApiCall::FetchReport).and_then(|()| {
                let found = match &selector {
                    ReportSelector::Latest => backend.reports.last(),
                    ReportSelector::LatestOf(cycle) => {
                        backend.reports.iter().rev().find(|(_, _, r)| r.cycle_type == *cycle)
                    }
                    ReportSelector::Id(id) => backend.reports.iter().find(|(rid, _, _)| rid == id),
                };
                found
                    .map(|(_, _, report)| report.clone())
                    .ok_or_else(|| ApiError::NotFound(selector.to_string()))
            })
        };
        self.respond().await;
        result
    }

    async fn submit_report(
        &self,
        _property: &PropertyId,
        lease: &LeaseId,
        report: &InventoryReport,
    ) -> Result<ReportId, ApiError> {
        let result = {
            let mut backend = self.backend.lock();
            backend.enter(ApiCall::SubmitReport).map(|()| {
                let id = ReportId::new(backend.next_id("report"));
                backend.reports.push((id.clone(), lease.clone(), report.clone()));
                id
            })
        };
        self.respond().await;
        result
    }
}

/// Encodes an image as its own location text
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityEncoder;

impl ImageEncoder for IdentityEncoder {
    fn encode(&self, image: &ImageRef) -> Result<EncodedImage, EncodingError> {
        Ok(EncodedImage::new(image.as_str()))
    }
}

/// Fails every image whose location contains `marker`
#[derive(Debug, Clone)]
pub struct FailingEncoder {
    marker: String,
}

impl FailingEncoder {
    #[must_use]
    pub fn matching(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl ImageEncoder for FailingEncoder {
    fn encode(&self, image: &ImageRef) -> Result<EncodedImage, EncodingError> {
        if image.as_str().contains(&self.marker) {
            return Err(EncodingError::Unsupported(image.to_string()));
        }
        Ok(EncodedImage::new(image.as_str()))
    }
}

/// Backend with a two-room layout and no reports
#[must_use]
pub fn sample_backend() -> InMemoryInventoryApi {
    InMemoryInventoryApi::new()
        .with_layout_room("Kitchen", RoomType::Kitchen, &["Oven", "Fridge"])
        .with_layout_room("Bedroom", RoomType::Bedroom, &["Bed"])
}

/// Controller on `api` with the default configuration and the identity encoder
#[must_use]
pub fn setup_controller(api: Arc<InMemoryInventoryApi>) -> WalkthroughController {
    setup_controller_with(api, Arc::new(IdentityEncoder), EngineConfig::new())
}

/// # Panics
/// If `config` is invalid.
#[must_use]
pub fn setup_controller_with(
    api: Arc<InMemoryInventoryApi>,
    encoder: Arc<dyn ImageEncoder>,
    config: EngineConfig,
) -> WalkthroughController {
    WalkthroughController::new(
        config,
        PropertyId::new("property-1"),
        LeaseId::new("lease-1"),
        api,
        encoder,
    )
    .expect("valid test configuration")
}

/// Photograph and complete every room of the open walkthrough
///
/// Rooms without furniture get one item first. Each room and item receives
/// a photo named after `cycle` and its own name.
///
/// # Errors
/// - `UnknownRoom` if a room is removed while it is being walked
/// - any error from the controller or the room sessions
pub async fn complete_walkthrough(
    controller: &WalkthroughController,
    cycle: CycleType,
) -> Result<(), InventoryError> {
    for room in controller.get_rooms() {
        let mut session = controller.open_room(&room.id).await?;
        if session.room().items().is_empty() {
            session.add_furniture("Fixture").await?;
        }

        let items: Vec<_> = session
            .room()
            .items()
            .iter()
            .map(|i| (i.id.clone(), i.name.clone()))
            .collect();
        for (id, name) in items {
            session.edit_furniture(
                &id,
                FieldEdit::AddPicture(ImageRef::new(format!("{cycle}/{}/{name}.jpg", room.name))),
            )?;
            session.edit_furniture(&id, FieldEdit::Completed(true))?;
        }
        session.edit_room(FieldEdit::AddPicture(ImageRef::new(format!(
            "{cycle}/{}.jpg",
            room.name
        ))))?;
        session.edit_room(FieldEdit::Completed(true))?;
        if !session.close().await? {
            return Err(InventoryError::UnknownRoom(room.id));
        }
    }
    Ok(())
}
