//! Backend collaborator contract
//!
//! The engine consumes these operations and never implements them. Every
//! call may suspend; failures come back as [`ApiError`].

use inventory_model::{
    CycleType, FurnitureId, InventoryReport, LeaseId, PropertyId, ReportId, RoomId, RoomType,
};
use serde::{Deserialize, Serialize};

/// Backend call failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (unreachable, timeout, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Requested resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend refused the request
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Backend answered with something unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Whether retrying the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Rejected { status, .. } => *status >= 500,
            ApiError::NotFound(_) | ApiError::InvalidResponse(_) => false,
        }
    }
}

/// Room as listed by the property layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub room_type: RoomType,
}

/// Furniture as listed for a room of the property layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureSummary {
    pub id: FurnitureId,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Which report to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportSelector {
    /// Most recent report of any cycle
    Latest,
    /// Most recent report of the given cycle
    LatestOf(CycleType),
    /// A specific persisted report
    Id(ReportId),
}

impl std::fmt::Display for ReportSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportSelector::Latest => f.write_str("latest report"),
            ReportSelector::LatestOf(cycle) => write!(f, "latest {cycle} report"),
            ReportSelector::Id(id) => write!(f, "report {id}"),
        }
    }
}

/// Property-management backend as seen by the engine
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InventoryApi: Send + Sync {
    /// List the rooms of a property
    async fn fetch_rooms(&self, property: &PropertyId) -> Result<Vec<RoomSummary>, ApiError>;

    /// List the furniture of one room
    async fn fetch_furniture(
        &self,
        property: &PropertyId,
        room: &RoomId,
    ) -> Result<Vec<FurnitureSummary>, ApiError>;

    /// Persist a new room, returning its id
    async fn create_room(
        &self,
        property: &PropertyId,
        name: &str,
        room_type: RoomType,
    ) -> Result<RoomId, ApiError>;

    /// Persist a new furniture item, returning its id
    async fn create_furniture(
        &self,
        property: &PropertyId,
        room: &RoomId,
        name: &str,
        quantity: u32,
    ) -> Result<FurnitureId, ApiError>;

    /// Fetch a report; `ApiError::NotFound` when none matches
    async fn fetch_report(
        &self,
        property: &PropertyId,
        selector: ReportSelector,
    ) -> Result<InventoryReport, ApiError>;

    /// Submit a finished report, returning the persisted id
    async fn submit_report(
        &self,
        property: &PropertyId,
        lease: &LeaseId,
        report: &InventoryReport,
    ) -> Result<ReportId, ApiError>;
}
