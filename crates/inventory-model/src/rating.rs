//! Enumerated ratings and classifiers
//!
//! Wire names are camelCase (`needsRepair`, `livingRoom`).

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Wear rating of a room or furniture item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    /// Not evaluated yet
    #[default]
    NotSet,
    Broken,
    NeedsRepair,
    Bad,
    Medium,
    Good,
    New,
}

impl Condition {
    /// All ratings, worst first
    pub const ALL: [Condition; 7] = [
        Condition::NotSet,
        Condition::Broken,
        Condition::NeedsRepair,
        Condition::Bad,
        Condition::Medium,
        Condition::Good,
        Condition::New,
    ];

    /// Whether a rating has been recorded
    #[inline]
    #[must_use]
    pub fn is_set(self) -> bool {
        self != Condition::NotSet
    }

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::NotSet => "notSet",
            Condition::Broken => "broken",
            Condition::NeedsRepair => "needsRepair",
            Condition::Bad => "bad",
            Condition::Medium => "medium",
            Condition::Good => "good",
            Condition::New => "new",
        }
    }
}

impl FromStr for Condition {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ModelError::UnknownValue {
                kind: "condition",
                value: s.to_string(),
            })
    }
}

/// Cleanliness rating of a room or furniture item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cleanliness {
    /// Not evaluated yet
    #[default]
    NotSet,
    Dirty,
    Medium,
    Clean,
}

impl Cleanliness {
    /// All ratings, dirtiest first
    pub const ALL: [Cleanliness; 4] = [
        Cleanliness::NotSet,
        Cleanliness::Dirty,
        Cleanliness::Medium,
        Cleanliness::Clean,
    ];

    /// Whether a rating has been recorded
    #[inline]
    #[must_use]
    pub fn is_set(self) -> bool {
        self != Cleanliness::NotSet
    }

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Cleanliness::NotSet => "notSet",
            Cleanliness::Dirty => "dirty",
            Cleanliness::Medium => "medium",
            Cleanliness::Clean => "clean",
        }
    }
}

impl FromStr for Cleanliness {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cleanliness::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ModelError::UnknownValue {
                kind: "cleanliness",
                value: s.to_string(),
            })
    }
}

/// Kind of room, as chosen when the room is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomType {
    Bedroom,
    LivingRoom,
    Kitchen,
    Bathroom,
    Toilet,
    DiningRoom,
    Hallway,
    Office,
    Laundry,
    Balcony,
    Cellar,
    Garage,
    #[default]
    Other,
}

impl RoomType {
    /// All room kinds
    pub const ALL: [RoomType; 13] = [
        RoomType::Bedroom,
        RoomType::LivingRoom,
        RoomType::Kitchen,
        RoomType::Bathroom,
        RoomType::Toilet,
        RoomType::DiningRoom,
        RoomType::Hallway,
        RoomType::Office,
        RoomType::Laundry,
        RoomType::Balcony,
        RoomType::Cellar,
        RoomType::Garage,
        RoomType::Other,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Bedroom => "bedroom",
            RoomType::LivingRoom => "livingRoom",
            RoomType::Kitchen => "kitchen",
            RoomType::Bathroom => "bathroom",
            RoomType::Toilet => "toilet",
            RoomType::DiningRoom => "diningRoom",
            RoomType::Hallway => "hallway",
            RoomType::Office => "office",
            RoomType::Laundry => "laundry",
            RoomType::Balcony => "balcony",
            RoomType::Cellar => "cellar",
            RoomType::Garage => "garage",
            RoomType::Other => "other",
        }
    }
}

impl FromStr for RoomType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::UnknownValue {
                kind: "room type",
                value: s.to_string(),
            })
    }
}

/// Inventory cycle: lease start or lease end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CycleType {
    Entry,
    Exit,
}

impl CycleType {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CycleType::Entry => "entry",
            CycleType::Exit => "exit",
        }
    }
}

impl std::fmt::Display for CycleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
