//! Engine configuration

use crate::error::InventoryError;
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Start the next walkthrough from the locally carried-forward baseline
    /// instead of refetching the last report
    pub reuse_carry_forward: bool,
    /// Encode photos on the blocking thread pool
    pub offload_encoding: bool,
    /// Quantity sent when creating furniture
    pub default_furniture_quantity: u32,
    /// Buffer size of the store change feed
    pub event_capacity: usize,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys take their defaults
    ///
    /// # Errors
    /// `InventoryError::Config` on malformed TOML or invalid values.
    pub fn from_toml_str(source: &str) -> Result<Self, InventoryError> {
        let config: Self =
            toml::from_str(source).map_err(|e| InventoryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `InventoryError::Config` naming the offending key.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.default_furniture_quantity == 0 {
            return Err(InventoryError::Config(
                "default_furniture_quantity must be at least 1".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(InventoryError::Config("event_capacity must be at least 1".into()));
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn with_reuse_carry_forward(mut self, reuse: bool) -> Self {
        self.reuse_carry_forward = reuse;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_offload_encoding(mut self, offload: bool) -> Self {
        self.offload_encoding = offload;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_furniture_quantity(mut self, quantity: u32) -> Self {
        self.default_furniture_quantity = quantity;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reuse_carry_forward: true,
            offload_encoding: true,
            default_furniture_quantity: 1,
            event_capacity: 64,
        }
    }
}
