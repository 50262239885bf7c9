//! Engine configuration: station, transit time, difficulty budgets and the
//! clue trail.
//!
//! Designed to be deserialized from RON. Every field has a built-in default
//! so a data file only needs to list what it overrides.
//!
//! # Example RON
//!
//! ```ron
//! EngineConfig(
//!     base_location: (x: 8, y: 10),
//!     transit_secs: 15,
//!     clues: [
//!         (id: 1, true_location: (x: 17, y: 13), acceptance_radius: 4.0),
//!     ],
//! )
//! ```
//!
//! **Note:** this module contains no file IO; loading from disk is handled
//! by the host.

use serde::{Deserialize, Serialize};

use crate::catalog::ClueCatalog;
use crate::difficulty::ProfileTable;
use crate::error::{DispatchError, Result};
use crate::grid::GridPos;
use crate::transit::DEFAULT_TRANSIT_SECS;

/// Default station location.
pub const DEFAULT_BASE_LOCATION: GridPos = GridPos::new(8, 10);

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Station every unit leaves from.
    pub base_location: GridPos,
    /// Seconds every trip takes, regardless of distance.
    pub transit_secs: u32,
    /// Budgets per difficulty.
    pub profiles: ProfileTable,
    /// The trail of clues.
    pub clues: ClueCatalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_location: DEFAULT_BASE_LOCATION,
            transit_secs: DEFAULT_TRANSIT_SECS,
            profiles: ProfileTable::default(),
            clues: ClueCatalog::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a RON document.
    ///
    /// `source` names the document in error messages (usually a path).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DataParseError`] if the text is not valid
    /// RON for this structure (including catalog or profile problems caught
    /// during deserialization), or [`DispatchError::InvalidCatalog`] if the
    /// remaining checks in [`validate`](Self::validate) fail.
    pub fn from_ron_str(text: &str, source: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| DispatchError::DataParseError {
            path: source.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(
            source,
            clues = config.clues.len(),
            transit_secs = config.transit_secs,
            "Loaded engine config"
        );
        Ok(config)
    }

    /// Render as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            DispatchError::DataParseError {
                path: "<engine config>".to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Check the invariants not already enforced by the field types.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidCatalog`] if the station is off the
    /// map or the transit time is zero.
    pub fn validate(&self) -> Result<()> {
        if !self.base_location.in_bounds() {
            return Err(DispatchError::InvalidCatalog(format!(
                "base location ({}, {}) is off the map",
                self.base_location.x, self.base_location.y
            )));
        }
        if self.transit_secs == 0 {
            return Err(DispatchError::InvalidCatalog(
                "transit_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
