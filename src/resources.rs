/// Emergency resource catalog.
///
/// Maps each location id to the pumping stations, diversion roads and
/// shelters available there. Loaded once at startup from a JSON object
/// keyed by location id and read-only afterwards, so a single instance can
/// be shared across threads behind an `Arc` without locking.
///
/// An unknown location id is a normal outcome: `lookup` returns `None` and
/// the strategy engine answers with an informational suggestion.

use std::collections::HashMap;
use std::path::Path;

use crate::model::{ConfigError, ResourceProfile};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCatalog {
    profiles: HashMap<String, ResourceProfile>,
}

impl ResourceCatalog {
    pub fn new(profiles: HashMap<String, ResourceProfile>) -> Self {
        ResourceCatalog { profiles }
    }

    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, ConfigError> {
        let profiles: HashMap<String, ResourceProfile> =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::new(profiles))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: origin.clone(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json, &origin)
    }

    /// Looks up a location. Returns `None` if the location has no profile.
    pub fn lookup(&self, location_id: &str) -> Option<&ResourceProfile> {
        self.profiles.get(location_id)
    }

    /// All location ids, sorted.
    pub fn location_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
