/// Core data types for the drainage flood control service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic beyond validation, no I/O, and only serde as an
/// external dependency.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of rainfall values retained per node.
pub const HISTORY_CAPACITY: usize = 7;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One ingested observation from a drainage node or weather feed.
///
/// Immutable once constructed. A newer reading for the same node replaces
/// this one in the node's "latest" slot; only its rainfall survives in the
/// rolling history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub node_id: String,
    #[serde(rename = "rainfall_mm_hr")]
    pub rainfall_mm_per_hr: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_level_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate_lps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_percent: Option<f64>,
}

impl SensorReading {
    /// A reading carrying only rainfall; all optional channels empty.
    pub fn rainfall(node_id: &str, rainfall_mm_per_hr: f64) -> Self {
        SensorReading {
            node_id: node_id.to_string(),
            rainfall_mm_per_hr,
            water_level_cm: None,
            flow_rate_lps: None,
            lat: None,
            lon: None,
            temperature_c: None,
            humidity_percent: None,
        }
    }

    pub fn with_water_level(mut self, water_level_cm: f64) -> Self {
        self.water_level_cm = Some(water_level_cm);
        self
    }
}

/// Returns `Ok(())` if `node_id` is usable as a history key.
///
/// Accepted ids are non-empty, carry no surrounding whitespace, and use only
/// ASCII alphanumerics, `_`, `-` and `.`.
pub fn validate_node_id(node_id: &str) -> Result<(), EngineError> {
    if node_id.is_empty() {
        return Err(EngineError::MalformedInput("node_id is required".to_string()));
    }
    let valid = node_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        return Err(EngineError::MalformedInput(format!(
            "node_id '{}' contains unsupported characters",
            node_id
        )));
    }
    Ok(())
}

/// Returns `Ok(())` if `rainfall` is a finite, non-negative rate.
pub fn validate_rainfall(rainfall: f64) -> Result<(), EngineError> {
    if !rainfall.is_finite() || rainfall < 0.0 {
        return Err(EngineError::MalformedInput(format!(
            "rainfall_mm_hr must be a non-negative number, got {}",
            rainfall
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scoring types
// ---------------------------------------------------------------------------

/// Which scorer a node is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerVariant {
    Threshold,
    Model,
}

impl fmt::Display for ScorerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScorerVariant::Threshold => f.pad("threshold"),
            ScorerVariant::Model => f.pad("model"),
        }
    }
}

/// Output of any scorer: a risk in [0, 1] and the binary flood flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskScore {
    pub risk: f64,
    pub flood: bool,
}

/// Full scoring result for one node, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeAssessment {
    pub node_id: String,
    pub scorer: ScorerVariant,
    pub live_data: SensorReading,
    pub flood: bool,
    pub risk_score: f64,
    pub history: Vec<f64>,
}

/// Per-node assessments plus the nodes that could not be scored.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub nodes: BTreeMap<String, NodeAssessment>,
    pub failures: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Resource and suggestion types
// ---------------------------------------------------------------------------

/// A road that can be closed or diverted. Any fields beyond `name` are kept
/// verbatim so downstream automation receives the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadRecord {
    pub name: String,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Emergency assets available at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pumping_stations: Vec<String>,
    #[serde(default)]
    pub major_roads_for_rerouting: Vec<RoadRecord>,
    #[serde(default)]
    pub emergency_shelters: Vec<String>,
}

impl ResourceProfile {
    /// Display name, falling back to a generic phrase.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("the area")
    }

    pub fn road_names(&self) -> Vec<&str> {
        self.major_roads_for_rerouting
            .iter()
            .map(|road| road.name.as_str())
            .collect()
    }
}

/// Suggestion priority, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Info => write!(f, "Info"),
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
            Priority::Critical => write!(f, "Critical"),
        }
    }
}

/// Machine-readable tag for suggestions that drive automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Pumping,
    TrafficReroute,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionPayload {
    pub roads: Vec<RoadRecord>,
}

/// One emitted control action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub priority: Priority,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SuggestionKind>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<SuggestionPayload>,
}

impl Suggestion {
    pub fn new(priority: Priority, action: impl Into<String>) -> Self {
        Suggestion {
            priority,
            kind: None,
            action: action.into(),
            payload: None,
        }
    }

    pub fn tagged(priority: Priority, kind: SuggestionKind, action: impl Into<String>) -> Self {
        Suggestion {
            kind: Some(kind),
            ..Suggestion::new(priority, action)
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by the scoring and strategy pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No resource profile exists for the location. Recovered locally by the
    /// strategy path; never returned from `FloodEngine::suggestions`.
    ConfigurationMissing(String),
    /// The classifier artifact failed to load at startup.
    ModelUnavailable(String),
    /// The request could not be interpreted (missing node_id, bad score, ...).
    MalformedInput(String),
    /// The node has never been ingested.
    NodeNotFound(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ConfigurationMissing(id) => {
                write!(f, "No resources configured for location: {}", id)
            }
            EngineError::ModelUnavailable(msg) => write!(f, "Model unavailable: {}", msg),
            EngineError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            EngineError::NodeNotFound(id) => write!(f, "Node not found: {}", id),
        }
    }
}

impl std::error::Error for EngineError {}

/// Errors raised while loading configuration, catalog, or model files.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse { path: String, message: String },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => write!(f, "Cannot read {}: {}", path, message),
            ConfigError::Parse { path, message } => {
                write!(f, "Cannot parse {}: {}", path, message)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering_matches_severity() {
        assert!(Priority::Info < Priority::Low);
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Critical);
    }

    #[test]
    fn test_node_id_validation() {
        assert!(validate_node_id("drain_a01").is_ok());
        assert!(validate_node_id("chennai-adyar.2").is_ok());
        assert!(matches!(validate_node_id(""), Err(EngineError::MalformedInput(_))));
        assert!(matches!(validate_node_id(" drain"), Err(EngineError::MalformedInput(_))));
        assert!(matches!(validate_node_id("a/b"), Err(EngineError::MalformedInput(_))));
    }

    #[test]
    fn test_rainfall_validation() {
        assert!(validate_rainfall(0.0).is_ok());
        assert!(validate_rainfall(62.5).is_ok());
        for bad in [-0.1, f64::NAN, f64::NEG_INFINITY, f64::INFINITY] {
            assert!(matches!(validate_rainfall(bad), Err(EngineError::MalformedInput(_))));
        }
    }

    #[test]
    fn test_scorer_variant_display_honours_width() {
        assert_eq!(format!("{:<9}|", ScorerVariant::Model), "model    |");
        assert_eq!(format!("{:<9}|", ScorerVariant::Threshold), "threshold|");
    }

    #[test]
    fn test_suggestion_serializes_without_empty_optionals() {
        let s = Suggestion::new(Priority::Info, "Conditions are normal.");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["priority"], "Info");
        assert!(json.get("type").is_none());
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_tagged_suggestion_uses_type_key() {
        let s = Suggestion::tagged(Priority::Critical, SuggestionKind::TrafficReroute, "Divert.");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["type"], "traffic_reroute");
    }

    #[test]
    fn test_road_record_keeps_metadata() {
        let road: RoadRecord = serde_json::from_str(
            r#"{"name": "OMR", "lat": 12.9, "alternate": "ECR"}"#,
        )
        .unwrap();
        assert_eq!(road.name, "OMR");
        assert_eq!(road.metadata["alternate"], "ECR");
        let back = serde_json::to_value(&road).unwrap();
        assert_eq!(back["lat"], 12.9);
    }

    #[test]
    fn test_profile_display_name_defaults() {
        let profile = ResourceProfile {
            name: None,
            pumping_stations: vec![],
            major_roads_for_rerouting: vec![],
            emergency_shelters: vec![],
        };
        assert_eq!(profile.display_name(), "the area");
    }
}
