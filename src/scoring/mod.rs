//! Risk scorer abstraction and per-node routing.
//!
//! Two scorers implement `RiskScorer`: `alert::thresholds::ThresholdScorer`
//! for sensors that report water level, and `classifier::ModelScorer` for
//! nodes scored by the trained classifier. Which one a node uses is decided
//! by a `ScorerRouting` built once at startup.

pub mod classifier;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{EngineError, RiskScore, ScorerVariant, SensorReading, validate_node_id};

/// Everything a scorer may look at for one node.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub latest: &'a SensorReading,
    /// Rainfall window, oldest first.
    pub history: &'a [f64],
    pub now: DateTime<Utc>,
}

pub trait RiskScorer: Send + Sync {
    fn variant(&self) -> ScorerVariant;

    fn score(&self, ctx: &ScoringContext<'_>) -> Result<RiskScore, EngineError>;
}

/// Static node_id → scorer mapping. Keys are matched case-insensitively;
/// ids without an explicit entry take the default variant.
#[derive(Debug, Clone)]
pub struct ScorerRouting {
    routes: HashMap<String, ScorerVariant>,
    default: ScorerVariant,
}

impl Default for ScorerRouting {
    fn default() -> Self {
        ScorerRouting::new(ScorerVariant::Model).with_route("drain_a01", ScorerVariant::Threshold)
    }
}

impl ScorerRouting {
    /// An empty routing that sends every node to `default`.
    pub fn new(default: ScorerVariant) -> Self {
        ScorerRouting {
            routes: HashMap::new(),
            default,
        }
    }

    pub fn with_route(mut self, node_id: &str, variant: ScorerVariant) -> Self {
        self.insert(node_id, variant);
        self
    }

    pub fn insert(&mut self, node_id: &str, variant: ScorerVariant) {
        self.routes.insert(node_id.to_ascii_lowercase(), variant);
    }

    pub fn default_variant(&self) -> ScorerVariant {
        self.default
    }

    /// Resolves the scorer for `node_id`. Malformed ids are rejected rather
    /// than falling through to the default.
    pub fn route(&self, node_id: &str) -> Result<ScorerVariant, EngineError> {
        validate_node_id(node_id)?;
        Ok(self
            .routes
            .get(&node_id.to_ascii_lowercase())
            .copied()
            .unwrap_or(self.default))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routing_sends_sentinel_to_threshold() {
        let routing = ScorerRouting::default();
        assert_eq!(routing.route("drain_a01"), Ok(ScorerVariant::Threshold));
        assert_eq!(routing.route("DRAIN_A01"), Ok(ScorerVariant::Threshold));
        assert_eq!(routing.route("chennai_adyar"), Ok(ScorerVariant::Model));
    }

    #[test]
    fn test_injected_routing_overrides_convention() {
        let routing = ScorerRouting::new(ScorerVariant::Threshold)
            .with_route("Lab-Node", ScorerVariant::Model);
        assert_eq!(routing.route("lab-node"), Ok(ScorerVariant::Model));
        assert_eq!(routing.route("drain_a01"), Ok(ScorerVariant::Threshold));
    }

    #[test]
    fn test_malformed_node_id_is_rejected() {
        let routing = ScorerRouting::default();
        assert!(matches!(routing.route(""), Err(EngineError::MalformedInput(_))));
        assert!(matches!(
            routing.route("drain a01"),
            Err(EngineError::MalformedInput(_))
        ));
    }
}
