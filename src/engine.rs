//! The scoring and strategy pipeline.
//!
//! `FloodEngine` owns the history store and holds the read-only pieces
//! loaded at startup (routing, scorers, resource catalog). It is built
//! explicitly by the caller; there is no process-wide instance.
//!
//! reading → `ingest` → history
//! node_id → `assess` → route → scorer → `NodeAssessment`
//! (location_id, risk) → `suggestions` → catalog lookup → strategy

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::alert::thresholds::ThresholdScorer;
use crate::config::ServiceConfig;
use crate::history::HistoryStore;
use crate::ingest::packet;
use crate::logging::{self, Component};
use crate::model::{
    ConfigError, EngineError, NodeAssessment, ScorerVariant, SensorReading, StatusReport,
    Suggestion, validate_node_id, validate_rainfall,
};
use crate::resources::ResourceCatalog;
use crate::scoring::classifier::ModelScorer;
use crate::scoring::{RiskScorer, ScorerRouting, ScoringContext};
use crate::strategy;

pub struct FloodEngine {
    history: HistoryStore,
    routing: ScorerRouting,
    threshold: ThresholdScorer,
    model: ModelScorer,
    catalog: Arc<ResourceCatalog>,
}

impl FloodEngine {
    pub fn new(routing: ScorerRouting, model: ModelScorer, catalog: Arc<ResourceCatalog>) -> Self {
        FloodEngine {
            history: HistoryStore::new(),
            routing,
            threshold: ThresholdScorer::new(),
            model,
            catalog,
        }
    }

    /// Builds the engine from configuration.
    ///
    /// A missing or invalid resource catalog is fatal. A classifier artifact
    /// that fails to load is not: the engine starts with an unavailable
    /// model scorer and model-routed nodes fail with `ModelUnavailable`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let catalog = ResourceCatalog::load(&config.paths.resources)?;
        logging::info(
            Component::Catalog,
            None,
            &format!(
                "Loaded {} location profiles from {}",
                catalog.len(),
                config.paths.resources.display()
            ),
        );

        let model = ModelScorer::load(&config.paths.model);
        match (model.version(), model.unavailable_reason()) {
            (Some(version), _) => logging::info(
                Component::Scoring,
                None,
                &format!("Model {} loaded from {}", version, config.paths.model.display()),
            ),
            (None, Some(reason)) => logging::error(
                Component::Scoring,
                None,
                &format!("Model unavailable, model-routed nodes will fail: {}", reason),
            ),
            (None, None) => {}
        }

        Ok(Self::new(config.routing(), model, Arc::new(catalog)))
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    pub fn model(&self) -> &ModelScorer {
        &self.model
    }

    // --- Ingestion -----------------------------------------------------------

    /// Records a reading as the node's latest and appends its rainfall.
    ///
    /// Rejects malformed node ids and negative or non-finite rainfall with
    /// `MalformedInput`; nothing is stored for a rejected reading.
    pub fn ingest(&self, reading: SensorReading) -> Result<(), EngineError> {
        validate_node_id(&reading.node_id)?;
        validate_rainfall(reading.rainfall_mm_per_hr)?;
        logging::debug(
            Component::Ingest,
            Some(&reading.node_id),
            &format!("Received reading, rainfall {} mm/hr", reading.rainfall_mm_per_hr),
        );
        self.history.record(reading);
        Ok(())
    }

    /// Parses and ingests one JSON packet, returning the stored reading.
    pub fn ingest_packet(&self, json: &str) -> Result<SensorReading, EngineError> {
        let reading = packet::parse_packet(json)?;
        self.ingest(reading.clone())?;
        Ok(reading)
    }

    // --- Scoring -------------------------------------------------------------

    fn scorer(&self, variant: ScorerVariant) -> &dyn RiskScorer {
        match variant {
            ScorerVariant::Threshold => &self.threshold,
            ScorerVariant::Model => &self.model,
        }
    }

    /// Scores one node at `now`.
    pub fn assess(&self, node_id: &str, now: DateTime<Utc>) -> Result<NodeAssessment, EngineError> {
        let variant = self.routing.route(node_id)?;
        let (latest, history) = self.history.snapshot(node_id)?;
        logging::debug(
            Component::Scoring,
            Some(node_id),
            &format!("Using {} scorer", variant),
        );

        let ctx = ScoringContext {
            latest: &latest,
            history: &history,
            now,
        };
        let score = self.scorer(variant).score(&ctx)?;

        Ok(NodeAssessment {
            node_id: node_id.to_string(),
            scorer: variant,
            live_data: latest,
            flood: score.flood,
            risk_score: score.risk,
            history,
        })
    }

    /// Scores every node with a latest reading. Failures are collected per
    /// node and logged; they never abort the other nodes.
    pub fn status(&self, now: DateTime<Utc>) -> StatusReport {
        let mut report = StatusReport::default();
        for node_id in self.history.node_ids() {
            if self.history.latest(&node_id).is_none() {
                continue;
            }
            match self.assess(&node_id, now) {
                Ok(assessment) => {
                    report.nodes.insert(node_id, assessment);
                }
                Err(e) => {
                    logging::log_engine_failure(Component::Scoring, Some(&node_id), "assess", &e);
                    report.failures.insert(node_id, e.to_string());
                }
            }
        }
        logging::log_cycle_summary(
            Component::Scoring,
            report.nodes.len() + report.failures.len(),
            report.nodes.len(),
            report.failures.len(),
        );
        report
    }

    // --- Strategy ------------------------------------------------------------

    /// Suggestions for a location. Unknown locations are answered with the
    /// single informational suggestion, never an error.
    pub fn suggestions(&self, location_id: &str, risk_score: f64) -> Vec<Suggestion> {
        let profile = self.catalog.lookup(location_id);
        if profile.is_none() {
            let missing = EngineError::ConfigurationMissing(location_id.to_string());
            logging::debug(Component::Strategy, Some(location_id), &missing.to_string());
        }
        strategy::generate(profile, risk_score)
    }

    /// Handles a raw suggestion request, rejecting it whole if malformed.
    pub fn handle_suggestion_request(&self, body: &Value) -> Result<Vec<Suggestion>, EngineError> {
        let request = SuggestionRequest::from_json(body)?;
        Ok(self.suggestions(&request.location_id, request.risk_score))
    }
}

// ---------------------------------------------------------------------------
// Suggestion requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRequest {
    pub location_id: String,
    pub risk_score: f64,
}

impl SuggestionRequest {
    /// Accepts `{"location_id": str, "risk_score": number | numeric string}`.
    pub fn from_json(body: &Value) -> Result<Self, EngineError> {
        let location_id = body
            .get("location_id")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::MalformedInput("location_id is required".to_string()))?;

        let risk_score = match body.get("risk_score") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            EngineError::MalformedInput("risk_score must be a finite number".to_string())
        })?;

        Ok(SuggestionRequest {
            location_id: location_id.to_string(),
            risk_score,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, ResourceProfile};
    use crate::scoring::classifier::Classifier;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;

    struct SumClassifier {
        features: Vec<String>,
    }

    impl Classifier for SumClassifier {
        fn version(&self) -> &str {
            "sum-stub"
        }
        fn feature_names(&self) -> &[String] {
            &self.features
        }
        /// sum_3d / 100, capped at 1.
        fn predict_proba(&self, row: &[f64]) -> f64 {
            (row[0] / 100.0).min(1.0)
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap()
    }

    fn catalog() -> Arc<ResourceCatalog> {
        let mut profiles = HashMap::new();
        profiles.insert(
            "drain_a01".to_string(),
            ResourceProfile {
                name: Some("Kodambakkam".to_string()),
                pumping_stations: vec!["P1".to_string(), "P2".to_string()],
                major_roads_for_rerouting: vec![],
                emergency_shelters: vec!["S1".to_string()],
            },
        );
        Arc::new(ResourceCatalog::new(profiles))
    }

    fn engine_with(model: ModelScorer) -> FloodEngine {
        FloodEngine::new(ScorerRouting::default(), model, catalog())
    }

    fn engine() -> FloodEngine {
        engine_with(ModelScorer::new(Arc::new(SumClassifier {
            features: vec!["sum_3d".to_string()],
        })))
    }

    // --- Assessment ---------------------------------------------------------

    #[test]
    fn test_sentinel_node_uses_threshold_scorer() {
        let engine = engine();
        engine
            .ingest(SensorReading::rainfall("drain_a01", 10.0).with_water_level(95.0))
            .unwrap();
        let a = engine.assess("drain_a01", fixed_now()).unwrap();
        assert_eq!(a.scorer, ScorerVariant::Threshold);
        assert_eq!(a.risk_score, 0.95);
        assert!(a.flood);
    }

    #[test]
    fn test_other_nodes_use_model_over_history() {
        let engine = engine();
        for rain in [20.0, 30.0, 10.0] {
            engine.ingest(SensorReading::rainfall("chennai_adyar", rain)).unwrap();
        }
        let a = engine.assess("chennai_adyar", fixed_now()).unwrap();
        assert_eq!(a.scorer, ScorerVariant::Model);
        assert!((a.risk_score - 0.6).abs() < 1e-9);
        assert!(a.flood);
        assert_eq!(a.history, vec![0.0, 0.0, 0.0, 0.0, 20.0, 30.0, 10.0]);
    }

    #[test]
    fn test_unknown_node_is_not_found() {
        assert_eq!(
            engine().assess("ghost", fixed_now()),
            Err(EngineError::NodeNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_malformed_node_is_rejected_before_lookup() {
        let engine = engine();
        assert!(matches!(
            engine.assess("bad id", fixed_now()),
            Err(EngineError::MalformedInput(_))
        ));
        assert!(matches!(
            engine.ingest(SensorReading::rainfall("", 1.0)),
            Err(EngineError::MalformedInput(_))
        ));
        assert!(engine.history().is_empty(), "rejected input must not be stored");
    }

    #[test]
    fn test_invalid_rainfall_is_rejected_on_ingest() {
        let engine = engine();
        for rain in [f64::NAN, f64::INFINITY, -500.0] {
            assert!(
                matches!(
                    engine.ingest(SensorReading::rainfall("chennai_adyar", rain)),
                    Err(EngineError::MalformedInput(_))
                ),
                "expected MalformedInput for rainfall {}",
                rain
            );
        }
        assert!(!engine.history().contains("chennai_adyar"));

        engine.ingest(SensorReading::rainfall("chennai_adyar", 0.0)).unwrap();
        let a = engine.assess("chennai_adyar", fixed_now()).unwrap();
        assert_eq!(a.history, vec![0.0; 7]);
        assert!(!a.flood);
    }

    #[test]
    fn test_unavailable_model_is_surfaced_not_defaulted() {
        let engine = engine_with(ModelScorer::unavailable("no artifact"));
        engine.ingest(SensorReading::rainfall("chennai_adyar", 5.0)).unwrap();
        engine.ingest(SensorReading::rainfall("drain_a01", 0.0)).unwrap();

        assert_eq!(
            engine.assess("chennai_adyar", fixed_now()),
            Err(EngineError::ModelUnavailable("no artifact".to_string()))
        );

        let report = engine.status(fixed_now());
        assert!(report.nodes.contains_key("drain_a01"), "threshold path keeps working");
        assert!(report.failures["chennai_adyar"].contains("Model unavailable"));
    }

    #[test]
    fn test_status_skips_nodes_without_latest_reading() {
        let engine = engine();
        engine.history().append("append_only", 3.0);
        engine.ingest(SensorReading::rainfall("drain_a01", 0.0)).unwrap();
        let report = engine.status(fixed_now());
        assert_eq!(report.nodes.len(), 1);
        assert!(report.failures.is_empty());
    }

    // --- Suggestions --------------------------------------------------------

    #[test]
    fn test_unknown_location_yields_single_info() {
        let out = engine().suggestions("nowhere", 0.99);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Info);
    }

    #[test]
    fn test_request_accepts_numeric_string_score() {
        let out = engine()
            .handle_suggestion_request(&json!({"location_id": "drain_a01", "risk_score": "0.7"}))
            .unwrap();
        assert_eq!(out[0].priority, Priority::High);
    }

    #[test]
    fn test_request_missing_fields_is_malformed() {
        let engine = engine();
        for body in [
            json!({"risk_score": 0.5}),
            json!({"location_id": "drain_a01"}),
            json!({"location_id": "drain_a01", "risk_score": "high"}),
            json!({"location_id": "drain_a01", "risk_score": null}),
            json!({"location_id": 7, "risk_score": 0.5}),
        ] {
            assert!(
                matches!(
                    engine.handle_suggestion_request(&body),
                    Err(EngineError::MalformedInput(_))
                ),
                "expected MalformedInput for {}",
                body
            );
        }
    }
}
