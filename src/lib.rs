//! Flood risk scoring and control strategy service for urban drainage nodes.
//!
//! Readings stream in per node, a short rolling rainfall history is kept per
//! node, a risk score is derived from it (trained classifier or fixed
//! thresholds), and prioritized control actions are generated from the
//! score and each location's emergency resources.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod resources;
pub mod scoring;
pub mod simulate;
pub mod strategy;

pub use engine::FloodEngine;
