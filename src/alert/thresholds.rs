//! Fixed-threshold flood risk scoring.
//!
//! Used for hardware sensors that report water level directly. Two
//! independent signals are checked, water level (as percent of channel
//! capacity) and rainfall rate, and the most severe tier triggered by
//! either one wins. No history is consulted.

use crate::model::{EngineError, RiskScore, ScorerVariant};
use crate::scoring::{RiskScorer, ScoringContext};

/// Threshold tiers, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThresholdTier {
    Low,
    Medium,
    High,
    Critical,
}

impl ThresholdTier {
    pub fn risk(self) -> f64 {
        match self {
            ThresholdTier::Critical => 0.95,
            ThresholdTier::High => 0.75,
            ThresholdTier::Medium => 0.45,
            ThresholdTier::Low => 0.10,
        }
    }
}

/// Trigger levels for one tier: water level (percent full) or rainfall
/// (mm/hr), whichever is reached first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierTrigger {
    pub tier: ThresholdTier,
    pub water_level: f64,
    pub rainfall: f64,
}

/// Triggers checked from most to least severe.
pub const DEFAULT_TRIGGERS: [TierTrigger; 3] = [
    TierTrigger { tier: ThresholdTier::Critical, water_level: 90.0, rainfall: 50.0 },
    TierTrigger { tier: ThresholdTier::High, water_level: 75.0, rainfall: 25.0 },
    TierTrigger { tier: ThresholdTier::Medium, water_level: 50.0, rainfall: 10.0 },
];

#[derive(Debug, Clone)]
pub struct ThresholdScorer {
    triggers: Vec<TierTrigger>,
}

impl Default for ThresholdScorer {
    fn default() -> Self {
        ThresholdScorer {
            triggers: DEFAULT_TRIGGERS.to_vec(),
        }
    }
}

impl ThresholdScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first tier whose water-level OR rainfall trigger is met.
    pub fn classify(&self, water_level_cm: f64, rainfall_mm_hr: f64) -> ThresholdTier {
        self.triggers
            .iter()
            .find(|t| water_level_cm >= t.water_level || rainfall_mm_hr >= t.rainfall)
            .map(|t| t.tier)
            .unwrap_or(ThresholdTier::Low)
    }

    pub fn score_levels(&self, water_level_cm: f64, rainfall_mm_hr: f64) -> RiskScore {
        let risk = self.classify(water_level_cm, rainfall_mm_hr).risk();
        RiskScore {
            risk,
            flood: risk > 0.5,
        }
    }
}

impl RiskScorer for ThresholdScorer {
    fn variant(&self) -> ScorerVariant {
        ScorerVariant::Threshold
    }

    fn score(&self, ctx: &ScoringContext<'_>) -> Result<RiskScore, EngineError> {
        let water_level = ctx.latest.water_level_cm.unwrap_or(0.0);
        Ok(self.score_levels(water_level, ctx.latest.rainfall_mm_per_hr))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
