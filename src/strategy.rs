//! Control strategy generation.
//!
//! Maps a location's resource profile and a risk score to an ordered list
//! of suggested actions. Tiers are mutually exclusive and checked from the
//! top down with strict `>` comparisons, so a score sitting exactly on a
//! boundary (0.8, 0.6, 0.4) falls to the tier below.

use crate::model::{
    Priority, ResourceProfile, Suggestion, SuggestionKind, SuggestionPayload,
};

/// Response tier selected by the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    Normal,
    Elevated,
    High,
    Critical,
}

impl RiskTier {
    pub fn from_score(risk_score: f64) -> Self {
        if risk_score > 0.8 {
            RiskTier::Critical
        } else if risk_score > 0.6 {
            RiskTier::High
        } else if risk_score > 0.4 {
            RiskTier::Elevated
        } else {
            RiskTier::Normal
        }
    }
}

pub const NO_RESOURCES_ACTION: &str = "No specific resources defined for this location.";

/// Generates suggestions for a location. `None` means the location has no
/// resource profile, which yields a single informational suggestion
/// regardless of the score.
pub fn generate(profile: Option<&ResourceProfile>, risk_score: f64) -> Vec<Suggestion> {
    let Some(profile) = profile else {
        return vec![Suggestion::new(Priority::Info, NO_RESOURCES_ACTION)];
    };

    match RiskTier::from_score(risk_score) {
        RiskTier::Critical => critical_actions(profile),
        RiskTier::High => high_actions(profile),
        RiskTier::Elevated => vec![
            Suggestion::new(
                Priority::Low,
                "Continuously monitor water levels and downstream flow.",
            ),
            Suggestion::new(
                Priority::Info,
                "Ensure drainage channels are clear of obstructions.",
            ),
        ],
        RiskTier::Normal => vec![Suggestion::new(
            Priority::Info,
            format!(
                "Conditions are normal in {}. Continue routine monitoring.",
                profile.display_name()
            ),
        )],
    }
}

fn critical_actions(profile: &ResourceProfile) -> Vec<Suggestion> {
    let shelter = profile
        .emergency_shelters
        .first()
        .map(String::as_str)
        .unwrap_or("no designated shelter");

    let mut diversion = Suggestion::tagged(
        Priority::Critical,
        SuggestionKind::TrafficReroute,
        format!(
            "Initiate mandatory traffic diversion on: {}.",
            profile.road_names().join(", ")
        ),
    );
    diversion.payload = Some(SuggestionPayload {
        roads: profile.major_roads_for_rerouting.clone(),
    });

    vec![
        Suggestion::tagged(
            Priority::Critical,
            SuggestionKind::Pumping,
            format!(
                "Activate all pumping stations immediately: {}.",
                profile.pumping_stations.join(", ")
            ),
        ),
        diversion,
        Suggestion::tagged(
            Priority::High,
            SuggestionKind::Alert,
            format!(
                "Send 'Severe Flood Alert' SMS to citizens in {}.",
                profile.display_name()
            ),
        ),
        Suggestion::new(
            Priority::Medium,
            format!("Prepare emergency shelter for evacuees: {}.", shelter),
        ),
    ]
}

fn high_actions(profile: &ResourceProfile) -> Vec<Suggestion> {
    vec![
        Suggestion::new(
            Priority::High,
            format!(
                "Place pumping stations on standby: {}.",
                profile.pumping_stations.join(", ")
            ),
        ),
        Suggestion::new(Priority::Medium, "Send 'Flood Watch' notifications to citizens."),
        Suggestion::new(
            Priority::Medium,
            format!(
                "Alert traffic police to monitor congestion on: {}.",
                profile.road_names().join(", ")
            ),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
