/// Development mode utilities for exercising the pipeline without hardware
///
/// Two replays are provided:
/// - `Simulator` produces one packet per node per cycle: a predictable
///   rainfall pattern for the city-wide live node and randomized local
///   weather for the simulated drainage nodes.
/// - `replay_daily_series` walks a daily rainfall series through a fresh
///   window and the classifier, one evaluation per day.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::analysis::features;
use crate::history::HistoryStore;
use crate::model::{EngineError, SensorReading};
use crate::scoring::classifier::ModelScorer;

/// A simulated drainage node.
pub struct SimulatedNode {
    pub id: &'static str,
    pub lat: f64,
    pub lon: f64,
}

pub static SIMULATED_NODES: &[SimulatedNode] = &[
    SimulatedNode { id: "chennai_adyar", lat: 13.0044, lon: 80.2534 },
    SimulatedNode { id: "chennai_t_nagar", lat: 13.0398, lon: 80.2333 },
    SimulatedNode { id: "chennai_velachery", lat: 12.9806, lon: 80.2215 },
    SimulatedNode { id: "chennai_guindy", lat: 13.0076, lon: 80.2133 },
    SimulatedNode { id: "chennai_madipakkam", lat: 12.9649, lon: 80.1983 },
    SimulatedNode { id: "chennai_saidapet", lat: 13.0250, lon: 80.2255 },
];

/// Live-node rainfall by cycle: dry, a burst peaking at 60 mm/hr, then dry.
pub const DEMO_RAINFALL_PATTERN: [f64; 9] = [0.0, 5.0, 15.0, 45.0, 60.0, 25.0, 10.0, 0.0, 0.0];

pub const LIVE_NODE_ID: &str = "live_chennai";

/// Daily rainfall for the demo week. Days 3-5 total 70 mm.
pub const DEMO_WEEK: [f64; 7] = [0.0, 5.0, 25.0, 30.0, 15.0, 2.0, 0.0];

pub fn demo_week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 15).unwrap_or_default()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Cycle simulator
// ---------------------------------------------------------------------------

pub struct Simulator {
    cycle: usize,
    rng: StdRng,
}

impl Simulator {
    /// A seeded simulator replays identically; `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Simulator { cycle: 0, rng }
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Reading for the live node at `cycle`, following the demo pattern.
    pub fn demo_live_reading(cycle: usize) -> SensorReading {
        let rain = DEMO_RAINFALL_PATTERN[cycle % DEMO_RAINFALL_PATTERN.len()];
        SensorReading {
            node_id: LIVE_NODE_ID.to_string(),
            rainfall_mm_per_hr: rain,
            water_level_cm: None,
            flow_rate_lps: None,
            lat: Some(13.0827),
            lon: Some(80.2707),
            temperature_c: Some(29.5),
            humidity_percent: Some(85.0),
        }
    }

    /// Independent local weather for one node: dry 40% of the time,
    /// otherwise up to 65 mm/hr with water level and flow scaled from it.
    pub fn simulate_node(&mut self, node: &SimulatedNode) -> SensorReading {
        let rain = if self.rng.gen_range(0.0..1.0) > 0.4 {
            round2(self.rng.gen_range(0.0..65.0))
        } else {
            0.0
        };
        let water_level = round2(rain * self.rng.gen_range(0.5..1.5));
        let flow_rate = round2(rain * self.rng.gen_range(2.0..5.0));

        SensorReading {
            node_id: node.id.to_string(),
            rainfall_mm_per_hr: rain,
            water_level_cm: Some(water_level),
            flow_rate_lps: Some(flow_rate),
            lat: Some(node.lat),
            lon: Some(node.lon),
            temperature_c: None,
            humidity_percent: None,
        }
    }

    /// Readings for the next cycle, live node first.
    pub fn next_cycle(&mut self) -> Vec<SensorReading> {
        let mut readings = Vec::with_capacity(SIMULATED_NODES.len() + 1);
        readings.push(Self::demo_live_reading(self.cycle));
        for node in SIMULATED_NODES {
            let reading = self.simulate_node(node);
            readings.push(reading);
        }
        self.cycle += 1;
        readings
    }
}

// ---------------------------------------------------------------------------
// Daily series replay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub rain_mm: f64,
    pub risk: f64,
    pub flood: bool,
}

/// Replays `rainfall` (one value per day from `start`) through a fresh
/// window, scoring each day with that day's date as evaluation time.
pub fn replay_daily_series(
    scorer: &ModelScorer,
    start: NaiveDate,
    rainfall: &[f64],
) -> Result<Vec<DailyReport>, EngineError> {
    const SERIES_NODE: &str = "daily_series";
    let store = HistoryStore::new();
    let mut reports = Vec::with_capacity(rainfall.len());

    for (day, &rain) in rainfall.iter().enumerate() {
        let date = start + Duration::days(day as i64);
        let now: DateTime<Utc> = date.and_time(NaiveTime::MIN).and_utc();

        store.append(SERIES_NODE, rain);
        let window = store.get(SERIES_NODE)?;
        let score = scorer.score_features(&features::build(&window, now))?;

        reports.push(DailyReport {
            date,
            rain_mm: rain,
            risk: score.risk,
            flood: score.flood,
        });
    }

    Ok(reports)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
