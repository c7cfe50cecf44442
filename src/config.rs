/// Service configuration.
///
/// Read from a TOML file (default `drainwatch.toml`). Every section and key
/// is optional. Selected values can be overridden from the environment,
/// which `main` populates from `.env` via dotenv:
///
/// - `DRAINWATCH_RESOURCES` — resource catalog path
/// - `DRAINWATCH_MODEL` — classifier artifact path
/// - `OPENWEATHER_API_KEY` — OpenWeatherMap key

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::logging::LogLevel;
use crate::model::{ConfigError, ScorerVariant};
use crate::scoring::ScorerRouting;

pub const DEFAULT_CONFIG_PATH: &str = "drainwatch.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub paths: PathsConfig,
    pub routing: RoutingConfig,
    pub logging: LoggingConfig,
    pub weather: WeatherConfig,
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub resources: PathBuf,
    pub model: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            resources: PathBuf::from("resources.json"),
            model: PathBuf::from("flood_model.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub default: ScorerVariant,
    /// Nodes scored from live water level / rainfall thresholds.
    pub threshold_nodes: Vec<String>,
    /// Nodes explicitly routed to the classifier.
    pub model_nodes: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            default: ScorerVariant::Model,
            threshold_nodes: vec!["drain_a01".to_string()],
            model_nodes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub city: String,
    pub api_key: Option<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            city: "Chennai".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub interval_secs: u64,
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            interval_secs: 15,
            seed: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.log_level()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    /// Environment overrides are applied afterwards.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let origin = path.display().to_string();
            let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: origin.clone(),
                message: e.to_string(),
            })?;
            Self::from_toml_str(&text, &origin)?
        } else {
            ServiceConfig::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value. Taking a closure keeps tests off the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DRAINWATCH_RESOURCES") {
            self.paths.resources = PathBuf::from(path);
        }
        if let Some(path) = lookup("DRAINWATCH_MODEL") {
            self.paths.model = PathBuf::from(path);
        }
        if let Some(key) = lookup("OPENWEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.logging.level.parse().map_err(ConfigError::Invalid)
    }

    /// Builds the node → scorer routing. Explicit model routes win over
    /// threshold routes for the same id.
    pub fn routing(&self) -> ScorerRouting {
        let mut routing = ScorerRouting::new(self.routing.default);
        for node in &self.routing.threshold_nodes {
            routing.insert(node, ScorerVariant::Threshold);
        }
        for node in &self.routing.model_nodes {
            routing.insert(node, ScorerVariant::Model);
        }
        routing
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
