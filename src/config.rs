use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use crate::models::{DoctrineWindows, EngineConfig, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub cmop: CmopSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmopSettings {
    pub api_base: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_poi_radius")]
    pub poi_radius_m: u32,
}

fn default_request_timeout() -> u64 { 30 }
fn default_poi_radius() -> u32 { 50_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_ground_speed")]
    pub ground_speed_kmh: f64,
    #[serde(default = "default_mascal_threshold")]
    pub mascal_threshold: usize,
    #[serde(default = "default_initial_care")]
    pub initial_care_minutes: f64,
    #[serde(default = "default_surgical")]
    pub surgical_minutes: f64,
    #[serde(default = "default_definitive")]
    pub definitive_minutes: f64,
    #[serde(default = "default_tolerance")]
    pub equidistance_tolerance_km: f64,
    #[serde(default = "default_alternatives")]
    pub alternatives_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ground_speed_kmh: default_ground_speed(),
            mascal_threshold: default_mascal_threshold(),
            initial_care_minutes: default_initial_care(),
            surgical_minutes: default_surgical(),
            definitive_minutes: default_definitive(),
            equidistance_tolerance_km: default_tolerance(),
            alternatives_limit: default_alternatives(),
        }
    }
}

fn default_ground_speed() -> f64 { 60.0 }
fn default_mascal_threshold() -> usize { 8 }
fn default_initial_care() -> f64 { 10.0 }
fn default_surgical() -> f64 { 60.0 }
fn default_definitive() -> f64 { 120.0 }
fn default_tolerance() -> f64 { 0.01 }
fn default_alternatives() -> usize { 3 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_red_base")]
    pub red_base: f64,
    #[serde(default = "default_yellow_base")]
    pub yellow_base: f64,
    #[serde(default = "default_violation_per_minute")]
    pub violation_per_minute: f64,
    #[serde(default = "default_elapsed_per_minute")]
    pub elapsed_per_minute: f64,
    #[serde(default = "default_distance_max")]
    pub distance_max: f64,
    #[serde(default = "default_distance_scale")]
    pub distance_scale_km: f64,
    #[serde(default = "default_max_counted_minutes")]
    pub max_counted_minutes: u32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            red_base: default_red_base(),
            yellow_base: default_yellow_base(),
            violation_per_minute: default_violation_per_minute(),
            elapsed_per_minute: default_elapsed_per_minute(),
            distance_max: default_distance_max(),
            distance_scale_km: default_distance_scale(),
            max_counted_minutes: default_max_counted_minutes(),
        }
    }
}

fn default_red_base() -> f64 { 100_000_000.0 }
fn default_yellow_base() -> f64 { 10_000_000.0 }
fn default_violation_per_minute() -> f64 { 3_000.0 }
fn default_elapsed_per_minute() -> f64 { 2.0 }
fn default_distance_max() -> f64 { 1.0 }
fn default_distance_scale() -> f64 { 25.0 }
fn default_max_counted_minutes() -> u32 { 1_440 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl LoggingSettings {
    /// Defaults with LOG_LEVEL / LOG_FORMAT applied, for when the settings
    /// file itself cannot be loaded
    pub fn from_env() -> Self {
        let mut logging = Self::default();
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            logging.format = format;
        }
        logging
    }

    /// Filter directives, falling back to `info` when they do not parse
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"))
    }

    pub fn is_pretty(&self) -> bool {
        self.format.eq_ignore_ascii_case("pretty")
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with EVAC_)
    /// 5. CMOP_API_BASE, LOG_LEVEL and LOG_FORMAT
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., EVAC__ENGINE__MASCAL_THRESHOLD -> engine.mascal_threshold
            .add_source(
                Environment::with_prefix("EVAC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_env_overrides(settings)?;

        let settings: Settings = settings.try_deserialize()?;
        settings.engine_config()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("EVAC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_env_overrides(settings)?;

        let settings: Settings = settings.try_deserialize()?;
        settings.engine_config()?;
        Ok(settings)
    }

    /// Engine parameters, rejecting values the ranking cannot honour
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let engine = &self.engine;
        let weights = ScoringWeights {
            red_base: self.scoring.weights.red_base,
            yellow_base: self.scoring.weights.yellow_base,
            violation_per_minute: self.scoring.weights.violation_per_minute,
            elapsed_per_minute: self.scoring.weights.elapsed_per_minute,
            distance_max: self.scoring.weights.distance_max,
            distance_scale_km: self.scoring.weights.distance_scale_km,
            max_counted_minutes: self.scoring.weights.max_counted_minutes,
        };
        weights
            .check_dominance()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        if !(engine.ground_speed_kmh.is_finite() && engine.ground_speed_kmh > 0.0) {
            return Err(ConfigError::Message("engine.ground_speed_kmh must be positive".into()));
        }
        if !(engine.equidistance_tolerance_km >= 0.0) {
            return Err(ConfigError::Message("engine.equidistance_tolerance_km must not be negative".into()));
        }
        if !(0.0 < engine.initial_care_minutes
            && engine.initial_care_minutes < engine.surgical_minutes
            && engine.surgical_minutes < engine.definitive_minutes)
        {
            return Err(ConfigError::Message(
                "engine windows must satisfy 0 < initial care < surgical < definitive".into(),
            ));
        }

        Ok(EngineConfig {
            ground_speed_kmh: engine.ground_speed_kmh,
            mascal_threshold: engine.mascal_threshold,
            windows: DoctrineWindows {
                initial_care_minutes: engine.initial_care_minutes,
                surgical_minutes: engine.surgical_minutes,
                definitive_minutes: engine.definitive_minutes,
            },
            equidistance_tolerance_km: engine.equidistance_tolerance_km,
            alternatives_limit: engine.alternatives_limit,
            weights,
        })
    }
}

/// Unprefixed variables shared with the rest of the tooling
const ENV_OVERRIDES: [(&str, &str); 3] = [
    ("CMOP_API_BASE", "cmop.api_base"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    apply_overrides(settings, |name| std::env::var(name).ok())
}

fn apply_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (name, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(name) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
