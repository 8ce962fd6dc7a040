//! Engine configuration
//!
//! Defaults, environment overrides and validation for a simulation run.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::metamorphosis::{HysteresisConfig, LocalThresholds};
use crate::spectral::SpectralConfig;

/// Full configuration of one simulation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of nodes in the population
    pub node_count: usize,
    /// Length of every node's state vector
    pub state_dim: usize,
    /// Snapshots kept per node for spectral analysis
    pub history_capacity: usize,
    /// Integration step
    pub dt: f64,
    /// Ticks between spectral analyses of each node
    pub analysis_interval: u64,
    /// Ticks between status reports
    pub report_interval: u64,
    /// Seed for reproducible runs (random when `None`)
    pub seed: Option<u64>,
    /// Trailing window for rate×intensity coherence, in seconds
    pub coherence_window_secs: i64,
    pub spectral: SpectralConfig,
    pub local: LocalThresholds,
    pub global: HysteresisConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_count: 16,
            state_dim: 64,
            history_capacity: 20,
            dt: 0.1,
            analysis_interval: 5,
            report_interval: 10,
            seed: None,
            coherence_window_secs: 60,
            spectral: SpectralConfig::default(),
            local: LocalThresholds::default(),
            global: HysteresisConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `ARKHE_*` environment variables.
    ///
    /// Reads:
    /// - ARKHE_NODE_COUNT, ARKHE_STATE_DIM, ARKHE_HISTORY
    /// - ARKHE_DT, ARKHE_SEED, ARKHE_REPORT_INTERVAL
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = env_parse("ARKHE_NODE_COUNT")? {
            config.node_count = v;
        }
        if let Some(v) = env_parse("ARKHE_STATE_DIM")? {
            config.state_dim = v;
        }
        if let Some(v) = env_parse("ARKHE_HISTORY")? {
            config.history_capacity = v;
        }
        if let Some(v) = env_parse("ARKHE_DT")? {
            config.dt = v;
        }
        if let Some(v) = env_parse("ARKHE_SEED")? {
            config.seed = Some(v);
        }
        if let Some(v) = env_parse("ARKHE_REPORT_INTERVAL")? {
            config.report_interval = v;
        }
        Ok(config)
    }

    pub fn with_nodes(mut self, count: usize) -> Self {
        self.node_count = count;
        self
    }

    pub fn with_state_dim(mut self, dim: usize) -> Self {
        self.state_dim = dim;
        self
    }

    pub fn with_history(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self.spectral.min_samples = self.spectral.min_samples.min(capacity);
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_analysis_interval(mut self, ticks: u64) -> Self {
        self.analysis_interval = ticks;
        self
    }

    pub fn with_report_interval(mut self, ticks: u64) -> Self {
        self.report_interval = ticks;
        self
    }

    pub fn with_hysteresis(mut self, global: HysteresisConfig) -> Self {
        self.global = global;
        self
    }

    pub fn with_thresholds(mut self, local: LocalThresholds) -> Self {
        self.local = local;
        self
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.node_count == 0 {
            return invalid("node_count must be at least 1");
        }
        if self.state_dim == 0 {
            return invalid("state_dim must be at least 1");
        }
        if self.history_capacity < 2 {
            return invalid("history_capacity must be at least 2");
        }
        if self.spectral.min_samples > self.history_capacity {
            return invalid("spectral.min_samples exceeds history_capacity");
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return invalid("dt must be positive and finite");
        }
        if self.local.low > self.local.high {
            return invalid("local.low must not exceed local.high");
        }
        if self.local.dead_zone < 0.0 {
            return invalid("local.dead_zone must be non-negative");
        }
        if !(self.global.hysteresis > 0.0 && self.global.hysteresis < 1.0) {
            return invalid("global.hysteresis must lie in (0, 1)");
        }
        if !(self.global.smoothing > 0.0 && self.global.smoothing <= 1.0) {
            return invalid("global.smoothing must lie in (0, 1]");
        }
        if self.coherence_window_secs <= 0 {
            return invalid("coherence_window_secs must be positive");
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Parse {
                key: key.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}
