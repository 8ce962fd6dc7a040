//! Metamorphosis controllers
//!
//! State machines that map an integration measure onto the active dynamics:
//! - [`LocalController`]: embedded in each node, threshold policy with a dead
//!   zone past each threshold.
//! - [`PopulationController`]: one per federation, smoothed measure with a
//!   hysteresis band around a target and a minimum dwell between switches.
//!
//! Both start in the explorative state and never terminate.
//!
//! Default thresholds are in absolute Φ units and sit inside the range a
//! coupled population reaches with 12 to 20 snapshot windows (Φ ≤ log2 H,
//! typically 1.3 to 2.0).

use serde::{Deserialize, Serialize};

use crate::strategy::{PopulationMode, Strategy};

/// Thresholds for the node-local policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalThresholds {
    /// Φ below this → Explore
    pub low: f64,
    /// Φ above this → Stabilize
    pub high: f64,
    /// Φ above this → Decay (disabled when `None`)
    pub overload: Option<f64>,
    /// Φ must sit this far past the crossed threshold before switching
    pub dead_zone: f64,
    /// A decaying node whose state entropy falls below this is revived
    pub min_state_entropy: f64,
}

impl Default for LocalThresholds {
    fn default() -> Self {
        Self {
            low: 1.2,
            high: 2.0,
            overload: None,
            dead_zone: 0.3,
            min_state_entropy: 0.05,
        }
    }
}

/// Node-local metamorphosis policy
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalController {
    pub thresholds: LocalThresholds,
}

impl LocalController {
    pub fn new(thresholds: LocalThresholds) -> Self {
        Self { thresholds }
    }

    /// Region of the threshold policy that `phi` falls into
    pub fn classify(&self, phi: f64) -> Strategy {
        let t = &self.thresholds;
        if t.overload.is_some_and(|o| phi > o) {
            Strategy::Decay
        } else if phi < t.low {
            Strategy::Explore
        } else if phi > t.high {
            Strategy::Stabilize
        } else {
            Strategy::Sync
        }
    }

    /// Propose a new strategy, or `None` to keep `current`.
    ///
    /// `state_entropy` is the node's normalised histogram entropy.
    pub fn propose(&self, current: Strategy, phi: f64, state_entropy: f64) -> Option<Strategy> {
        if current == Strategy::Decay && state_entropy < self.thresholds.min_state_entropy {
            return Some(Strategy::Explore);
        }

        let target = self.classify(phi);
        if target == current {
            return None;
        }

        // Only the side the measure came from needs the margin
        let margin = self.thresholds.dead_zone;
        let checked = if rank(target) > rank(current) {
            phi - margin
        } else {
            phi + margin
        };
        (self.classify(checked) == target).then_some(target)
    }
}

/// Position of a strategy along the Φ axis of the threshold policy
fn rank(strategy: Strategy) -> u8 {
    match strategy {
        Strategy::Explore => 0,
        Strategy::Sync => 1,
        Strategy::Stabilize => 2,
        Strategy::Decay => 3,
    }
}

/// Hysteresis settings for the population-level controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Integration value the population is steered around
    pub target: f64,
    /// Relative half-width of the no-switch band, in (0, 1)
    pub hysteresis: f64,
    /// EMA weight of each new sample, in (0, 1]
    pub smoothing: f64,
    /// Observations that must pass after a switch before the next one.
    ///
    /// This gates band crossings on top of the hysteresis band: a crossing
    /// within the dwell is held until the dwell has elapsed. A fresh
    /// controller is not held. Zero disables the gate.
    pub min_dwell: usize,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            target: 1.6,
            hysteresis: 0.1,
            smoothing: 0.3,
            min_dwell: 3,
        }
    }
}

impl HysteresisConfig {
    /// Inclusive `(lower, upper)` bounds of the no-switch band
    pub fn band(&self) -> (f64, f64) {
        (
            self.target * (1.0 - self.hysteresis),
            self.target * (1.0 + self.hysteresis),
        )
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_min_dwell(mut self, cycles: usize) -> Self {
        self.min_dwell = cycles;
        self
    }
}

/// Population-level metamorphosis with a hysteresis band
#[derive(Debug, Clone)]
pub struct PopulationController {
    config: HysteresisConfig,
    mode: PopulationMode,
    smoothed: Option<f64>,
    since_switch: usize,
}

impl PopulationController {
    pub fn new(config: HysteresisConfig) -> Self {
        Self {
            config,
            mode: PopulationMode::Exploration,
            smoothed: None,
            since_switch: config.min_dwell,
        }
    }

    pub fn mode(&self) -> PopulationMode {
        self.mode
    }

    /// Exponentially smoothed measure (None before the first observation)
    pub fn smoothed(&self) -> Option<f64> {
        self.smoothed
    }

    pub fn config(&self) -> &HysteresisConfig {
        &self.config
    }

    /// Feed one integration sample; returns `(from, to)` if the mode switched.
    ///
    /// Inside the band nothing changes. Below it the population explores;
    /// above it the population consolidates, and a consolidated population
    /// that is pushed above the band again transcends.
    pub fn observe(&mut self, phi: f64) -> Option<(PopulationMode, PopulationMode)> {
        let alpha = self.config.smoothing.clamp(f64::EPSILON, 1.0);
        let s = match self.smoothed {
            Some(prev) => prev + alpha * (phi - prev),
            None => phi,
        };
        self.smoothed = Some(s);
        self.since_switch = self.since_switch.saturating_add(1);

        let (lower, upper) = self.config.band();
        let desired = if s < lower {
            PopulationMode::Exploration
        } else if s > upper {
            match self.mode {
                PopulationMode::Exploration => PopulationMode::Consolidation,
                PopulationMode::Consolidation | PopulationMode::Transcendence => {
                    PopulationMode::Transcendence
                }
            }
        } else {
            return None;
        };

        if desired == self.mode || self.since_switch < self.config.min_dwell {
            return None;
        }

        let from = self.mode;
        self.mode = desired;
        self.since_switch = 0;
        Some((from, desired))
    }
}

impl Default for PopulationController {
    fn default() -> Self {
        Self::new(HysteresisConfig::default())
    }
}
