//! Strategy library
//!
//! A closed set of evolution functions. Each strategy is a tag plus a pure
//! dispatch from tag to dynamics, so the active strategy can be swapped at
//! runtime, serialized and compared without holding a callable.
//!
//! Two families exist:
//! - [`Strategy`] drives a single node, coupling each element to the
//!   matching element of a neighbour field.
//! - [`PopulationMode`] drives the population as a whole, coupling each
//!   element of the mean field to the scalar mean of that field.
//!
//! Every update is clamped element-wise to `[0, 1]`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::numerics::{clamp_unit, mean, stencil_laplacian};

/// Golden ratio
pub const PHI: f64 = 1.618_033_988_749_895;

/// Fixed point the stabilising dynamics relax towards (1/φ)
pub const GOLDEN_TARGET: f64 = 1.0 / PHI;

/// Node-level dynamics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Strategy {
    /// Reaction-diffusion with logistic reaction and complexity-scaled noise
    #[default]
    Explore,
    /// Relaxation towards 1/φ with weak neighbour coupling
    Stabilize,
    /// Kuramoto-style phase coupling to the neighbour field
    Sync,
    /// Pure exponential relaxation towards zero
    Decay,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Explore,
        Strategy::Stabilize,
        Strategy::Sync,
        Strategy::Decay,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Explore => "Explore",
            Self::Stabilize => "Stabilize",
            Self::Sync => "Sync",
            Self::Decay => "Decay",
        }
    }

    /// Advance `state` by one step of length `dt`.
    ///
    /// `neighbor` is the coupling field; indices it does not cover couple to
    /// the node's own value (no pull). `complexity` scales exploration noise
    /// and is expected in `[0, 1]`.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        state: &[f64],
        neighbor: &[f64],
        external: f64,
        dt: f64,
        complexity: f64,
        rng: &mut R,
    ) -> Vec<f64> {
        if let Self::Decay = self {
            return state
                .iter()
                .map(|&v| clamp_unit((v - 0.1 * v * dt).max(0.0)))
                .collect();
        }

        let lap = stencil_laplacian(state);
        state
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let n = neighbor.get(i).copied().unwrap_or(v);
                let next = match self {
                    Self::Explore => {
                        let reaction = 3.8 * v * (1.0 - v) - v;
                        let coupling = 0.05 * (n - v);
                        let noise = rng.gen_range(-1.0..=1.0) * 0.1 * complexity;
                        v + dt * (0.5 * lap[i] + reaction + coupling) + noise
                    }
                    Self::Stabilize => {
                        v + dt * (0.2 * lap[i] - 1.5 * (v - GOLDEN_TARGET) + 0.2 * (n - v))
                    }
                    Self::Sync => v + dt * (0.1 * lap[i] + (n - v).sin() + 0.1 * external),
                    Self::Decay => v,
                };
                clamp_unit(next)
            })
            .collect()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// Population-level dynamics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PopulationMode {
    #[default]
    Exploration,
    Consolidation,
    Transcendence,
}

impl PopulationMode {
    pub const ALL: [PopulationMode; 3] = [
        PopulationMode::Exploration,
        PopulationMode::Consolidation,
        PopulationMode::Transcendence,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exploration => "Exploration",
            Self::Consolidation => "Consolidation",
            Self::Transcendence => "Transcendence",
        }
    }

    /// Advance the population field by one step.
    ///
    /// Each element couples to the scalar mean of the whole field rather
    /// than to a per-element neighbour.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        field: &[f64],
        external: f64,
        dt: f64,
        complexity: f64,
        rng: &mut R,
    ) -> Vec<f64> {
        let m = mean(field);
        let lap = stencil_laplacian(field);
        field
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let next = match self {
                    Self::Exploration => {
                        let reaction = 3.5 * v * (1.0 - v) - v;
                        let noise = rng.gen_range(-1.0..=1.0) * 0.05 * complexity;
                        v + dt * (0.3 * lap[i] + reaction + 0.1 * (m - v)) + noise
                    }
                    Self::Consolidation => {
                        v + dt * (0.1 * lap[i] - (v - GOLDEN_TARGET) + 0.3 * (m - v))
                    }
                    Self::Transcendence => {
                        v + dt * (0.05 * lap[i] + 0.5 * (m - v).sin() + 0.2 * external)
                    }
                };
                clamp_unit(next)
            })
            .collect()
    }
}

impl fmt::Display for PopulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PopulationMode {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// A strategy or mode name that is not part of the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown strategy tag: {0}")]
pub struct UnknownTag(pub String);
