//! Spectral integration estimate
//!
//! Turns a window of state snapshots into a scalar "integration measure" (Φ):
//!
//! 1. Sample covariance between snapshots (H×H, each snapshot is one variable
//!    observed over the state dimensions, normalised by `dim - 1`).
//! 2. Eigenvalues of that symmetric matrix by classical Jacobi rotations
//!    (largest off-diagonal pivot first).
//! 3. Base-2 entropy of the normalised positive eigenvalues.
//!
//! Φ has no fixed upper bound; for H samples it is at most `log2(H)`.

use serde::{Deserialize, Serialize};

use crate::history::HistoryWindow;

/// Spectral analyzer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Fewer snapshots than this yields `default_value`
    pub min_samples: usize,
    /// Neutral measure returned during warm-up
    pub default_value: f64,
    /// Off-diagonal magnitude treated as converged; eigenvalues at or below
    /// it are treated as zero
    pub epsilon: f64,
    /// Upper bound on Jacobi rotations
    pub max_rotations: usize,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            default_value: 0.0,
            epsilon: 1e-10,
            max_rotations: 200,
        }
    }
}

/// Computes the integration measure of a snapshot window
#[derive(Debug, Clone, Default)]
pub struct SpectralAnalyzer {
    pub config: SpectralConfig,
}

impl SpectralAnalyzer {
    pub fn new(config: SpectralConfig) -> Self {
        Self { config }
    }

    /// Integration measure of a history window
    pub fn integration(&self, window: &HistoryWindow) -> f64 {
        let samples: Vec<&[f64]> = window.snapshots().map(|s| s.as_slice()).collect();
        self.integration_of(&samples)
    }

    /// Integration measure of an explicit list of snapshots
    pub fn integration_of<S: AsRef<[f64]>>(&self, samples: &[S]) -> f64 {
        if samples.len() < self.config.min_samples.max(1) {
            return self.config.default_value;
        }

        let n = samples.len();
        let Some(cov) = covariance_matrix(samples) else {
            return 0.0;
        };
        let eigenvalues =
            jacobi_eigenvalues(cov, n, self.config.epsilon, self.config.max_rotations);
        spectral_entropy(&eigenvalues, self.config.epsilon)
    }

    /// Map Φ onto `[0, 1]` relative to its ceiling `log2(samples)`
    pub fn normalised(phi: f64, samples: usize) -> f64 {
        if samples < 2 {
            return 0.0;
        }
        (phi / (samples as f64).log2()).clamp(0.0, 1.0)
    }
}

/// Sample covariance between snapshots, as a row-major H×H matrix.
///
/// Snapshots of different lengths are truncated to the shortest one.
/// Returns `None` when the snapshot dimension is below two (the `dim - 1`
/// normaliser is undefined).
pub fn covariance_matrix<S: AsRef<[f64]>>(samples: &[S]) -> Option<Vec<f64>> {
    let h = samples.len();
    let dim = samples.iter().map(|s| s.as_ref().len()).min()?;
    if dim < 2 {
        return None;
    }

    let centered: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| {
            let row = &s.as_ref()[..dim];
            let mean = row.iter().sum::<f64>() / dim as f64;
            row.iter().map(|v| v - mean).collect()
        })
        .collect();

    let norm = (dim - 1) as f64;
    let mut cov = vec![0.0; h * h];
    for i in 0..h {
        for j in i..h {
            let c: f64 = centered[i]
                .iter()
                .zip(&centered[j])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / norm;
            cov[i * h + j] = c;
            cov[j * h + i] = c;
        }
    }
    Some(cov)
}

/// Eigenvalues of a symmetric row-major `n×n` matrix.
///
/// Classical Jacobi: each rotation annihilates the current largest
/// off-diagonal entry. Stops once that entry is below `epsilon` or after
/// `max_rotations` rotations, returning the diagonal (unsorted).
pub fn jacobi_eigenvalues(
    mut a: Vec<f64>,
    n: usize,
    epsilon: f64,
    max_rotations: usize,
) -> Vec<f64> {
    debug_assert_eq!(a.len(), n * n);

    for _ in 0..max_rotations {
        let mut p = 0;
        let mut q = 0;
        let mut max_off = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let v = a[i * n + j].abs();
                if v > max_off {
                    max_off = v;
                    p = i;
                    q = j;
                }
            }
        }
        if max_off < epsilon {
            break;
        }

        let apq = a[p * n + q];
        let app = a[p * n + p];
        let aqq = a[q * n + q];
        let theta = (aqq - app) / (2.0 * apq);
        // Smaller root of t^2 + 2θt - 1 = 0 for stability
        let t = if theta >= 0.0 {
            1.0 / (theta + (1.0 + theta * theta).sqrt())
        } else {
            -1.0 / (-theta + (1.0 + theta * theta).sqrt())
        };
        let c = 1.0 / (1.0 + t * t).sqrt();
        let s = t * c;

        a[p * n + p] = app - t * apq;
        a[q * n + q] = aqq + t * apq;
        a[p * n + q] = 0.0;
        a[q * n + p] = 0.0;

        for r in 0..n {
            if r == p || r == q {
                continue;
            }
            let arp = a[r * n + p];
            let arq = a[r * n + q];
            let new_rp = c * arp - s * arq;
            let new_rq = s * arp + c * arq;
            a[r * n + p] = new_rp;
            a[p * n + r] = new_rp;
            a[r * n + q] = new_rq;
            a[q * n + r] = new_rq;
        }
    }

    (0..n).map(|i| a[i * n + i]).collect()
}

/// Base-2 entropy of the eigenvalue spectrum.
///
/// Eigenvalues at or below `floor` are discarded; if nothing remains the
/// entropy is `0.0`.
pub fn spectral_entropy(eigenvalues: &[f64], floor: f64) -> f64 {
    let positive: Vec<f64> = eigenvalues.iter().copied().filter(|&l| l > floor).collect();
    let total: f64 = positive.iter().sum();
    if positive.is_empty() || total <= 0.0 || !total.is_finite() {
        return 0.0;
    }

    positive
        .iter()
        .map(|l| {
            let p = l / total;
            -p * p.log2()
        })
        .sum()
}
