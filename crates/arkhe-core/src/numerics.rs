//! Numerical primitives over ordered `f64` sequences
//!
//! All functions are pure and total: degenerate input (empty or too short)
//! yields a documented default instead of an error.

/// First derivative by finite differences.
///
/// Central difference on interior points, one-sided difference at both
/// boundaries. Sequences shorter than two elements return `[0.0]`.
pub fn gradient(values: &[f64], step: f64) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0];
    }

    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / step);
    for i in 1..n - 1 {
        out.push((values[i + 1] - values[i - 1]) / (2.0 * step));
    }
    out.push((values[n - 1] - values[n - 2]) / step);
    out
}

/// Second derivative with open boundaries (gradient of the gradient).
pub fn laplacian(values: &[f64], step: f64) -> Vec<f64> {
    gradient(&gradient(values, step), step)
}

/// Cyclic 3-point stencil `prev + next - 2 * center` (periodic boundary).
///
/// This is the diffusion term used by the strategy library.
pub fn stencil_laplacian(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    (0..n)
        .map(|i| {
            let prev = values[(i + n - 1) % n];
            let next = values[(i + 1) % n];
            prev + next - 2.0 * values[i]
        })
        .collect()
}

/// Population standard deviation; `0.0` for an empty sequence.
pub fn standard_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Arithmetic mean; `0.0` for an empty sequence.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Elementwise mean of a set of state vectors.
///
/// Ragged input is truncated to the shortest vector; no input yields an
/// empty field.
pub fn mean_field<S: AsRef<[f64]>>(states: &[S]) -> Vec<f64> {
    let Some(width) = states.iter().map(|s| s.as_ref().len()).min() else {
        return Vec::new();
    };

    let mut field = vec![0.0; width];
    for state in states {
        for (acc, v) in field.iter_mut().zip(state.as_ref()) {
            *acc += v;
        }
    }
    let count = states.len() as f64;
    for v in &mut field {
        *v /= count;
    }
    field
}

/// Clamp into `[0, 1]`. NaN collapses to `0.0`.
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Normalised Shannon entropy of `[0, 1]` data over `bins` equal buckets.
///
/// Returns a value in `[0, 1]`: `0.0` when every value lands in one bucket
/// (or input is empty), `1.0` for a perfectly flat histogram.
pub fn shannon_entropy(values: &[f64], bins: usize) -> f64 {
    if values.is_empty() || bins < 2 {
        return 0.0;
    }

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = ((clamp_unit(v) * bins as f64) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let total = values.len() as f64;
    let entropy: f64 = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum();
    entropy / (bins as f64).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_linear() {
        let g = gradient(&[0.0, 1.0, 2.0, 3.0], 1.0);
        assert_eq!(g, vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_gradient_short_input() {
        assert_eq!(gradient(&[], 0.1), vec![0.0]);
        assert_eq!(gradient(&[4.2], 0.1), vec![0.0]);
    }

    #[test]
    fn test_laplacian_quadratic_interior() {
        // x^2 sampled at unit spacing has second derivative 2 in the interior
        let values: Vec<f64> = (0..8).map(|i| (i * i) as f64).collect();
        let lap = laplacian(&values, 1.0);
        assert_eq!(lap.len(), values.len());
        for v in &lap[2..6] {
            assert!((v - 2.0).abs() < 1e-12, "got {}", v);
        }
    }

    #[test]
    fn test_stencil_wraps() {
        let lap = stencil_laplacian(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(lap, vec![-2.0, 1.0, 0.0, 1.0]);
        assert!(stencil_laplacian(&[]).is_empty());
        // A single element is its own neighbour on both sides
        assert_eq!(stencil_laplacian(&[0.7]), vec![0.0]);
    }

    #[test]
    fn test_standard_deviation() {
        assert_eq!(standard_deviation(&[]), 0.0);
        assert_eq!(standard_deviation(&[3.0, 3.0, 3.0]), 0.0);
        let sd = standard_deviation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_field() {
        let states = vec![vec![0.0, 1.0], vec![1.0, 1.0], vec![0.5, 0.4]];
        let field = mean_field(&states);
        assert!((field[0] - 0.5).abs() < 1e-12);
        assert!((field[1] - 0.8).abs() < 1e-12);

        let empty: Vec<Vec<f64>> = Vec::new();
        assert!(mean_field(&empty).is_empty());
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.3), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(0.25), 0.25);
    }

    #[test]
    fn test_shannon_entropy_bounds() {
        assert_eq!(shannon_entropy(&[0.5; 32], 10), 0.0);
        let flat: Vec<f64> = (0..10).map(|i| i as f64 / 10.0 + 0.05).collect();
        assert!((shannon_entropy(&flat, 10) - 1.0).abs() < 1e-12);
    }
}
