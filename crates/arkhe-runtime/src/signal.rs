//! Environmental entropy input
//!
//! The federation consumes one scalar per tick from an external collaborator
//! (a sensor bridge, a replayed trace, a test stub). Values are expected in
//! `[0, 1]`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One scalar per tick
pub trait EntropySource: Send {
    fn sample(&mut self, tick: u64) -> f64;
}

impl<F> EntropySource for F
where
    F: FnMut(u64) -> f64 + Send,
{
    fn sample(&mut self, tick: u64) -> f64 {
        self(tick)
    }
}

/// Always the same value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantEntropy(pub f64);

impl EntropySource for ConstantEntropy {
    fn sample(&mut self, _tick: u64) -> f64 {
        self.0
    }
}

/// Uniform samples in `[0, 1)` from a seeded generator
#[derive(Debug, Clone)]
pub struct UniformEntropy {
    rng: StdRng,
}

impl UniformEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl EntropySource for UniformEntropy {
    fn sample(&mut self, _tick: u64) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Clamp a signal into `[0, 1]`, warning when it was out of range.
/// NaN becomes 0.
pub(crate) fn sanitize(value: f64, tick: u64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        return value;
    }
    let clamped = arkhe_core::numerics::clamp_unit(value);
    tracing::warn!(
        tick,
        value,
        clamped,
        "Environmental signal out of range, clamping"
    );
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_is_seeded() {
        let mut a = UniformEntropy::new(4);
        let mut b = UniformEntropy::new(4);
        for t in 0..10 {
            let x = a.sample(t);
            assert_eq!(x, b.sample(t));
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_closure_source() {
        let mut source = |tick: u64| tick as f64 / 10.0;
        assert_eq!(source.sample(3), 0.3);
        assert_eq!(ConstantEntropy(0.7).sample(99), 0.7);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(0.4, 0), 0.4);
        assert_eq!(sanitize(1.7, 0), 1.0);
        assert_eq!(sanitize(-2.0, 0), 0.0);
        assert_eq!(sanitize(f64::NAN, 0), 0.0);
    }
}
