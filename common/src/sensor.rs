// Simulated sensor producing uniformly distributed readings

use crate::config::SensorConfig;
use crate::models::Reading;
use rand::Rng;
use std::sync::Arc;

/// Source of uniformly distributed values in `[0, 1)`
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// Thread-local RNG backed source
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Always returns the same value
#[derive(Debug, Clone, Copy)]
pub struct FixedSource(pub f64);

impl RandomSource for FixedSource {
    fn next_unit(&self) -> f64 {
        self.0
    }
}

/// Maps random unit values onto `[min, min + span)`
#[derive(Clone)]
pub struct SensorSimulator {
    min: f64,
    span: f64,
    source: Arc<dyn RandomSource>,
}

impl SensorSimulator {
    pub fn new(min: f64, span: f64, source: Arc<dyn RandomSource>) -> Self {
        Self { min, span, source }
    }

    pub fn from_config(config: &SensorConfig, source: Arc<dyn RandomSource>) -> Self {
        Self::new(config.min_value, config.span, source)
    }

    /// Exclusive upper bound of generated values
    pub fn max(&self) -> f64 {
        self.min + self.span
    }

    pub fn sample(&self) -> Reading {
        Reading::new(self.value_for(self.source.next_unit()))
    }

    fn value_for(&self, unit: f64) -> f64 {
        let unit = if unit.is_finite() {
            unit.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let max = self.max();
        let value = self.min + unit * self.span;
        if value >= max {
            // Rounding (or unit == 1.0) can land on max itself
            below(max)
        } else {
            value
        }
    }
}

/// Largest f64 strictly less than `x`
fn below(x: f64) -> f64 {
    if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else if x == 0.0 {
        -f64::from_bits(1)
    } else {
        f64::from_bits(x.to_bits() + 1)
    }
}

impl std::fmt::Debug for SensorSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSimulator")
            .field("min", &self.min)
            .field("span", &self.span)
            .finish()
    }
}
