//! Bounded pseudo-random numbers with fixed decimal precision.
//!
//! The simulation never calls a global RNG directly. It holds a
//! [`RandomSource`] so tests can swap in a [`ScriptedRandom`] that replays
//! a known sequence.

use std::collections::VecDeque;

use rand::Rng;

/// Precision used when a caller has no particular requirement.
pub const DEFAULT_PRECISION: u32 = 4;

/// Precision beyond this is clamped; `f64` has no more useful digits here.
const MAX_PRECISION: u32 = 12;

/// A capability that produces bounded random numbers.
pub trait RandomSource: Send + Sync {
    /// Return a value in `[min, max)` truncated to `precision` decimal
    /// digits. `precision == 0` yields an integral value.
    ///
    /// An empty range (`min >= max`) yields `min`.
    fn generate(&mut self, min: f64, max: f64, precision: u32) -> f64;
}

/// Production source backed by the thread-local `rand` generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl ThreadRandom {
    /// Create a new thread-backed source.
    pub const fn new() -> Self {
        Self
    }
}

impl RandomSource for ThreadRandom {
    fn generate(&mut self, min: f64, max: f64, precision: u32) -> f64 {
        if min >= max {
            return min;
        }
        let raw = rand::rng().random_range(min..max);
        truncate_into_range(raw, min, max, precision)
    }
}

/// Deterministic source that replays a fixed sequence of values.
///
/// Values are returned verbatim (no clamping or rounding) so tests can also
/// force out-of-range draws. Once exhausted it keeps returning `min`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
}

impl ScriptedRandom {
    /// Create a source that will return `values` in order.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Append more values to the end of the script.
    pub fn extend(&mut self, values: impl IntoIterator<Item = f64>) {
        self.values.extend(values);
    }

    /// Number of scripted values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn generate(&mut self, min: f64, _max: f64, _precision: u32) -> f64 {
        self.values.pop_front().unwrap_or(min)
    }
}

/// Truncate `value` to `precision` digits, keeping the result in `[min, max)`.
fn truncate_into_range(value: f64, min: f64, max: f64, precision: u32) -> f64 {
    let exponent = i32::try_from(precision.min(MAX_PRECISION)).unwrap_or(0);
    let scale = 10_f64.powi(exponent);
    let truncated = ((value * scale).floor() / scale).max(min);
    if truncated < max {
        truncated
    } else {
        // Floating error pushed the value onto the open upper bound.
        (max - scale.recip()).max(min)
    }
}

/// Convert an integral sample into an index, rejecting negatives and NaN.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sample_to_index(sample: f64) -> Option<usize> {
    if sample.is_finite() && sample >= 0.0 {
        Some(sample.trunc() as usize)
    } else {
        None
    }
}

/// Convert a collection length into the exclusive upper bound of a draw.
pub fn len_to_bound(len: usize) -> f64 {
    f64::from(u32::try_from(len).unwrap_or(u32::MAX))
}
