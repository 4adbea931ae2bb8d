use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// Easing curve for a motion segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    /// Fast start, slow finish: `sin(t * pi/2)`.
    Sine,
    /// Slow start, fast finish: `1 - cos(t * pi/2)`.
    Cosine,
    /// Polynomial curve `t^exponent`.
    Power { exponent: f64 },
}

impl Easing {
    /// Map a normalized time fraction to an eased fraction.
    ///
    /// `t` is clamped to [0, 1] before the curve is applied, so the output
    /// always lands between the endpoints.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Sine => (t * FRAC_PI_2).sin(),
            Easing::Cosine => 1.0 - (t * FRAC_PI_2).cos(),
            Easing::Power { exponent } => t.powf(exponent),
        }
    }
}

/// Interpolate between `start` and `end` through the eased fraction of `t`.
pub fn ease(start: f64, end: f64, t: f64, easing: Easing) -> f64 {
    start + (end - start) * easing.apply(t)
}
