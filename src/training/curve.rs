use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{NexusError, Result};

/// Smallest loss a synthetic step may report.
pub const LOSS_FLOOR: f64 = 0.01;

/// Largest accuracy a synthetic step may report.
pub const ACCURACY_CEILING: f64 = 0.99;

/// Half-open interval `[low, high)` additive noise is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseRange {
    pub low: f64,
    pub high: f64,
}

impl NoiseRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    fn draw(&self, rng: &mut StdRng) -> f64 {
        if self.high > self.low {
            rng.random_range(self.low..self.high)
        } else {
            self.low
        }
    }
}

/// Shape of the synthetic loss and accuracy curves.
///
/// At step `n` the loss is `exp(-n / loss_decay)` and the accuracy is
/// `1 - exp(-n / accuracy_decay)`, each plus uniform noise. Results are then clamped
/// to [`LOSS_FLOOR`] and [`ACCURACY_CEILING`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    pub loss_decay: f64,
    pub loss_noise: NoiseRange,
    pub accuracy_decay: f64,
    pub accuracy_noise: NoiseRange,
}

impl CurveParams {
    /// Curve used by the store-integrated run: fast decay, strictly positive noise.
    pub fn store() -> Self {
        Self {
            loss_decay: 20.0,
            loss_noise: NoiseRange::new(0.0, 0.1),
            accuracy_decay: 25.0,
            accuracy_noise: NoiseRange::new(0.0, 0.1),
        }
    }

    /// Curve used by the epoch-oriented simulator: slower loss decay, centered noise.
    pub fn epoch() -> Self {
        Self {
            loss_decay: 25.0,
            loss_noise: NoiseRange::new(-0.05, 0.05),
            accuracy_decay: 20.0,
            accuracy_noise: NoiseRange::new(-0.025, 0.025),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, decay) in [
            ("loss_decay", self.loss_decay),
            ("accuracy_decay", self.accuracy_decay),
        ] {
            if !(decay.is_finite() && decay > 0.0) {
                return Err(NexusError::InvalidConfig(format!(
                    "{name} must be a positive number, got {decay}"
                )));
            }
        }

        for (name, noise) in [
            ("loss_noise", self.loss_noise),
            ("accuracy_noise", self.accuracy_noise),
        ] {
            if !(noise.low.is_finite() && noise.high.is_finite()) || noise.low > noise.high {
                return Err(NexusError::InvalidConfig(format!(
                    "{name} must satisfy low <= high, got [{}, {})",
                    noise.low, noise.high
                )));
            }
        }

        Ok(())
    }
}

/// One synthetic training step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub loss: f64,
    pub accuracy: f64,
}

/// Noisy generator of loss/accuracy values along a [`CurveParams`] shape.
#[derive(Debug)]
pub struct MetricCurve {
    params: CurveParams,
    rng: StdRng,
}

impl MetricCurve {
    /// Creates a new curve.
    ///
    /// # Args
    /// * `params` - The curve shape.
    /// * `seed` - Fixes the noise sequence when given; otherwise the OS seeds it.
    pub fn new(params: CurveParams, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self { params, rng }
    }

    pub fn params(&self) -> &CurveParams {
        &self.params
    }

    /// The noise-free value of the curve at `step`, before clamping.
    pub fn baseline(&self, step: u32) -> Sample {
        let n = f64::from(step);
        Sample {
            loss: (-n / self.params.loss_decay).exp(),
            accuracy: 1.0 - (-n / self.params.accuracy_decay).exp(),
        }
    }

    /// Draws the noisy, clamped value of the curve at `step`.
    pub fn sample(&mut self, step: u32) -> Sample {
        let base = self.baseline(step);
        let loss = base.loss + self.params.loss_noise.draw(&mut self.rng);
        let accuracy = base.accuracy + self.params.accuracy_noise.draw(&mut self.rng);

        Sample {
            loss: loss.max(LOSS_FLOOR),
            accuracy: accuracy.min(ACCURACY_CEILING),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn baseline_follows_exponential_decay() {
        let curve = MetricCurve::new(CurveParams::store(), Some(0));

        let at_0 = curve.baseline(0);
        assert!((at_0.loss - 1.0).abs() < EPS);
        assert!(at_0.accuracy.abs() < EPS);

        // exp(-20 / 20) and 1 - exp(-25 / 25)
        assert!((curve.baseline(20).loss - (-1.0f64).exp()).abs() < EPS);
        assert!((curve.baseline(25).accuracy - (1.0 - (-1.0f64).exp())).abs() < EPS);
    }

    #[test]
    fn store_samples_stay_within_noise_band() {
        let mut curve = MetricCurve::new(CurveParams::store(), Some(7));

        for step in 1..=100 {
            let base = curve.baseline(step);
            let s = curve.sample(step);
            assert!(s.loss >= base.loss.max(LOSS_FLOOR) && s.loss < base.loss + 0.1 + EPS);
            assert!(s.accuracy <= ACCURACY_CEILING);
            assert!(s.accuracy >= base.accuracy.min(ACCURACY_CEILING));
        }
    }

    #[test]
    fn loss_never_drops_below_floor() {
        let mut curve = MetricCurve::new(CurveParams::epoch(), Some(11));

        for step in 1..=1000 {
            let s = curve.sample(step);
            assert!(s.loss >= LOSS_FLOOR, "step {step}: loss {}", s.loss);
            assert!(s.accuracy <= ACCURACY_CEILING, "step {step}: acc {}", s.accuracy);
        }

        // Far along the curve the baseline loss is ~0 and the noise cannot lift it
        // above 0.05, so the floor must have been hit at least once.
        let late: Vec<_> = (900..1000).map(|step| curve.sample(step).loss).collect();
        assert!(late.iter().any(|&l| l == LOSS_FLOOR));
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = MetricCurve::new(CurveParams::epoch(), Some(42));
        let mut b = MetricCurve::new(CurveParams::epoch(), Some(42));

        for step in 1..=20 {
            assert_eq!(a.sample(step), b.sample(step));
        }
    }

    #[test]
    fn degenerate_noise_range_is_constant() {
        let params = CurveParams {
            loss_noise: NoiseRange::new(0.0, 0.0),
            accuracy_noise: NoiseRange::new(0.0, 0.0),
            ..CurveParams::store()
        };
        let mut curve = MetricCurve::new(params, None);

        let s = curve.sample(20);
        assert!((s.loss - (-1.0f64).exp()).abs() < EPS);
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let zero_decay = CurveParams {
            loss_decay: 0.0,
            ..CurveParams::store()
        };
        assert!(zero_decay.validate().is_err());

        let inverted = CurveParams {
            accuracy_noise: NoiseRange::new(0.1, -0.1),
            ..CurveParams::epoch()
        };
        assert!(inverted.validate().is_err());

        assert!(CurveParams::store().validate().is_ok());
        assert!(CurveParams::epoch().validate().is_ok());
    }
}
