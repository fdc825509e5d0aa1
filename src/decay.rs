use crate::assert_interval;

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f64) -> f64;
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f64) -> f64 {
        self.value
    }
}

/// v(t) = max(v<sub>i</sub> * r<sup>max(t - d, 0)</sup>, v<sub>f</sub>)
///
/// Holds `vi` for the first `delay` steps, then shrinks it by a factor of `rate` per step
/// until it reaches the floor `vf`.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometric {
    rate: f64,
    vi: f64,
    vf: f64,
    delay: f64,
}

impl Geometric {
    /// **Panics** if `rate` is not in the interval `[0,1]` or if `vi` is less than `vf`
    pub fn new(rate: f64, vi: f64, vf: f64, delay: f64) -> Self {
        assert_interval!(rate, 0.0, 1.0);
        assert!(vi >= vf, "Initial value must not be less than the floor.");
        Self {
            rate,
            vi,
            vf,
            delay,
        }
    }
}

impl Decay for Geometric {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self {
            rate,
            vi,
            vf,
            delay,
        } = self;
        (vi * rate.powf((t - delay).max(0.0))).max(vf)
    }
}
