use rand::Rng;

use crate::{assert_interval, decay::Decay};

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
///
/// The threshold follows the decay strategy over completed episodes unless it has been
/// pinned with [`EpsilonGreedy::pin`].
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
    pinned: Option<f64>,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self {
            epsilon: decay,
            pinned: None,
        }
    }

    /// Epsilon threshold in effect after `episode` completed episodes
    pub fn epsilon(&self, episode: u32) -> f64 {
        self.pinned
            .unwrap_or_else(|| self.epsilon.evaluate(episode as f64))
    }

    /// Override the decay strategy with a fixed threshold
    ///
    /// **Panics** if `epsilon` is not in the interval `[0,1]`
    pub fn pin(&mut self, epsilon: f64) {
        assert_interval!(epsilon, 0.0, 1.0);
        self.pinned = Some(epsilon);
    }

    /// Return to following the decay strategy
    pub fn unpin(&mut self) {
        self.pinned = None;
    }

    /// Invoke epsilon greedy policy for current episode
    pub fn choose<R: Rng + ?Sized>(&self, episode: u32, rng: &mut R) -> Choice {
        if rng.gen::<f64>() < self.epsilon(episode) {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::decay::{self, Constant};

    #[test]
    fn extremes_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let greedy = EpsilonGreedy::new(Constant::new(0.0));
        let random = EpsilonGreedy::new(Constant::new(1.0));
        for episode in 0..100 {
            assert_eq!(greedy.choose(episode, &mut rng), Choice::Exploit);
            assert_eq!(random.choose(episode, &mut rng), Choice::Explore);
        }
    }

    #[test]
    fn pin_overrides_schedule() {
        let mut policy = EpsilonGreedy::new(decay::Geometric::new(0.5, 1.0, 0.1, 0.0));
        assert_eq!(policy.epsilon(1), 0.5);
        policy.pin(0.3);
        assert_eq!(policy.epsilon(1), 0.3);
        assert_eq!(policy.epsilon(10), 0.3);
        policy.unpin();
        assert_eq!(policy.epsilon(1), 0.5);
    }
}
