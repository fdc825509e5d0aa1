use std::path::Path;

use log::{debug, info, trace};
use rand::{seq::SliceRandom, Rng};
use strum::VariantArray;

use crate::{
    algo::Controller,
    assert_interval,
    decay::Geometric,
    distance::DistanceField,
    encoding::{Encoding, StateKey},
    env::{Action, GridWorld},
    episode::{run_episode, EpisodeStats},
    error::Result,
    exploration::{Choice, EpsilonGreedy},
};

use super::{
    q_table::{QTable, Row},
    reward::{SymbolReward, Transition, TransitionReward},
};

/// Whether the agent is still learning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Explore and update the table after every step
    #[default]
    Training,
    /// Always exploit and leave the table untouched
    Evaluation,
}

/// Epsilon schedule over completed training episodes
///
/// Epsilon holds at `start` for the first `decay_after` episodes, then shrinks by
/// `decay_rate` after every episode until it reaches `floor`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationSchedule {
    /// **Default**: `1.0`
    pub start: f64,
    /// **Default**: `0.1`
    pub floor: f64,
    /// **Default**: `0.99`
    pub decay_rate: f64,
    /// **Default**: `0`
    pub decay_after: u32,
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self {
            start: 1.0,
            floor: 0.1,
            decay_rate: 0.99,
            decay_after: 0,
        }
    }
}

impl ExplorationSchedule {
    /// Default schedule that starts decaying once `fraction` of `episodes` are done
    ///
    /// **Panics** if `fraction` is not in the interval `[0,1]`
    pub fn for_training(episodes: u32, fraction: f64) -> Self {
        assert_interval!(fraction, 0.0, 1.0);
        Self {
            decay_after: (episodes as f64 * fraction) as u32,
            ..Default::default()
        }
    }

    /// **Panics** if `start` or `floor` is not in the interval `[0,1]`, or if `start < floor`
    pub fn policy(&self) -> EpsilonGreedy<Geometric> {
        assert_interval!(self.start, 0.0, 1.0);
        assert_interval!(self.floor, 0.0, 1.0);
        EpsilonGreedy::new(Geometric::new(
            self.decay_rate,
            self.start,
            self.floor,
            self.decay_after as f64,
        ))
    }
}

/// Configuration for the [`QLearningAgent`]
#[derive(Debug, Clone, PartialEq)]
pub struct QLearningConfig {
    /// Learning rate
    ///
    /// **Default**: `0.5`
    pub alpha: f64,
    /// Discount factor
    ///
    /// **Default**: `0.9`
    pub gamma: f64,
    /// **Default**: `LocalWindow { radius: 2 }`
    pub encoding: Encoding,
    /// **Default**: [`Mode::Training`]
    pub mode: Mode,
    pub exploration: ExplorationSchedule,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            gamma: 0.9,
            encoding: Encoding::default(),
            mode: Mode::Training,
            exploration: ExplorationSchedule::default(),
        }
    }
}

/// A Q-learning agent over encoded dungeon states
///
/// The agent learns online: every decision first settles the previous decision's value with
/// the reward of the transition that followed it.
///
/// ### Generics
/// - `R` - Source of randomness for exploration
/// - `F` - The [`TransitionReward`] shaping what the agent learns
pub struct QLearningAgent<R, F = SymbolReward> {
    table: QTable,
    encoding: Encoding,
    exploration: EpsilonGreedy<Geometric>,
    alpha: f64,   // learning rate
    gamma: f64,   // discount factor
    mode: Mode,
    episode: u32, // completed training episodes
    distances: DistanceField,
    reward: F,
    rng: R,
    previous: Option<(StateKey, Action)>,
}

impl<R: Rng> QLearningAgent<R> {
    /// Initialize an agent with an empty table and the [`SymbolReward`] defaults
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(config: QLearningConfig, distances: DistanceField, rng: R) -> Self {
        Self::with_reward(config, distances, SymbolReward::default(), rng)
    }

    /// Initialize an agent that continues from a previously saved table
    pub fn from_table(
        config: QLearningConfig,
        distances: DistanceField,
        table: QTable,
        rng: R,
    ) -> Self {
        Self::new(config, distances, rng).with_table(table)
    }
}

impl<R, F> QLearningAgent<R, F>
where
    R: Rng,
    F: TransitionReward,
{
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn with_reward(
        config: QLearningConfig,
        distances: DistanceField,
        reward: F,
        rng: R,
    ) -> Self {
        assert_interval!(config.alpha, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);
        Self {
            table: QTable::new(),
            encoding: config.encoding,
            exploration: config.exploration.policy(),
            alpha: config.alpha,
            gamma: config.gamma,
            mode: config.mode,
            episode: 0,
            distances,
            reward,
            rng,
            previous: None,
        }
    }

    /// Continue from a previously saved table instead of an empty one
    pub fn with_table(mut self, table: QTable) -> Self {
        self.table = table;
        self
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.table.save(path)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.previous = None;
    }

    /// Number of completed training episodes
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Exploration rate in effect for the next decision, always `0` in evaluation
    pub fn epsilon(&self) -> f64 {
        match self.mode {
            Mode::Training => self.exploration.epsilon(self.episode),
            Mode::Evaluation => 0.0,
        }
    }

    /// Fix epsilon at `epsilon`, ignoring the schedule from now on
    ///
    /// **Panics** if `epsilon` is not in the interval `[0,1]`
    pub fn set_exploration_rate(&mut self, epsilon: f64) {
        self.exploration.pin(epsilon);
    }

    /// Undo [`QLearningAgent::set_exploration_rate`] and follow the schedule again
    pub fn follow_schedule(&mut self) {
        self.exploration.unpin();
    }

    /// Replace the distance field, e.g. when moving on to another map
    pub fn set_distances(&mut self, distances: DistanceField) {
        self.distances = distances;
        self.previous = None;
    }

    /// Play `episodes` episodes on fresh clones of `template`
    pub fn train<W: GridWorld>(
        &mut self,
        template: &W,
        episodes: u32,
        max_actions: usize,
    ) -> Vec<EpisodeStats> {
        let mut history = Vec::with_capacity(episodes as usize);
        for i in 1..=episodes {
            let mut world = template.clone();
            history.push(run_episode(&mut world, self, max_actions));

            if i % 100 == 0 || i == episodes {
                info!(
                    "episode {i}/{episodes}: epsilon {:.3}, {} states",
                    self.epsilon(),
                    self.table.len()
                );
            }
        }
        history
    }

    fn act(&mut self, values: &Row) -> Action {
        let choice = match self.mode {
            Mode::Training => self.exploration.choose(self.episode, &mut self.rng),
            Mode::Evaluation => Choice::Exploit,
        };
        match choice {
            Choice::Explore => Action::VARIANTS
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(Action::Up),
            Choice::Exploit => QTable::best_action(values),
        }
    }

    /// Settle the previous decision with the transition that led to `world`
    ///
    /// `next_max` is the best value of the state reached, `0` for a terminal state.
    fn learn<W: GridWorld>(&mut self, world: &W, next_max: f64) {
        let Some((key, action)) = self.previous.take() else {
            return;
        };

        let transition = Transition {
            target: self.encoding.target_symbol(&key, action, world.width()),
            health_bucket: key.health_bucket(),
            distance: self.distances.distance(world.hero_position()),
        };
        let reward = self.reward.reward(&transition);

        let q = &mut self.table.row_mut(&key)[action.index()];
        *q += self.alpha * (reward + self.gamma * next_max - *q);
        trace!("Q[{key}][{action:?}] = {q} after reward {reward}");
    }
}

impl<W, R, F> Controller<W> for QLearningAgent<R, F>
where
    W: GridWorld,
    R: Rng,
    F: TransitionReward,
{
    fn next_action(&mut self, world: &W) -> Action {
        let key = self.encoding.encode(world);
        let values = match self.mode {
            Mode::Training => *self.table.row_mut(&key),
            Mode::Evaluation => self.table.values(&key),
        };

        let action = self.act(&values);
        if self.mode == Mode::Training {
            self.learn(world, QTable::max(&values));
        }
        debug!("q-agent chose {action:?} in {key}");

        self.previous = Some((key, action));
        action
    }

    fn reset(&mut self) {
        self.previous = None;
    }

    fn end_episode(&mut self, world: &W) {
        if self.mode == Mode::Evaluation {
            return;
        }

        let next_max = if world.is_terminal() {
            0.0
        } else {
            QTable::max(&self.table.values(&self.encoding.encode(world)))
        };
        self.learn(world, next_max);
        self.episode += 1;
    }
}
