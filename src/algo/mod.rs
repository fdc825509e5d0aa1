use crate::env::{Action, GridWorld};

pub mod mcts;
pub mod tabular;

pub use mcts::{MctsConfig, MctsPlanner};
pub use tabular::{QLearningAgent, QLearningConfig};

/// A decision engine driving the hero of a [`GridWorld`], one action per turn
pub trait Controller<W: GridWorld> {
    /// Choose the hero's next action
    ///
    /// The world is only borrowed; an engine looks ahead on clones, never on the live world.
    fn next_action(&mut self, world: &W) -> Action;

    /// Forget any per-episode state before a new episode starts
    fn reset(&mut self);

    /// Observe the final state of an episode
    fn end_episode(&mut self, _world: &W) {}
}
