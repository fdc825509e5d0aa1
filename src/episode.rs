use std::collections::HashSet;

use crate::{algo::Controller, env::GridWorld};

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The game ended with the hero alive
    Completed,
    Died,
    /// The action budget ran out first
    Uncompleted,
}

/// Per-episode metrics read off the final world
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    pub hp_remaining: i32,
    pub monsters_killed: usize,
    pub treasures_collected: usize,
    pub potions_drunk: usize,
    /// Distinct cells the hero stood on, the start included
    pub tiles_explored: usize,
    pub actions_taken: usize,
    pub outcome: Outcome,
}

impl EpisodeStats {
    fn from_world<W: GridWorld>(world: &W, tiles_explored: usize, actions_taken: usize) -> Self {
        let outcome = if world.hitpoints() <= 0 {
            Outcome::Died
        } else if world.is_terminal() {
            Outcome::Completed
        } else {
            Outcome::Uncompleted
        };
        Self {
            hp_remaining: world.hitpoints(),
            monsters_killed: world.monsters_killed(),
            treasures_collected: world.rewards_collected(),
            potions_drunk: world.potions_used(),
            tiles_explored,
            actions_taken,
            outcome,
        }
    }
}

/// Let `controller` play `world` until the game ends or `max_actions` actions were taken
pub fn run_episode<W, C>(world: &mut W, controller: &mut C, max_actions: usize) -> EpisodeStats
where
    W: GridWorld,
    C: Controller<W> + ?Sized,
{
    controller.reset();
    let mut visited = HashSet::from([world.hero_position()]);
    let mut actions = 0;
    while !world.is_terminal() && actions < max_actions {
        let action = controller.next_action(world);
        world.step(action);
        visited.insert(world.hero_position());
        actions += 1;
    }
    controller.end_episode(world);

    let stats = EpisodeStats::from_world(world, visited.len(), actions);
    log::debug!("episode finished: {:?}", stats);
    stats
}
