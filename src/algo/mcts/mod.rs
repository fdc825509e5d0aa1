//! Monte-Carlo tree search over cloned dungeon states

use log::{debug, trace, warn};
use rand::{seq::SliceRandom, Rng};

use crate::{
    algo::Controller,
    distance::DistanceField,
    env::{Action, GridWorld},
};

mod reward;
mod tree;

pub use reward::{Metric, RolloutReward, WeightedReward};
pub use tree::{Node, Tree};

/// Configuration for the [`MctsPlanner`]
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Select-expand-simulate-backpropagate cycles per decision
    ///
    /// **Default**: `200`
    pub iterations: u32,
    /// Maximum number of random actions in a single rollout
    ///
    /// **Default**: `50`
    pub rollout_cap: u32,
    /// Exploration constant `c` of the UCB score
    ///
    /// **Default**: `√2`, which yields UCB1
    pub exploration: f64,
    /// Keep the subtree of the action taken between decisions instead of searching from scratch
    ///
    /// **Default**: `false`
    pub reuse_tree: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            rollout_cap: 50,
            exploration: std::f64::consts::SQRT_2,
            reuse_tree: false,
        }
    }
}

/// A planner that runs a full tree search for every decision and plays the most visited root action
///
/// ### Generics
/// - `W` - The [`GridWorld`] being searched, cloned into every tree node
/// - `R` - Source of randomness for rollouts, owned so that seeded runs are reproducible
/// - `F` - The [`RolloutReward`] scoring the end of each rollout
pub struct MctsPlanner<W, R, F = WeightedReward> {
    config: MctsConfig,
    distances: DistanceField,
    reward: F,
    rng: R,
    tree: Option<Tree<W>>,
    last_action: Option<Action>,
}

impl<W, R, F> MctsPlanner<W, R, F>
where
    W: GridWorld,
    R: Rng,
    F: RolloutReward<W>,
{
    pub fn new(config: MctsConfig, distances: DistanceField, reward: F, rng: R) -> Self {
        Self {
            config,
            distances,
            reward,
            rng,
            tree: None,
            last_action: None,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Tree kept from the last decision, only retained when tree reuse is enabled
    pub fn tree(&self) -> Option<&Tree<W>> {
        self.tree.as_ref()
    }

    /// Replace the distance field, e.g. when moving on to another map
    pub fn set_distances(&mut self, distances: DistanceField) {
        self.distances = distances;
        self.reset();
    }

    /// Build the tree for `world` and run the configured number of iterations on it
    pub fn search(&mut self, world: &W) -> Tree<W> {
        let mut tree = self.root_for(world);
        let mut skipped = 0;
        for _ in 0..self.config.iterations {
            if !self.iterate(&mut tree) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            trace!("{skipped} iterations hit a dead end");
        }
        tree
    }

    /// Fresh root for `world`, or the promoted subtree of the last action if it still matches
    fn root_for(&mut self, world: &W) -> Tree<W> {
        let previous = self.tree.take().zip(self.last_action.take());
        let Some((tree, action)) = previous.filter(|_| self.config.reuse_tree) else {
            return Tree::new(world.clone());
        };

        let Some(child) = tree.root_child(action) else {
            warn!("no subtree for {action:?} to reuse, searching from scratch");
            return Tree::new(world.clone());
        };

        let node = tree.node(child);
        if node.world.hero_position() != world.hero_position()
            || node.world.hitpoints() != world.hitpoints()
        {
            debug!("subtree for {action:?} diverged from the live world, searching from scratch");
            return Tree::new(world.clone());
        }

        tree.promote(child)
    }

    /// Run one select-expand-simulate-backpropagate cycle
    ///
    /// **Returns** `false` if the selected leaf had no legal move and nothing was backpropagated
    fn iterate(&mut self, tree: &mut Tree<W>) -> bool {
        let leaf = tree.select(self.config.exploration);

        if tree.node(leaf).world.is_terminal() {
            let reward = self.reward.score(&tree.node(leaf).world, &self.distances);
            tree.backpropagate(leaf, reward);
            return true;
        }

        let expansions: Vec<(Action, W)> = {
            let world = &tree.node(leaf).world;
            world
                .legal_actions()
                .into_iter()
                .map(|action| {
                    let mut next = world.clone();
                    next.step(action);
                    (action, next)
                })
                .collect()
        };
        let children: Vec<usize> = expansions
            .into_iter()
            .map(|(action, next)| tree.add_child(leaf, action, next))
            .collect();

        let Some(&child) = children.choose(&mut self.rng) else {
            return false;
        };
        trace!("expanded node {leaf} into {} children", children.len());

        let reward = self.simulate(tree.node(child).world.clone());
        tree.backpropagate(child, reward);
        true
    }

    /// Play uniformly random legal actions from `world` and score where it ends up
    fn simulate(&mut self, mut world: W) -> f64 {
        for _ in 0..self.config.rollout_cap {
            if world.is_terminal() {
                break;
            }
            let Some(&action) = world.legal_actions().choose(&mut self.rng) else {
                break;
            };
            world.step(action);
        }
        self.reward.score(&world, &self.distances)
    }
}

/// First legal action, or [`Action::Up`] when the hero cannot move at all
fn fallback_action<W: GridWorld>(world: &W) -> Action {
    world.legal_actions().first().copied().unwrap_or(Action::Up)
}

impl<W, R, F> Controller<W> for MctsPlanner<W, R, F>
where
    W: GridWorld,
    R: Rng,
    F: RolloutReward<W>,
{
    fn next_action(&mut self, world: &W) -> Action {
        let tree = self.search(world);
        let action = tree
            .most_visited_action()
            .unwrap_or_else(|| fallback_action(world));

        debug!(
            "mcts chose {:?} at {:?} with {} root visits over {} nodes",
            action,
            world.hero_position(),
            tree.root().visits,
            tree.len()
        );

        if self.config.reuse_tree {
            self.tree = Some(tree);
            self.last_action = Some(action);
        }
        action
    }

    fn reset(&mut self) {
        self.tree = None;
        self.last_action = None;
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::gym::Dungeon;

    fn planner(
        world: &Dungeon,
        config: MctsConfig,
        seed: u64,
    ) -> MctsPlanner<Dungeon, StdRng, WeightedReward> {
        let distances = DistanceField::to_exit(world).unwrap();
        MctsPlanner::new(
            config,
            distances,
            WeightedReward::default(),
            StdRng::seed_from_u64(seed),
        )
    }

    fn open_five_by_five() -> Dungeon {
        Dungeon::parse(&["@....", ".....", ".....", ".....", "....X"]).unwrap()
    }

    #[test]
    fn each_iteration_adds_one_root_visit() {
        let world = open_five_by_five();
        let mut planner = planner(&world, MctsConfig::default(), 1);
        let mut tree = Tree::new(world.clone());

        for expected in 1..=30 {
            assert!(planner.iterate(&mut tree));
            assert_eq!(tree.root().visits, expected);
        }
        let children: u32 = tree
            .root()
            .children
            .iter()
            .map(|&c| tree.node(c).visits)
            .sum();
        assert_eq!(children, 30, "every visit passed through a root child");
    }

    #[test]
    fn expansion_skips_illegal_moves() {
        let world = Dungeon::parse(&["#.#", "#@.", "###", "X.."]).unwrap();
        let mut planner = planner(&world, MctsConfig::default(), 2);
        let mut tree = Tree::new(world.clone());
        planner.iterate(&mut tree);

        let actions: Vec<_> = tree
            .root()
            .children
            .iter()
            .map(|&c| tree.node(c).action)
            .collect();
        assert_eq!(actions, vec![Some(Action::Up), Some(Action::Right)]);
    }

    #[test]
    fn zero_iterations_falls_back() {
        let world = open_five_by_five();
        let config = MctsConfig {
            iterations: 0,
            ..Default::default()
        };
        let mut planner = planner(&world, config, 3);
        assert_eq!(
            planner.next_action(&world),
            Action::Right,
            "first legal action from the top-left corner"
        );
    }

    #[test]
    fn boxed_in_hero_does_not_crash() {
        let world = Dungeon::parse(&["###..", "#@#.X", "###.."]).unwrap();
        let mut planner = planner(&world, MctsConfig::default(), 4);

        let tree = planner.search(&world);
        assert_eq!(tree.root().visits, 0, "every iteration was skipped");
        assert_eq!(planner.next_action(&world), Action::Up);
    }

    #[test]
    fn terminal_root_is_scored_in_place() {
        let mut world = Dungeon::parse(&["@X"]).unwrap();
        let config = MctsConfig {
            iterations: 5,
            ..Default::default()
        };
        let mut planner = planner(&world, config, 5);
        world.step(Action::Right);

        let tree = planner.search(&world);
        assert_eq!(tree.len(), 1, "terminal nodes are never expanded");
        assert_eq!(tree.root().visits, 5);
    }

    #[test]
    fn live_world_is_untouched() {
        let world = Dungeon::parse(&["@r..", "m..X"]).unwrap();
        let mut planner = planner(&world, MctsConfig::default(), 6);
        planner.next_action(&world);

        assert_eq!(world.hero_position(), (0, 0));
        assert_eq!(world.rewards_collected(), 0);
        assert_eq!(world.monsters_killed(), 0);
    }

    #[test]
    fn reused_subtree_keeps_statistics() {
        let mut world = open_five_by_five();
        let config = MctsConfig {
            iterations: 50,
            reuse_tree: true,
            ..Default::default()
        };
        let mut planner = planner(&world, config, 7);

        let action = planner.next_action(&world);
        let tree = planner.tree().unwrap();
        let kept = tree.node(tree.root_child(action).unwrap()).visits;
        assert!(kept > 0);

        world.step(action);
        planner.next_action(&world);
        assert_eq!(planner.tree().unwrap().root().visits, kept + 50);
    }

    #[test]
    fn diverged_subtree_is_discarded() {
        let mut world = open_five_by_five();
        let config = MctsConfig {
            iterations: 50,
            reuse_tree: true,
            ..Default::default()
        };
        let mut planner = planner(&world, config, 8);

        let action = planner.next_action(&world);
        let other = if action == Action::Right {
            Action::Down
        } else {
            Action::Right
        };
        world.step(other);
        planner.next_action(&world);
        assert_eq!(planner.tree().unwrap().root().visits, 50);
    }

    #[test]
    fn missing_subtree_starts_fresh() {
        let mut world = open_five_by_five();
        let config = MctsConfig {
            iterations: 0,
            reuse_tree: true,
            ..Default::default()
        };
        let mut planner = planner(&world, config, 9);

        let action = planner.next_action(&world);
        assert_eq!(action, Action::Right);
        assert_eq!(planner.tree().unwrap().len(), 1, "nothing was expanded");

        world.step(action);
        planner.config.iterations = 10;
        planner.next_action(&world);
        assert_eq!(planner.tree().unwrap().root().visits, 10);
        assert_eq!(planner.tree().unwrap().root().world.hero_position(), (1, 0));
    }

    #[test]
    fn reaches_exit_of_open_room() {
        let config = MctsConfig {
            iterations: 200,
            rollout_cap: 50,
            ..Default::default()
        };

        let escapes = (0..5)
            .filter(|&seed| {
                let mut world = open_five_by_five();
                let mut planner = planner(&world, config.clone(), seed);
                for _ in 0..20 {
                    if world.is_terminal() {
                        break;
                    }
                    let action = planner.next_action(&world);
                    world.step(action);
                }
                world.escaped()
            })
            .count();

        assert!(escapes > 0, "no seeded run reached the exit");
    }
}
