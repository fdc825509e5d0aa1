use crate::{
    distance::{Distance, DistanceField},
    env::GridWorld,
};

/// Scores the world at the end of a rollout
///
/// Any `Fn(&W, &DistanceField) -> f64` closure is a valid strategy.
pub trait RolloutReward<W: GridWorld> {
    fn score(&self, world: &W, distances: &DistanceField) -> f64;
}

impl<W, F> RolloutReward<W> for F
where
    W: GridWorld,
    F: Fn(&W, &DistanceField) -> f64,
{
    fn score(&self, world: &W, distances: &DistanceField) -> f64 {
        self(world, distances)
    }
}

/// How [`WeightedReward`] measures the hero's distance to the exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Precomputed BFS distance, which accounts for walls
    #[default]
    Field,
    /// Straight Manhattan distance to the exit, blind to walls
    Manhattan,
}

/// Linear combination of exit distance, hitpoints, and collected entities
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedReward {
    /// Multiplies the number of steps to the exit, negative to pull the hero toward it
    ///
    /// **Default**: `-10.0`
    pub distance_weight: f64,
    /// Added when the hero stands on the exit
    ///
    /// **Default**: `100.0`
    pub exit_bonus: f64,
    /// **Default**: `1.0`
    pub health_weight: f64,
    /// **Default**: `20.0`
    pub treasure_weight: f64,
    /// **Default**: `5.0`
    pub monster_weight: f64,
    /// **Default**: `5.0`
    pub potion_weight: f64,
    /// Distance assumed for tiles the exit cannot be reached from
    ///
    /// **Default**: `100.0`
    pub unreachable_distance: f64,
    /// **Default**: [`Metric::Field`]
    pub metric: Metric,
}

impl Default for WeightedReward {
    fn default() -> Self {
        Self {
            distance_weight: -10.0,
            exit_bonus: 100.0,
            health_weight: 1.0,
            treasure_weight: 20.0,
            monster_weight: 5.0,
            potion_weight: 5.0,
            unreachable_distance: 100.0,
            metric: Metric::Field,
        }
    }
}

impl WeightedReward {
    fn distance<W: GridWorld>(&self, world: &W, distances: &DistanceField) -> f64 {
        let hero = world.hero_position();
        match self.metric {
            Metric::Field => distances
                .distance(hero)
                .steps_or(self.unreachable_distance),
            Metric::Manhattan => {
                let exit = distances.exit();
                ((hero.0 - exit.0).abs() + (hero.1 - exit.1).abs()) as f64
            }
        }
    }
}

impl<W: GridWorld> RolloutReward<W> for WeightedReward {
    fn score(&self, world: &W, distances: &DistanceField) -> f64 {
        let at_exit = match self.metric {
            Metric::Field => distances.distance(world.hero_position()) == Distance::Steps(0),
            Metric::Manhattan => world.hero_position() == distances.exit(),
        };

        self.distance_weight * self.distance(world, distances)
            + if at_exit { self.exit_bonus } else { 0.0 }
            + self.health_weight * world.hitpoints().max(0) as f64
            + self.treasure_weight * world.rewards_collected() as f64
            + self.monster_weight * world.monsters_killed() as f64
            + self.potion_weight * world.potions_used() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{env::Action, gym::Dungeon};

    fn unit_weights() -> WeightedReward {
        WeightedReward {
            distance_weight: -1.0,
            exit_bonus: 50.0,
            health_weight: 0.0,
            treasure_weight: 3.0,
            monster_weight: 7.0,
            potion_weight: 11.0,
            unreachable_distance: 1000.0,
            metric: Metric::Field,
        }
    }

    #[test]
    fn weighted_terms() {
        let mut world = Dungeon::parse(&["@rmp.X"]).unwrap();
        let distances = DistanceField::to_exit(&world).unwrap();
        let reward = unit_weights();

        assert_eq!(reward.score(&world, &distances), -5.0);

        for _ in 0..3 {
            world.step(Action::Right);
        }
        assert_eq!(reward.score(&world, &distances), -2.0 + 3.0 + 7.0 + 11.0);

        world.step(Action::Right);
        world.step(Action::Right);
        assert_eq!(reward.score(&world, &distances), 50.0 + 21.0, "exit bonus");
    }

    #[test]
    fn walls_count_for_field_but_not_manhattan() {
        let world = Dungeon::parse(&["@#X", ".#.", "..."]).unwrap();
        let distances = DistanceField::to_exit(&world).unwrap();
        let field = unit_weights();
        let manhattan = WeightedReward {
            metric: Metric::Manhattan,
            ..unit_weights()
        };

        assert_eq!(field.score(&world, &distances), -6.0);
        assert_eq!(manhattan.score(&world, &distances), -2.0);
    }

    #[test]
    fn unreachable_is_far_not_zero() {
        let world = Dungeon::parse(&["@#X"]).unwrap();
        let distances = DistanceField::to_exit(&world).unwrap();
        assert_eq!(unit_weights().score(&world, &distances), -1000.0);
    }

    #[test]
    fn closures_are_strategies() {
        let world = Dungeon::parse(&["@.X"]).unwrap();
        let distances = DistanceField::to_exit(&world).unwrap();
        let hp = |w: &Dungeon, _: &DistanceField| w.hitpoints() as f64;
        assert_eq!(hp.score(&world, &distances), 40.0);
    }
}
