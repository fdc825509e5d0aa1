use strum::{FromRepr, VariantArray};

/// Tile coordinates as `(x, y)`, signed so that neighbours past the map edge can be named
pub type Pos = (i32, i32);

/// A move the hero can attempt on its turn
///
/// The discriminants double as indices into a Q-table row.
#[derive(VariantArray, FromRepr, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

/// Number of actions a decision engine chooses between
pub const ACTION_COUNT: usize = 4;

impl Action {
    /// Offset applied to a position, with `y` growing downwards
    pub fn delta(self) -> Pos {
        match self {
            Action::Up => (0, -1),
            Action::Right => (1, 0),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
        }
    }

    /// Position reached by moving from `pos` in this direction
    pub fn apply(self, pos: Pos) -> Pos {
        let (dx, dy) = self.delta();
        (pos.0 + dx, pos.1 + dy)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Classification of a single map cell as seen by the hero
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Hero,
    Entrance,
    Exit,
    Monster,
    Reward,
    Potion,
    Wall,
}

/// A dungeon simulation that decision engines can observe, clone, and step
///
/// Engines never mutate the world they are handed by a driver. Any lookahead works on a
/// [`Clone`], so implementations must make `clone` a deep copy: stepping a clone may not
/// be observable through the original.
pub trait GridWorld: Clone {
    /// Apply one hero action, resolving movement, combat, and pickups, and advance the turn
    ///
    /// An illegal move is a no-op turn rather than an error.
    fn step(&mut self, action: Action);

    /// Determine if the game has ended, either at the exit or with the hero dead
    fn is_terminal(&self) -> bool;

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Classify the cell at `pos`
    ///
    /// Callers only pass positions for which [`GridWorld::within_bounds`] holds.
    fn tile(&self, pos: Pos) -> Tile;

    fn hero_position(&self) -> Pos;

    fn hitpoints(&self) -> i32;

    fn score(&self) -> i32;

    /// Determine if the hero may stand on `pos`
    fn is_legal_move(&self, pos: Pos) -> bool;

    fn monsters_killed(&self) -> usize;

    fn rewards_collected(&self) -> usize;

    fn potions_used(&self) -> usize;

    /// Position the hero would reach with `action`, without moving it
    fn next_position(&self, action: Action) -> Pos {
        action.apply(self.hero_position())
    }

    fn within_bounds(&self, pos: Pos) -> bool {
        pos.0 >= 0 && pos.1 >= 0 && (pos.0 as usize) < self.width() && (pos.1 as usize) < self.height()
    }

    /// Actions whose target position is currently a legal move, in [`Action`] order
    fn legal_actions(&self) -> Vec<Action> {
        <Action as VariantArray>::VARIANTS
            .iter()
            .copied()
            .filter(|&a| self.is_legal_move(self.next_position(a)))
            .collect()
    }

    /// Layout predicates such as this one, [`GridWorld::is_entrance`] and
    /// [`GridWorld::is_exit`] must still hold under the hero. Override them when
    /// [`GridWorld::tile`] reports [`Tile::Hero`] over the layout.
    fn is_wall(&self, pos: Pos) -> bool {
        self.tile(pos) == Tile::Wall
    }

    fn is_empty(&self, pos: Pos) -> bool {
        self.tile(pos) == Tile::Empty
    }

    fn is_hero(&self, pos: Pos) -> bool {
        self.tile(pos) == Tile::Hero
    }

    fn is_monster(&self, pos: Pos) -> bool {
        self.tile(pos) == Tile::Monster
    }

    fn is_reward(&self, pos: Pos) -> bool {
        self.tile(pos) == Tile::Reward
    }

    fn is_potion(&self, pos: Pos) -> bool {
        self.tile(pos) == Tile::Potion
    }

    fn is_entrance(&self, pos: Pos) -> bool {
        self.tile(pos) == Tile::Entrance
    }

    fn is_exit(&self, pos: Pos) -> bool {
        self.tile(pos) == Tile::Exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_offsets() {
        assert_eq!(Action::Up.apply((2, 2)), (2, 1), "Up decreases y");
        assert_eq!(Action::Right.apply((2, 2)), (3, 2), "Right increases x");
        assert_eq!(Action::Down.apply((2, 2)), (2, 3), "Down increases y");
        assert_eq!(Action::Left.apply((2, 2)), (1, 2), "Left decreases x");
    }

    #[test]
    fn action_indices_round_trip() {
        for (i, &action) in Action::VARIANTS.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(Action::from_repr(i), Some(action));
        }
        assert_eq!(Action::VARIANTS.len(), ACTION_COUNT);
    }
}
