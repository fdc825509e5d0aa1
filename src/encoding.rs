//! Discrete state keys for tabular learning
//!
//! A key is a string of tile symbols followed by a single health digit. Keeping the
//! health coarse keeps the number of distinct keys, and therefore the Q-table, small.

use std::fmt;

use crate::env::{Action, GridWorld, Pos, Tile};

/// One character of an encoded state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Empty,
    Hero,
    Entrance,
    Exit,
    Monster,
    Reward,
    Potion,
    Wall,
    OutOfBounds,
}

impl Symbol {
    pub fn as_char(self) -> char {
        match self {
            Symbol::Empty => '.',
            Symbol::Hero => '@',
            Symbol::Entrance => 'E',
            Symbol::Exit => 'X',
            Symbol::Monster => 'm',
            Symbol::Reward => 'r',
            Symbol::Potion => 'p',
            Symbol::Wall => '#',
            Symbol::OutOfBounds => '~',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '.' => Symbol::Empty,
            '@' => Symbol::Hero,
            'E' => Symbol::Entrance,
            'X' => Symbol::Exit,
            'm' => Symbol::Monster,
            'r' => Symbol::Reward,
            'p' => Symbol::Potion,
            '#' => Symbol::Wall,
            '~' => Symbol::OutOfBounds,
            _ => return None,
        })
    }
}

impl From<Tile> for Symbol {
    fn from(tile: Tile) -> Self {
        match tile {
            Tile::Empty => Symbol::Empty,
            Tile::Hero => Symbol::Hero,
            Tile::Entrance => Symbol::Entrance,
            Tile::Exit => Symbol::Exit,
            Tile::Monster => Symbol::Monster,
            Tile::Reward => Symbol::Reward,
            Tile::Potion => Symbol::Potion,
            Tile::Wall => Symbol::Wall,
        }
    }
}

/// Number of health buckets a key can carry
pub const HEALTH_LEVELS: u8 = 4;

/// Quantize hitpoints: `[31,∞) → 3`, `[15,31) → 2`, `[6,15) → 1`, below 6 → 0
pub fn health_bucket(hitpoints: i32) -> u8 {
    match hitpoints {
        31.. => 3,
        15..=30 => 2,
        6..=14 => 1,
        _ => 0,
    }
}

/// Hashable key identifying a row of the Q-table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(String);

impl StateKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Health bucket stored in the trailing digit, `0` if the key carries none
    pub fn health_bucket(&self) -> u8 {
        self.0
            .chars()
            .last()
            .and_then(|c| c.to_digit(10))
            .map_or(0, |d| d as u8)
    }

    /// Symbol at a character offset, [`Symbol::OutOfBounds`] past the tile section
    fn symbol_at(&self, index: usize) -> Symbol {
        let tiles = &self.0[..self.0.len().saturating_sub(1)];
        tiles
            .chars()
            .nth(index)
            .and_then(Symbol::from_char)
            .unwrap_or(Symbol::OutOfBounds)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strategy projecting a world onto a [`StateKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Every tile of the map, row-major
    FullBoard,
    /// The `(2r+1)²` square centered on the hero, row-major
    LocalWindow { radius: u32 },
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::LocalWindow { radius: 2 }
    }
}

impl Encoding {
    pub fn encode<W: GridWorld>(&self, world: &W) -> StateKey {
        let mut key = String::new();
        match *self {
            Encoding::FullBoard => {
                key.reserve(world.width() * world.height() + 1);
                for y in 0..world.height() as i32 {
                    for x in 0..world.width() as i32 {
                        key.push(Self::symbol(world, (x, y)).as_char());
                    }
                }
            }
            Encoding::LocalWindow { radius } => {
                let r = radius as i32;
                let (hx, hy) = world.hero_position();
                for y in (hy - r)..=(hy + r) {
                    for x in (hx - r)..=(hx + r) {
                        key.push(Self::symbol(world, (x, y)).as_char());
                    }
                }
            }
        }
        key.push(char::from(b'0' + health_bucket(world.hitpoints())));
        StateKey(key)
    }

    /// Symbol next to the hero in the direction of `action`, as recorded in `key`
    ///
    /// `width` is the map width, needed to walk a [`Encoding::FullBoard`] key.
    pub fn target_symbol(&self, key: &StateKey, action: Action, width: usize) -> Symbol {
        let (dx, dy) = action.delta();
        match *self {
            Encoding::LocalWindow { radius } => {
                let side = 2 * radius as i32 + 1;
                let (cx, cy) = (radius as i32 + dx, radius as i32 + dy);
                key.symbol_at((cy * side + cx) as usize)
            }
            Encoding::FullBoard => {
                let Some(hero) = key.as_str().find(Symbol::Hero.as_char()) else {
                    return Symbol::OutOfBounds;
                };
                let (hx, hy) = ((hero % width) as i32, (hero / width) as i32);
                let (x, y) = (hx + dx, hy + dy);
                if x < 0 || y < 0 || x as usize >= width {
                    return Symbol::OutOfBounds;
                }
                key.symbol_at(y as usize * width + x as usize)
            }
        }
    }

    fn symbol<W: GridWorld>(world: &W, pos: Pos) -> Symbol {
        if world.within_bounds(pos) {
            world.tile(pos).into()
        } else {
            Symbol::OutOfBounds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{env::GridWorld, gym::Dungeon};

    #[test]
    fn health_buckets() {
        assert_eq!(health_bucket(40), 3);
        assert_eq!(health_bucket(31), 3);
        assert_eq!(health_bucket(30), 2);
        assert_eq!(health_bucket(15), 2);
        assert_eq!(health_bucket(14), 1);
        assert_eq!(health_bucket(6), 1);
        assert_eq!(health_bucket(5), 0);
        assert_eq!(health_bucket(-3), 0);
    }

    #[test]
    fn full_board_layout() {
        let world = Dungeon::parse(&["E.m", "#rX"]).unwrap();
        let key = Encoding::FullBoard.encode(&world);
        assert_eq!(key.as_str(), "@.m#rX3", "hero drawn over the entrance");
        assert_eq!(key.health_bucket(), 3);
    }

    #[test]
    fn local_window_pads_out_of_bounds() {
        let world = Dungeon::parse(&["E.m", "#rX"]).unwrap();
        let key = Encoding::LocalWindow { radius: 1 }.encode(&world);
        assert_eq!(key.as_str(), "~~~~@.~#r3");
    }

    #[test]
    fn default_window_is_five_by_five() {
        let world = Dungeon::parse(&["E....", ".....", "....X"]).unwrap();
        let key = Encoding::default().encode(&world);
        assert_eq!(key.as_str().len(), 26);
    }

    #[test]
    fn encoding_ignores_move_order() {
        let base = Dungeon::parse(&["@...", "....", "...X"]).unwrap();

        let mut a = base.clone();
        a.step(Action::Right);
        a.step(Action::Down);

        let mut b = base.clone();
        b.step(Action::Down);
        b.step(Action::Right);

        for encoding in [Encoding::FullBoard, Encoding::LocalWindow { radius: 2 }] {
            assert_eq!(encoding.encode(&a), encoding.encode(&b), "{encoding:?}");
        }
    }

    #[test]
    fn keys_only_see_the_health_bucket() {
        let layout = ["@.m", "r.X"];
        for encoding in [Encoding::FullBoard, Encoding::LocalWindow { radius: 2 }] {
            let key = |hp| encoding.encode(&Dungeon::parse(&layout).unwrap().with_hitpoints(hp));
            assert_eq!(key(40), key(35), "{encoding:?}: same bucket");
            assert_ne!(key(35), key(30), "{encoding:?}: different bucket");
            assert_eq!(key(30).health_bucket(), 2);
        }
    }

    #[test]
    fn target_symbol_reads_neighbours() {
        let world = Dungeon::parse(&["#r#", "p@m", "#X#"]).unwrap();
        for encoding in [Encoding::FullBoard, Encoding::LocalWindow { radius: 2 }] {
            let key = encoding.encode(&world);
            assert_eq!(encoding.target_symbol(&key, Action::Up, 3), Symbol::Reward);
            assert_eq!(encoding.target_symbol(&key, Action::Right, 3), Symbol::Monster);
            assert_eq!(encoding.target_symbol(&key, Action::Down, 3), Symbol::Exit);
            assert_eq!(encoding.target_symbol(&key, Action::Left, 3), Symbol::Potion);
        }
    }

    #[test]
    fn full_board_target_off_the_edge() {
        let world = Dungeon::parse(&["@.X"]).unwrap();
        let key = Encoding::FullBoard.encode(&world);
        assert_eq!(
            Encoding::FullBoard.target_symbol(&key, Action::Left, 3),
            Symbol::OutOfBounds
        );
        assert_eq!(
            Encoding::FullBoard.target_symbol(&key, Action::Down, 3),
            Symbol::OutOfBounds
        );
    }
}
