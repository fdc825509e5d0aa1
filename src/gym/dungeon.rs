use crate::{
    env::{Action, GridWorld, Pos, Tile},
    error::{Error, Result},
};

pub const START_HITPOINTS: i32 = 40;
pub const MONSTER_DAMAGE: i32 = 10;
pub const POTION_HEAL: i32 = 10;
pub const TREASURE_SCORE: i32 = 10;
pub const MONSTER_SCORE: i32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Terrain {
    Floor,
    Wall,
    Entrance,
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Entity {
    Monster,
    Reward,
    Potion,
}

/// A small dungeon crawl with fixed combat and pickup rules
///
/// Built from an ASCII layout, one string per row:
///
/// | char | meaning |
/// |------|---------|
/// | `#`  | wall |
/// | `.`  | floor |
/// | `E`  | entrance, where the hero starts unless `@` is given |
/// | `X`  | exit |
/// | `@`  | hero start on plain floor |
/// | `m`  | monster, costs [`MONSTER_DAMAGE`] hitpoints to kill |
/// | `r`  | treasure |
/// | `p`  | potion, heals [`POTION_HEAL`] up to [`START_HITPOINTS`] |
///
/// The game ends when the hero steps onto the exit or runs out of hitpoints.
#[derive(Clone, Debug)]
pub struct Dungeon {
    width: usize,
    height: usize,
    terrain: Vec<Terrain>,
    entities: Vec<Option<Entity>>,
    hero: Pos,
    hitpoints: i32,
    score: i32,
    monsters_killed: usize,
    rewards_collected: usize,
    potions_used: usize,
    escaped: bool,
}

impl Dungeon {
    pub fn parse(rows: &[&str]) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidLayout { reason };

        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 {
            return Err(invalid("layout is empty".into()));
        }

        let mut terrain = Vec::with_capacity(width * height);
        let mut entities = Vec::with_capacity(width * height);
        let mut hero = None;
        let mut entrance = None;

        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(invalid(format!("row {y} is not {width} tiles wide")));
            }
            for (x, c) in row.chars().enumerate() {
                let pos = (x as i32, y as i32);
                let (t, e) = match c {
                    '#' => (Terrain::Wall, None),
                    '.' => (Terrain::Floor, None),
                    'E' => {
                        entrance = Some(pos);
                        (Terrain::Entrance, None)
                    }
                    'X' => (Terrain::Exit, None),
                    '@' => {
                        if hero.replace(pos).is_some() {
                            return Err(invalid("more than one hero".into()));
                        }
                        (Terrain::Floor, None)
                    }
                    'm' => (Terrain::Floor, Some(Entity::Monster)),
                    'r' => (Terrain::Floor, Some(Entity::Reward)),
                    'p' => (Terrain::Floor, Some(Entity::Potion)),
                    _ => return Err(invalid(format!("unknown tile '{c}' at {pos:?}"))),
                };
                terrain.push(t);
                entities.push(e);
            }
        }

        let hero = hero
            .or(entrance)
            .ok_or_else(|| invalid("no hero or entrance".into()))?;

        Ok(Self {
            width,
            height,
            terrain,
            entities,
            hero,
            hitpoints: START_HITPOINTS,
            score: 0,
            monsters_killed: 0,
            rewards_collected: 0,
            potions_used: 0,
            escaped: false,
        })
    }

    /// Replace the hero's hitpoints, mostly useful to set up health buckets
    pub fn with_hitpoints(mut self, hitpoints: i32) -> Self {
        self.hitpoints = hitpoints;
        self
    }

    /// Determine if the hero left through the exit
    pub fn escaped(&self) -> bool {
        self.escaped
    }

    fn index(&self, (x, y): Pos) -> usize {
        y as usize * self.width + x as usize
    }
}

impl GridWorld for Dungeon {
    fn step(&mut self, action: Action) {
        if self.is_terminal() {
            return;
        }

        let target = self.next_position(action);
        if !self.is_legal_move(target) {
            return;
        }

        let i = self.index(target);
        match self.entities[i].take() {
            Some(Entity::Monster) => {
                self.hitpoints -= MONSTER_DAMAGE;
                self.monsters_killed += 1;
                self.score += MONSTER_SCORE;
                if self.hitpoints <= 0 {
                    return;
                }
            }
            Some(Entity::Reward) => {
                self.rewards_collected += 1;
                self.score += TREASURE_SCORE;
            }
            Some(Entity::Potion) => {
                self.potions_used += 1;
                self.hitpoints = (self.hitpoints + POTION_HEAL).min(START_HITPOINTS);
            }
            None => {}
        }

        self.hero = target;
        self.escaped = self.terrain[i] == Terrain::Exit;
    }

    fn is_terminal(&self) -> bool {
        self.escaped || self.hitpoints <= 0
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn tile(&self, pos: Pos) -> Tile {
        if pos == self.hero {
            return Tile::Hero;
        }
        let i = self.index(pos);
        match (self.entities[i], self.terrain[i]) {
            (Some(Entity::Monster), _) => Tile::Monster,
            (Some(Entity::Reward), _) => Tile::Reward,
            (Some(Entity::Potion), _) => Tile::Potion,
            (None, Terrain::Floor) => Tile::Empty,
            (None, Terrain::Wall) => Tile::Wall,
            (None, Terrain::Entrance) => Tile::Entrance,
            (None, Terrain::Exit) => Tile::Exit,
        }
    }

    fn hero_position(&self) -> Pos {
        self.hero
    }

    fn hitpoints(&self) -> i32 {
        self.hitpoints
    }

    fn score(&self) -> i32 {
        self.score
    }

    fn is_legal_move(&self, pos: Pos) -> bool {
        self.within_bounds(pos) && self.terrain[self.index(pos)] != Terrain::Wall
    }

    fn monsters_killed(&self) -> usize {
        self.monsters_killed
    }

    fn rewards_collected(&self) -> usize {
        self.rewards_collected
    }

    fn potions_used(&self) -> usize {
        self.potions_used
    }

    fn is_wall(&self, pos: Pos) -> bool {
        self.terrain[self.index(pos)] == Terrain::Wall
    }

    fn is_entrance(&self, pos: Pos) -> bool {
        self.terrain[self.index(pos)] == Terrain::Entrance
    }

    fn is_exit(&self, pos: Pos) -> bool {
        self.terrain[self.index(pos)] == Terrain::Exit
    }
}
