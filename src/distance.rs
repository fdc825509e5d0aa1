use std::collections::VecDeque;

use strum::VariantArray;

use crate::{
    env::{Action, GridWorld, Pos},
    error::{Error, Result},
};

/// Raw value stored for impassable tiles
pub const WALL: i32 = -1;

/// Raw value stored for passable tiles that have no path to the exit
pub const UNREACHABLE: i32 = i32::MAX;

/// Typed reading of a single cell of a [`DistanceField`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    Wall,
    Unreachable,
    Steps(u32),
}

impl Distance {
    /// Number of steps to the exit, with walls and unreachable tiles mapped to `far`
    pub fn steps_or(self, far: f64) -> f64 {
        match self {
            Distance::Steps(d) => d as f64,
            Distance::Wall | Distance::Unreachable => far,
        }
    }
}

/// Breadth-first distance transform from the exit over passable tiles
///
/// Walls never move, so the field is computed once per map from its initial layout and
/// then shared by every decision made on that map.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceField {
    width: usize,
    height: usize,
    exit: Pos,
    cells: Vec<i32>,
}

impl DistanceField {
    /// Compute the field from the first tile (in row-major order) matched by `is_exit`
    ///
    /// **Returns** [`Error::ExitNotFound`] if no tile matches
    pub fn compute<W, F>(world: &W, is_exit: F) -> Result<Self>
    where
        W: GridWorld,
        F: Fn(&W, Pos) -> bool,
    {
        let (width, height) = (world.width(), world.height());
        let exit = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| (x, y)))
            .find(|&pos| is_exit(world, pos))
            .ok_or(Error::ExitNotFound { width, height })?;

        let mut field = Self {
            width,
            height,
            exit,
            cells: vec![UNREACHABLE; width * height],
        };
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                if world.is_wall((x, y)) {
                    field.cells[y as usize * width + x as usize] = WALL;
                }
            }
        }

        let mut queue = VecDeque::from([exit]);
        field.set(exit, 0);
        while let Some(pos) = queue.pop_front() {
            let d = field.get(pos);
            for action in Action::VARIANTS {
                let next = action.apply(pos);
                if field.get(next) == UNREACHABLE {
                    field.set(next, d + 1);
                    queue.push_back(next);
                }
            }
        }

        log::debug!(
            "distance field {}x{} computed from exit at {:?}",
            width,
            height,
            exit
        );
        Ok(field)
    }

    /// Compute the field from the level exit, skipping the entrance
    pub fn to_exit<W: GridWorld>(world: &W) -> Result<Self> {
        Self::compute(world, |w, pos| w.is_exit(pos))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Position the field was seeded from
    pub fn exit(&self) -> Pos {
        self.exit
    }

    /// Raw cell value: [`WALL`], [`UNREACHABLE`], or the number of steps
    ///
    /// Positions outside the map read as [`WALL`].
    pub fn get(&self, pos: Pos) -> i32 {
        self.index(pos).map_or(WALL, |i| self.cells[i])
    }

    pub fn distance(&self, pos: Pos) -> Distance {
        match self.get(pos) {
            WALL => Distance::Wall,
            UNREACHABLE => Distance::Unreachable,
            d => Distance::Steps(d as u32),
        }
    }

    fn set(&mut self, pos: Pos, value: i32) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = value;
        }
    }

    fn index(&self, (x, y): Pos) -> Option<usize> {
        (x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height)
            .then(|| y as usize * self.width + x as usize)
    }
}
