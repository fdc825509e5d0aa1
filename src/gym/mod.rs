pub mod dungeon;

pub use dungeon::Dungeon;
