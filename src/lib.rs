/// Decision engines: Monte-Carlo tree search and tabular Q-learning
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Shortest walking distances to the exit
pub mod distance;

/// Discrete state keys
pub mod encoding;

/// Grid world contract
pub mod env;

/// Playing a single episode
pub mod episode;

pub mod error;

/// Exploration policies
pub mod exploration;

/// Testing environments
#[cfg(any(test, feature = "gym"))]
pub mod gym;

mod util;

pub use error::{Error, Result};
