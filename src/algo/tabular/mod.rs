pub mod q_agent;
pub mod q_table;
pub mod reward;

pub use q_agent::{ExplorationSchedule, Mode, QLearningAgent, QLearningConfig};
pub use q_table::QTable;
pub use reward::{SymbolReward, Transition, TransitionReward};
