//! Q-learning agent for Snake: a small value network trained with one-step
//! TD updates and experience replay.

pub mod agent;
pub mod config;
pub mod env;
pub mod error;
pub mod game;
pub mod network;
pub mod plot;
pub mod replay_buffer;
pub mod snake;
pub mod train;
pub mod trainer;
pub mod utils;

pub use agent::{Agent, State, get_state};
pub use config::AgentConfig;
pub use env::{Environment, StepOutcome};
pub use error::{Error, Result};
pub use game::SnakeGame;
pub use network::QNet;
pub use replay_buffer::{ReplayBuffer, Transition};
pub use train::{TrainSummary, train};
pub use trainer::QTrainer;
