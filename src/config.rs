use std::path::PathBuf;

/// Hyperparameters for the agent and its trainer.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub state_dim: usize,            // featurized state size (15)
    pub hidden: usize,               // hidden layer width
    pub act_dim: usize,              // number of relative moves (3)
    pub max_memory: usize,           // replay buffer capacity
    pub batch_size: usize,           // long-memory minibatch size
    pub lr: f32,                     // Adam learning rate
    pub gamma: f32,                  // discount factor
    pub explore_games: u32,          // epsilon = explore_games - n_game
    pub explore_range: u32,          // random draw is uniform in 0..=explore_range
    pub seed: Option<u64>,           // RNG seed (None = from entropy)
    pub model_dir: PathBuf,          // where `save` writes parameters
    pub model_file: String,          // file name inside model_dir
    pub resume_from: Option<PathBuf>, // load parameters at startup if set
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            state_dim: 15,
            hidden: 256,
            act_dim: 3,
            max_memory: 100_000,
            batch_size: 1000,
            lr: 0.001,
            gamma: 0.9,
            explore_games: 80,
            explore_range: 200,
            seed: None,
            model_dir: PathBuf::from("./model"),
            model_file: "model.json".to_string(),
            resume_from: None,
        }
    }
}
