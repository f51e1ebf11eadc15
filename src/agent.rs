//! Agent: featurization, epsilon-greedy moves, replay memory, short/long training.

use std::path::PathBuf;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::AgentConfig;
use crate::env::Environment;
use crate::error::Result;
use crate::network::QNet;
use crate::replay_buffer::{ReplayBuffer, Transition};
use crate::snake::{ACTION_COUNT, Action, Direction, one_hot};
use crate::trainer::QTrainer;
use crate::utils::argmax;

pub const STATE_LEN: usize = 15;

/// Featurized board: every entry is 0 or 1.
pub type State = [u8; STATE_LEN];

/// Network input for a state.
pub fn as_input(state: &State) -> [f32; STATE_LEN] {
    state.map(f32::from)
}

/// Builds the 15 flags the network sees:
///
/// * 0..3   danger straight / right / left
/// * 3..7   heading left / right / up / down
/// * 7..11  tail-distance flags for the left / right / up / down neighbours
/// * 11..15 food left / right / above / below the head
///
/// Panics if the snake has fewer than two segments.
pub fn get_state<E: Environment + ?Sized>(env: &E) -> State {
    let snake = env.snake();
    assert!(snake.len() >= 2, "snake must have at least two segments, got {}", snake.len());

    let head = snake[0];
    let dir = env.direction();
    let danger = |d: Direction| env.is_collision(head.step(d));

    // NOTE: the reference distance is measured to the tail while the neighbour
    // distances go to the segment before it. Looks like a bug; kept as-is.
    let tail = snake[snake.len() - 1];
    let tail_prev = snake[snake.len() - 2];
    let distance = head.distance(&tail);
    let farther = |d: Direction| distance > head.step(d).distance(&tail_prev);

    let food = env.food();
    let food_head = env.head();

    [
        danger(dir),
        danger(dir.right()),
        danger(dir.left()),
        dir == Direction::Left,
        dir == Direction::Right,
        dir == Direction::Up,
        dir == Direction::Down,
        farther(Direction::Left),
        farther(Direction::Right),
        farther(Direction::Up),
        farther(Direction::Down),
        food.x < food_head.x,
        food.x > food_head.x,
        food.y < food_head.y,
        food.y > food_head.y,
    ]
    .map(u8::from)
}

pub struct Agent {
    cfg: AgentConfig,
    n_game: u32,      // finished episodes
    epsilon: i64,     // explore_games - n_game, refreshed on every move
    model: QNet,
    trainer: QTrainer,
    memory: ReplayBuffer,
    rng: StdRng,      // exploration + minibatch sampling
}

impl Agent {
    /// Builds the network, trainer and replay memory; loads saved
    /// parameters when `cfg.resume_from` is set.
    pub fn new(cfg: AgentConfig) -> Result<Self> {
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut model = QNet::new(cfg.state_dim, cfg.hidden, cfg.act_dim, &mut rng);
        if let Some(path) = &cfg.resume_from {
            let loaded = QNet::load(path)?;
            model.check_compatible(&loaded)?;
            model = loaded;
            info!("loaded model from {}", path.display());
        }

        Ok(Self {
            trainer: QTrainer::new(cfg.lr, cfg.gamma),
            memory: ReplayBuffer::new(cfg.max_memory),
            epsilon: 0,
            n_game: 0,
            model,
            rng,
            cfg,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.cfg
    }

    pub fn n_game(&self) -> u32 {
        self.n_game
    }

    /// Counts finished episodes; the counter never goes down.
    pub fn advance_games(&mut self, by: u32) {
        self.n_game += by;
    }

    /// Epsilon used by the most recent move.
    pub fn epsilon(&self) -> i64 {
        self.epsilon
    }

    pub fn model(&self) -> &QNet {
        &self.model
    }

    pub fn trainer(&self) -> &QTrainer {
        &self.trainer
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn get_state<E: Environment + ?Sized>(&self, env: &E) -> State {
        get_state(env)
    }

    /// Exploration draw: a random move index, or `None` to act greedily.
    ///
    /// `epsilon = explore_games - n_game`; a value `r` uniform in
    /// `0..=explore_range` explores when `r < epsilon`.
    pub fn random_move(&mut self) -> Option<usize> {
        self.epsilon = i64::from(self.cfg.explore_games) - i64::from(self.n_game);
        let r = i64::from(self.rng.gen_range(0..=self.cfg.explore_range));
        if r < self.epsilon {
            Some(self.rng.gen_range(0..ACTION_COUNT))
        } else {
            None
        }
    }

    /// Greedy move index for `state`.
    pub fn best_move(&self, state: &State) -> usize {
        argmax(&self.model.forward(&as_input(state)))
    }

    /// Epsilon-greedy one-hot move.
    pub fn get_action(&mut self, state: &State) -> Action {
        let idx = match self.random_move() {
            Some(idx) => idx,
            None => self.best_move(state),
        };
        one_hot(idx)
    }

    pub fn remember(&mut self, tr: Transition) {
        self.memory.push(tr);
    }

    pub fn train_short_memory(&mut self, tr: &Transition) {
        self.trainer.train_single(&mut self.model, tr);
    }

    /// Minibatch for the long-memory update: `batch_size` distinct transitions
    /// when memory holds more, otherwise all of it in insertion order.
    pub fn long_memory_batch(&mut self) -> Vec<Transition> {
        if self.memory.len() > self.cfg.batch_size {
            self.memory.sample(&mut self.rng, self.cfg.batch_size)
        } else {
            self.memory.iter().copied().collect()
        }
    }

    pub fn train_long_memory(&mut self) {
        let batch = self.long_memory_batch();
        self.trainer.train_step(&mut self.model, &batch);
    }

    /// Writes the network to `model_dir/model_file`.
    pub fn save_model(&self) -> Result<PathBuf> {
        self.model.save_to(&self.cfg.model_dir, &self.cfg.model_file)
    }
}
