use log::info;

use crate::agent::Agent;
use crate::env::Environment;
use crate::error::Result;
use crate::plot::{ScoreSeries, ScoreSink};
use crate::replay_buffer::Transition;

/// Where training stood when the loop returned.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    pub games: u32,
    pub record: u32,
    pub mean_score: f32,
}

/// Plays and learns until `max_games` episodes are finished (forever when `None`).
///
/// Every step gets a short-memory update and goes into replay memory. On the
/// terminal step the board is reset, the game counter advances, one
/// long-memory update runs and a new record saves the model.
pub fn train<E: Environment, S: ScoreSink>(
    agent: &mut Agent,
    env: &mut E,
    sink: &mut S,
    max_games: Option<u32>,
) -> Result<TrainSummary> {
    let mut series = ScoreSeries::default();
    let mut record = 0;

    loop {
        let state_old = agent.get_state(&*env);
        let final_move = agent.get_action(&state_old);
        let out = env.step(&final_move);
        let state_new = agent.get_state(&*env);

        let tr = Transition {
            state: state_old,
            action: final_move,
            reward: out.reward,
            next_state: state_new,
            done: out.done,
        };
        agent.train_short_memory(&tr);
        agent.remember(tr);

        if !out.done {
            continue;
        }

        env.reset();
        agent.advance_games(1);
        agent.train_long_memory();

        if out.score > record {
            record = out.score;
            agent.save_model()?;
        }
        let mean_score = series.push(out.score);
        info!(
            "Game {} Score {} Record {} Mean {:.2} Loss {:.4}",
            agent.n_game(),
            out.score,
            record,
            mean_score,
            agent.trainer().last_loss()
        );
        sink.record(&series)?;

        if max_games.is_some_and(|m| agent.n_game() >= m) {
            return Ok(TrainSummary { games: agent.n_game(), record, mean_score });
        }
    }
}
