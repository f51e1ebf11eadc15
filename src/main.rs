use anyhow::{Context, Result};
use log::info;

use snake_ql::plot::CsvSink;
use snake_ql::{Agent, AgentConfig, SnakeGame, train};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = AgentConfig::default();
    info!(
        "training: hidden={} memory={} batch={} lr={} gamma={}",
        cfg.hidden, cfg.max_memory, cfg.batch_size, cfg.lr, cfg.gamma
    );

    let mut agent = Agent::new(cfg).context("failed to build agent")?;
    let mut game = SnakeGame::new(None);
    let mut sink = CsvSink::create("scores.csv").context("failed to open scores.csv")?;

    // Runs until the process is killed.
    train(&mut agent, &mut game, &mut sink, None)?;
    Ok(())
}
