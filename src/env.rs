//! Read-only view of a Snake game plus the two calls that drive it.
//!
//! The agent featurizes through this trait only, so any board that can answer
//! these questions can be trained on.

use crate::snake::{Action, Direction, Point};

/// Result of one environment tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    pub done: bool,
    pub score: u32,
}

pub trait Environment {
    /// Snake segments, head first. At least two segments after `reset`.
    fn snake(&self) -> &[Point];

    fn direction(&self) -> Direction;

    fn head(&self) -> Point {
        self.snake()[0]
    }

    fn food(&self) -> Point;

    /// True if a head placed at `point` would end the episode (wall or body).
    fn is_collision(&self, point: Point) -> bool;

    /// Advances one tick with a one-hot relative move.
    fn step(&mut self, action: &Action) -> StepOutcome;

    /// Starts a new episode.
    fn reset(&mut self);
}
