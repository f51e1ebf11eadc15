//! Headless Snake board used by the training binary.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::env::{Environment, StepOutcome};
use crate::snake::{Action, BLOCK_SIZE, Direction, Point};

pub const BOARD_WIDTH: i32 = 640;
pub const BOARD_HEIGHT: i32 = 480;
const INIT_LENGTH: usize = 3;

pub const REWARD_FOOD: f32 = 10.0;
pub const REWARD_DEATH: f32 = -10.0;

pub struct SnakeGame {
    width: i32,
    height: i32,
    body: Vec<Point>, // body[0] - head
    direction: Direction,
    food: Point,
    score: u32,
    frame_iteration: usize,
    rng: StdRng,
}

impl SnakeGame {
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_size(BOARD_WIDTH, BOARD_HEIGHT, seed)
    }

    pub fn with_size(width: i32, height: i32, seed: Option<u64>) -> Self {
        assert!(
            width % BLOCK_SIZE == 0 && height % BLOCK_SIZE == 0,
            "board must be a whole number of tiles"
        );
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut game = Self {
            width,
            height,
            body: Vec::new(),
            direction: Direction::Right,
            food: Point::new(0, 0),
            score: 0,
            frame_iteration: 0,
            rng,
        };
        game.reset();
        game
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Replaces the snake and heading. Test and replay helper.
    pub fn set_snake(&mut self, body: &[Point], direction: Direction) {
        assert!(body.len() >= 2, "snake needs at least two segments");
        self.body = body.to_vec();
        self.direction = direction;
    }

    pub fn set_food(&mut self, food: Point) {
        self.food = food;
    }

    fn is_inside(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x <= self.width - BLOCK_SIZE && p.y <= self.height - BLOCK_SIZE
    }

    fn place_food(&mut self) {
        let cols = self.width / BLOCK_SIZE;
        let rows = self.height / BLOCK_SIZE;
        loop {
            let pos = Point::new(
                self.rng.gen_range(0..cols) * BLOCK_SIZE,
                self.rng.gen_range(0..rows) * BLOCK_SIZE,
            );
            if !self.body.contains(&pos) {
                self.food = pos;
                break;
            }
        }
    }
}

impl Environment for SnakeGame {
    fn snake(&self) -> &[Point] {
        &self.body
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn food(&self) -> Point {
        self.food
    }

    fn is_collision(&self, point: Point) -> bool {
        !self.is_inside(point) || self.body[1..].contains(&point)
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        self.frame_iteration += 1;

        self.direction = self.direction.turn(action);
        let new_head = self.head().step(self.direction);
        self.body.insert(0, new_head);

        if self.is_collision(new_head) || self.frame_iteration > 100 * self.body.len() {
            return StepOutcome { reward: REWARD_DEATH, done: true, score: self.score };
        }

        let reward = if new_head == self.food {
            self.score += 1;
            self.place_food();
            REWARD_FOOD
        } else {
            self.body.pop();
            0.0
        };
        StepOutcome { reward, done: false, score: self.score }
    }

    fn reset(&mut self) {
        self.direction = Direction::Right;
        let head = Point::new(self.width / 2, self.height / 2);
        let tail_dir = self.direction.opposite();
        self.body = (0..INIT_LENGTH)
            .scan(head, |p, i| {
                if i > 0 {
                    *p = p.step(tail_dir);
                }
                Some(*p)
            })
            .collect();
        self.score = 0;
        self.frame_iteration = 0;
        self.place_food();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRAIGHT: Action = [1, 0, 0];

    #[test]
    fn reset_builds_three_segments_heading_right() {
        let game = SnakeGame::new(Some(1));
        assert_eq!(
            game.snake(),
            &[Point::new(320, 240), Point::new(300, 240), Point::new(280, 240)]
        );
        assert_eq!(game.direction(), Direction::Right);
        assert!(!game.snake().contains(&game.food()));
        assert_eq!(game.food().x % BLOCK_SIZE, 0);
        assert_eq!(game.food().y % BLOCK_SIZE, 0);
    }

    #[test]
    fn running_into_the_wall_ends_episode() {
        let mut game = SnakeGame::new(Some(2));
        game.set_food(Point::new(0, 0));
        let mut out = game.step(&STRAIGHT);
        let mut steps = 1;
        while !out.done {
            out = game.step(&STRAIGHT);
            steps += 1;
        }
        // 320 -> 620 is 15 moves, the 16th leaves the board.
        assert_eq!(steps, 16);
        assert_eq!(out.reward, REWARD_DEATH);
        assert_eq!(out.score, 0);
    }

    #[test]
    fn eating_food_grows_and_scores() {
        let mut game = SnakeGame::new(Some(3));
        game.set_food(Point::new(340, 240));
        let out = game.step(&STRAIGHT);
        assert_eq!(out, StepOutcome { reward: REWARD_FOOD, done: false, score: 1 });
        assert_eq!(game.snake().len(), 4);
        assert_eq!(game.head(), Point::new(340, 240));
        assert_ne!(game.food(), Point::new(340, 240));
    }

    #[test]
    fn plain_move_keeps_length() {
        let mut game = SnakeGame::new(Some(4));
        game.set_food(Point::new(0, 0));
        let out = game.step(&[0, 1, 0]);
        assert_eq!(out.reward, 0.0);
        assert!(!out.done);
        assert_eq!(game.direction(), Direction::Down);
        assert_eq!(game.snake(), &[Point::new(320, 260), Point::new(320, 240), Point::new(300, 240)]);
    }

    #[test]
    fn self_collision_ends_episode() {
        let mut game = SnakeGame::new(Some(5));
        game.set_food(Point::new(0, 0));
        game.set_snake(
            &[
                Point::new(100, 100),
                Point::new(100, 120),
                Point::new(120, 120),
                Point::new(140, 120),
                Point::new(140, 100),
                Point::new(120, 100),
            ],
            Direction::Up,
        );
        // right turn from Up heads into (120, 100)
        let out = game.step(&[0, 1, 0]);
        assert!(out.done);
        assert_eq!(out.reward, REWARD_DEATH);
    }

    #[test]
    fn collision_predicate_checks_walls_and_body() {
        let game = SnakeGame::new(Some(6));
        assert!(game.is_collision(Point::new(-20, 0)));
        assert!(game.is_collision(Point::new(640, 0)));
        assert!(game.is_collision(Point::new(0, 480)));
        assert!(!game.is_collision(Point::new(620, 460)));
        assert!(game.is_collision(Point::new(300, 240)));
        assert!(!game.is_collision(Point::new(320, 240)));
    }

    #[test]
    fn idle_snake_times_out() {
        let mut game = SnakeGame::new(Some(7));
        game.set_food(Point::new(0, 0));
        game.set_snake(
            &[Point::new(100, 100), Point::new(80, 100)],
            Direction::Right,
        );
        // circle a 2x2 block forever: right turns only
        let mut out = game.step(&[0, 1, 0]);
        let mut steps = 1;
        while !out.done {
            out = game.step(&[0, 1, 0]);
            steps += 1;
        }
        assert!(steps > 100 * 2, "timed out after {steps} steps");
        assert_eq!(out.reward, REWARD_DEATH);
    }
}
