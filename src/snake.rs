use serde::{Deserialize, Serialize};

/// Size of one grid tile in board units. Every coordinate is a multiple of it.
pub const BLOCK_SIZE: i32 = 20;

/// Number of relative moves: straight, right turn, left turn.
pub const ACTION_COUNT: usize = 3;

/// One-hot move in the snake's local frame: `[straight, right, left]`.
pub type Action = [u8; ACTION_COUNT];

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbouring cell one tile away in `dir`.
    pub fn step(&self, dir: Direction) -> Point {
        let (dx, dy) = dir.delta();
        Point { x: self.x + dx * BLOCK_SIZE, y: self.y + dy * BLOCK_SIZE }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Clockwise order on screen (y grows downwards).
    pub const CLOCKWISE: [Direction; 4] =
        [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// 90° counter-clockwise turn.
    pub fn left(&self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Down,
            Direction::Right => Direction::Up,
        }
    }

    /// 90° clockwise turn.
    pub fn right(&self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Right => Direction::Down,
        }
    }

    /// Unit offset (dx, dy) of one step in this direction.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Heading after applying a relative move.
    pub fn turn(&self, action: &Action) -> Direction {
        match action_index(action) {
            0 => *self,
            1 => self.right(),
            _ => self.left(),
        }
    }
}

/// Builds the one-hot move for `index` (0 straight, 1 right, 2 left).
pub fn one_hot(index: usize) -> Action {
    assert!(index < ACTION_COUNT, "move index {index} out of range");
    let mut action = [0u8; ACTION_COUNT];
    action[index] = 1;
    action
}

/// Index of the set entry of a one-hot move (first maximum).
pub fn action_index(action: &Action) -> usize {
    let mut best = 0;
    for i in 1..ACTION_COUNT {
        if action[i] > action[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_follow_clockwise_order() {
        for (i, dir) in Direction::CLOCKWISE.iter().enumerate() {
            assert_eq!(dir.right(), Direction::CLOCKWISE[(i + 1) % 4]);
            assert_eq!(dir.left(), Direction::CLOCKWISE[(i + 3) % 4]);
            assert_eq!(dir.right().left(), *dir);
        }
    }

    #[test]
    fn turn_maps_relative_moves() {
        assert_eq!(Direction::Right.turn(&[1, 0, 0]), Direction::Right);
        assert_eq!(Direction::Right.turn(&[0, 1, 0]), Direction::Down);
        assert_eq!(Direction::Right.turn(&[0, 0, 1]), Direction::Up);
        assert_eq!(Direction::Up.turn(&[0, 1, 0]), Direction::Right);
    }

    #[test]
    fn step_moves_one_tile() {
        let p = Point::new(100, 100);
        assert_eq!(p.step(Direction::Left), Point::new(80, 100));
        assert_eq!(p.step(Direction::Down), Point::new(100, 120));
        assert_eq!(p.distance(&Point::new(130, 140)), 50.0);
    }

    #[test]
    fn one_hot_round_trips_index() {
        for i in 0..ACTION_COUNT {
            let a = one_hot(i);
            assert_eq!(a.iter().filter(|&&v| v == 1).count(), 1);
            assert_eq!(action_index(&a), i);
        }
    }
}
