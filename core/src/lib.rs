//! # 2048 Rule Engine
//!
//! A pure Rust implementation of the 2048 rules: board state, the
//! move/merge/scoring pipeline, random tile spawning and game-over
//! detection. Randomness is injected, so every game is reproducible from a
//! seed and nothing here knows about rendering or input devices.
//!
//! ## Example
//!
//! ```rust
//! use game_2048_engine::{Direction, Game};
//!
//! let mut game = Game::new(42); // Create game with seed 42
//! let result = game.step(Direction::Left);
//! println!("Score: {}, Changed: {}", game.score(), result.changed);
//! ```
//!
//! The board operations are also available on their own:
//!
//! ```rust
//! use game_2048_engine::{Board, Direction};
//!
//! let board = Board::from_rows([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]);
//! let result = board.apply_move(Direction::Left);
//! assert_eq!(result.board.rows()[0], [4, 4, 0, 0]);
//! assert_eq!(result.score, 4);
//! assert!(result.changed);
//! ```

use std::fmt;
use std::str::FromStr;

use log::{debug, trace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub mod board;
pub mod error;

pub use board::{slide_and_merge_row, Board, MoveResult, Row, RowResult, Spawn, MAX_TILE, SIZE};
pub use error::{BoardError, ParseCommandError};

/// Number of tiles placed on a fresh board.
pub const INITIAL_TILES: usize = 2;

/// The four possible move directions in 2048.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// Convert a u8 to a Direction (0=Up, 1=Down, 2=Left, 3=Right).
    /// Returns None for invalid values.
    pub fn from_u8(value: u8) -> Option<Direction> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    /// Get all four directions.
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Command>()? {
            Command::Move(direction) => Ok(direction),
            _ => Err(ParseCommandError::new(s)),
        }
    }
}

/// A command from whatever drives the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Move(Direction),
    Restart,
    Quit,
}

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Accepts full names and the usual WASD / vi keys, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" | "w" | "k" => Command::Move(Direction::Up),
            "down" | "s" | "j" => Command::Move(Direction::Down),
            "left" | "a" | "h" => Command::Move(Direction::Left),
            "right" | "d" | "l" => Command::Move(Direction::Right),
            "restart" | "r" | "new" => Command::Restart,
            "quit" | "q" | "exit" => Command::Quit,
            _ => return Err(ParseCommandError::new(s)),
        };
        Ok(command)
    }
}

/// Whether the session still accepts moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    Playing,
    GameOver,
}

/// One turn as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// The move shifted or merged something, so a tile was spawned.
    pub changed: bool,
    /// Score added this turn; 0 for unchanged or ignored moves.
    pub reward: u32,
    /// The session is in [`GameState::GameOver`] after this turn.
    pub done: bool,
}

/// What [`Game::apply_command`] did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Moved(StepResult),
    /// A move arrived after the game ended and was dropped.
    Ignored,
    Restarted,
    Quit,
}

/// A 2048 session: board, score, randomness and state.
///
/// The RNG is an injected capability. [`Game::new`] seeds a [`SmallRng`];
/// [`Game::with_rng`] accepts any [`Rng`], which keeps spawning scriptable
/// in tests.
#[derive(Clone)]
pub struct Game<R = SmallRng> {
    board: Board,
    score: u32,
    rng: R,
    state: GameState,
}

impl Game<SmallRng> {
    /// Start a game whose spawns come from a `SmallRng` seeded with `seed`.
    ///
    /// Equal seeds and equal move sequences give identical games.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    /// Reseed the spawn stream and start over.
    pub fn reset(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
        self.restart();
    }
}

impl<R: Rng> Game<R> {
    /// Start a game drawing all randomness from `rng`.
    pub fn with_rng(rng: R) -> Self {
        let mut game = Game {
            board: Board::empty(),
            score: 0,
            rng,
            state: GameState::Playing,
        };
        game.restart();
        game
    }

    /// Resume play from an existing position.
    ///
    /// The state is derived from the board: a terminal board starts in
    /// [`GameState::GameOver`].
    pub fn from_board(board: Board, score: u32, rng: R) -> Self {
        let state = if board.is_terminal() {
            GameState::GameOver
        } else {
            GameState::Playing
        };
        Game {
            board,
            score,
            rng,
            state,
        }
    }

    /// Clear the board, zero the score and spawn the opening tiles.
    ///
    /// The RNG keeps its current stream.
    pub fn restart(&mut self) {
        self.board = Board::empty();
        self.score = 0;
        for _ in 0..INITIAL_TILES {
            self.board.spawn_tile(&mut self.rng);
        }
        self.state = GameState::Playing;
        debug!("new game: {:?}", self.board);
    }

    /// Preview a move without spawning or touching the session.
    pub fn apply_move(&self, direction: Direction) -> MoveResult {
        self.board.apply_move(direction)
    }

    /// Play one turn: move, score, spawn, then check for game over.
    ///
    /// An unchanged move spawns nothing and scores nothing. A changed move
    /// that leaves a terminal board moves the session to
    /// [`GameState::GameOver`]; from then on every call returns
    /// `done = true` without touching the board until [`Game::restart`].
    /// The score saturates at `u32::MAX`.
    pub fn step(&mut self, direction: Direction) -> StepResult {
        if self.state == GameState::GameOver {
            return StepResult {
                changed: false,
                reward: 0,
                done: true,
            };
        }

        let result = self.board.apply_move(direction);
        trace!(
            "move {direction}: changed={} reward={}",
            result.changed,
            result.score
        );

        if result.changed {
            self.board = result.board;
            self.score = self.score.saturating_add(result.score);
            if let Some(spawn) = self.board.spawn_tile(&mut self.rng) {
                trace!("spawned {} at ({}, {})", spawn.value, spawn.row, spawn.col);
            }
            if self.board.is_terminal() {
                self.state = GameState::GameOver;
                debug!(
                    "game over: score={} max_tile={}",
                    self.score,
                    self.board.max_tile()
                );
            }
        }

        StepResult {
            changed: result.changed,
            reward: if result.changed { result.score } else { 0 },
            done: self.state == GameState::GameOver,
        }
    }

    /// Feed one command from the input stream into the session.
    pub fn apply_command(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::Move(_) if self.is_over() => CommandOutcome::Ignored,
            Command::Move(direction) => CommandOutcome::Moved(self.step(direction)),
            Command::Restart => {
                self.restart();
                CommandOutcome::Restarted
            }
            Command::Quit => CommandOutcome::Quit,
        }
    }
}

impl<R> Game<R> {
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Get the current score.
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Check if the game is over (no legal moves available).
    pub fn is_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    /// Get the legal moves as a boolean array [Up, Down, Left, Right].
    pub fn legal_moves(&self) -> [bool; 4] {
        self.board.legal_moves()
    }

    /// Get the maximum tile value on the board.
    pub fn max_tile(&self) -> u32 {
        self.board.max_tile()
    }

    /// Get the number of empty cells on the board.
    pub fn empty_count(&self) -> usize {
        self.board.empty_count()
    }
}

impl<R> fmt::Debug for Game<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Game {{ score: {}, state: {:?} }}", self.score, self.state)?;
        for row in self.board.rows() {
            for &val in row {
                if val == 0 {
                    write!(f, "    .")?;
                } else {
                    write!(f, "{:5}", val)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<R> fmt::Display for Game<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score: {}", self.score)?;
        write!(f, "{}", self.board)
    }
}

// =============================================================================
// Tests
// =============================================================================
