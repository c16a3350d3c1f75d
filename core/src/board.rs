//! The 4x4 board and the move pipeline.
//!
//! Every direction is reduced to a single primitive, [`Board::slide_and_merge_left`],
//! by reorienting the grid first and restoring it afterwards:
//!
//! | Direction | Before             | After              |
//! |-----------|--------------------|--------------------|
//! | Left      | -                  | -                  |
//! | Right     | reverse rows       | reverse rows       |
//! | Up        | transpose          | transpose          |
//! | Down      | transpose, reverse | reverse, transpose |

use std::fmt;

use rand::Rng;

use crate::error::BoardError;
use crate::Direction;

/// Side length of the board.
pub const SIZE: usize = 4;

/// Probability that a spawned tile is a 4 rather than a 2.
pub const SPAWN_FOUR_PROBABILITY: f64 = 0.1;

/// Largest tile a 4x4 game can produce. Boards holding anything larger are
/// rejected, which keeps every merge within `u32`.
pub const MAX_TILE: u32 = 1 << 17;

/// One row (or, after transposition, one column) of the board.
pub type Row = [u32; SIZE];

/// Outcome of sliding a single row toward index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowResult {
    pub row: Row,
    /// Sum of the tiles created by merges.
    pub score: u32,
    pub changed: bool,
}

/// Outcome of applying a move to a whole board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    /// The board after the move. Equal to the input when `changed` is false.
    pub board: Board,
    /// Points earned from merges in this move.
    pub score: u32,
    /// Whether any tile moved or merged.
    pub changed: bool,
}

/// A tile placed by [`Board::spawn_tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    pub row: usize,
    pub col: usize,
    pub value: u32,
}

/// The 2048 grid.
///
/// Cells are stored row-major. Empty cells are 0; tiles hold their value
/// (2, 4, 8, ...). The type is `Copy`, so every move yields a fresh snapshot
/// and callers never share a mutable grid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [Row; SIZE],
}

fn is_valid_tile(value: u32) -> bool {
    value == 0 || ((2..=MAX_TILE).contains(&value) && value.is_power_of_two())
}

impl Board {
    /// An empty board.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a board from rows, checking every cell.
    pub fn try_from_rows(rows: [Row; SIZE]) -> Result<Self, BoardError> {
        for (row, cells) in rows.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if !is_valid_tile(value) {
                    return Err(BoardError::InvalidTile { row, col, value });
                }
            }
        }
        Ok(Self { cells: rows })
    }

    /// Build a board from rows.
    ///
    /// # Panics
    ///
    /// Panics if a cell is neither 0 nor a power of two in `2..=MAX_TILE`. Use
    /// [`Board::try_from_rows`] for untrusted input.
    pub fn from_rows(rows: [Row; SIZE]) -> Self {
        match Self::try_from_rows(rows) {
            Ok(board) => board,
            Err(err) => panic!("board invariant violated: {err}"),
        }
    }

    /// The rows of the board, top to bottom.
    pub fn rows(&self) -> &[Row; SIZE] {
        &self.cells
    }

    /// Value at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= SIZE`.
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row][col]
    }

    /// All cell values in row-major order.
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.iter().flat_map(|row| row.iter().copied())
    }

    /// Coordinates of every empty cell in row-major order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut empty = Vec::with_capacity(SIZE * SIZE);
        for (r, row) in self.cells.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                if value == 0 {
                    empty.push((r, c));
                }
            }
        }
        empty
    }

    pub fn empty_count(&self) -> usize {
        self.values().filter(|&v| v == 0).count()
    }

    pub fn max_tile(&self) -> u32 {
        self.values().max().unwrap_or(0)
    }

    /// Sum of all tile values.
    pub fn sum(&self) -> u64 {
        self.values().map(u64::from).sum()
    }

    // -------------------------------------------------------------------------
    // Geometric transforms
    // -------------------------------------------------------------------------

    /// Mirror the board across its main diagonal.
    pub fn transpose(&self) -> Self {
        let mut out = [[0; SIZE]; SIZE];
        for (r, row) in self.cells.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                out[c][r] = value;
            }
        }
        Self { cells: out }
    }

    /// Reverse every row left to right.
    pub fn reverse_rows(&self) -> Self {
        let mut out = self.cells;
        for row in out.iter_mut() {
            row.reverse();
        }
        Self { cells: out }
    }

    // -------------------------------------------------------------------------
    // Moves
    // -------------------------------------------------------------------------

    /// Compact and merge every row toward the left edge.
    pub fn slide_and_merge_left(&self) -> MoveResult {
        let mut cells = self.cells;
        let mut score = 0;
        let mut changed = false;

        for row in cells.iter_mut() {
            let result = slide_and_merge_row(*row);
            *row = result.row;
            score += result.score;
            changed |= result.changed;
        }

        MoveResult {
            board: Self { cells },
            score,
            changed,
        }
    }

    /// Apply a move in `direction` without spawning.
    pub fn apply_move(&self, direction: Direction) -> MoveResult {
        let oriented = match direction {
            Direction::Left => *self,
            Direction::Right => self.reverse_rows(),
            Direction::Up => self.transpose(),
            Direction::Down => self.transpose().reverse_rows(),
        };

        let mut result = oriented.slide_and_merge_left();

        result.board = match direction {
            Direction::Left => result.board,
            Direction::Right => result.board.reverse_rows(),
            Direction::Up => result.board.transpose(),
            Direction::Down => result.board.reverse_rows().transpose(),
        };
        result
    }

    /// Whether a move in `direction` would change the board.
    pub fn can_move(&self, direction: Direction) -> bool {
        self.apply_move(direction).changed
    }

    /// Legal moves as a boolean array indexed like [`Direction::all`]:
    /// `[Up, Down, Left, Right]`.
    pub fn legal_moves(&self) -> [bool; 4] {
        Direction::all().map(|direction| self.can_move(direction))
    }

    // -------------------------------------------------------------------------
    // Spawning and terminal detection
    // -------------------------------------------------------------------------

    /// Place a 2 (90%) or a 4 (10%) in a uniformly chosen empty cell.
    ///
    /// Draws the cell first and the value second. Returns `None` and leaves
    /// the board untouched when there is no empty cell.
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Spawn> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return None;
        }

        let (row, col) = empty[rng.gen_range(0..empty.len())];
        let value = if rng.gen_bool(SPAWN_FOUR_PROBABILITY) {
            4
        } else {
            2
        };
        self.cells[row][col] = value;
        Some(Spawn { row, col, value })
    }

    /// True when the board is full and no two neighbours are equal, so no
    /// direction can change it.
    ///
    /// Checking the right and lower neighbour of every cell covers every
    /// adjacent pair exactly once.
    pub fn is_terminal(&self) -> bool {
        for r in 0..SIZE {
            for c in 0..SIZE {
                let value = self.cells[r][c];
                if value == 0 {
                    return false;
                }
                if c + 1 < SIZE && value == self.cells[r][c + 1] {
                    return false;
                }
                if r + 1 < SIZE && value == self.cells[r + 1][c] {
                    return false;
                }
            }
        }
        true
    }
}

/// Compress, merge and re-pad one row toward index 0.
///
/// 1. Compress: drop empty cells, keeping the order of tiles.
/// 2. Merge: scan left to right; an equal adjacent pair becomes one tile of
///    double value and the scan resumes after it, so a merged tile never
///    merges twice in the same move.
/// 3. Re-pad with empty cells on the right.
pub fn slide_and_merge_row(row: Row) -> RowResult {
    let mut tiles = [0; SIZE];
    let mut len = 0;
    for value in row.into_iter().filter(|&v| v != 0) {
        tiles[len] = value;
        len += 1;
    }

    let mut out = [0; SIZE];
    let mut score = 0;
    let mut merged = false;
    let mut write = 0;
    let mut read = 0;
    while read < len {
        if read + 1 < len && tiles[read] == tiles[read + 1] {
            let value = tiles[read] * 2;
            out[write] = value;
            score += value;
            merged = true;
            read += 2;
        } else {
            out[write] = tiles[read];
            read += 1;
        }
        write += 1;
    }

    RowResult {
        row: out,
        score,
        changed: merged || out != row,
    }
}

impl TryFrom<[Row; SIZE]> for Board {
    type Error = BoardError;

    fn try_from(rows: [Row; SIZE]) -> Result<Self, Self::Error> {
        Self::try_from_rows(rows)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.cells.iter()).finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+------+------+------+------+")?;
        for row in &self.cells {
            write!(f, "|")?;
            for &value in row {
                if value == 0 {
                    write!(f, "      |")?;
                } else {
                    write!(f, "{:^6}|", value)?;
                }
            }
            writeln!(f)?;
            writeln!(f, "+------+------+------+------+")?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const CHECKERBOARD: [Row; SIZE] = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];

    fn single_row(row: Row) -> Board {
        Board::from_rows([row, [0; SIZE], [0; SIZE], [0; SIZE]])
    }

    // -------------------------------------------------------------------------
    // Row primitive
    // -------------------------------------------------------------------------

    #[test]
    fn test_row_merge_then_shift() {
        let result = slide_and_merge_row([2, 2, 4, 0]);
        assert_eq!(result.row, [4, 4, 0, 0]);
        assert_eq!(result.score, 4);
        assert!(result.changed);
    }

    #[test]
    fn test_row_leftmost_pair_wins() {
        let result = slide_and_merge_row([2, 0, 2, 2]);
        assert_eq!(result.row, [4, 2, 0, 0]);
        assert_eq!(result.score, 4);
        assert!(result.changed);
    }

    #[test]
    fn test_row_no_merge_no_gap() {
        let result = slide_and_merge_row([2, 4, 8, 16]);
        assert_eq!(result.row, [2, 4, 8, 16]);
        assert_eq!(result.score, 0);
        assert!(!result.changed);
    }

    #[test]
    fn test_row_all_zeros_unchanged() {
        let result = slide_and_merge_row([0; SIZE]);
        assert_eq!(result.row, [0; SIZE]);
        assert!(!result.changed);
    }

    #[test]
    fn test_row_gap_without_merge_is_changed() {
        let result = slide_and_merge_row([2, 0, 4, 0]);
        assert_eq!(result.row, [2, 4, 0, 0]);
        assert_eq!(result.score, 0);
        assert!(result.changed);
    }

    #[test]
    fn test_row_no_chain_merge() {
        let result = slide_and_merge_row([2, 2, 2, 2]);
        assert_eq!(result.row, [4, 4, 0, 0]);
        assert_eq!(result.score, 8);

        let result = slide_and_merge_row([4, 2, 2, 0]);
        assert_eq!(result.row, [4, 4, 0, 0]);
        assert_eq!(result.score, 4);
    }

    #[test]
    fn test_row_two_pairs() {
        let result = slide_and_merge_row([4, 4, 8, 8]);
        assert_eq!(result.row, [8, 16, 0, 0]);
        assert_eq!(result.score, 24);
    }

    // -------------------------------------------------------------------------
    // Board moves
    // -------------------------------------------------------------------------

    #[test]
    fn test_move_left_scenarios() {
        let result = single_row([2, 2, 4, 0]).apply_move(Direction::Left);
        assert_eq!(result.board.rows()[0], [4, 4, 0, 0]);
        assert_eq!(result.score, 4);
        assert!(result.changed);

        let result = single_row([2, 4, 8, 16]).apply_move(Direction::Left);
        assert_eq!(result.board, single_row([2, 4, 8, 16]));
        assert_eq!(result.score, 0);
        assert!(!result.changed);
    }

    #[test]
    fn test_move_left() {
        let board = Board::from_rows([[2, 2, 0, 0], [0, 4, 4, 0], [2, 0, 2, 0], [8, 8, 8, 8]]);
        let result = board.apply_move(Direction::Left);
        assert_eq!(
            result.board,
            Board::from_rows([[4, 0, 0, 0], [8, 0, 0, 0], [4, 0, 0, 0], [16, 16, 0, 0]])
        );
        assert_eq!(result.score, 4 + 8 + 4 + 32);
    }

    #[test]
    fn test_move_right() {
        let board = Board::from_rows([[2, 2, 0, 0], [0, 4, 4, 0], [2, 0, 2, 0], [8, 8, 8, 8]]);
        let result = board.apply_move(Direction::Right);
        assert_eq!(
            result.board,
            Board::from_rows([[0, 0, 0, 4], [0, 0, 0, 8], [0, 0, 0, 4], [0, 0, 16, 16]])
        );
        assert_eq!(result.score, 4 + 8 + 4 + 32);
    }

    #[test]
    fn test_move_right_merges_from_the_right_edge() {
        let result = single_row([2, 2, 2, 0]).apply_move(Direction::Right);
        assert_eq!(result.board.rows()[0], [0, 0, 2, 4]);
    }

    #[test]
    fn test_move_up() {
        let board = Board::from_rows([[2, 0, 2, 8], [2, 4, 0, 8], [0, 4, 2, 8], [0, 0, 0, 8]]);
        let result = board.apply_move(Direction::Up);
        assert_eq!(
            result.board,
            Board::from_rows([[4, 8, 4, 16], [0, 0, 0, 16], [0, 0, 0, 0], [0, 0, 0, 0]])
        );
        assert_eq!(result.score, 4 + 8 + 4 + 32);
    }

    #[test]
    fn test_move_down() {
        let board = Board::from_rows([[2, 0, 2, 8], [2, 4, 0, 8], [0, 4, 2, 8], [0, 0, 0, 8]]);
        let result = board.apply_move(Direction::Down);
        assert_eq!(
            result.board,
            Board::from_rows([[0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 16], [4, 8, 4, 16]])
        );
        assert_eq!(result.score, 4 + 8 + 4 + 32);
    }

    #[test]
    fn test_unchanged_move_returns_input() {
        let board = Board::from_rows([[2, 0, 0, 0], [4, 0, 0, 0], [8, 0, 0, 0], [16, 0, 0, 0]]);
        let result = board.apply_move(Direction::Left);
        assert!(!result.changed);
        assert_eq!(result.board, board);
        assert_eq!(result.score, 0);
        assert!(board.can_move(Direction::Right));
        assert!(!board.can_move(Direction::Up));
        assert!(!board.can_move(Direction::Down));
        assert_eq!(board.legal_moves(), [false, false, false, true]);
    }

    #[test]
    fn test_transforms_are_involutions() {
        let board = Board::from_rows([[2, 4, 8, 16], [0, 2, 0, 4], [32, 0, 0, 0], [0, 0, 64, 2]]);
        assert_eq!(board.transpose().transpose(), board);
        assert_eq!(board.reverse_rows().reverse_rows(), board);
        assert_eq!(board.transpose().rows()[0], [2, 0, 32, 0]);
        assert_eq!(board.reverse_rows().rows()[0], [16, 8, 4, 2]);
    }

    // -------------------------------------------------------------------------
    // Spawning
    // -------------------------------------------------------------------------

    #[test]
    fn test_spawn_fills_exactly_one_empty_cell() {
        let mut rng = SmallRng::seed_from_u64(7);
        let before = Board::from_rows([[2, 0, 4, 0], [0, 8, 0, 0], [0, 0, 0, 0], [16, 0, 0, 2]]);
        let mut after = before;
        let spawn = after.spawn_tile(&mut rng).expect("board has room");

        assert_eq!(before.get(spawn.row, spawn.col), 0);
        assert!(spawn.value == 2 || spawn.value == 4);
        assert_eq!(after.get(spawn.row, spawn.col), spawn.value);
        assert_eq!(after.empty_count(), before.empty_count() - 1);
        assert_eq!(after.sum(), before.sum() + u64::from(spawn.value));
    }

    #[test]
    fn test_spawn_on_full_board_is_noop() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut board = Board::from_rows(CHECKERBOARD);
        assert_eq!(board.spawn_tile(&mut rng), None);
        assert_eq!(board, Board::from_rows(CHECKERBOARD));
    }

    #[test]
    fn test_spawn_with_zero_draws_picks_first_cell_and_a_four() {
        // An all-zero stream picks index 0 and passes every `gen_bool` check.
        let mut rng = StepRng::new(0, 0);
        let mut board = Board::from_rows([[2, 0, 0, 0], [0; SIZE], [0; SIZE], [0; SIZE]]);
        let spawn = board.spawn_tile(&mut rng).expect("board has room");
        assert_eq!(spawn, Spawn { row: 0, col: 1, value: 4 });
    }

    #[test]
    fn test_spawn_with_quarter_draws_picks_fifth_cell_and_a_two() {
        // 2^62 is a quarter of the u64 range: index 4 of 16, and above the 10% cut.
        let mut rng = StepRng::new(1 << 62, 0);
        let mut board = Board::empty();
        let spawn = board.spawn_tile(&mut rng).expect("board has room");
        assert_eq!(spawn, Spawn { row: 1, col: 0, value: 2 });
    }

    #[test]
    fn test_spawn_value_distribution() {
        let mut rng = SmallRng::seed_from_u64(2048);
        let mut fours = 0;
        let trials = 10_000;
        for _ in 0..trials {
            let mut board = Board::empty();
            if board.spawn_tile(&mut rng).map(|s| s.value) == Some(4) {
                fours += 1;
            }
        }
        // 10% expected; allow generous slack for a fixed seed.
        assert!((700..1300).contains(&fours), "fours = {fours}");
    }

    // -------------------------------------------------------------------------
    // Terminal detection
    // -------------------------------------------------------------------------

    #[test]
    fn test_checkerboard_is_terminal() {
        let board = Board::from_rows(CHECKERBOARD);
        assert!(board.is_terminal());
        for direction in Direction::all() {
            let result = board.apply_move(direction);
            assert!(!result.changed, "{direction} changed a terminal board");
            assert_eq!(result.score, 0);
        }
    }

    #[test]
    fn test_board_with_empty_cell_not_terminal() {
        let mut rows = CHECKERBOARD;
        rows[3][3] = 0;
        assert!(!Board::from_rows(rows).is_terminal());
        assert!(!Board::empty().is_terminal());
    }

    #[test]
    fn test_full_board_with_horizontal_pair_not_terminal() {
        let board = Board::from_rows([[2, 2, 4, 8], [4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]]);
        assert!(!board.is_terminal());
        assert!(board.can_move(Direction::Left));
    }

    #[test]
    fn test_full_board_with_vertical_pair_not_terminal() {
        let board = Board::from_rows([[2, 4, 8, 16], [2, 8, 16, 32], [4, 16, 32, 64], [8, 32, 64, 128]]);
        assert!(!board.is_terminal());
        assert!(board.can_move(Direction::Up));
        assert!(!board.can_move(Direction::Left));
    }

    #[test]
    fn test_pair_in_last_row_and_column_detected() {
        let mut rows = CHECKERBOARD;
        rows[3][3] = 4;
        assert!(!Board::from_rows(rows).is_terminal());
    }

    // -------------------------------------------------------------------------
    // Construction and formatting
    // -------------------------------------------------------------------------

    #[test]
    fn test_try_from_rows_rejects_bad_tiles() {
        let mut rows = [[0; SIZE]; SIZE];
        rows[1][2] = 3;
        assert_eq!(
            Board::try_from_rows(rows),
            Err(BoardError::InvalidTile { row: 1, col: 2, value: 3 })
        );

        rows[1][2] = 1;
        assert!(Board::try_from(rows).is_err());

        rows[1][2] = 1024;
        assert!(Board::try_from(rows).is_ok());
    }

    #[test]
    fn test_try_from_rows_caps_tile_size() {
        let mut rows = [[0; SIZE]; SIZE];
        rows[0][0] = MAX_TILE;
        rows[0][1] = MAX_TILE;
        let board = Board::try_from_rows(rows).expect("largest reachable tile is valid");
        let result = board.apply_move(Direction::Left);
        assert_eq!(result.board.rows()[0], [MAX_TILE * 2, 0, 0, 0]);
        assert_eq!(result.score, MAX_TILE * 2);

        rows[0][1] = 1 << 18;
        assert_eq!(
            Board::try_from_rows(rows),
            Err(BoardError::InvalidTile { row: 0, col: 1, value: 1 << 18 })
        );

        rows[0][0] = 1 << 31;
        rows[0][1] = 1 << 31;
        assert!(Board::try_from_rows(rows).is_err());
    }

    #[test]
    #[should_panic(expected = "board invariant violated")]
    fn test_from_rows_panics_on_invariant_violation() {
        let _ = Board::from_rows([[6, 0, 0, 0], [0; SIZE], [0; SIZE], [0; SIZE]]);
    }

    #[test]
    fn test_stats() {
        let board = Board::from_rows([[2, 0, 4, 0], [0, 8, 0, 0], [0, 0, 0, 0], [16, 0, 0, 2]]);
        assert_eq!(board.max_tile(), 16);
        assert_eq!(board.empty_count(), 11);
        assert_eq!(board.sum(), 32);
        assert_eq!(board.empty_cells()[0], (0, 1));
        assert_eq!(Board::empty().max_tile(), 0);
    }

    #[test]
    fn test_display_format() {
        let board = single_row([2, 0, 0, 2048]);
        let display = board.to_string();
        assert!(display.starts_with("+------+"));
        assert!(display.contains("2048"));
        assert_eq!(display.lines().count(), 2 * SIZE + 1);
    }
}
