//! Per-player board state.
//!
//! This module contains:
//! - Placement queues that stage drawn tiles row by row
//! - The 5x5 scoring wall with its fixed color diagonal
//! - The penalty tray and its weight table
//! - End-of-round resolution: wall placement, adjacency scoring, penalties

use crate::tile::{Tile, TileCounts};
use serde::{Deserialize, Serialize};

/// Number of placement queue rows (and wall rows).
pub const QUEUE_ROWS: usize = 5;

/// Number of penalty tray slots.
pub const TRAY_SLOTS: usize = 7;

/// Points deducted per occupied tray slot at round end.
pub const TRAY_PENALTIES: [i32; TRAY_SLOTS] = [1, 1, 2, 2, 2, 3, 3];

/// Wall column for a color on a given row.
///
/// Each color occupies exactly one column per row, shifted one column
/// right per row, so a color traces a diagonal across the wall.
pub fn wall_column(tile: Tile, row: usize) -> usize {
    (tile.column_offset() + row) % QUEUE_ROWS
}

/// A tile sitting in the penalty tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrayTile {
    /// An ordinary colored tile, returned to the bag at round end
    Color(Tile),
    /// The first-to-center marker; incurs its slot penalty but is
    /// never returned to the bag
    FirstPlayer,
}

/// A single player's board: queues, wall, tray, and score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerBoard {
    /// Display name
    pub name: String,
    /// Placement queues; row r holds r+1 cells
    pub queues: [Vec<Option<Tile>>; QUEUE_ROWS],
    /// Scoring wall; `wall[row][col]` is true once placed
    pub wall: [[bool; QUEUE_ROWS]; QUEUE_ROWS],
    /// Penalty tray slots, filled left to right
    pub tray: [Option<TrayTile>; TRAY_SLOTS],
    /// Running score; may go negative, never clamped
    pub score: i32,
    /// Whether this player has resigned
    pub resigned: bool,
    /// Sticky flag set once any wall row is complete
    pub completed: bool,
}

impl PlayerBoard {
    /// Create a fresh board for a named player
    pub fn new(name: String) -> Self {
        Self {
            name,
            queues: std::array::from_fn(|row| vec![None; row + 1]),
            wall: [[false; QUEUE_ROWS]; QUEUE_ROWS],
            tray: [None; TRAY_SLOTS],
            score: 0,
            resigned: false,
            completed: false,
        }
    }

    /// Whether `tile` may still be staged on wall row `row` (0-based).
    ///
    /// False once the wall cell mapped for that color is occupied; a
    /// color cannot be replayed on a row that already completed it.
    pub fn row_accepts(&self, tile: Tile, row: usize) -> bool {
        !self.wall[row][wall_column(tile, row)]
    }

    /// Stage `count` drawn tiles of one color.
    ///
    /// `target_row == 0` sends everything straight to the penalty tray;
    /// otherwise row `target_row - 1` fills its empty queue cells first
    /// and the excess spills into the tray. Tiles that fit nowhere are
    /// dropped, matching the physical tray's capacity limit.
    ///
    /// The caller is responsible for validating [`row_accepts`] first;
    /// this method mutates unconditionally.
    ///
    /// [`row_accepts`]: PlayerBoard::row_accepts
    pub fn place_tiles(&mut self, tile: Tile, count: usize, target_row: usize) {
        let mut remaining = count;

        if target_row > 0 {
            let row = target_row - 1;
            for cell in self.queues[row].iter_mut() {
                if remaining == 0 {
                    break;
                }
                if cell.is_none() {
                    *cell = Some(tile);
                    remaining -= 1;
                }
            }
        }

        while remaining > 0 {
            if !self.push_tray(TrayTile::Color(tile)) {
                break;
            }
            remaining -= 1;
        }
    }

    /// Put the first-to-center marker in the tray, if there is room
    pub fn take_first_player_marker(&mut self) {
        self.push_tray(TrayTile::FirstPlayer);
    }

    /// Resolve this board at round end.
    ///
    /// Completed queue rows commit one tile to the wall and score its
    /// contiguous horizontal and vertical neighbors; the tray deducts
    /// its penalty weights. Returns the per-color counts to recycle
    /// into the bag (row r returns r tiles; tray tiles return one each;
    /// the first-player marker returns nothing).
    pub fn resolve_round(&mut self) -> TileCounts {
        let mut returned = TileCounts::new();

        for row in 0..QUEUE_ROWS {
            // The rightmost cell is the last to fill, so it marks a
            // complete row.
            let tile = match self.queues[row][row] {
                Some(tile) => tile,
                None => continue,
            };

            let col = wall_column(tile, row);
            self.wall[row][col] = true;

            for cell in self.queues[row].iter_mut() {
                *cell = None;
            }

            // One tile moves onto the wall; the other `row` tiles from
            // the queue go back to the bag. Counts sum across rows that
            // completed the same color this round.
            returned.add(tile, row as u32);

            self.score += self.adjacency_score(row, col);
        }

        let mut deduction = 0;
        for (slot, cell) in self.tray.iter_mut().enumerate() {
            if let Some(tray_tile) = cell.take() {
                deduction += TRAY_PENALTIES[slot];
                if let TrayTile::Color(tile) = tray_tile {
                    returned.add(tile, 1);
                }
            }
        }
        self.score -= deduction;

        if self.wall.iter().any(|row| row.iter().all(|&cell| cell)) {
            self.completed = true;
        }

        returned
    }

    /// Points for a tile just placed at `(row, col)`: the contiguous
    /// runs of occupied cells left, right, above, and below, stopping
    /// at the first gap in each direction. A lone tile scores 0.
    fn adjacency_score(&self, row: usize, col: usize) -> i32 {
        let mut points = 0;

        for c in (0..col).rev() {
            if !self.wall[row][c] {
                break;
            }
            points += 1;
        }
        for c in col + 1..QUEUE_ROWS {
            if !self.wall[row][c] {
                break;
            }
            points += 1;
        }
        for r in (0..row).rev() {
            if !self.wall[r][col] {
                break;
            }
            points += 1;
        }
        for r in row + 1..QUEUE_ROWS {
            if !self.wall[r][col] {
                break;
            }
            points += 1;
        }

        points
    }

    /// Total tiles currently staged on this board (queues plus tray,
    /// excluding the first-player marker)
    pub fn tiles_in_play(&self) -> usize {
        let queued: usize = self
            .queues
            .iter()
            .map(|row| row.iter().filter(|cell| cell.is_some()).count())
            .sum();
        let trayed = self
            .tray
            .iter()
            .filter(|slot| matches!(slot, Some(TrayTile::Color(_))))
            .count();
        queued + trayed
    }

    fn push_tray(&mut self, tile: TrayTile) -> bool {
        match self.tray.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(tile);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wall_column_traces_a_diagonal() {
        // Blue starts at column 0 and shifts one column per row.
        for row in 0..QUEUE_ROWS {
            assert_eq!(wall_column(Tile::Blue, row), row);
        }
        // Row 0 is the offset order itself.
        assert_eq!(wall_column(Tile::Yellow, 0), 1);
        assert_eq!(wall_column(Tile::Red, 0), 2);
        assert_eq!(wall_column(Tile::Black, 0), 3);
        assert_eq!(wall_column(Tile::White, 0), 4);
        // White wraps around on later rows.
        assert_eq!(wall_column(Tile::White, 2), 1);
    }

    #[test]
    fn test_queue_rows_have_increasing_capacity() {
        let board = PlayerBoard::new("Ana".into());
        for (row, queue) in board.queues.iter().enumerate() {
            assert_eq!(queue.len(), row + 1);
        }
    }

    #[test]
    fn test_place_fills_queue_then_spills_to_tray() {
        let mut board = PlayerBoard::new("Ana".into());

        // Row 2 (capacity 2) takes two tiles; the third spills.
        board.place_tiles(Tile::Red, 3, 2);
        assert_eq!(board.queues[1], vec![Some(Tile::Red), Some(Tile::Red)]);
        assert_eq!(board.tray[0], Some(TrayTile::Color(Tile::Red)));
        assert_eq!(board.tray[1], None);
    }

    #[test]
    fn test_place_row_zero_targets_tray() {
        let mut board = PlayerBoard::new("Ana".into());
        board.place_tiles(Tile::Black, 2, 0);
        assert_eq!(board.tray[0], Some(TrayTile::Color(Tile::Black)));
        assert_eq!(board.tray[1], Some(TrayTile::Color(Tile::Black)));
        assert!(board.queues.iter().all(|q| q.iter().all(|c| c.is_none())));
    }

    #[test]
    fn test_tray_overflow_discards_tiles() {
        let mut board = PlayerBoard::new("Ana".into());
        board.place_tiles(Tile::White, 9, 0);
        assert_eq!(board.tiles_in_play(), TRAY_SLOTS);
    }

    #[test]
    fn test_row_accepts_locks_completed_color() {
        let mut board = PlayerBoard::new("Ana".into());
        assert!(board.row_accepts(Tile::Red, 1));

        board.wall[1][wall_column(Tile::Red, 1)] = true;
        assert!(!board.row_accepts(Tile::Red, 1));
        // Other colors on the row are still fine.
        assert!(board.row_accepts(Tile::Blue, 1));
    }

    #[test]
    fn test_resolve_commits_complete_rows_only() {
        let mut board = PlayerBoard::new("Ana".into());
        board.place_tiles(Tile::Red, 1, 1); // row 0 complete
        board.place_tiles(Tile::Blue, 1, 2); // row 1 half full

        let returned = board.resolve_round();

        assert!(board.wall[0][wall_column(Tile::Red, 0)]);
        assert!(!board.wall[1][wall_column(Tile::Blue, 1)]);
        // Row 0 returns 0 tiles; the incomplete row keeps its tile.
        assert_eq!(returned.total(), 0);
        assert_eq!(board.queues[0][0], None);
        assert_eq!(board.queues[1][0], Some(Tile::Blue));
        // A lone wall tile scores nothing.
        assert_eq!(board.score, 0);
    }

    #[test]
    fn test_adjacency_score_counts_contiguous_runs() {
        let mut board = PlayerBoard::new("Ana".into());
        // Neighbors of (2,2): left and above occupied, right and below
        // empty. Placement scores exactly 2.
        board.wall[2][1] = true;
        board.wall[1][2] = true;
        board.wall[2][2] = true;
        assert_eq!(board.adjacency_score(2, 2), 2);
    }

    #[test]
    fn test_adjacency_score_stops_at_first_gap() {
        let mut board = PlayerBoard::new("Ana".into());
        // Row 0: occupied at columns 0 and 2, gap at 1. Placing at
        // column 3 only sees the run back to column 2.
        board.wall[0][0] = true;
        board.wall[0][2] = true;
        board.wall[0][3] = true;
        assert_eq!(board.adjacency_score(0, 3), 1);
    }

    #[test]
    fn test_resolve_returns_row_minus_one_tiles() {
        let mut board = PlayerBoard::new("Ana".into());
        board.place_tiles(Tile::Yellow, 3, 3); // row 2, capacity 3

        let returned = board.resolve_round();
        assert_eq!(returned.get(Tile::Yellow), 2);
        assert!(board.wall[2][wall_column(Tile::Yellow, 2)]);
    }

    #[test]
    fn test_resolve_accumulates_same_color_across_rows() {
        let mut board = PlayerBoard::new("Ana".into());
        board.place_tiles(Tile::Red, 2, 2); // row 1 returns 1
        board.place_tiles(Tile::Red, 3, 3); // row 2 returns 2

        let returned = board.resolve_round();
        assert_eq!(returned.get(Tile::Red), 3);
    }

    #[test]
    fn test_tray_penalties_and_returns() {
        let mut board = PlayerBoard::new("Ana".into());
        board.take_first_player_marker();
        board.place_tiles(Tile::Black, 2, 0);

        let returned = board.resolve_round();

        // Slots 0..3 occupied: penalties 1 + 1 + 2.
        assert_eq!(board.score, -4);
        // The marker stays out of the bag return.
        assert_eq!(returned.get(Tile::Black), 2);
        assert_eq!(returned.total(), 2);
        assert!(board.tray.iter().all(|slot| slot.is_none()));
    }

    #[test]
    fn test_completed_flag_is_sticky() {
        let mut board = PlayerBoard::new("Ana".into());
        for col in 0..QUEUE_ROWS {
            board.wall[0][col] = true;
        }
        board.resolve_round();
        assert!(board.completed);

        board.resolve_round();
        assert!(board.completed);
    }
}
