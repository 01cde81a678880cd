//! # Bingo Card Model
//!
//! A card is a 5x5 grid of cells handed to the client as a snapshot at
//! purchase time. The `called` flags on its cells are derived state: they must
//! be recomputable from the authoritative called-number sequence at any time,
//! and are never persisted as a source of truth.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cards are square 5x5 grids.
pub const GRID_SIZE: usize = 5;
/// Row of the FREE cell.
pub const FREE_ROW: usize = 2;
/// Column of the FREE cell.
pub const FREE_COL: usize = 2;
/// Number of purchasable cards in one game's pool.
pub const CARD_POOL_SIZE: u32 = 400;

/// Column letter of a bingo card. The column index fixes the letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    B,
    I,
    N,
    G,
    O,
}

impl Letter {
    /// Letters in column order.
    pub const ALL: [Letter; GRID_SIZE] = [Letter::B, Letter::I, Letter::N, Letter::G, Letter::O];

    /// Letter for a column index, `None` when the index is out of range.
    pub fn from_column(column: usize) -> Option<Letter> {
        Self::ALL.get(column).copied()
    }

    pub fn column(self) -> usize {
        match self {
            Letter::B => 0,
            Letter::I => 1,
            Letter::N => 2,
            Letter::G => 3,
            Letter::O => 4,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Letter::B => 'B',
            Letter::I => 'I',
            Letter::N => 'N',
            Letter::G => 'G',
            Letter::O => 'O',
        };
        write!(f, "{c}")
    }
}

/// A backend-announced (letter, number) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub letter: Letter,
    pub number: u32,
}

/// Inclusive numeric range a column draws its numbers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRange {
    pub low: u32,
    pub high: u32,
}

/// Per-column ranges used for card construction.
///
/// The backend owns the real ranges; the default is the classic 15-wide split
/// (B 1-15 through O 61-75).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRanges(pub [ColumnRange; GRID_SIZE]);

impl Default for ColumnRanges {
    fn default() -> Self {
        ColumnRanges([
            ColumnRange { low: 1, high: 15 },
            ColumnRange { low: 16, high: 30 },
            ColumnRange { low: 31, high: 45 },
            ColumnRange { low: 46, high: 60 },
            ColumnRange { low: 61, high: 75 },
        ])
    }
}

impl ColumnRanges {
    pub fn get(&self, column: usize) -> Option<ColumnRange> {
        self.0.get(column).copied()
    }
}

/// One cell of a card. FREE cells never carry a number; non-free cells always
/// do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub letter: Letter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub called: bool,
}

/// An owned, per-purchase card. Belongs to exactly one game and one user for
/// that game's duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub number: u32,
    pub game_id: String,
    /// Row-major 5x5 grid.
    pub grid: Vec<Vec<Cell>>,
}

impl Card {
    /// Deterministically lay out a card for `number`.
    ///
    /// Column values are drawn without replacement from the given range using
    /// a generator seeded from the card number and column, so the same inputs
    /// always produce the same card. Uniqueness across a game's 400-card pool
    /// is a backend guarantee this constructor does not enforce.
    pub fn build(number: u32, game_id: &str, ranges: &ColumnRanges) -> Card {
        let mut grid: Vec<Vec<Cell>> = (0..GRID_SIZE)
            .map(|_| Vec::with_capacity(GRID_SIZE))
            .collect();
        for column in 0..GRID_SIZE {
            let Some(letter) = Letter::from_column(column) else {
                continue;
            };
            let Some(range) = ranges.get(column) else {
                continue;
            };
            let values = column_values(number, column, range);
            for (row, row_cells) in grid.iter_mut().enumerate() {
                let free = row == FREE_ROW && column == FREE_COL;
                row_cells.push(Cell {
                    letter,
                    number: if free { None } else { Some(values[row]) },
                    free,
                    called: free,
                });
            }
        }
        Card {
            number,
            game_id: game_id.to_string(),
            grid,
        }
    }

    /// Cell at (row, column), `None` when out of range or the grid is
    /// malformed.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.grid.get(row).and_then(|cells| cells.get(column))
    }

    /// Mark the cell matching an announced call.
    ///
    /// Unrecognized calls are a silent no-op and reapplying a call leaves the
    /// card unchanged; the backend is the arbiter of call validity. Returns
    /// `true` when the marking state changed.
    pub fn apply_called_number(&mut self, letter: Letter, number: u32) -> bool {
        let mut changed = false;
        for row in &mut self.grid {
            for cell in row.iter_mut() {
                if !cell.free
                    && !cell.called
                    && cell.letter == letter
                    && cell.number == Some(number)
                {
                    cell.called = true;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Recompute every `called` flag from the authoritative call sequence.
    pub fn resync_from_calls(&mut self, calls: &[Call]) {
        for row in &mut self.grid {
            for cell in row.iter_mut() {
                cell.called = cell.free;
            }
        }
        for call in calls {
            self.apply_called_number(call.letter, call.number);
        }
    }

    /// Count of marked cells, FREE cell included. Display only.
    pub fn marked_count(&self) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|cell| cell.called)
            .count()
    }
}

/// Five distinct values for one column, seeded by (card number, column).
/// Degenerate ranges repeat the upper bound instead of panicking.
fn column_values(card_number: u32, column: usize, range: ColumnRange) -> [u32; GRID_SIZE] {
    let low = range.low.min(range.high);
    let high = range.low.max(range.high);
    let mut pool: Vec<u32> = (low..=high).collect();
    let seed = (u64::from(card_number) << 8) | column as u64;
    let mut rng = StdRng::seed_from_u64(seed);
    pool.shuffle(&mut rng);
    let mut values = [high; GRID_SIZE];
    for (slot, value) in values.iter_mut().zip(pool) {
        *slot = value;
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_cell_is_free_and_premarked() {
        let card = Card::build(1, "game-1", &ColumnRanges::default());
        let center = card.cell(FREE_ROW, FREE_COL).unwrap();
        assert!(center.free);
        assert!(center.called);
        assert_eq!(center.number, None);
    }

    #[test]
    fn test_non_free_cells_carry_numbers_in_column_range() {
        let ranges = ColumnRanges::default();
        let card = Card::build(42, "game-1", &ranges);
        for row in 0..GRID_SIZE {
            for column in 0..GRID_SIZE {
                let cell = card.cell(row, column).unwrap();
                if cell.free {
                    continue;
                }
                let range = ranges.get(column).unwrap();
                let number = cell.number.expect("non-free cell without a number");
                assert!(number >= range.low && number <= range.high);
                assert_eq!(cell.letter, Letter::from_column(column).unwrap());
                assert!(!cell.called);
            }
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let ranges = ColumnRanges::default();
        let first = Card::build(7, "game-1", &ranges);
        let second = Card::build(7, "game-1", &ranges);
        assert_eq!(first, second);
    }

    #[test]
    fn test_column_values_are_distinct() {
        let values = column_values(3, 0, ColumnRange { low: 1, high: 15 });
        let mut seen = values.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), GRID_SIZE);
    }

    #[test]
    fn test_degenerate_range_does_not_panic() {
        let card = Card::build(
            1,
            "game-1",
            &ColumnRanges([ColumnRange { low: 5, high: 6 }; GRID_SIZE]),
        );
        assert_eq!(card.grid.len(), GRID_SIZE);
        for row in 0..GRID_SIZE {
            for column in 0..GRID_SIZE {
                let cell = card.cell(row, column).unwrap();
                if !cell.free {
                    assert!(cell.number.is_some());
                }
            }
        }
    }

    #[test]
    fn test_apply_called_number_is_idempotent() {
        let mut card = Card::build(9, "game-1", &ColumnRanges::default());
        let target = card.cell(0, 0).unwrap().number.unwrap();

        assert!(card.apply_called_number(Letter::B, target));
        let after_first = card.clone();

        assert!(!card.apply_called_number(Letter::B, target));
        assert_eq!(card, after_first);
    }

    #[test]
    fn test_unmatched_call_is_a_noop() {
        let mut card = Card::build(9, "game-1", &ColumnRanges::default());
        let before = card.clone();
        // 99 is outside every default column range
        assert!(!card.apply_called_number(Letter::B, 99));
        assert_eq!(card, before);
    }

    #[test]
    fn test_letter_must_match_column() {
        let mut card = Card::build(9, "game-1", &ColumnRanges::default());
        let b_number = card.cell(0, 0).unwrap().number.unwrap();
        // A B-range number announced under O matches nothing
        assert!(!card.apply_called_number(Letter::O, b_number));
    }

    #[test]
    fn test_fresh_card_has_only_free_marked() {
        let card = Card::build(11, "game-1", &ColumnRanges::default());
        assert_eq!(card.marked_count(), 1);
    }

    #[test]
    fn test_resync_recomputes_from_sequence() {
        let mut card = Card::build(5, "game-1", &ColumnRanges::default());
        let first = card.cell(0, 0).unwrap().number.unwrap();
        let second = card.cell(1, 1).unwrap().number.unwrap();

        card.apply_called_number(Letter::B, first);
        card.apply_called_number(Letter::I, second);
        assert_eq!(card.marked_count(), 3);

        // Replaying a shorter authoritative sequence drops the extra mark
        card.resync_from_calls(&[Call {
            letter: Letter::B,
            number: first,
        }]);
        assert_eq!(card.marked_count(), 2);
        assert!(card.cell(0, 0).unwrap().called);
        assert!(!card.cell(1, 1).unwrap().called);
    }

    #[test]
    fn test_card_serde_round_trip() {
        let card = Card::build(3, "game-1", &ColumnRanges::default());
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"gameId\""));
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(card, back);
    }
}
