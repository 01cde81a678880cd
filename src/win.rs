//! Win detection over a marked card.
//!
//! The local detector is an optimistic hint used to offer a claim as soon as
//! a pattern completes; the backend re-verifies every claim before any payout.

use crate::card::{Card, GRID_SIZE};
use std::fmt;

/// A recognized win pattern. Variants carry zero-based indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinPattern {
    Row(usize),
    Column(usize),
    DiagonalMain,
    DiagonalAnti,
}

impl WinPattern {
    /// Cells covered by the pattern as (row, column) pairs.
    pub fn cells(self) -> [(usize, usize); GRID_SIZE] {
        let mut cells = [(0, 0); GRID_SIZE];
        for (i, slot) in cells.iter_mut().enumerate() {
            *slot = match self {
                WinPattern::Row(row) => (row, i),
                WinPattern::Column(column) => (i, column),
                WinPattern::DiagonalMain => (i, i),
                WinPattern::DiagonalAnti => (i, GRID_SIZE - 1 - i),
            };
        }
        cells
    }
}

impl fmt::Display for WinPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinPattern::Row(row) => write!(f, "row {}", row + 1),
            WinPattern::Column(column) => write!(f, "column {}", column + 1),
            WinPattern::DiagonalMain => write!(f, "diagonal"),
            WinPattern::DiagonalAnti => write!(f, "anti-diagonal"),
        }
    }
}

/// Patterns in the fixed reporting order: rows top to bottom, then columns
/// left to right, then the two diagonals.
pub fn all_patterns() -> impl Iterator<Item = WinPattern> {
    (0..GRID_SIZE)
        .map(WinPattern::Row)
        .chain((0..GRID_SIZE).map(WinPattern::Column))
        .chain([WinPattern::DiagonalMain, WinPattern::DiagonalAnti])
}

fn pattern_complete(card: &Card, pattern: WinPattern) -> bool {
    pattern
        .cells()
        .iter()
        .all(|&(row, column)| card.cell(row, column).is_some_and(|cell| cell.called))
}

/// First completed pattern in reporting order, or `None`.
///
/// The order is a display convention only. It does not rank simultaneous
/// winners across players; the backend decides pot split or claim precedence.
pub fn find_winning_pattern(card: &Card) -> Option<WinPattern> {
    all_patterns().find(|&pattern| pattern_complete(card, pattern))
}

pub fn has_win(card: &Card) -> bool {
    find_winning_pattern(card).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, ColumnRanges};

    fn mark(card: &mut Card, cells: &[(usize, usize)]) {
        for &(row, column) in cells {
            card.grid[row][column].called = true;
        }
    }

    #[test]
    fn test_fresh_card_never_wins() {
        let card = Card::build(1, "game-1", &ColumnRanges::default());
        assert_eq!(find_winning_pattern(&card), None);
        assert!(!has_win(&card));
    }

    #[test]
    fn test_row_completes_through_free_cell() {
        let mut card = Card::build(1, "game-1", &ColumnRanges::default());
        mark(&mut card, &[(2, 0), (2, 1), (2, 3), (2, 4)]);
        assert_eq!(find_winning_pattern(&card), Some(WinPattern::Row(2)));
    }

    #[test]
    fn test_column_win() {
        let mut card = Card::build(1, "game-1", &ColumnRanges::default());
        mark(&mut card, &[(0, 4), (1, 4), (2, 4), (3, 4), (4, 4)]);
        assert_eq!(find_winning_pattern(&card), Some(WinPattern::Column(4)));
    }

    #[test]
    fn test_diagonal_wins() {
        let mut card = Card::build(1, "game-1", &ColumnRanges::default());
        mark(&mut card, &[(0, 0), (1, 1), (3, 3), (4, 4)]);
        assert_eq!(find_winning_pattern(&card), Some(WinPattern::DiagonalMain));

        let mut card = Card::build(2, "game-1", &ColumnRanges::default());
        mark(&mut card, &[(0, 4), (1, 3), (3, 1), (4, 0)]);
        assert_eq!(find_winning_pattern(&card), Some(WinPattern::DiagonalAnti));
    }

    #[test]
    fn test_rows_report_before_columns() {
        let mut card = Card::build(1, "game-1", &ColumnRanges::default());
        // Complete both row 4 and column 0; row order wins for reporting
        mark(&mut card, &[(4, 0), (4, 1), (4, 2), (4, 3), (4, 4)]);
        mark(&mut card, &[(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(find_winning_pattern(&card), Some(WinPattern::Row(4)));
    }

    #[test]
    fn test_four_marks_are_not_enough() {
        let mut card = Card::build(1, "game-1", &ColumnRanges::default());
        mark(&mut card, &[(0, 0), (0, 1), (0, 2), (0, 3)]);
        assert_eq!(find_winning_pattern(&card), None);
    }

    #[test]
    fn test_pattern_cells_cover_expected_coordinates() {
        assert_eq!(
            WinPattern::DiagonalAnti.cells(),
            [(0, 4), (1, 3), (2, 2), (3, 1), (4, 0)]
        );
        assert_eq!(
            WinPattern::Row(1).cells(),
            [(1, 0), (1, 1), (1, 2), (1, 3), (1, 4)]
        );
    }
}
