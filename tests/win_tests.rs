use bingo_bot::card::{Card, ColumnRanges, Letter, GRID_SIZE};
use bingo_bot::win::{find_winning_pattern, has_win, WinPattern};

/// Card whose cell numbers are all three-digit sentinels that no test call
/// can match, so marks land only where a test puts them.
fn sentinel_card() -> Card {
    let mut card = Card::build(1, "game-1", &ColumnRanges::default());
    for (row, cells) in card.grid.iter_mut().enumerate() {
        for (column, cell) in cells.iter_mut().enumerate() {
            if !cell.free {
                cell.number = Some(200 + (row as u32) * 10 + column as u32);
            }
        }
    }
    card
}

#[test]
fn test_fresh_card_never_wins() {
    let card = Card::build(8, "game-1", &ColumnRanges::default());
    assert!(!has_win(&card));
    assert_eq!(find_winning_pattern(&card), None);
}

/// The middle row {B7, I19, FREE, G50, O71} completes once those four calls
/// land; the free-adjacent N33 call matches nothing and must not matter.
#[test]
fn test_middle_row_completes_from_called_sequence() {
    let mut card = sentinel_card();
    card.grid[2][0].number = Some(7);
    card.grid[2][1].number = Some(19);
    card.grid[2][3].number = Some(50);
    card.grid[2][4].number = Some(71);

    let calls = [
        (Letter::B, 7),
        (Letter::I, 19),
        (Letter::N, 33),
        (Letter::G, 50),
        (Letter::O, 71),
    ];
    for (letter, number) in calls {
        card.apply_called_number(letter, number);
    }

    assert_eq!(find_winning_pattern(&card), Some(WinPattern::Row(2)));
}

#[test]
fn test_each_row_can_win() {
    for row in 0..GRID_SIZE {
        let mut card = sentinel_card();
        for column in 0..GRID_SIZE {
            card.grid[row][column].called = true;
        }
        assert_eq!(find_winning_pattern(&card), Some(WinPattern::Row(row)));
    }
}

#[test]
fn test_each_column_can_win() {
    for column in 0..GRID_SIZE {
        let mut card = sentinel_card();
        for row in 0..GRID_SIZE {
            card.grid[row][column].called = true;
        }
        assert_eq!(
            find_winning_pattern(&card),
            Some(WinPattern::Column(column))
        );
    }
}

#[test]
fn test_diagonals_can_win() {
    let mut card = sentinel_card();
    for i in 0..GRID_SIZE {
        card.grid[i][i].called = true;
    }
    assert_eq!(find_winning_pattern(&card), Some(WinPattern::DiagonalMain));

    let mut card = sentinel_card();
    for i in 0..GRID_SIZE {
        card.grid[i][GRID_SIZE - 1 - i].called = true;
    }
    assert_eq!(find_winning_pattern(&card), Some(WinPattern::DiagonalAnti));
}

/// Reporting order is rows, then columns, then diagonals.
#[test]
fn test_reporting_order_prefers_rows() {
    let mut card = sentinel_card();
    // Complete column 2 and row 2 simultaneously
    for i in 0..GRID_SIZE {
        card.grid[i][2].called = true;
        card.grid[2][i].called = true;
    }
    assert_eq!(find_winning_pattern(&card), Some(WinPattern::Row(2)));
}

#[test]
fn test_almost_complete_patterns_do_not_win() {
    let mut card = sentinel_card();
    // Four of five in row 0, four of five in column 0
    for i in 0..4 {
        card.grid[0][i].called = true;
        card.grid[i][0].called = true;
    }
    assert!(!has_win(&card));
}

#[test]
fn test_free_cell_participates_in_column_and_diagonals() {
    // Column 2, both diagonals and row 2 all pass through the FREE cell, so
    // each needs only four real marks
    let mut card = sentinel_card();
    for row in [0, 1, 3, 4] {
        card.grid[row][2].called = true;
    }
    assert_eq!(find_winning_pattern(&card), Some(WinPattern::Column(2)));
}
