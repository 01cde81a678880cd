use bingo_bot::card::{Call, Card, ColumnRange, ColumnRanges, Letter, FREE_COL, FREE_ROW, GRID_SIZE};

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that every constructed card pre-marks the FREE center cell
    #[test]
    fn test_center_cell_free_and_called_after_construction() {
        for number in [1, 57, 400] {
            let card = Card::build(number, "game-1", &ColumnRanges::default());
            let center = card.cell(FREE_ROW, FREE_COL).unwrap();
            assert!(center.free, "card {number} center must be free");
            assert!(center.called, "card {number} center must be pre-marked");
            assert_eq!(center.number, None, "free cells carry no number");
        }
    }

    /// Test the column to letter mapping across the whole grid
    #[test]
    fn test_column_letter_mapping() {
        let card = Card::build(12, "game-1", &ColumnRanges::default());
        let expected = [Letter::B, Letter::I, Letter::N, Letter::G, Letter::O];
        for row in 0..GRID_SIZE {
            for (column, letter) in expected.iter().enumerate() {
                assert_eq!(card.cell(row, column).unwrap().letter, *letter);
            }
        }
    }

    #[test]
    fn test_grid_is_row_major_five_by_five() {
        let card = Card::build(3, "game-1", &ColumnRanges::default());
        assert_eq!(card.grid.len(), GRID_SIZE);
        for row in &card.grid {
            assert_eq!(row.len(), GRID_SIZE);
        }
    }

    /// Test applyCalledNumber idempotence: applying the same call twice
    /// yields the same marking state as applying it once
    #[test]
    fn test_apply_called_number_idempotent() {
        let mut card = Card::build(7, "game-1", &ColumnRanges::default());
        let number = card.cell(1, 2).unwrap().number.unwrap();

        let changed = card.apply_called_number(Letter::N, number);
        assert!(changed);
        let once = card.clone();

        let changed_again = card.apply_called_number(Letter::N, number);
        assert!(!changed_again);
        assert_eq!(card, once);
        assert_eq!(card.marked_count(), once.marked_count());
    }

    /// Test that a call with no matching cell is a silent no-op
    #[test]
    fn test_unrecognized_call_never_panics_or_marks() {
        let mut card = Card::build(7, "game-1", &ColumnRanges::default());
        let before = card.clone();

        assert!(!card.apply_called_number(Letter::G, 9999));
        assert!(!card.apply_called_number(Letter::B, 75));
        assert_eq!(card, before);
    }

    #[test]
    fn test_marked_count_includes_free_cell() {
        let mut card = Card::build(5, "game-1", &ColumnRanges::default());
        assert_eq!(card.marked_count(), 1);

        let number = card.cell(0, 3).unwrap().number.unwrap();
        card.apply_called_number(Letter::G, number);
        assert_eq!(card.marked_count(), 2);
    }

    /// Test that called flags are derived: resyncing from the authoritative
    /// sequence replaces any locally accumulated state
    #[test]
    fn test_resync_from_calls_is_authoritative() {
        let mut card = Card::build(9, "game-1", &ColumnRanges::default());
        let kept = card.cell(0, 0).unwrap().number.unwrap();
        let dropped = card.cell(4, 4).unwrap().number.unwrap();

        card.apply_called_number(Letter::B, kept);
        card.apply_called_number(Letter::O, dropped);
        assert_eq!(card.marked_count(), 3);

        card.resync_from_calls(&[Call {
            letter: Letter::B,
            number: kept,
        }]);

        assert!(card.cell(0, 0).unwrap().called);
        assert!(!card.cell(4, 4).unwrap().called);
        assert!(card.cell(FREE_ROW, FREE_COL).unwrap().called);
        assert_eq!(card.marked_count(), 2);
    }

    /// Test deterministic construction for identical inputs
    #[test]
    fn test_build_deterministic_and_number_sensitive() {
        let ranges = ColumnRanges::default();
        assert_eq!(
            Card::build(33, "game-1", &ranges),
            Card::build(33, "game-1", &ranges)
        );
        assert_ne!(
            Card::build(33, "game-1", &ranges).grid,
            Card::build(34, "game-1", &ranges).grid
        );
    }

    #[test]
    fn test_backend_card_json_decodes() {
        // Shape the backend hands out at purchase time
        let json = r#"{
            "number": 12,
            "gameId": "g-77",
            "grid": [
                [
                    {"letter":"B","number":5,"free":false,"called":false},
                    {"letter":"I","number":20,"free":false,"called":false},
                    {"letter":"N","number":35,"free":false,"called":false},
                    {"letter":"G","number":50,"free":false,"called":false},
                    {"letter":"O","number":65,"free":false,"called":false}
                ]
            ]
        }"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.number, 12);
        assert_eq!(card.game_id, "g-77");
        assert_eq!(card.cell(0, 2).unwrap().letter, Letter::N);
    }

    #[test]
    fn test_narrow_ranges_still_produce_full_grid() {
        let ranges = ColumnRanges([ColumnRange { low: 1, high: 3 }; GRID_SIZE]);
        let card = Card::build(2, "game-1", &ranges);
        for row in 0..GRID_SIZE {
            for column in 0..GRID_SIZE {
                let cell = card.cell(row, column).unwrap();
                assert_eq!(cell.number.is_none(), cell.free);
            }
        }
    }
}
