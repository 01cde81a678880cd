use bingo_bot::bot::ui_builder::winner_message;
use bingo_bot::card::{Card, ColumnRanges, Letter};
use bingo_bot::events::{
    observe_status, CallTracker, Game, GameEvent, GameStatus, SeqCheck,
};
use bingo_bot::localization::init_localization;

#[test]
fn test_observed_transitions_follow_the_state_machine() {
    assert_eq!(
        observe_status(GameStatus::Waiting, GameStatus::Active),
        Ok(GameStatus::Active)
    );
    assert_eq!(
        observe_status(GameStatus::Active, GameStatus::Completed),
        Ok(GameStatus::Completed)
    );
    // Redelivery of the current status is tolerated
    assert_eq!(
        observe_status(GameStatus::Active, GameStatus::Active),
        Ok(GameStatus::Active)
    );

    // Backwards and skipping observations are protocol errors
    assert!(observe_status(GameStatus::Active, GameStatus::Waiting).is_err());
    assert!(observe_status(GameStatus::Completed, GameStatus::Active).is_err());
    assert!(observe_status(GameStatus::Completed, GameStatus::Waiting).is_err());
    assert!(observe_status(GameStatus::Waiting, GameStatus::Completed).is_err());
}

/// Duplicate and out-of-order number_called events must not change marking
/// state; only the next in-order sequence index applies.
#[test]
fn test_duplicate_and_replayed_calls_leave_marking_unchanged() {
    let mut card = Card::build(21, "game-1", &ColumnRanges::default());
    let mut tracker = CallTracker::new();

    let first = card.cell(0, 0).unwrap().number.unwrap();
    let second = card.cell(0, 1).unwrap().number.unwrap();

    assert_eq!(tracker.observe(1), SeqCheck::InOrder);
    card.apply_called_number(Letter::B, first);
    assert_eq!(tracker.observe(2), SeqCheck::InOrder);
    card.apply_called_number(Letter::I, second);
    let settled = card.clone();

    // Replays with an index at or below the applied watermark are discarded
    for replay in [1, 2] {
        assert_eq!(tracker.observe(replay), SeqCheck::Stale);
    }
    assert_eq!(card, settled);
    assert_eq!(tracker.applied(), 2);
}

#[test]
fn test_gap_requires_resync_and_does_not_advance() {
    let mut tracker = CallTracker::new();
    tracker.observe(1);
    assert_eq!(tracker.observe(3), SeqCheck::Gap);
    assert_eq!(tracker.applied(), 1);

    // After recomputing from the authoritative sequence the stream resumes
    tracker.resync(3);
    assert_eq!(tracker.observe(4), SeqCheck::InOrder);
}

#[test]
fn test_event_vocabulary_decodes_from_gateway_json() {
    let frames = [
        r#"{"event":"game_starting","gameId":"g-1"}"#,
        r#"{"event":"number_called","letter":"G","number":46,"currentCalls":1}"#,
        r#"{"event":"player_joined","username":"ada","totalPlayers":4}"#,
        r#"{"event":"card_sold","cardNumber":17,"pot":250.0}"#,
        r#"{"event":"winner","userId":"u-1","username":"ada","amount":500}"#,
        r#"{"event":"game_ending"}"#,
    ];
    let decoded: Vec<GameEvent> = frames
        .iter()
        .map(|frame| serde_json::from_str(frame).unwrap())
        .collect();

    assert_eq!(
        decoded[0],
        GameEvent::GameStarting {
            game_id: "g-1".to_string()
        }
    );
    assert_eq!(
        decoded[1],
        GameEvent::NumberCalled {
            letter: Letter::G,
            number: 46,
            current_calls: 1
        }
    );
    assert_eq!(decoded[5], GameEvent::GameEnding);
}

#[test]
fn test_unknown_events_map_to_the_catch_all() {
    let event: GameEvent =
        serde_json::from_str(r#"{"event":"tournament_round","round":2}"#).unwrap();
    assert_eq!(event, GameEvent::Unknown);
}

#[test]
fn test_game_projection_decodes() {
    let game: Game = serde_json::from_str(
        r#"{
            "id": "g-9",
            "status": "active",
            "pot": 410.5,
            "calledNumbers": [{"letter":"B","number":7},{"letter":"O","number":61}],
            "timeLeft": 95
        }"#,
    )
    .unwrap();
    assert_eq!(game.status, GameStatus::Active);
    assert_eq!(game.called_numbers.len(), 2);
    assert_eq!(game.called_numbers[0].letter, Letter::B);
    assert_eq!(game.time_left, Some(95));
}

/// A winner event for another user must render the opponent variant, never
/// the congratulation.
#[test]
fn test_winner_message_variants() {
    init_localization().expect("localization should load");

    let yours = winner_message("ada", 500.0, true, None);
    let theirs = winner_message("ada", 500.0, false, None);

    assert_ne!(yours, theirs);
    assert!(yours.contains("Congratulations"));
    assert!(!theirs.contains("Congratulations"));
    assert!(theirs.contains("ada"));
    assert!(theirs.contains("500"));
}
