//! # Game State and Event Contract
//!
//! The game projection and the push-event vocabulary shared by every client
//! front-end. Transitions happen in the backend; clients only observe them.
//! Delivery is at least once and ordering across event types is not
//! guaranteed, so `number_called` events carry the length of the
//! authoritative sequence and a per-session tracker discards replays.

use crate::card::{Call, Letter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Active,
    Completed,
}

impl GameStatus {
    /// Whether observing `next` after `self` is valid. Observing the same
    /// status again is a harmless redelivery; the only real transitions are
    /// waiting to active and active to completed.
    pub fn can_become(self, next: GameStatus) -> bool {
        self == next
            || matches!(
                (self, next),
                (GameStatus::Waiting, GameStatus::Active)
                    | (GameStatus::Active, GameStatus::Completed)
            )
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Active => "active",
            GameStatus::Completed => "completed",
        };
        write!(f, "{text}")
    }
}

/// Read-only projection of a game owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub status: GameStatus,
    #[serde(default)]
    pub pot: f64,
    /// Append-only for the lifetime of the game.
    #[serde(default)]
    pub called_numbers: Vec<Call>,
    #[serde(default)]
    pub time_left: Option<u64>,
}

/// An observed transition the protocol does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: GameStatus,
    pub to: GameStatus,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid game transition: {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

/// Validate an observed status against the current one.
///
/// Callers log the error and keep the current status; an invalid observation
/// is discarded, never fatal.
pub fn observe_status(
    current: GameStatus,
    observed: GameStatus,
) -> Result<GameStatus, InvalidTransition> {
    if current.can_become(observed) {
        Ok(observed)
    } else {
        Err(InvalidTransition {
            from: current,
            to: observed,
        })
    }
}

/// Push events emitted by the socket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    #[serde(rename_all = "camelCase")]
    GameStarting { game_id: String },
    #[serde(rename_all = "camelCase")]
    NumberCalled {
        letter: Letter,
        number: u32,
        /// Length of the authoritative sequence after this call.
        current_calls: u32,
    },
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        username: String,
        total_players: u32,
    },
    #[serde(rename_all = "camelCase")]
    CardSold { card_number: u32, pot: f64 },
    #[serde(rename_all = "camelCase")]
    Winner {
        user_id: String,
        username: String,
        amount: f64,
    },
    GameEnding,
    /// Events this client version does not know. Logged and discarded.
    #[serde(other)]
    Unknown,
}

/// Outcome of checking a `number_called` event against the applied sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqCheck {
    /// Next call in order, apply it.
    InOrder,
    /// Duplicate or out-of-order replay, discard it.
    Stale,
    /// Calls were missed, resync from the authoritative sequence.
    Gap,
}

/// Tracks how far into the authoritative `calledNumbers` sequence a session
/// has applied its marking state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallTracker {
    applied: u32,
}

impl CallTracker {
    pub fn new() -> CallTracker {
        CallTracker::default()
    }

    pub fn applied(&self) -> u32 {
        self.applied
    }

    /// Check an incoming sequence length and advance on `InOrder`.
    pub fn observe(&mut self, current_calls: u32) -> SeqCheck {
        if current_calls <= self.applied {
            SeqCheck::Stale
        } else if current_calls == self.applied + 1 {
            self.applied = current_calls;
            SeqCheck::InOrder
        } else {
            SeqCheck::Gap
        }
    }

    /// Reset after recomputing card state from the full sequence.
    pub fn resync(&mut self, total_calls: u32) {
        self.applied = total_calls;
    }
}
