//! # Session Store Module
//!
//! Per-chat session state, keyed by the Telegram chat and injected into
//! handlers through an explicit store so tests can construct isolated
//! sessions. Each session exclusively owns its local game projection; the
//! writers are the handler processing that chat and the gateway event loop,
//! one event at a time.

use crate::card::Card;
use crate::events::{CallTracker, GameStatus};
use std::collections::HashMap;
use teloxide::types::ChatId;
use tokio::sync::Mutex;

/// Local projection of the game a session joined.
#[derive(Debug, Clone, PartialEq)]
pub struct GameView {
    pub game_id: String,
    pub status: GameStatus,
    pub pot: f64,
    pub total_players: u32,
    /// Cards this user bought for the game.
    pub cards: Vec<Card>,
    pub tracker: CallTracker,
    /// Set once a winner was announced; no further claims for this game.
    pub finished: bool,
}

impl GameView {
    pub fn new(game_id: &str, status: GameStatus, pot: f64) -> GameView {
        GameView {
            game_id: game_id.to_string(),
            status,
            pot,
            total_players: 0,
            cards: Vec::new(),
            tracker: CallTracker::new(),
            finished: false,
        }
    }
}

/// State kept for one chat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Backend user id from register-or-authenticate.
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub game: Option<GameView>,
}

/// Session store keyed by chat id.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<ChatId, Session>>,
}

impl SessionStore {
    pub fn new() -> SessionStore {
        SessionStore::default()
    }

    /// Run a closure against the session for `chat`, creating it on first use.
    pub async fn with<R>(&self, chat: ChatId, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.inner.lock().await;
        f(sessions.entry(chat).or_default())
    }

    /// Snapshot of a session, if one exists.
    pub async fn get(&self, chat: ChatId) -> Option<Session> {
        self.inner.lock().await.get(&chat).cloned()
    }

    /// Chats currently tracking a game, for event fan-out.
    pub async fn chats_in_game(&self) -> Vec<ChatId> {
        self.inner
            .lock()
            .await
            .iter()
            .filter(|(_, session)| session.game.is_some())
            .map(|(chat, _)| *chat)
            .collect()
    }
}
