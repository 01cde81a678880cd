//! Event Handler module: fan-out of gateway events to every session tracking
//! a game.
//!
//! Events arrive at least once and in no particular cross-type order, so each
//! session validates an event against its own projection before mutating it.
//! Protocol anomalies are logged and discarded, never shown to users.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::card::{Call, Letter};
use crate::events::{observe_status, GameEvent, GameStatus, SeqCheck};
use crate::localization::t_lang;
use crate::win::{find_winning_pattern, WinPattern};

use super::ui_builder::{call_announcement, claim_keyboard, claimable_notice, winner_message};
use super::AppState;

/// Consume gateway events until the channel closes.
pub async fn run_event_loop(bot: Bot, state: Arc<AppState>, mut events: mpsc::Receiver<GameEvent>) {
    while let Some(event) = events.recv().await {
        debug!(event = ?event, "Gateway event");
        if let Err(err) = dispatch_event(&bot, &state, event).await {
            error!(error = %err, "Event handling failed");
        }
    }
    info!("Gateway event channel closed");
}

async fn dispatch_event(bot: &Bot, state: &AppState, event: GameEvent) -> Result<()> {
    match event {
        GameEvent::GameStarting { game_id } => on_game_starting(bot, state, &game_id).await,
        GameEvent::NumberCalled {
            letter,
            number,
            current_calls,
        } => on_number_called(bot, state, letter, number, current_calls).await,
        GameEvent::PlayerJoined {
            username,
            total_players,
        } => on_player_joined(state, &username, total_players).await,
        GameEvent::CardSold { card_number, pot } => on_card_sold(state, card_number, pot).await,
        GameEvent::Winner {
            user_id,
            username,
            amount,
        } => on_winner(bot, state, &user_id, &username, amount).await,
        GameEvent::GameEnding => on_game_ending(bot, state).await,
        GameEvent::Unknown => {
            debug!("Ignoring unknown gateway event");
            Ok(())
        }
    }
}

async fn on_game_starting(bot: &Bot, state: &AppState, game_id: &str) -> Result<()> {
    for chat in state.sessions.chats_in_game().await {
        let Some(session) = state.sessions.get(chat).await else {
            continue;
        };
        let Some(view) = session.game else { continue };
        if view.game_id != game_id {
            continue;
        }
        if let Err(violation) = observe_status(view.status, GameStatus::Waiting) {
            warn!(user_id = %chat, error = %violation, "Ignoring game_starting event");
            continue;
        }
        let lang = session.language_code.as_deref();
        if let Err(err) = bot
            .send_message(chat, t_lang("event-game-starting", lang))
            .await
        {
            warn!(user_id = %chat, error = %err, "Failed to send game starting notice");
        }
    }
    Ok(())
}

/// Session-level result of applying one `number_called` event.
struct CallApplication {
    lang: Option<String>,
    needs_resync: bool,
    newly_claimable: Vec<(u32, WinPattern)>,
}

async fn on_number_called(
    bot: &Bot,
    state: &AppState,
    letter: Letter,
    number: u32,
    current_calls: u32,
) -> Result<()> {
    // At most one authoritative refetch per event, shared by every session
    // that detected a gap.
    let mut authoritative: Option<Vec<Call>> = None;

    for chat in state.sessions.chats_in_game().await {
        let application = state
            .sessions
            .with(chat, |session| {
                let view = session.game.as_mut()?;
                if view.finished {
                    return None;
                }
                match view.tracker.observe(current_calls) {
                    SeqCheck::Stale => {
                        debug!(user_id = %chat, current_calls, "Discarding duplicate call event");
                        None
                    }
                    SeqCheck::Gap => Some(CallApplication {
                        lang: session.language_code.clone(),
                        needs_resync: true,
                        newly_claimable: Vec::new(),
                    }),
                    SeqCheck::InOrder => {
                        // The first call flips a waiting game to active
                        match observe_status(view.status, GameStatus::Active) {
                            Ok(status) => view.status = status,
                            Err(violation) => {
                                warn!(user_id = %chat, error = %violation, "Ignoring call event");
                                return None;
                            }
                        }
                        let mut newly_claimable = Vec::new();
                        for card in view.cards.iter_mut() {
                            let had_win = find_winning_pattern(card).is_some();
                            card.apply_called_number(letter, number);
                            if !had_win {
                                if let Some(pattern) = find_winning_pattern(card) {
                                    newly_claimable.push((card.number, pattern));
                                }
                            }
                        }
                        Some(CallApplication {
                            lang: session.language_code.clone(),
                            needs_resync: false,
                            newly_claimable,
                        })
                    }
                }
            })
            .await;

        let Some(mut application) = application else {
            continue;
        };
        let lang = application.lang.as_deref();

        if application.needs_resync {
            if authoritative.is_none() {
                authoritative = fetch_called_numbers(state).await;
            }
            let Some(calls) = authoritative.clone() else {
                continue;
            };
            application.newly_claimable = resync_session(state, chat, calls).await;
            info!(user_id = %chat, "Resynced marking state after missed calls");
        }

        if let Err(err) = bot
            .send_message(chat, call_announcement(letter, number, current_calls, lang))
            .await
        {
            warn!(user_id = %chat, error = %err, "Failed to send call announcement");
            continue;
        }
        for (card_number, pattern) in &application.newly_claimable {
            if let Err(err) = bot
                .send_message(chat, claimable_notice(*card_number, *pattern, lang))
                .reply_markup(claim_keyboard(lang))
                .await
            {
                warn!(user_id = %chat, error = %err, "Failed to send claim prompt");
            }
        }
    }
    Ok(())
}

async fn fetch_called_numbers(state: &AppState) -> Option<Vec<Call>> {
    match state.api.current_game().await {
        Ok(Some(game)) => Some(game.called_numbers),
        Ok(None) => {
            warn!("Gap detected but no current game to resync from");
            None
        }
        Err(err) => {
            warn!(error = %err, "Resync fetch failed");
            None
        }
    }
}

/// Recompute a session's marking state from the full authoritative sequence
/// and report the cards that hold a completed pattern afterwards.
async fn resync_session(state: &AppState, chat: ChatId, calls: Vec<Call>) -> Vec<(u32, WinPattern)> {
    state
        .sessions
        .with(chat, move |session| {
            let mut claimable = Vec::new();
            if let Some(view) = session.game.as_mut() {
                for card in view.cards.iter_mut() {
                    card.resync_from_calls(&calls);
                    if let Some(pattern) = find_winning_pattern(card) {
                        claimable.push((card.number, pattern));
                    }
                }
                view.tracker.resync(calls.len() as u32);
                if view.status == GameStatus::Waiting {
                    view.status = GameStatus::Active;
                }
            }
            claimable
        })
        .await
}

async fn on_player_joined(state: &AppState, username: &str, total_players: u32) -> Result<()> {
    debug!(username, total_players, "Player joined");
    for chat in state.sessions.chats_in_game().await {
        state
            .sessions
            .with(chat, |session| {
                if let Some(view) = session.game.as_mut() {
                    view.total_players = total_players;
                }
            })
            .await;
    }
    Ok(())
}

async fn on_card_sold(state: &AppState, card_number: u32, pot: f64) -> Result<()> {
    debug!(card_number, pot, "Card sold");
    for chat in state.sessions.chats_in_game().await {
        state
            .sessions
            .with(chat, |session| {
                if let Some(view) = session.game.as_mut() {
                    view.pot = pot;
                }
            })
            .await;
    }
    Ok(())
}

async fn on_winner(
    bot: &Bot,
    state: &AppState,
    winner_user_id: &str,
    username: &str,
    amount: f64,
) -> Result<()> {
    for chat in state.sessions.chats_in_game().await {
        let outcome = state
            .sessions
            .with(chat, |session| {
                let view = session.game.as_mut()?;
                if view.finished {
                    // Winner redelivery for a game already closed out
                    return None;
                }
                match observe_status(view.status, GameStatus::Completed) {
                    Ok(status) => {
                        view.status = status;
                        view.finished = true;
                        let is_local = session.user_id.as_deref() == Some(winner_user_id);
                        Some(Ok((is_local, session.language_code.clone())))
                    }
                    Err(violation) => Some(Err(violation)),
                }
            })
            .await;

        match outcome {
            Some(Ok((is_local, lang))) => {
                let text = winner_message(username, amount, is_local, lang.as_deref());
                if let Err(err) = bot.send_message(chat, text).await {
                    warn!(user_id = %chat, error = %err, "Failed to send winner notice");
                }
            }
            Some(Err(violation)) => {
                warn!(user_id = %chat, error = %violation, "Ignoring winner event");
            }
            None => {}
        }
    }
    Ok(())
}

async fn on_game_ending(bot: &Bot, state: &AppState) -> Result<()> {
    for chat in state.sessions.chats_in_game().await {
        let Some(session) = state.sessions.get(chat).await else {
            continue;
        };
        let Some(view) = session.game else { continue };
        if view.finished || view.status != GameStatus::Active {
            continue;
        }
        let lang = session.language_code.as_deref();
        if let Err(err) = bot
            .send_message(chat, t_lang("event-game-ending", lang))
            .reply_markup(claim_keyboard(lang))
            .await
        {
            warn!(user_id = %chat, error = %err, "Failed to send game ending notice");
        }
    }
    Ok(())
}
