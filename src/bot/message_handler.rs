//! Message Handler module for incoming Telegram commands.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

use crate::backend::CardsPage;
use crate::events::{Game, GameStatus};
use crate::localization::{t_args_lang, t_lang};
use crate::session::GameView;
use crate::socket::GatewayCommand;

use super::commands::Command;
use super::ui_builder::{
    backend_error_text, cards_page_keyboard, format_amount, format_card, game_summary,
    webapp_keyboard,
};
use super::AppState;

/// Pool numbers shown per card-browser page.
pub const CARDS_PAGE_SIZE: u32 = 25;

fn language_of(msg: &Message) -> Option<String> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.clone())
}

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<AppState>,
) -> Result<()> {
    let language_code = language_of(&msg);
    let lang = language_code.as_deref();
    debug!(user_id = %msg.chat.id, command = ?cmd, "Handling command");

    match cmd {
        Command::Start(payload) => {
            handle_start(&bot, &msg, &state, payload.trim(), lang).await
        }
        Command::Help => handle_help(&bot, &msg, lang).await,
        Command::Play => handle_play(&bot, &msg, &state, lang).await,
        Command::Cards => handle_cards(&bot, &msg, &state, lang).await,
        Command::Mycards => handle_my_cards(&bot, &msg, &state, lang).await,
        Command::Balance => handle_balance(&bot, &msg, &state, lang).await,
        Command::Stats => handle_stats(&bot, &msg, &state, lang).await,
        Command::Referral => handle_referral(&bot, &msg, &state, lang).await,
        Command::Claim => handle_claim(&bot, &msg, &state, lang).await,
    }
}

/// Fallback for plain text and unknown commands.
pub async fn message_handler(bot: Bot, msg: Message, state: Arc<AppState>) -> Result<()> {
    if msg.text().is_some() {
        let language_code = language_of(&msg);
        debug!(user_id = %msg.chat.id, "Received non-command text");
        state
            .sessions
            .with(msg.chat.id, |session| {
                if session.language_code.is_none() {
                    session.language_code = language_code.clone();
                }
            })
            .await;
        bot.send_message(
            msg.chat.id,
            t_lang("text-fallback", language_code.as_deref()),
        )
        .await?;
    }
    Ok(())
}

async fn handle_start(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    referral_payload: &str,
    lang: Option<&str>,
) -> Result<()> {
    let telegram_id = msg
        .from
        .as_ref()
        .map(|user| user.id.0 as i64)
        .unwrap_or(msg.chat.id.0);
    let username = msg.from.as_ref().and_then(|user| user.username.clone());
    let referral_code = (!referral_payload.is_empty()).then_some(referral_payload);

    match state
        .api
        .register_user(telegram_id, username.as_deref(), referral_code)
        .await
    {
        Ok(auth) => {
            state
                .sessions
                .with(msg.chat.id, |session| {
                    session.user_id = Some(auth.user_id.clone());
                    session.username = username.clone();
                    session.language_code = lang.map(|code| code.to_string());
                })
                .await;
            info!(user_id = %msg.chat.id, "User registered");

            let welcome = format!(
                "*{}*\n\n{}\n\n{}\n\n{}",
                t_lang("welcome-title", lang),
                t_lang("welcome-description", lang),
                t_args_lang(
                    "welcome-balance",
                    &[("balance", &format_amount(auth.balance))],
                    lang
                ),
                t_lang("welcome-commands", lang),
            );
            let mut request = bot.send_message(msg.chat.id, welcome);
            if let Some(url) = state.config.web_app_url.as_deref() {
                if let Some(keyboard) = webapp_keyboard(url, lang) {
                    request = request.reply_markup(keyboard);
                }
            }
            request.await?;
        }
        Err(err) => {
            warn!(user_id = %msg.chat.id, error = %err, "Registration failed");
            bot.send_message(msg.chat.id, backend_error_text(&err, lang))
                .await?;
        }
    }
    Ok(())
}

async fn handle_help(bot: &Bot, msg: &Message, lang: Option<&str>) -> Result<()> {
    let help_message = vec![
        t_lang("help-title", lang),
        t_lang("help-description", lang),
        t_lang("help-step1", lang),
        t_lang("help-step2", lang),
        t_lang("help-step3", lang),
        t_lang("help-step4", lang),
        t_lang("help-footer", lang),
    ]
    .join("\n\n");
    bot.send_message(msg.chat.id, help_message).await?;
    Ok(())
}

async fn handle_play(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    lang: Option<&str>,
) -> Result<()> {
    if registered_user(state, msg.chat.id).await.is_none() {
        bot.send_message(msg.chat.id, t_lang("error-not-registered", lang))
            .await?;
        return Ok(());
    }

    let game = match state.api.current_game().await {
        Ok(Some(game)) => Some(game),
        Ok(None) => create_game_with_retry(state).await,
        Err(err) => {
            bot.send_message(msg.chat.id, backend_error_text(&err, lang))
                .await?;
            return Ok(());
        }
    };
    let Some(game) = game else {
        bot.send_message(msg.chat.id, t_lang("play-create-failed", lang))
            .await?;
        return Ok(());
    };

    join_game(state, msg.chat.id, &game).await;

    let summary = game_summary(&game, lang);
    match game.status {
        GameStatus::Waiting => {
            let intro = format!("{}\n\n{}", t_lang("play-game-waiting", lang), summary);
            bot.send_message(msg.chat.id, intro).await?;
            send_cards_page(bot, msg.chat.id, state, &game.id, 1, lang).await?;
        }
        GameStatus::Active => {
            let text = format!("{}\n\n{}", t_lang("play-game-active", lang), summary);
            bot.send_message(msg.chat.id, text).await?;
        }
        GameStatus::Completed => {
            bot.send_message(msg.chat.id, t_lang("game-over", lang))
                .await?;
        }
    }
    Ok(())
}

/// Bounded replacement for the recursive create-then-play flow: after
/// `create_game_attempts` failures the user gets an explicit error instead of
/// another round trip.
async fn create_game_with_retry(state: &AppState) -> Option<Game> {
    let attempts = state.config.retry.create_game_attempts.max(1);
    for attempt in 1..=attempts {
        match state.api.create_game().await {
            Ok(game) => {
                info!(game_id = %game.id, "Created a new game");
                return Some(game);
            }
            Err(err) => {
                warn!(attempt, error = %err, "Game creation failed");
                // Another client may have created one in the meantime
                if let Ok(Some(game)) = state.api.current_game().await {
                    return Some(game);
                }
            }
        }
    }
    None
}

/// Track the game in the session and keep the gateway subscription in step.
async fn join_game(state: &AppState, chat: ChatId, game: &Game) {
    let mut left_game: Option<String> = None;
    state
        .sessions
        .with(chat, |session| match session.game.as_mut() {
            Some(view) if view.game_id == game.id => {
                view.status = game.status;
                view.pot = game.pot;
            }
            _ => {
                if let Some(old) = session.game.take() {
                    left_game = Some(old.game_id);
                }
                let mut view = GameView::new(&game.id, game.status, game.pot);
                view.tracker.resync(game.called_numbers.len() as u32);
                session.game = Some(view);
            }
        })
        .await;

    if let Some(game_id) = left_game {
        if state
            .gateway
            .send(GatewayCommand::LeaveGame { game_id })
            .await
            .is_err()
        {
            warn!("Gateway command channel closed");
        }
    }
    if state
        .gateway
        .send(GatewayCommand::JoinGame {
            game_id: game.id.clone(),
        })
        .await
        .is_err()
    {
        warn!("Gateway command channel closed");
    }
}

pub(super) async fn send_cards_page(
    bot: &Bot,
    chat: ChatId,
    state: &AppState,
    game_id: &str,
    page: u32,
    lang: Option<&str>,
) -> Result<()> {
    match state.api.cards_page(game_id, page, CARDS_PAGE_SIZE).await {
        Ok(cards_page) if cards_page.cards.is_empty() => {
            bot.send_message(chat, t_lang("cards-none-left", lang))
                .await?;
        }
        Ok(cards_page) => {
            bot.send_message(chat, cards_page_title(&cards_page, page, lang))
                .reply_markup(cards_page_keyboard(&cards_page, page, lang))
                .await?;
        }
        Err(err) => {
            bot.send_message(chat, backend_error_text(&err, lang))
                .await?;
        }
    }
    Ok(())
}

pub(super) fn cards_page_title(page: &CardsPage, current_page: u32, lang: Option<&str>) -> String {
    t_args_lang(
        "cards-page-title",
        &[
            ("page", &current_page.to_string()),
            ("pages", &page.total_pages.to_string()),
        ],
        lang,
    )
}

async fn handle_cards(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    lang: Option<&str>,
) -> Result<()> {
    let Some(view) = state
        .sessions
        .get(msg.chat.id)
        .await
        .and_then(|session| session.game)
    else {
        bot.send_message(msg.chat.id, t_lang("error-no-game", lang))
            .await?;
        return Ok(());
    };
    if view.status != GameStatus::Waiting {
        bot.send_message(msg.chat.id, t_lang("play-game-active", lang))
            .await?;
        return Ok(());
    }
    send_cards_page(bot, msg.chat.id, state, &view.game_id, 1, lang).await
}

async fn handle_my_cards(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    lang: Option<&str>,
) -> Result<()> {
    let Some(user_id) = registered_user(state, msg.chat.id).await else {
        bot.send_message(msg.chat.id, t_lang("error-not-registered", lang))
            .await?;
        return Ok(());
    };

    let session = state.sessions.get(msg.chat.id).await.unwrap_or_default();
    let local_cards = session
        .game
        .as_ref()
        .map(|view| view.cards.clone())
        .unwrap_or_default();

    let cards = if local_cards.is_empty() {
        match state.api.user_cards(&user_id).await {
            Ok(cards) => match session.game.as_ref() {
                Some(view) => cards
                    .into_iter()
                    .filter(|card| card.game_id == view.game_id)
                    .collect(),
                None => cards,
            },
            Err(err) => {
                bot.send_message(msg.chat.id, backend_error_text(&err, lang))
                    .await?;
                return Ok(());
            }
        }
    } else {
        local_cards
    };

    if cards.is_empty() {
        bot.send_message(msg.chat.id, t_lang("mycards-none", lang))
            .await?;
        return Ok(());
    }

    let mut text = t_args_lang(
        "mycards-title",
        &[("count", &cards.len().to_string())],
        lang,
    );
    for card in &cards {
        text.push_str("\n\n");
        text.push_str(&format_card(card, lang));
    }
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_balance(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    lang: Option<&str>,
) -> Result<()> {
    let Some(user_id) = registered_user(state, msg.chat.id).await else {
        bot.send_message(msg.chat.id, t_lang("error-not-registered", lang))
            .await?;
        return Ok(());
    };

    match state.api.balance(&user_id).await {
        Ok(balance) => {
            let mut text = format!(
                "*{}*\n{}",
                t_lang("balance-title", lang),
                t_args_lang(
                    "balance-line",
                    &[
                        ("available", &format_amount(balance.available)),
                        ("in_play", &format_amount(balance.in_play)),
                        ("total_won", &format_amount(balance.total_won)),
                    ],
                    lang
                ),
            );
            if let Some(address) = balance.wallet_address.as_deref() {
                text.push('\n');
                text.push_str(&t_args_lang(
                    "balance-wallet",
                    &[("address", address)],
                    lang,
                ));
            }
            bot.send_message(msg.chat.id, text).await?;
        }
        Err(err) => {
            bot.send_message(msg.chat.id, backend_error_text(&err, lang))
                .await?;
        }
    }
    Ok(())
}

async fn handle_stats(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    lang: Option<&str>,
) -> Result<()> {
    let Some(user_id) = registered_user(state, msg.chat.id).await else {
        bot.send_message(msg.chat.id, t_lang("error-not-registered", lang))
            .await?;
        return Ok(());
    };

    match state.api.user_stats(&user_id).await {
        Ok(stats) => {
            let mut text = format!(
                "*{}*\n{}",
                t_lang("stats-title", lang),
                t_args_lang(
                    "stats-line",
                    &[
                        ("played", &stats.games_played.to_string()),
                        ("won", &stats.games_won.to_string()),
                        ("rate", &format!("{:.1}", stats.win_rate)),
                        ("total", &format_amount(stats.total_won)),
                    ],
                    lang
                ),
            );
            if let (Some(rank), Some(level)) = (stats.rank, stats.level) {
                text.push('\n');
                text.push_str(&t_args_lang(
                    "stats-rank",
                    &[("rank", &rank.to_string()), ("level", &level.to_string())],
                    lang,
                ));
            }
            bot.send_message(msg.chat.id, text).await?;
        }
        Err(err) => {
            bot.send_message(msg.chat.id, backend_error_text(&err, lang))
                .await?;
        }
    }
    Ok(())
}

async fn handle_referral(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    lang: Option<&str>,
) -> Result<()> {
    let Some(user_id) = registered_user(state, msg.chat.id).await else {
        bot.send_message(msg.chat.id, t_lang("error-not-registered", lang))
            .await?;
        return Ok(());
    };

    match state.api.referral_info(&user_id).await {
        Ok(info) => {
            let text = format!(
                "*{}*\n{}",
                t_lang("referral-title", lang),
                t_args_lang(
                    "referral-line",
                    &[
                        ("code", &info.code),
                        ("count", &info.total_referrals.to_string()),
                        ("earned", &format_amount(info.total_earned)),
                    ],
                    lang
                ),
            );
            bot.send_message(msg.chat.id, text).await?;
        }
        Err(err) => {
            bot.send_message(msg.chat.id, backend_error_text(&err, lang))
                .await?;
        }
    }
    Ok(())
}

async fn handle_claim(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    lang: Option<&str>,
) -> Result<()> {
    let Some(user_id) = registered_user(state, msg.chat.id).await else {
        bot.send_message(msg.chat.id, t_lang("error-not-registered", lang))
            .await?;
        return Ok(());
    };
    let Some(view) = state
        .sessions
        .get(msg.chat.id)
        .await
        .and_then(|session| session.game)
    else {
        bot.send_message(msg.chat.id, t_lang("error-no-game", lang))
            .await?;
        return Ok(());
    };
    if view.finished {
        bot.send_message(msg.chat.id, t_lang("game-over", lang))
            .await?;
        return Ok(());
    }

    claim(bot, msg.chat.id, state, &user_id, &view.game_id, lang).await
}

/// Shared by /claim and the claim button. The backend verdict is final and
/// the call is never retried.
pub(super) async fn claim(
    bot: &Bot,
    chat: ChatId,
    state: &AppState,
    user_id: &str,
    game_id: &str,
    lang: Option<&str>,
) -> Result<()> {
    match state.api.claim_bingo(game_id, user_id).await {
        Ok(outcome) if outcome.success => {
            let amount = format_amount(outcome.amount.unwrap_or(0.0));
            info!(user_id = %chat, game_id = %game_id, amount = %amount, "Claim verified");
            bot.send_message(
                chat,
                t_args_lang("claim-success", &[("amount", &amount)], lang),
            )
            .await?;
        }
        Ok(_) => {
            info!(user_id = %chat, game_id = %game_id, "Claim rejected by backend");
            bot.send_message(chat, t_lang("claim-rejected", lang))
                .await?;
        }
        Err(err) => {
            warn!(user_id = %chat, error = %err, "Claim failed");
            bot.send_message(chat, backend_error_text(&err, lang))
                .await?;
        }
    }
    Ok(())
}

async fn registered_user(state: &AppState, chat: ChatId) -> Option<String> {
    state
        .sessions
        .get(chat)
        .await
        .and_then(|session| session.user_id)
}
