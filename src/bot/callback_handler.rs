//! Callback Handler module for inline keyboard queries: card-pool paging,
//! purchases and claims.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, MessageId};
use tracing::{debug, error, warn};

use crate::backend::CardChoice;
use crate::events::GameStatus;
use crate::localization::{t_args_lang, t_lang};

use super::message_handler::{cards_page_title, claim, CARDS_PAGE_SIZE};
use super::ui_builder::{backend_error_text, cards_page_keyboard, format_amount, format_card};
use super::AppState;

pub async fn callback_handler(bot: Bot, q: CallbackQuery, state: Arc<AppState>) -> Result<()> {
    let data = q.data.as_deref().unwrap_or("");
    let language_code = q.from.language_code.clone();
    let lang = language_code.as_deref();
    debug!(user_id = %q.from.id, data = %data, "Received callback query");

    if let Some(msg) = &q.message {
        let chat = msg.chat().id;
        if let Some(page) = data.strip_prefix("page:") {
            handle_page_nav(&bot, chat, msg.id(), &state, page, lang).await?;
        } else if let Some(choice) = data.strip_prefix("buy:") {
            handle_buy(&bot, chat, &state, choice, lang).await?;
        } else if data == "claim" {
            handle_claim_button(&bot, chat, &state, lang).await?;
        } else {
            debug!(user_id = %q.from.id, data = %data, "Ignoring unrecognized callback");
        }
    }

    // Answer the callback query to remove the loading state
    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn handle_page_nav(
    bot: &Bot,
    chat: ChatId,
    message_id: MessageId,
    state: &AppState,
    page_str: &str,
    lang: Option<&str>,
) -> Result<()> {
    let page: u32 = page_str.parse().unwrap_or(1);
    let Some(view) = state
        .sessions
        .get(chat)
        .await
        .and_then(|session| session.game)
    else {
        bot.send_message(chat, t_lang("error-no-game", lang)).await?;
        return Ok(());
    };

    match state
        .api
        .cards_page(&view.game_id, page, CARDS_PAGE_SIZE)
        .await
    {
        Ok(cards_page) => {
            let title = cards_page_title(&cards_page, page, lang);
            if let Err(err) = bot
                .edit_message_text(chat, message_id, title)
                .reply_markup(cards_page_keyboard(&cards_page, page, lang))
                .await
            {
                error!(user_id = %chat, error = %err, "Failed to edit card page message");
            }
        }
        Err(err) => {
            bot.send_message(chat, backend_error_text(&err, lang))
                .await?;
        }
    }
    Ok(())
}

async fn handle_buy(
    bot: &Bot,
    chat: ChatId,
    state: &AppState,
    choice_str: &str,
    lang: Option<&str>,
) -> Result<()> {
    let session = state.sessions.get(chat).await.unwrap_or_default();
    let Some(user_id) = session.user_id else {
        bot.send_message(chat, t_lang("error-not-registered", lang))
            .await?;
        return Ok(());
    };
    let Some(view) = session.game else {
        bot.send_message(chat, t_lang("error-no-game", lang)).await?;
        return Ok(());
    };
    if view.status != GameStatus::Waiting {
        // Sales close on the waiting -> active transition
        bot.send_message(chat, t_lang("play-game-active", lang))
            .await?;
        return Ok(());
    }

    let choice = if choice_str == "random" {
        CardChoice::Random
    } else {
        match choice_str.parse::<u32>() {
            Ok(number) => CardChoice::Number(number),
            Err(_) => {
                debug!(user_id = %chat, data = %choice_str, "Ignoring malformed buy callback");
                return Ok(());
            }
        }
    };

    match state.api.buy_card(&view.game_id, &user_id, choice).await {
        Ok(purchase) => {
            let rendered = format_card(&purchase.card, lang);
            let card_number = purchase.card.number;
            state
                .sessions
                .with(chat, |session| {
                    if let Some(view) = session.game.as_mut() {
                        view.cards.push(purchase.card.clone());
                    }
                })
                .await;
            debug!(user_id = %chat, card = card_number, "Card purchased");
            bot.send_message(
                chat,
                format!(
                    "{}\n\n{}",
                    t_args_lang(
                        "buy-success",
                        &[
                            ("number", &card_number.to_string()),
                            ("balance", &format_amount(purchase.new_balance)),
                        ],
                        lang
                    ),
                    rendered
                ),
            )
            .await?;
        }
        Err(err) => {
            warn!(user_id = %chat, error = %err, "Card purchase failed");
            bot.send_message(chat, backend_error_text(&err, lang))
                .await?;
        }
    }
    Ok(())
}

async fn handle_claim_button(
    bot: &Bot,
    chat: ChatId,
    state: &AppState,
    lang: Option<&str>,
) -> Result<()> {
    let session = state.sessions.get(chat).await.unwrap_or_default();
    let Some(user_id) = session.user_id else {
        bot.send_message(chat, t_lang("error-not-registered", lang))
            .await?;
        return Ok(());
    };
    let Some(view) = session.game else {
        bot.send_message(chat, t_lang("error-no-game", lang)).await?;
        return Ok(());
    };
    if view.finished {
        bot.send_message(chat, t_lang("game-over", lang)).await?;
        return Ok(());
    }

    claim(bot, chat, state, &user_id, &view.game_id, lang).await
}
