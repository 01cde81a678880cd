use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::utils::command::BotCommands;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bingo_bot::backend::BackendApi;
use bingo_bot::bot::{self, AppState, Command};
use bingo_bot::config::BotConfig;
use bingo_bot::localization::init_localization;
use bingo_bot::session::SessionStore;
use bingo_bot::socket;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Bingo Telegram Bot");

    let config = BotConfig::from_env()?;
    init_localization()?;

    let api = BackendApi::new(&config.backend_url, config.retry.clone())?;
    let sessions = SessionStore::new();

    let (event_tx, event_rx) = mpsc::channel(256);
    let (gateway_tx, gateway_rx) = mpsc::channel(64);

    info!(gateway_url = %config.gateway_url, "Connecting to socket gateway");
    tokio::spawn(socket::run_gateway(
        config.gateway_url.clone(),
        event_tx,
        gateway_rx,
    ));

    let state = Arc::new(AppState {
        api,
        sessions,
        gateway: gateway_tx,
        config: config.clone(),
    });

    let bot = Bot::new(&config.bot_token);
    bot.set_my_commands(Command::bot_commands()).await?;

    tokio::spawn(bot::run_event_loop(
        bot.clone(),
        Arc::clone(&state),
        event_rx,
    ));

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint({
                    let state = Arc::clone(&state);
                    move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state);
                        async move { bot::command_handler(bot, msg, cmd, state).await }
                    }
                }),
        )
        .branch(Update::filter_message().endpoint({
            let state = Arc::clone(&state);
            move |bot: Bot, msg: Message| {
                let state = Arc::clone(&state);
                async move { bot::message_handler(bot, msg, state).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let state = Arc::clone(&state);
            move |bot: Bot, q: CallbackQuery| {
                let state = Arc::clone(&state);
                async move { bot::callback_handler(bot, q, state).await }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
