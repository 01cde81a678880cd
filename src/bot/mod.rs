//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `commands`: typed command vocabulary
//! - `message_handler`: command and plain-text message handling
//! - `callback_handler`: inline keyboard callbacks (paging, purchases, claims)
//! - `event_handler`: socket gateway event fan-out
//! - `ui_builder`: message rendering and keyboards

pub mod callback_handler;
pub mod commands;
pub mod event_handler;
pub mod message_handler;
pub mod ui_builder;

use tokio::sync::mpsc;

use crate::backend::BackendApi;
use crate::config::BotConfig;
use crate::session::SessionStore;
use crate::socket::GatewayCommand;

/// Shared state injected into every handler.
pub struct AppState {
    pub api: BackendApi,
    pub sessions: SessionStore,
    pub gateway: mpsc::Sender<GatewayCommand>,
    pub config: BotConfig,
}

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use commands::Command;
pub use event_handler::run_event_loop;
pub use message_handler::{command_handler, message_handler};
