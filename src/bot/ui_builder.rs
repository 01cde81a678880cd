//! UI Builder module for rendering messages and keyboards.
//!
//! All chat formatting lives here so the card model and win detector stay
//! free of presentation concerns.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::backend::CardsPage;
use crate::backend_errors::BackendError;
use crate::card::{Card, Letter, GRID_SIZE};
use crate::events::Game;
use crate::localization::{t_args_lang, t_lang};
use crate::win::WinPattern;

/// Escape characters Telegram's Markdown parser treats specially.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '_' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Credits formatted without trailing zeros for whole amounts.
pub fn format_amount(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Render a card as a monospace grid. Marked cells are bracketed, the FREE
/// cell is starred.
pub fn format_card(card: &Card, language_code: Option<&str>) -> String {
    let mut out = format!("Card #{}\n", card.number);
    out.push_str("```\n  B    I    N    G    O\n");
    for row in 0..GRID_SIZE {
        for column in 0..GRID_SIZE {
            let text = match card.cell(row, column) {
                Some(cell) if cell.free => "  *  ".to_string(),
                Some(cell) => {
                    let number = cell.number.unwrap_or(0);
                    if cell.called {
                        format!("[{number:2}] ")
                    } else {
                        format!(" {number:2}  ")
                    }
                }
                None => "  ?  ".to_string(),
            };
            out.push_str(&text);
        }
        out.push('\n');
    }
    out.push_str("```\n");
    out.push_str(&t_args_lang(
        "card-marked-count",
        &[("marked", &card.marked_count().to_string())],
        language_code,
    ));
    out
}

/// Status, pot, call count and remaining time for a game.
pub fn game_summary(game: &Game, language_code: Option<&str>) -> String {
    let mut lines = vec![
        t_args_lang(
            "game-status",
            &[("status", &game.status.to_string())],
            language_code,
        ),
        t_args_lang(
            "play-pot",
            &[("pot", &format_amount(game.pot))],
            language_code,
        ),
        t_args_lang(
            "game-calls",
            &[("count", &game.called_numbers.len().to_string())],
            language_code,
        ),
    ];
    if let Some(time_left) = game.time_left {
        lines.push(t_args_lang(
            "game-time-left",
            &[("seconds", &time_left.to_string())],
            language_code,
        ));
    }
    lines.join("\n")
}

/// Inline keyboard for one page of the card pool: number buttons in rows of
/// five, then a navigation row with a random-card shortcut.
pub fn cards_page_keyboard(
    page: &CardsPage,
    current_page: u32,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for chunk in page.cards.chunks(5) {
        rows.push(
            chunk
                .iter()
                .map(|listing| {
                    InlineKeyboardButton::callback(
                        format!("#{}", listing.number),
                        format!("buy:{}", listing.number),
                    )
                })
                .collect(),
        );
    }

    let mut nav = Vec::new();
    if current_page > 1 {
        nav.push(InlineKeyboardButton::callback(
            t_lang("prev-button", language_code),
            format!("page:{}", current_page - 1),
        ));
    }
    nav.push(InlineKeyboardButton::callback(
        t_lang("random-button", language_code),
        "buy:random".to_string(),
    ));
    if current_page < page.total_pages {
        nav.push(InlineKeyboardButton::callback(
            t_lang("next-button", language_code),
            format!("page:{}", current_page + 1),
        ));
    }
    rows.push(nav);

    InlineKeyboardMarkup::new(rows)
}

/// Single-button claim affordance.
pub fn claim_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t_lang("claim-button", language_code),
        "claim".to_string(),
    )]])
}

/// Link to the web client, when one is configured and its URL parses.
pub fn webapp_keyboard(
    web_app_url: &str,
    language_code: Option<&str>,
) -> Option<InlineKeyboardMarkup> {
    let url = reqwest::Url::parse(web_app_url).ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url(t_lang("webapp-button", language_code), url),
    ]]))
}

pub fn call_announcement(
    letter: Letter,
    number: u32,
    current_calls: u32,
    language_code: Option<&str>,
) -> String {
    t_args_lang(
        "event-number-called",
        &[
            ("letter", &letter.to_string()),
            ("number", &number.to_string()),
            ("count", &current_calls.to_string()),
        ],
        language_code,
    )
}

pub fn claimable_notice(
    card_number: u32,
    pattern: WinPattern,
    language_code: Option<&str>,
) -> String {
    t_args_lang(
        "event-claimable",
        &[
            ("card", &card_number.to_string()),
            ("pattern", &pattern.to_string()),
        ],
        language_code,
    )
}

/// The congratulation goes to the winning session only; everyone else sees
/// the opponent variant.
pub fn winner_message(
    username: &str,
    amount: f64,
    is_local_user: bool,
    language_code: Option<&str>,
) -> String {
    let amount = format_amount(amount);
    let username = escape_markdown(username);
    let key = if is_local_user {
        "event-winner-you"
    } else {
        "event-winner-opponent"
    };
    t_args_lang(
        key,
        &[("username", &username), ("amount", &amount)],
        language_code,
    )
}

/// User-facing text for a backend failure: domain rejections verbatim,
/// everything else a generic retry prompt.
pub fn backend_error_text(err: &BackendError, language_code: Option<&str>) -> String {
    match err {
        BackendError::Domain(msg) => escape_markdown(msg),
        _ => t_lang("error-backend-unreachable", language_code),
    }
}
