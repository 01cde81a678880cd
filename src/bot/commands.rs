//! Typed command vocabulary for the bot.
//!
//! Commands are an enum matched exhaustively in the message handler, so
//! adding a command is a compile-time-checked change.

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Bingo bot commands:")]
pub enum Command {
    #[command(description = "register and show the welcome menu")]
    Start(String),
    #[command(description = "how the bot works")]
    Help,
    #[command(description = "join the current game")]
    Play,
    #[command(description = "browse the cards for sale")]
    Cards,
    #[command(description = "your cards in the current game")]
    Mycards,
    #[command(description = "your balance")]
    Balance,
    #[command(description = "your playing statistics")]
    Stats,
    #[command(description = "your referral code")]
    Referral,
    #[command(description = "claim bingo")]
    Claim,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parse() {
        assert_eq!(
            Command::parse("/play", "bingobot").unwrap(),
            Command::Play
        );
        assert_eq!(
            Command::parse("/start ref-42", "bingobot").unwrap(),
            Command::Start("ref-42".to_string())
        );
        assert_eq!(
            Command::parse("/mycards@bingobot", "bingobot").unwrap(),
            Command::Mycards
        );
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        assert!(Command::parse("/jackpot", "bingobot").is_err());
    }
}
