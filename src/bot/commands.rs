//! Bot commands.

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "how to use the bot")]
    Start,
    #[command(description = "remaining credits")]
    Balance,
    #[command(description = "toggle vocal-free mode")]
    Instrumental,
}

pub const HELP_TEXT: &str = "\
🎵 *Hi! I turn text descriptions into songs with Suno AI.*

*How to use:*
Just send me a song description. For example:
• \"a sad indie-rock song about a breakup\"
• \"upbeat jazz about a morning in Paris\"
• \"an epic soundtrack for a fantasy game\"

Generation takes ~1-2 minutes. I'll send the finished tracks.

*Commands:*
/balance — remaining credits
/instrumental — toggle vocal-free mode (instrumental)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parse() {
        assert_eq!(Command::parse("/start", "testbot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/balance", "testbot").unwrap(), Command::Balance);
        assert_eq!(Command::parse("/instrumental", "testbot").unwrap(), Command::Instrumental);
        assert!(Command::parse("a sad song about rain", "testbot").is_err());
    }
}
