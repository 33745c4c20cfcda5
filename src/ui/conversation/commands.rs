use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Show help
    Help,
    /// Leave the chat
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Help => "show available commands and keys",
            SlashCommand::Quit => "leave the chat",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input.
///
/// Unknown `/words` are not commands and go to the assistant as plain text.
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let args: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(&head).ok().or_else(|| match head.as_str() {
        "h" | "?" => Some(SlashCommand::Help),
        "q" | "exit" | "bye" => Some(SlashCommand::Quit),
        _ => None,
    })?;

    let argument = if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n");
    for command in SlashCommand::iter() {
        help.push_str(&format!("  /{} - {}\n", command.command(), command.description()));
    }

    help.push_str("Aliases: /h or /? for /help, /q, /exit or /bye for /quit.\n");
    help.push_str("Keys: Enter sends, Shift+Enter adds a line, PageUp/PageDown scroll, Esc quits.");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands_and_aliases() {
        assert_eq!(parse_slash_command("/help").unwrap().command, SlashCommand::Help);
        assert_eq!(parse_slash_command("/?").unwrap().command, SlashCommand::Help);
        assert_eq!(parse_slash_command("  /QUIT ").unwrap().command, SlashCommand::Quit);
        assert_eq!(parse_slash_command("/bye").unwrap().command, SlashCommand::Quit);
    }

    #[test]
    fn keeps_trailing_argument() {
        let parsed = parse_slash_command("/help me  please").unwrap();
        assert_eq!(parsed.argument.as_deref(), Some("me please"));
    }

    #[test]
    fn plain_and_unknown_text_is_not_a_command() {
        assert!(parse_slash_command("hello /help").is_none());
        assert!(parse_slash_command("/pricing plans?").is_none());
        assert!(parse_slash_command("/").is_none());
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for command in SlashCommand::iter() {
            assert!(help.contains(&format!("/{}", command.command())));
        }
    }
}
