use songgen_core::Msg;

use super::constants::{CMD_DOWNLOAD, CMD_HELP, CMD_QUIT, CMD_RESET, COMMAND_PREFIX};

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Anything not starting with `:`; also blank lines.
    Prompt(String),
    Download,
    Reset,
    Quit,
    Help,
    Unknown(String),
}

impl InputCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(command) = line.trim_start().strip_prefix(COMMAND_PREFIX) else {
            return InputCommand::Prompt(line.to_string());
        };
        let command = command.trim().to_ascii_lowercase();
        if CMD_DOWNLOAD.contains(&command.as_str()) {
            InputCommand::Download
        } else if CMD_RESET.contains(&command.as_str()) {
            InputCommand::Reset
        } else if CMD_QUIT.contains(&command.as_str()) {
            InputCommand::Quit
        } else if CMD_HELP.contains(&command.as_str()) {
            InputCommand::Help
        } else {
            InputCommand::Unknown(command)
        }
    }

    /// Messages for the core; empty for commands handled by the front-end itself.
    pub fn into_msgs(self) -> Vec<Msg> {
        match self {
            InputCommand::Prompt(text) => vec![Msg::PromptChanged(text), Msg::GenerateClicked],
            InputCommand::Download => vec![Msg::DownloadClicked],
            InputCommand::Reset => vec![Msg::ResetClicked],
            InputCommand::Quit => vec![Msg::QuitRequested],
            InputCommand::Help | InputCommand::Unknown(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_prompts() {
        assert_eq!(
            InputCommand::parse("lofi beat\n"),
            InputCommand::Prompt("lofi beat".to_string())
        );
        assert_eq!(InputCommand::parse("   "), InputCommand::Prompt("   ".to_string()));
        assert_eq!(
            InputCommand::parse("lofi beat").into_msgs(),
            vec![
                Msg::PromptChanged("lofi beat".to_string()),
                Msg::GenerateClicked
            ]
        );
    }

    #[test]
    fn commands_accept_aliases_and_case() {
        assert_eq!(InputCommand::parse(":download"), InputCommand::Download);
        assert_eq!(InputCommand::parse("  :D \r\n"), InputCommand::Download);
        assert_eq!(InputCommand::parse(":r"), InputCommand::Reset);
        assert_eq!(InputCommand::parse(":exit"), InputCommand::Quit);
        assert_eq!(InputCommand::parse(":?"), InputCommand::Help);
        assert_eq!(
            InputCommand::parse(":play"),
            InputCommand::Unknown("play".to_string())
        );
    }

    #[test]
    fn front_end_commands_produce_no_msgs() {
        assert!(InputCommand::Help.into_msgs().is_empty());
        assert!(InputCommand::Unknown("x".into()).into_msgs().is_empty());
        assert_eq!(InputCommand::Quit.into_msgs(), vec![Msg::QuitRequested]);
    }
}
