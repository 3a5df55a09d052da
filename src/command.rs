//! Colon commands typed into the scratchpad

use crate::ai::Action;

/// Help information for a command
#[derive(Debug, Clone)]
pub struct CommandHelp {
    pub name: &'static str,
    pub description: &'static str,
}

/// Parsed command from user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedCommand {
    Run(Action),
    Show,
    Clear,
    Help,
    Quit,
}

/// One line of scratchpad input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PadInput<'a> {
    Command(ParsedCommand),
    Unknown(&'a str),
    Text(&'a str),
}

/// Classify a line: `:`-prefixed lines are commands, anything else is text.
///
/// A leading `::` escapes a literal colon into the pad. Leading whitespace
/// is ignored for both, and dropped from escaped lines.
pub fn parse_line(line: &str) -> PadInput<'_> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("::") {
        return PadInput::Text(&trimmed[1..]);
    }
    match trimmed.strip_prefix(':') {
        Some(cmd) => match parse_command(cmd) {
            Some(parsed) => PadInput::Command(parsed),
            None => PadInput::Unknown(cmd.trim()),
        },
        None => PadInput::Text(line),
    }
}

/// Parse a command string into a ParsedCommand
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    match input.trim() {
        "summarize" | "summary" | "s" => Some(ParsedCommand::Run(Action::Summarize)),
        "bullets" | "bullet-points" | "b" => Some(ParsedCommand::Run(Action::BulletPoints)),
        "tidy" | "t" => Some(ParsedCommand::Run(Action::Tidy)),
        "show" | "p" => Some(ParsedCommand::Show),
        "clear" | "c" => Some(ParsedCommand::Clear),
        "help" | "h" | "?" => Some(ParsedCommand::Help),
        "q" | "quit" | "exit" => Some(ParsedCommand::Quit),
        _ => None,
    }
}

/// Get all available commands for help display
pub fn available_commands() -> Vec<CommandHelp> {
    vec![
        CommandHelp {
            name: ":summarize",
            description: "Summarize the pad",
        },
        CommandHelp {
            name: ":bullets",
            description: "Turn the pad into bullet points",
        },
        CommandHelp {
            name: ":tidy",
            description: "Fix spelling, grammar and formatting (replaces the pad)",
        },
        CommandHelp {
            name: ":show",
            description: "Print the current pad",
        },
        CommandHelp {
            name: ":clear",
            description: "Empty the pad",
        },
        CommandHelp {
            name: ":help",
            description: "Show this help message",
        },
        CommandHelp {
            name: ":quit",
            description: "Exit the scratchpad",
        },
    ]
}
