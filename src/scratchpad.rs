//! Line-oriented terminal scratchpad
//!
//! Text lines accumulate in the pad; `:`-commands run an action on the whole
//! pad. Each action is awaited before the next line is read, so at most one
//! request is in flight.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::ai::{Action, AiService};
use crate::command::{PadInput, ParsedCommand, available_commands, parse_line};

/// The text being edited
#[derive(Debug, Default)]
pub struct Pad {
    text: String,
}

impl Pad {
    pub fn push_line(&mut self, line: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(line);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn replace(&mut self, text: String) {
        self.text = text;
    }
}

fn print_help(out: &mut impl Write) -> Result<()> {
    writeln!(out, "Type text to add it to the pad. Commands:")?;
    for help in available_commands() {
        writeln!(out, "  {:<12} {}", help.name, help.description)?;
    }
    Ok(())
}

/// Strip the line ending; invalid UTF-8 is replaced and returned as `Err`.
fn decode_line(bytes: &[u8]) -> Result<String, String> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(line) => Ok(line.to_string()),
        Err(_) => Err(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Run the scratchpad until `:quit` or end of input.
pub async fn run<R, W>(service: &AiService, mut input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut pad = Pad::default();
    let mut buf = Vec::new();

    writeln!(out, "AI Scratchpad (:help for commands)")?;

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = match decode_line(&buf) {
            Ok(line) => line,
            Err(line) => {
                tracing::warn!("Input line is not valid UTF-8");
                writeln!(out, "Warning: invalid UTF-8 in input was replaced.")?;
                line
            }
        };

        match parse_line(&line) {
            PadInput::Text(text) => pad.push_line(text),
            PadInput::Unknown(cmd) => {
                writeln!(out, "Unknown command: :{} (try :help)", cmd)?;
            }
            PadInput::Command(ParsedCommand::Quit) => break,
            PadInput::Command(ParsedCommand::Help) => print_help(out)?,
            PadInput::Command(ParsedCommand::Show) => {
                writeln!(out, "{}", pad.text())?;
            }
            PadInput::Command(ParsedCommand::Clear) => {
                pad.clear();
                writeln!(out, "Pad cleared.")?;
            }
            PadInput::Command(ParsedCommand::Run(action)) => {
                if pad.is_blank() {
                    writeln!(out, "Cannot run {}: the pad is empty.", action)?;
                    continue;
                }

                writeln!(out, "Running {}...", action)?;
                out.flush()?;

                match service.generate(action, pad.text()).await {
                    Ok(Some(result)) => {
                        writeln!(out, "{}", result)?;
                        if action == Action::Tidy {
                            pad.replace(result);
                        }
                    }
                    // Fallback text is shown but never becomes pad content
                    Ok(None) => writeln!(out, "{}", action.fallback())?,
                    // Errors are shown and the pad is left untouched
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
            }
        }
        out.flush()?;
    }

    Ok(())
}
