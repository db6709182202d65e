//! Parsing of REPL input lines.

use std::path::PathBuf;

/// A single line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    /// Send a prompt.
    Prompt(String),

    /// Run a REPL command.
    Command(Command),

    /// Nothing to do.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Show the current model, or switch to another one.
    Model(Option<String>),

    /// List the configured models.
    Models,

    /// Show the attention depth, or change it.
    Attention(Option<usize>),

    Redo,

    /// Export the conversation as Markdown.
    Export(Option<PathBuf>),

    /// Copy the `n`th turn (1-based), or the last one, to the clipboard.
    Copy(Option<usize>),

    /// Start or stop reading the last response aloud.
    Speak,

    /// Record a prompt by voice and send it.
    Listen,

    History,
    Help,
    Quit,
}

pub(crate) const HELP: &str = "\
Commands:
  /model [id]      show or switch the model
  /models          list configured models
  /attention [n]   show or set the number of prior turns sent as context
  /redo            send the last prompt again, replacing its turn
  /export [path]   write the conversation to a Markdown file
  /copy [n]        copy a turn to the clipboard (default: the last one)
  /speak           read the last response aloud, or stop reading
  /listen          speak a prompt instead of typing it (Ctrl-C stops)
  /history         list the turns of this conversation
  /help            show this message
  /quit            exit

Press Ctrl-C to abort a streaming response, or to exit when idle.";

/// Parse a line of input.
///
/// Lines starting with `/` are commands, anything else is a prompt.
pub(crate) fn parse(line: &str) -> Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }

    let Some(command) = line.strip_prefix('/') else {
        return Ok(Input::Prompt(line.to_owned()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (command, None),
    };

    let command = match name {
        "model" => Command::Model(arg.map(str::to_owned)),
        "models" => Command::Models,
        "attention" => Command::Attention(arg.map(parse_number).transpose()?),
        "redo" => Command::Redo,
        "export" => Command::Export(arg.map(PathBuf::from)),
        "copy" => Command::Copy(arg.map(parse_number).transpose()?),
        "speak" => Command::Speak,
        "listen" => Command::Listen,
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(format!("Unknown command `/{name}`, try `/help`.")),
    };

    Ok(Input::Command(command))
}

fn parse_number(arg: &str) -> Result<usize, String> {
    arg.parse()
        .map_err(|_| format!("Expected a non-negative number, got `{arg}`."))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_prompts() {
        assert_eq!(parse("  hi there \n"), Ok(Input::Prompt("hi there".to_owned())));
        assert_eq!(parse(" \t"), Ok(Input::Empty));
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse("/models"), Ok(Input::Command(Command::Models)));
        assert_eq!(
            parse("/model  @cf/meta/llama-3.1-8b-instruct "),
            Ok(Input::Command(Command::Model(Some(
                "@cf/meta/llama-3.1-8b-instruct".to_owned()
            ))))
        );
        assert_eq!(parse("/attention 3"), Ok(Input::Command(Command::Attention(Some(3)))));
        assert_eq!(parse("/attention"), Ok(Input::Command(Command::Attention(None))));
        assert_eq!(
            parse("/export notes/chat.md"),
            Ok(Input::Command(Command::Export(Some("notes/chat.md".into()))))
        );
        assert_eq!(parse("/copy 2"), Ok(Input::Command(Command::Copy(Some(2)))));
        assert_eq!(parse("/listen"), Ok(Input::Command(Command::Listen)));
        assert_eq!(parse("/exit"), Ok(Input::Command(Command::Quit)));
    }

    #[test]
    fn test_invalid_commands() {
        assert_matches!(parse("/attention -1"), Err(msg) if msg.contains("`-1`"));
        assert_matches!(parse("/nope"), Err(msg) if msg.contains("/nope"));
    }
}
