use std::{
    io::{self, Stdout, Write as _},
    path::{Path, PathBuf},
};

use chrono::{Local, Utc};
use crossterm::style::Stylize as _;
use tokio::{
    io::{AsyncBufReadExt as _, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use va_chat::{Chat, Outcome};
use va_client::Client;
use va_config::AppConfig;
use va_conversation::{Turn, export};

use super::{forward_ctrl_c, new_chat};
use crate::{
    error::{Error, Result},
    parser::{self, Command, HELP, Input},
    term::{Listener, Speaker, TerminalRender, osc52},
};

#[derive(Debug, Default, clap::Args)]
pub(crate) struct Args {}

impl Args {
    pub(crate) async fn run(self, config: AppConfig) -> Result<()> {
        let mut repl = Repl {
            chat: new_chat(&config),
            render: TerminalRender::new(io::stdout()),
            listener: Listener::from_config(&config.speech),
            speaker: Speaker::new(config.speech.clone()),
            models: config.models,
        };

        let (signal, mut idle) = forward_ctrl_c(repl.chat.abort_handle());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        repl.say(&format!(
            "Chatting with {}. Type /help for commands.",
            repl.chat.session().model
        ))?;

        loop {
            repl.prompt()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = idle.recv() => None,
            };

            let Some(line) = line else {
                break;
            };

            match parser::parse(&line) {
                Ok(Input::Empty) => {}
                Ok(Input::Prompt(prompt)) => {
                    let result = repl.chat.submit(&prompt, &mut repl.render).await;
                    repl.report(result)?;
                }
                Ok(Input::Command(Command::Quit)) => break,
                Ok(Input::Command(Command::Listen)) => {
                    if let Some(prompt) = repl.listen(&mut idle).await? {
                        let result = repl.chat.submit(&prompt, &mut repl.render).await;
                        repl.report(result)?;
                    }
                }
                Ok(Input::Command(command)) => repl.command(command).await?,
                Err(message) => repl.say(&message)?,
            }
        }

        signal.abort();
        writeln!(io::stdout())?;

        Ok(())
    }
}

struct Repl {
    chat: Chat<Client>,
    render: TerminalRender<Stdout>,
    speaker: Speaker,
    listener: Option<Listener>,
    models: Vec<String>,
}

impl Repl {
    fn say(&self, message: &str) -> Result<()> {
        writeln!(io::stdout(), "{}", message.dark_grey()).map_err(Into::into)
    }

    fn prompt(&self) -> Result<()> {
        let mut out = io::stdout();
        write!(out, "{} ", ">".bold())?;
        out.flush().map_err(Into::into)
    }

    /// Print a failed request, which does not end the session.
    fn report(&self, result: std::result::Result<Outcome, va_chat::Error>) -> Result<()> {
        match result {
            Ok(_) => Ok(()),
            Err(error) => {
                warn!(%error, "Request failed.");
                writeln!(io::stdout(), "{}\n", error.to_string().red()).map_err(Into::into)
            }
        }
    }

    /// Record a prompt by voice. Ctrl-C stops listening.
    async fn listen(&self, idle: &mut mpsc::UnboundedReceiver<()>) -> Result<Option<String>> {
        let Some(listener) = &self.listener else {
            self.say("No speech recognition program configured, set `speech.listen_program`.")?;
            return Ok(None);
        };

        self.say("Listening, press Ctrl-C to stop.")?;
        let cancel = async {
            idle.recv().await;
        };

        match listener.listen(cancel).await {
            Ok(Some(prompt)) => {
                writeln!(io::stdout(), "{} {prompt}", ">".bold())?;
                Ok(Some(prompt))
            }
            Ok(None) => {
                self.say("Nothing heard.")?;
                Ok(None)
            }
            Err(error @ Error::Speech { .. }) => {
                self.say(&error.to_string())?;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Model(None) => self.say(&self.chat.session().model),
            Command::Model(Some(model)) => {
                if !self.models.contains(&model) {
                    warn!(%model, "Model is not in the configured list.");
                }

                self.chat.select_model(model);
                self.say(&format!("Switched to {}.", self.chat.session().model))
            }
            Command::Models => {
                let current = &self.chat.session().model;
                let list = self
                    .models
                    .iter()
                    .map(|m| {
                        let marker = if m == current { '*' } else { ' ' };
                        format!("{marker} {m}")
                    })
                    .collect::<Vec<_>>()
                    .join("\n");

                self.say(&list)
            }
            Command::Attention(None) => {
                self.say(&format!("Attention: {}", self.chat.session().attention))
            }
            Command::Attention(Some(depth)) => {
                self.chat.set_attention(depth);
                self.say(&format!("Attention set to {depth}."))
            }
            Command::Redo => {
                let result = self.chat.redo(&mut self.render).await;
                if matches!(result, Ok(Outcome::Ignored)) {
                    return self.say("Nothing to redo.");
                }

                self.report(result)
            }
            Command::Export(path) => {
                let path = export_path(path.as_deref());
                let markdown = export::to_markdown(self.chat.history().all());
                std::fs::write(&path, markdown)?;

                info!(path = %path.display(), "Exported conversation.");
                self.say(&format!("Exported to {}.", path.display()))
            }
            Command::Copy(index) => {
                let Some(turn) = self.visible_turn(index) else {
                    return self.say("No such turn.");
                };

                let mut out = io::stdout();
                write!(out, "{}", osc52(&turn.to_markdown()))?;
                out.flush()?;

                self.say("Copied to clipboard.")
            }
            Command::Speak => {
                let text = self
                    .visible_turn(None)
                    .map(|turn| turn.response().to_owned())
                    .unwrap_or_default();

                if text.is_empty() && !self.speaker.is_speaking() {
                    return self.say("Nothing to read.");
                }

                match self.speaker.toggle(&text).await {
                    Ok(true) => self.say("Speaking."),
                    Ok(false) => self.say("Stopped speaking."),
                    Err(error @ Error::Speech { .. }) => self.say(&error.to_string()),
                    Err(error) => Err(error),
                }
            }
            Command::History => {
                let lines = self
                    .visible_turns()
                    .enumerate()
                    .map(|(i, turn)| history_line(i + 1, turn))
                    .collect::<Vec<_>>();

                if lines.is_empty() {
                    return self.say("No turns yet.");
                }

                self.say(&lines.join("\n"))
            }
            Command::Help => self.say(HELP),
            Command::Listen | Command::Quit => Ok(()),
        }
    }

    /// Turns shown in the transcript, skipping priming turns.
    fn visible_turns(&self) -> impl Iterator<Item = &Turn> {
        self.chat.history().all().iter().filter(|t| !t.is_priming())
    }

    /// The `index`th visible turn (1-based), or the last one.
    fn visible_turn(&self, index: Option<usize>) -> Option<&Turn> {
        match index {
            Some(index) => self.visible_turns().nth(index.checked_sub(1)?),
            None => self.visible_turns().last(),
        }
    }
}

/// One `/history` entry, stamped with the local time the turn was sent.
fn history_line(number: usize, turn: &Turn) -> String {
    let time = turn.timestamp().with_timezone(&Local).format("%H:%M:%S");
    let outcome = turn.outcome().map(|o| o.to_string()).unwrap_or_default();

    format!(
        "{number:>3}. {time} [{}] {} ({outcome})",
        turn.model(),
        turn.prompt()
    )
}

/// Where to write an export: `path` itself, or a timestamped file inside it
/// if it is a directory, or in the working directory.
fn export_path(path: Option<&Path>) -> PathBuf {
    let file_name = export::file_name(Utc::now());

    match path {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}
