//! Terminal front end: response rendering, clipboard and speech.

use std::{io::Write, process::Stdio};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use crossterm::style::Stylize as _;
use tokio::{
    io::AsyncWriteExt as _,
    process::{Child, Command},
};
use tracing::{debug, warn};
use va_chat::{Notice, Render};
use va_config::SpeechConfig;
use va_conversation::Turn;

use crate::error::{Error, Result};

/// Renders streamed responses to a terminal.
///
/// [`Render::update`] receives the full text every time, only the new suffix
/// is written. Priming turns are not shown.
pub(crate) struct TerminalRender<W> {
    out: W,
    printed: usize,
    hidden: bool,
}

impl<W: Write> TerminalRender<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            printed: 0,
            hidden: false,
        }
    }

    fn write(&mut self, text: &str) {
        if let Err(error) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
        {
            warn!(%error, "Failed to write to terminal.");
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Render for TerminalRender<W> {
    fn begin(&mut self, turn: &Turn) {
        self.printed = 0;
        self.hidden = turn.is_priming();
    }

    fn update(&mut self, text: &str) {
        if self.hidden {
            return;
        }

        // Deltas only ever append, but never slice past a char boundary.
        if let Some(suffix) = text.get(self.printed..) {
            self.write(suffix);
        }
        self.printed = text.len();
    }

    fn notice(&mut self, notice: Notice) {
        let message = match notice {
            Notice::PrimingSent => "(sending agreement prompt)\n",
            Notice::PrimingAccepted => "(agreement accepted)\n",
            Notice::Aborted => " [aborted]",
        };

        self.write(&message.dark_grey().to_string());
    }

    fn finish(&mut self, turn: &Turn) {
        if !turn.is_priming() {
            self.write("\n\n");
        }
    }
}

/// The OSC 52 escape sequence placing `text` on the terminal's clipboard.
pub(crate) fn osc52(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

/// Reads text aloud with an external program.
pub(crate) struct Speaker {
    config: SpeechConfig,
    child: Option<Child>,
}

impl Speaker {
    pub(crate) fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }

    /// Whether the speech program is still running.
    pub(crate) fn is_speaking(&mut self) -> bool {
        match &mut self.child {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Stop speaking if the program runs, otherwise start speaking `text`.
    ///
    /// Returns whether speech was started.
    pub(crate) async fn toggle(&mut self, text: &str) -> Result<bool> {
        if self.is_speaking() {
            self.stop().await;
            return Ok(false);
        }

        self.start(text).await?;
        Ok(true)
    }

    async fn start(&mut self, text: &str) -> Result<()> {
        let error = |error: std::io::Error| Error::Speech {
            program: self.config.program.clone(),
            error,
        };

        debug!(program = %self.config.program, args = ?self.config.args, "Starting speech.");
        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await.map_err(error)?;
        }

        self.child = Some(child);
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!("Stopping speech.");
            if let Err(error) = child.kill().await {
                warn!(%error, "Failed to stop speech program.");
            }
        }
    }
}

/// Turns speech into a prompt with an external program.
pub(crate) struct Listener {
    program: String,
    args: Vec<String>,
}

impl Listener {
    /// A listener for the configured program, if there is one.
    pub(crate) fn from_config(config: &SpeechConfig) -> Option<Self> {
        let program = config.listen_program.clone().filter(|p| !p.is_empty())?;

        Some(Self {
            program,
            args: config.listen_args.clone(),
        })
    }

    /// Run the program until it exits or `cancel` completes.
    ///
    /// Returns the trimmed text the program printed. `None` if it was
    /// cancelled, failed or printed nothing.
    pub(crate) async fn listen(
        &self,
        cancel: impl Future<Output = ()>,
    ) -> Result<Option<String>> {
        let error = |error: std::io::Error| Error::Speech {
            program: self.program.clone(),
            error,
        };

        debug!(program = %self.program, args = ?self.args, "Starting speech recognition.");
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(error)?;

        // Dropping the child on cancellation kills the program.
        let output = tokio::select! {
            biased;
            () = cancel => {
                debug!("Speech recognition cancelled.");
                return Ok(None);
            }
            output = child.wait_with_output() => output.map_err(error)?,
        };

        if !output.status.success() {
            warn!(status = %output.status, "Speech recognition program failed.");
            return Ok(None);
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        Ok(Some(text).filter(|text| !text.is_empty()))
    }
}
