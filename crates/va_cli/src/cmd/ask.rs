use std::io;

use tracing::info;
use va_chat::Outcome;
use va_config::AppConfig;

use super::{forward_ctrl_c, new_chat};
use crate::{error::Result, term::TerminalRender};

#[derive(Debug, clap::Args)]
pub(crate) struct Args {
    /// The prompt to send.
    #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
    prompt: Vec<String>,
}

impl Args {
    pub(crate) async fn run(self, config: AppConfig) -> Result<()> {
        let mut chat = new_chat(&config);
        let mut render = TerminalRender::new(io::stdout());

        let (signal, _idle) = forward_ctrl_c(chat.abort_handle());
        let outcome = chat.submit(&self.prompt.join(" "), &mut render).await;
        signal.abort();

        if outcome? == Outcome::Aborted {
            info!("Request aborted.");
        }

        Ok(())
    }
}
