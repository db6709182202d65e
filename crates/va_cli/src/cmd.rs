mod ask;
mod chat;
mod serve;

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;
use va_chat::{AbortHandle, AgreementGate, Chat, Session};
use va_client::Client;
use va_config::AppConfig;

use crate::error::Result;

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Commands {
    /// Start an interactive chat (default).
    Chat(chat::Args),

    /// Send a single prompt and print the response.
    Ask(ask::Args),

    /// Run the edge proxy.
    Serve(serve::Args),
}

impl Default for Commands {
    fn default() -> Self {
        Self::Chat(chat::Args::default())
    }
}

impl Commands {
    pub(crate) async fn run(self, config: AppConfig) -> Result<()> {
        match self {
            Self::Chat(args) => args.run(config).await,
            Self::Ask(args) => args.run(config).await,
            Self::Serve(args) => args.run(config).await,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Chat(_) => "chat",
            Self::Ask(_) => "ask",
            Self::Serve(_) => "serve",
        }
    }
}

/// Create a chat from the configuration.
fn new_chat(config: &AppConfig) -> Chat<Client> {
    let session = Session::new(config.model.clone()).with_attention(config.attention);
    let gate = AgreementGate::from(&config.agreement);

    let mut client = Client::new(config.endpoint.clone());
    if let Some(api_key) = &config.api_key {
        client = client.with_api_key(api_key.clone());
    }

    Chat::new(client, session, gate)
}

/// Forward Ctrl-C presses to `handle`, aborting the running request.
///
/// Presses while no request is running are reported on the returned channel.
fn forward_ctrl_c(handle: AbortHandle) -> (JoinHandle<()>, mpsc::UnboundedReceiver<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if handle.abort() {
                continue;
            }

            debug!("Received Ctrl-C while idle.");
            if tx.send(()).is_err() {
                break;
            }
        }
    });

    (task, rx)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_new_chat_from_config() {
        let mut config = va_config::load_from_str("").unwrap();
        config
            .apply_overrides(&["model=m", "attention=2", "api_key="])
            .unwrap();

        let chat = new_chat(&config);
        assert_eq!(chat.session().model, "m");
        assert_eq!(chat.session().attention, 2);
        assert_eq!(chat.backend().api_key, None);

        config.apply_overrides(&["api_key=secret"]).unwrap();
        assert_eq!(new_chat(&config).backend().api_key.as_deref(), Some("secret"));
    }
}
