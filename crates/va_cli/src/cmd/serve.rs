use tracing::info;
use va_config::AppConfig;

use crate::error::Result;

#[derive(Debug, clap::Args)]
pub(crate) struct Args {
    /// Address to listen on, overriding `proxy.listen`.
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,
}

impl Args {
    pub(crate) async fn run(self, config: AppConfig) -> Result<()> {
        let mut proxy = config.proxy;
        if let Some(listen) = self.listen {
            proxy.listen = listen;
        }

        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, shutting down.");
            }
        };

        va_proxy::serve(proxy, shutdown).await.map_err(Into::into)
    }
}
