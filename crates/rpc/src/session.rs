//! Session-scoped gateway handle.

use anyhow::Result;
use tokio::sync::OnceCell;
use tracing::info;

use crate::client::GatewayClient;
use crate::config::ShellConfig;

/// Lazily created, session-scoped handle to the gateway connection.
///
/// The client is constructed at most once, on the first command that needs
/// it, and reused for every subsequent command in the session. There is no
/// explicit teardown beyond the session ending. Construction failures are
/// not cached: a later command retries the construction.
pub struct GatewaySession {
    config: ShellConfig,
    client: OnceCell<GatewayClient>,
}

impl GatewaySession {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// The gateway operations handle, created on first use.
    pub async fn ops(&self) -> Result<&GatewayClient> {
        self.client
            .get_or_try_init(|| async {
                let client = GatewayClient::new(&self.config)?;
                info!(address = %self.config.address, "gateway connection established");
                Ok(client)
            })
            .await
    }
}
