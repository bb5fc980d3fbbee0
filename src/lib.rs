pub mod config;
pub mod observer;
pub mod server;

use std::sync::Arc;

use self::{config::Config, observer::EchoObserver};

/// In order to let the integration test directly use the ws-server crate and
/// start the server, a function is opened to replace the main function to
/// directly start the server.
pub async fn startup(config: Arc<Config>) -> anyhow::Result<()> {
    server::run(config, EchoObserver).await?;

    // The websocket server is non-blocking after it runs and needs to be
    // kept from exiting immediately.
    std::future::pending::<()>().await;

    Ok(())
}
