use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::gateway::Gateway;
use crate::http::connection::Connection;

/// Binds the listener, fires `on_ready` with the bound address, then serves
/// until the accept loop fails.
///
/// `on_ready` runs on the accept task and must not block; anything slow
/// belongs in a task it spawns.
pub async fn run<F>(listen_addr: &str, gateway: Arc<Gateway>, on_ready: F) -> anyhow::Result<()>
where
    F: FnOnce(SocketAddr),
{
    let listener = TcpListener::bind(listen_addr).await?;
    let local_addr = listener.local_addr()?;
    info!("Listening on {}", local_addr);

    on_ready(local_addr);

    serve(listener, gateway).await
}

/// Accept loop: one task per connection, all sharing the same gateway.
pub async fn serve(listener: TcpListener, gateway: Arc<Gateway>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        debug!("Accepted connection from {}", peer);

        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, gateway);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
