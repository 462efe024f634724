//! `TilewarServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room registry.

use std::sync::Arc;

use tilewar_protocol::JsonCodec;
use tilewar_room::{GameConfig, RoomRegistry};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{DEFAULT_BIND, MapStore, ServerConfig, TilewarError, WebSocketTransport};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S: MapStore> {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) store: S,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Tilewar server.
///
/// ```rust,ignore
/// let server = TilewarServer::builder()
///     .bind("0.0.0.0:8080")
///     .config(GameConfig::default())
///     .build(store)
///     .await?;
/// server.run().await
/// ```
pub struct TilewarServerBuilder {
    bind_addr: String,
    config: GameConfig,
}

impl TilewarServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            config: GameConfig::default(),
        }
    }

    /// Takes bind address and game settings from a [`ServerConfig`].
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new().bind(&config.bind).config(config.game.clone())
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the settings every room is created with.
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener. Maps for new rooms come from `store`.
    pub async fn build<S: MapStore>(self, store: S) -> Result<TilewarServer<S>, TilewarError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(self.config)),
            store,
            codec: JsonCodec,
        });
        Ok(TilewarServer { transport, state })
    }
}

impl Default for TilewarServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Tilewar server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TilewarServer<S: MapStore> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S>>,
}

impl TilewarServer<crate::InMemoryMapStore> {
    pub fn builder() -> TilewarServerBuilder {
        TilewarServerBuilder::new()
    }
}

impl<S: MapStore> TilewarServer<S> {
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process ends, one handler task per
    /// connection.
    pub async fn run(self) -> Result<(), TilewarError> {
        tracing::info!("Tilewar server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
