//! # Tilewar
//!
//! WebSocket server for Tilewar, a turn-based strategy game played on tile
//! maps.
//!
//! Clients speak JSON messages (see [`tilewar_protocol`]). Each room runs
//! as its own actor inside [`tilewar_room`]; this crate accepts
//! connections, assigns every connection a player id, and routes requests
//! to the [`RoomRegistry`](tilewar_room::RoomRegistry).
//!
//! ```rust,no_run
//! use tilewar::{InMemoryMapStore, TilewarServer};
//!
//! # async fn run() -> Result<(), tilewar::TilewarError> {
//! let store = InMemoryMapStore::load_dir("maps")?;
//! let server = TilewarServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(store)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;
mod store;
mod transport;

pub use config::{DEFAULT_BIND, ServerConfig};
pub use error::TilewarError;
pub use server::{TilewarServer, TilewarServerBuilder};
pub use store::{InMemoryMapStore, MapStore};
pub use transport::{TransportError, WebSocketConnection, WebSocketTransport};
