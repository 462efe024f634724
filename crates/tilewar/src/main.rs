use tilewar::{InMemoryMapStore, ServerConfig, TilewarError, TilewarServerBuilder};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), TilewarError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let store = match &config.maps_dir {
        Some(dir) => InMemoryMapStore::load_dir(dir)?,
        None => {
            tracing::warn!("TILEWAR_MAPS is not set, no maps are available");
            InMemoryMapStore::new()
        }
    };
    tracing::info!(maps = store.len(), bind = %config.bind, "starting server");

    let server = TilewarServerBuilder::from_config(&config).build(store).await?;
    server.run().await
}
