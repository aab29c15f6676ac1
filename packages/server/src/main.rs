use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{Level, info};

use common::storage::FilesystemBlobStore;
use server::config::AppConfig;
use server::gallery::GalleryService;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let store = FilesystemBlobStore::new(
        config.storage.upload_dir.clone(),
        config.storage.max_image_size,
    )
    .await?;
    info!("Serving images from {}", config.storage.upload_dir.display());

    let state = AppState {
        gallery: Arc::new(GalleryService::new(
            Arc::new(store),
            config.storage.max_image_size,
        )),
        config: config.clone(),
    };

    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
