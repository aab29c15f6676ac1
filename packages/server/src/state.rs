use std::sync::Arc;

use crate::config::AppConfig;
use crate::gallery::GalleryService;

#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<GalleryService>,
    pub config: AppConfig,
}
