use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let images = OpenApiRouter::new()
        .routes(routes!(
            handlers::image::list_images,
            handlers::image::upload_image,
            handlers::image::delete_image
        ))
        .layer(handlers::image::upload_body_limit(
            config.storage.max_image_size,
        ));

    let uploads = OpenApiRouter::new().routes(routes!(handlers::image::serve_image));

    OpenApiRouter::new().nest("/images", images).merge(uploads)
}
