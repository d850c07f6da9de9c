use http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::routes::{health, market, portfolio, root, scrape, screener};
use crate::state::AppState;

pub fn create_app(state: AppState, client_urls: &[String]) -> Router {
    Router::<AppState>::new()
        .merge(root::router())
        .nest("/health", health::router())
        .nest("/portfolio", portfolio::router())
        .nest("/market", market::router())
        .nest("/scrape", scrape::router())
        .nest("/screener", screener::router())
        .layer(cors_layer(client_urls))
        .with_state(state)
}

/// Any origin when none are configured (or `*` is), otherwise the listed
/// origins with credentials allowed.
fn cors_layer(client_urls: &[String]) -> CorsLayer {
    if client_urls.is_empty() || client_urls.iter().any(|u| u == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = client_urls
        .iter()
        .filter_map(|u| match HeaderValue::from_str(u) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CLIENT_URL origin: {}", u);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
