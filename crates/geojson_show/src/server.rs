use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use geojson::FeatureCollection;
use include_dir::{include_dir, Dir};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::error;

use crate::map::{MapConfig, TileMount};

static WWW: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/www");

#[derive(Clone)]
struct AppState {
    features: Arc<FeatureCollection>,
    map_config: Arc<MapConfig>,
}

/// Builds the full HTTP surface. The tile mount, when present, must be
/// registered here, before the listener starts accepting connections.
pub fn app(
    features: FeatureCollection,
    map_config: MapConfig,
    tile_mount: Option<&TileMount>,
) -> Router {
    let state = AppState {
        features: Arc::new(features),
        map_config: Arc::new(map_config),
    };

    let mut router = Router::new()
        .route("/features.geojson", get(features_handler))
        .route("/map.json", get(map_config_handler));

    if let Some(mount) = tile_mount {
        router = router.route_service(mount.route.as_str(), ServeDir::new(&mount.dir));
    }

    router.fallback(asset_handler).with_state(state)
}

async fn features_handler(State(state): State<AppState>) -> Response {
    match serde_json::to_vec(state.features.as_ref()) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode feature collection");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

async fn map_config_handler(State(state): State<AppState>) -> Response {
    match serde_json::to_vec(state.map_config.as_ref()) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode map config");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

async fn asset_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match WWW.get_file(path) {
        Some(file) => (
            [(header::CONTENT_TYPE, content_type(path))],
            file.contents(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") | Some("geojson") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub async fn spawn_test_server(router: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (addr, handle)
}
