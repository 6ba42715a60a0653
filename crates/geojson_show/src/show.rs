use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use geojson::Feature;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::browser::Browser;
use crate::error::ShowError;
use crate::features::into_collection;
use crate::map::{resolve_map_config, MapProvider, LEAFLET_OSM_TILE_URL};
use crate::server;
use crate::style::LeafletStyle;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct RunOptions {
    pub map_provider: MapProvider,
    pub map_tile_uri: String,
    pub protomaps_theme: String,
    pub port: u16,
    pub features: Vec<Feature>,
    pub style: Option<LeafletStyle>,
    pub point_style: Option<LeafletStyle>,
    pub label_properties: Vec<String>,
    pub browser: Browser,
    /// Cancelled by the interrupt handler. Cancelling it from any other task
    /// shuts the server down the same way.
    pub shutdown: CancellationToken,
    /// Bound on the graceful drain once shutdown has been requested.
    pub drain_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            map_provider: MapProvider::Leaflet,
            map_tile_uri: LEAFLET_OSM_TILE_URL.to_string(),
            protomaps_theme: "white".to_string(),
            port: 0,
            features: Vec::new(),
            style: None,
            point_style: None,
            label_properties: Vec::new(),
            browser: Browser::Null(Default::default()),
            shutdown: CancellationToken::new(),
            drain_timeout: Duration::from_secs(10),
        }
    }
}

/// A configured server holding its bound listener. Binding once and keeping
/// the listener is what makes the ephemeral port reliable: the port is owned
/// from discovery until shutdown, there is no probe-then-rebind window.
pub struct ShowServer {
    addr: SocketAddr,
    url: String,
    listener: TcpListener,
    router: Router,
    browser: Browser,
    shutdown: CancellationToken,
    drain_timeout: Duration,
}

impl ShowServer {
    /// Registers every route (including any tile mount) and binds the
    /// listener. A bind failure is fatal; there is no fallback port.
    pub async fn bind(opts: RunOptions) -> Result<Self, ShowError> {
        let RunOptions {
            map_provider,
            map_tile_uri,
            protomaps_theme,
            port,
            features,
            style,
            point_style,
            label_properties,
            browser,
            shutdown,
            drain_timeout,
        } = opts;

        let (map_config, tile_mount) = resolve_map_config(
            map_provider,
            &map_tile_uri,
            &protomaps_theme,
            style,
            point_style,
            label_properties,
        )?;

        let router = server::app(into_collection(features), map_config, tile_mount.as_ref());

        let requested = format!("localhost:{port}");
        let listener =
            TcpListener::bind(requested.as_str())
                .await
                .map_err(|e| ShowError::Listen {
                    addr: requested.clone(),
                    source: e,
                })?;
        let addr = listener.local_addr().map_err(|e| ShowError::Listen {
            addr: requested,
            source: e,
        })?;
        let url = format!("http://localhost:{}", addr.port());

        Ok(Self {
            addr,
            url,
            listener,
            router,
            browser,
            shutdown,
            drain_timeout,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Serves until shutdown. Three tasks cooperate from here on: the accept
    /// loop, the readiness poll, and the signal waiter. They share only the
    /// read-only state captured at bind time, the shutdown token, and a
    /// single-use error channel.
    pub async fn serve(self) -> Result<(), ShowError> {
        let Self {
            url,
            listener,
            router,
            browser,
            shutdown,
            drain_timeout,
            ..
        } = self;

        let (err_tx, mut err_rx) = oneshot::channel::<ShowError>();
        let serve_shutdown = shutdown.clone();
        let server_task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(serve_shutdown.cancelled_owned())
                .await
            {
                let _ = err_tx.send(ShowError::Serve(e.to_string()));
            }
        });

        let signal_shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received, shutting server down");
                    signal_shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "failed to listen for interrupt signal"),
            }
        });

        let early = tokio::select! {
            _ = wait_until_ready(&url) => None,
            err = &mut err_rx => Some(serve_outcome(err)),
            _ = shutdown.cancelled() => {
                info!("shutdown requested before the server became ready");
                Some(Ok(()))
            }
        };

        let result = match early {
            Some(done) => done,
            None => match browser.open_url(&url) {
                Err(e) => Err(e),
                Ok(()) => {
                    info!(url = %url, "features are viewable");
                    tokio::select! {
                        _ = shutdown.cancelled() => Ok(()),
                        err = &mut err_rx => serve_outcome(err),
                    }
                }
            },
        };

        shutdown.cancel();
        if tokio::time::timeout(drain_timeout, server_task).await.is_err() {
            warn!(timeout = ?drain_timeout, "server did not drain in time");
        }

        result
    }
}

/// Runs the whole lifecycle: bind, serve, poll until ready, open the
/// browser once, block until shutdown.
pub async fn run(opts: RunOptions) -> Result<(), ShowError> {
    ShowServer::bind(opts).await?.serve().await
}

/// Polls the server's own root URL with HEAD requests until one returns
/// 200. Failures are logged and retried without limit.
async fn wait_until_ready(url: &str) {
    let client = reqwest::Client::new();
    let mut tick = tokio::time::interval(READY_POLL_INTERVAL);

    loop {
        tick.tick().await;
        match client.head(url).send().await {
            Ok(rsp) if rsp.status() == reqwest::StatusCode::OK => {
                debug!(url = %url, "head request succeeded");
                return;
            }
            Ok(rsp) => {
                warn!(url = %url, status = %rsp.status(), "head request returned unexpected status");
            }
            Err(e) => {
                warn!(url = %url, error = %e, "head request failed");
            }
        }
    }
}

// A closed channel means the serve loop ended without an error, which only
// happens once shutdown has been requested.
fn serve_outcome(err: Result<ShowError, oneshot::error::RecvError>) -> Result<(), ShowError> {
    match err {
        Ok(e) => Err(e),
        Err(_) => Ok(()),
    }
}
