use std::time::Duration;

use geojson_show::browser::{Browser, NullBrowser};
use geojson_show::features::parse_features;
use geojson_show::show::{RunOptions, ShowServer};
use geojson_show::ShowError;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn sample_features() -> Vec<geojson::Feature> {
    let body = json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
        "properties": {"name": "origin"}
    })
    .to_string();
    parse_features(&body).unwrap()
}

#[tokio::test]
async fn coordinator_opens_browser_once_ready_and_drains_on_cancel() {
    let null = NullBrowser::new();
    let shutdown = CancellationToken::new();

    let opts = RunOptions {
        features: sample_features(),
        browser: Browser::Null(null.clone()),
        shutdown: shutdown.clone(),
        drain_timeout: Duration::from_secs(5),
        ..Default::default()
    };

    let server = ShowServer::bind(opts).await.unwrap();
    let url = server.url().to_string();
    let handle = tokio::spawn(server.serve());

    // the browser is opened exactly once, only after readiness
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while null.opened().is_empty() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "browser was never opened"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(null.opened(), vec![url.clone()]);

    // open-url is invoked strictly after a 200 HEAD; the server must be
    // answering now
    let rsp = reqwest::Client::new().head(&url).send().await.unwrap();
    assert_eq!(rsp.status(), reqwest::StatusCode::OK);

    let rsp = reqwest::get(format!("{url}/features.geojson")).await.unwrap();
    assert!(rsp.status().is_success());
    let body: serde_json::Value = rsp.json().await.unwrap();
    assert_eq!(body["features"][0]["properties"]["name"], "origin");

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("serve did not stop within the drain bound")
        .unwrap();
    assert!(result.is_ok(), "serve returned {result:?}");

    assert_eq!(null.opened().len(), 1);

    // once stopped, connections are refused rather than left hanging
    assert!(reqwest::get(format!("{url}/features.geojson")).await.is_err());
}

#[tokio::test]
async fn bind_failure_is_fatal() {
    let v4 = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = v4.local_addr().unwrap().port();
    // hold the same port on the v6 loopback too, when there is one
    let _v6 = tokio::net::TcpListener::bind(("::1", port)).await.ok();

    let opts = RunOptions {
        port,
        ..Default::default()
    };
    let err = ShowServer::bind(opts).await.err().expect("bind should fail");
    assert!(matches!(err, ShowError::Listen { .. }), "got {err:?}");
}

#[tokio::test]
async fn ephemeral_port_is_held_from_bind_to_serve() {
    let opts = RunOptions {
        features: sample_features(),
        ..Default::default()
    };
    let server = ShowServer::bind(opts).await.unwrap();
    let port = server.addr().port();
    assert_ne!(port, 0);
    assert_eq!(server.url(), format!("http://localhost:{port}"));

    // the listener is already owned; a second bind of the same port fails
    let addr = server.addr();
    assert!(tokio::net::TcpListener::bind(addr).await.is_err());
}
