use std::io::Write;

use geojson_show::features::{into_collection, parse_features};
use geojson_show::map::{resolve_map_config, MapProvider};
use geojson_show::server::{app, spawn_test_server};
use pretty_assertions::assert_eq;
use serde_json::json;

fn sample_collection() -> geojson::FeatureCollection {
    let body = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-122.38, 37.62]},
                "properties": {"name": "sfo"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [2.55, 49.01]},
                "properties": {"name": "cdg"}
            }
        ]
    })
    .to_string();
    into_collection(parse_features(&body).unwrap())
}

async fn spawn_sample_server() -> std::net::SocketAddr {
    let (config, mount) = resolve_map_config(
        MapProvider::Leaflet,
        "https://tile.example.com/{z}/{x}/{y}.png",
        "white",
        None,
        None,
        vec!["name".to_string()],
    )
    .unwrap();
    let router = app(sample_collection(), config, mount.as_ref());
    let (addr, _handle) = spawn_test_server(router).await;
    addr
}

#[tokio::test]
async fn features_endpoint_serves_the_store_in_order() {
    let addr = spawn_sample_server().await;
    let rsp = reqwest::get(format!("http://{addr}/features.geojson"))
        .await
        .unwrap();
    assert!(rsp.status().is_success());
    assert_eq!(
        rsp.headers()[reqwest::header::CONTENT_TYPE],
        "application/json"
    );

    let body: serde_json::Value = rsp.json().await.unwrap();
    assert_eq!(body["type"], "FeatureCollection");
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["properties"]["name"], "sfo");
    assert_eq!(features[1]["properties"]["name"], "cdg");
}

#[tokio::test]
async fn map_config_endpoint_serves_the_resolved_config() {
    let addr = spawn_sample_server().await;
    let rsp = reqwest::get(format!("http://{addr}/map.json")).await.unwrap();
    assert!(rsp.status().is_success());
    assert_eq!(
        rsp.headers()[reqwest::header::CONTENT_TYPE],
        "application/json"
    );

    let body: serde_json::Value = rsp.json().await.unwrap();
    assert_eq!(body["provider"], "leaflet");
    assert_eq!(body["tile_url"], "https://tile.example.com/{z}/{x}/{y}.png");
    assert_eq!(body["label_properties"], json!(["name"]));
}

#[tokio::test]
async fn root_serves_the_embedded_front_end() {
    let addr = spawn_sample_server().await;

    let rsp = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert!(rsp.status().is_success());
    let body = rsp.text().await.unwrap();
    assert!(body.contains("<div id=\"map\">"));

    let rsp = reqwest::get(format!("http://{addr}/css/show.css")).await.unwrap();
    assert!(rsp.status().is_success());
    assert_eq!(rsp.headers()[reqwest::header::CONTENT_TYPE], "text/css");

    let rsp = reqwest::get(format!("http://{addr}/javascript/show.js"))
        .await
        .unwrap();
    assert!(rsp.status().is_success());
}

#[tokio::test]
async fn head_on_root_answers_ok() {
    let addr = spawn_sample_server().await;
    let rsp = reqwest::Client::new()
        .head(format!("http://{addr}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(rsp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let addr = spawn_sample_server().await;
    let rsp = reqwest::get(format!("http://{addr}/no/such/asset"))
        .await
        .unwrap();
    assert_eq!(rsp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tile_mount_serves_the_pmtiles_file() {
    let dir = tempfile::tempdir().unwrap();
    let tile_path = dir.path().join("sfo.pmtiles");
    let tile_bytes = b"PMTiles fixture bytes for range requests".to_vec();
    let mut w = std::fs::File::create(&tile_path).unwrap();
    w.write_all(&tile_bytes).unwrap();

    let tile_uri = format!("file://{}", tile_path.display());
    let (config, mount) =
        resolve_map_config(MapProvider::Protomaps, &tile_uri, "white", None, None, Vec::new())
            .unwrap();
    assert_eq!(config.tile_url, "/sfo.pmtiles");

    let router = app(sample_collection(), config, mount.as_ref());
    let (addr, _handle) = spawn_test_server(router).await;

    let rsp = reqwest::get(format!("http://{addr}/sfo.pmtiles")).await.unwrap();
    assert!(rsp.status().is_success());
    assert_eq!(rsp.bytes().await.unwrap().as_ref(), tile_bytes.as_slice());

    // PMTiles readers fetch with range requests
    let rsp = reqwest::Client::new()
        .get(format!("http://{addr}/sfo.pmtiles"))
        .header(reqwest::header::RANGE, "bytes=0-6")
        .send()
        .await
        .unwrap();
    assert_eq!(rsp.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(rsp.bytes().await.unwrap().as_ref(), b"PMTiles");
}
