use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use url::Url;

use crate::error::ShowError;
use crate::style::LeafletStyle;

pub const LEAFLET_OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const PROTOMAPS_API_TILE_URL: &str =
    "https://api.protomaps.com/tiles/v3/{z}/{x}/{y}.mvt?key={key}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapProvider {
    Leaflet,
    Protomaps,
}

impl FromStr for MapProvider {
    type Err = ShowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leaflet" => Ok(MapProvider::Leaflet),
            "protomaps" => Ok(MapProvider::Protomaps),
            other => Err(ShowError::Config(format!(
                "invalid map provider '{other}', valid options are: leaflet, protomaps"
            ))),
        }
    }
}

/// Map configuration served verbatim to the front end on /map.json.
#[derive(Debug, Clone, Serialize)]
pub struct MapConfig {
    pub provider: MapProvider,
    pub tile_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protomaps: Option<ProtomapsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<LeafletStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_style: Option<LeafletStyle>,
    pub label_properties: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProtomapsConfig {
    pub theme: String,
}

/// A static route the HTTP surface must register before it starts
/// listening: `route` serves the contents of `dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMount {
    pub route: String,
    pub dir: PathBuf,
}

/// Builds the map configuration, rewriting the tile URI where the provider
/// requires it. A `file:` PMTiles source yields a `TileMount` the server
/// registers; the tile_url in the returned config is always directly
/// fetchable by the browser.
pub fn resolve_map_config(
    provider: MapProvider,
    tile_uri: &str,
    protomaps_theme: &str,
    style: Option<LeafletStyle>,
    point_style: Option<LeafletStyle>,
    label_properties: Vec<String>,
) -> Result<(MapConfig, Option<TileMount>), ShowError> {
    let mut tile_url = tile_uri.to_string();
    let mut tile_mount = None;
    let mut protomaps = None;

    if provider == MapProvider::Protomaps {
        let parsed = Url::parse(tile_uri)
            .map_err(|e| ShowError::Config(format!("invalid tile uri '{tile_uri}': {e}")))?;

        match parsed.scheme() {
            "file" => {
                let (route, dir) = tile_route_from_path(&parsed, tile_uri)?;
                tile_url = route.clone();
                tile_mount = Some(TileMount { route, dir });
            }
            "api" => {
                let key = parsed.host_str().ok_or_else(|| {
                    ShowError::Config(format!("missing api key in tile uri '{tile_uri}'"))
                })?;
                tile_url = PROTOMAPS_API_TILE_URL.replacen("{key}", key, 1);
            }
            _ => {}
        }

        protomaps = Some(ProtomapsConfig {
            theme: protomaps_theme.to_string(),
        });
    }

    let config = MapConfig {
        provider,
        tile_url,
        protomaps,
        style,
        point_style,
        label_properties,
    };

    Ok((config, tile_mount))
}

fn tile_route_from_path(parsed: &Url, tile_uri: &str) -> Result<(String, PathBuf), ShowError> {
    let path = parsed.to_file_path().map_err(|_| {
        ShowError::Config(format!("tile uri '{tile_uri}' is not a local file path"))
    })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ShowError::Config(format!("tile uri '{tile_uri}' has no file name")))?;

    let dir = path
        .parent()
        .ok_or_else(|| ShowError::Config(format!("tile uri '{tile_uri}' has no parent directory")))?
        .to_path_buf();

    Ok((format!("/{file_name}"), dir))
}
