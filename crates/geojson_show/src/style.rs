use serde::{Deserialize, Serialize};

use crate::error::ShowError;

/// Styling directives for rendering GeoJSON features and markers. Field names
/// follow the Leaflet path options they configure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeafletStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "fillColor", skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(rename = "fillOpacity", skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
}

/// Resolves a raw `--style` value. An empty string means no style. A value
/// starting with "{" is parsed as inline JSON, anything else is treated as a
/// path on disk.
pub fn resolve_style(raw: &str) -> Result<Option<LeafletStyle>, ShowError> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Ok(None);
    }

    let body = if raw.starts_with('{') {
        raw.to_string()
    } else {
        std::fs::read_to_string(raw)
            .map_err(|e| ShowError::Config(format!("failed to read style from {raw}: {e}")))?
    };

    let style = serde_json::from_str(&body)
        .map_err(|e| ShowError::Config(format!("invalid style definition: {e}")))?;

    Ok(Some(style))
}
