use std::io::Read;
use std::path::PathBuf;

use geojson::{Feature, FeatureCollection, GeoJson};

use crate::error::ShowError;

/// Where feature data comes from. A lone "-" positional argument selects
/// stdin; anything else is a list of file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureInput {
    Stdin,
    Paths(Vec<PathBuf>),
}

impl FeatureInput {
    pub fn from_args(args: &[String]) -> Self {
        if args.len() == 1 && args[0] == "-" {
            FeatureInput::Stdin
        } else {
            FeatureInput::Paths(args.iter().map(PathBuf::from).collect())
        }
    }
}

/// Parses a single GeoJSON document into zero or more features. The document
/// must be a Feature or a FeatureCollection; bare geometries are rejected.
pub fn parse_features(body: &str) -> Result<Vec<Feature>, ShowError> {
    let geojson = body
        .parse::<GeoJson>()
        .map_err(|e| ShowError::Parse(format!("invalid geojson: {e}")))?;

    match geojson {
        GeoJson::Feature(f) => Ok(vec![f]),
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        GeoJson::Geometry(g) => Err(ShowError::Parse(format!(
            "invalid type, {}",
            g.value.type_name()
        ))),
    }
}

/// Loads every source in order and concatenates their features. Any failure
/// aborts the whole load; no partial store is returned.
pub fn load_features(input: &FeatureInput) -> Result<Vec<Feature>, ShowError> {
    let mut features = Vec::new();

    match input {
        FeatureInput::Stdin => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .map_err(|e| ShowError::Io {
                    path: "-".to_string(),
                    source: e,
                })?;
            features.extend(parse_features(&body)?);
        }
        FeatureInput::Paths(paths) => {
            for path in paths {
                let body = std::fs::read_to_string(path).map_err(|e| ShowError::Io {
                    path: path.display().to_string(),
                    source: e,
                })?;
                features.extend(parse_features(&body)?);
            }
        }
    }

    Ok(features)
}

pub fn into_collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
