//! Extracting point features out of GeoJSON documents.
//! <https://datatracker.ietf.org/doc/html/rfc7946>

use serde_json::{Map, Value};

use crate::position::{Position, lon_lat, validate};

/// Point extracted from a document, ready to become a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub position: Position,
    pub title: String,
    pub description: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

/// Turns document text into point features. Runs on the background worker, hence `Send`.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Vec<PointFeature>, ParseError>;
}

/// Accepts a `FeatureCollection` or a single `Feature`. Only `Point` geometries become markers,
/// named after `title` and `description` properties.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonParser;

impl DocumentParser for GeoJsonParser {
    fn parse(&self, text: &str) -> Result<Vec<PointFeature>, ParseError> {
        let document: Value = serde_json::from_str(text)?;

        match type_of(&document) {
            Some("FeatureCollection") => {
                let features = document
                    .get("features")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        ParseError::UnsupportedDocument("collection without features".to_owned())
                    })?;

                let mut points = Vec::new();
                for feature in features {
                    points.extend(point_feature(feature)?);
                }
                Ok(points)
            }
            Some("Feature") => Ok(point_feature(&document)?.into_iter().collect()),
            other => Err(ParseError::UnsupportedDocument(format!(
                "type {}",
                other.unwrap_or("missing")
            ))),
        }
    }
}

fn type_of(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

fn point_feature(feature: &Value) -> Result<Option<PointFeature>, ParseError> {
    let Some(geometry) = feature.get("geometry").filter(|g| !g.is_null()) else {
        return Ok(None);
    };

    if type_of(geometry) != Some("Point") {
        log::trace!("Skipping {:?} geometry.", type_of(geometry));
        return Ok(None);
    }

    let properties = feature.get("properties").and_then(Value::as_object);

    Ok(Some(PointFeature {
        position: coordinates(geometry.get("coordinates"))?,
        title: property(properties, "title"),
        description: property(properties, "description"),
    }))
}

fn coordinates(value: Option<&Value>) -> Result<Position, ParseError> {
    let invalid = || ParseError::InvalidCoordinates(format!("{value:?}"));

    // Longitude goes first, optional altitude is ignored.
    let Some([lon, lat, ..]) = value.and_then(Value::as_array).map(Vec::as_slice) else {
        return Err(invalid());
    };

    let (Some(lon), Some(lat)) = (lon.as_f64(), lat.as_f64()) else {
        return Err(invalid());
    };

    validate(lon_lat(lon, lat)).map_err(|_| invalid())
}

fn property(properties: Option<&Map<String, Value>>, name: &str) -> String {
    match properties.and_then(|p| p.get(name)) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
