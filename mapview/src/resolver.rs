//! Normalization of map source identifiers into tile source descriptors.
//!
//! Three shapes are recognized, checked in this order, since they overlap:
//!
//! 1. metadata document references, containing `.json`,
//! 2. short map IDs like `examples.map-z2effxa8`, without any scheme,
//! 3. xyz image templates like `http://host/{z}/{x}/{y}.png`.

use crate::sources::TileSourceDescriptor;

/// Hosting service short map IDs are resolved against.
pub const MAPBOX_BASE_URL: &str = "http://a.tiles.mapbox.com/v3/";

/// Map shown when nothing else was requested.
pub const EXAMPLE_MAP_ID: &str = "examples.map-z2effxa8";

/// Zoom bounds of documents and map IDs.
pub const FULL_ZOOM_BOUNDS: (u8, u8) = (0, 24);

/// Zoom bounds of xyz templates and of every switched layer.
pub const LAYER_ZOOM_BOUNDS: (u8, u8) = (1, 16);

const XYZ_SUFFIX: &str = "/{z}/{x}/{y}.png";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidIdentifier {
    #[error("map source identifier is empty")]
    Empty,

    #[error("'{0}' is not a valid map ID, it needs to look like 'owner.mapname'")]
    MissingSeparator(String),

    #[error("'{0}' is not a supported tile template, expected '.../{{z}}/{{x}}/{{y}}.png'")]
    UnsupportedTemplate(String),

    #[error("'{0}' is neither a map ID, a metadata document nor a tile template")]
    Unrecognized(String),
}

/// Recognized shape of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Document,
    MapId,
    Template,
}

impl IdentifierKind {
    /// Classify the identifier. Order matters, since e.g. a document URL has a scheme too.
    pub fn of(identifier: &str) -> Result<Self, InvalidIdentifier> {
        if identifier.is_empty() {
            Err(InvalidIdentifier::Empty)
        } else if identifier.contains(".json") {
            Ok(Self::Document)
        } else if !identifier.contains("http://") && !identifier.contains("https://") {
            if identifier.contains('.') {
                Ok(Self::MapId)
            } else {
                Err(InvalidIdentifier::MissingSeparator(identifier.to_owned()))
            }
        } else if identifier.contains(".png") {
            Ok(Self::Template)
        } else {
            Err(InvalidIdentifier::Unrecognized(identifier.to_owned()))
        }
    }
}

/// Turns identifiers into [`TileSourceDescriptor`]s. Stateless apart from the base URL of the
/// hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    service_base_url: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::with_base_url(MAPBOX_BASE_URL)
    }
}

impl Resolver {
    /// Resolve short map IDs against `service_base_url`, which should end with a `/`.
    pub fn with_base_url(service_base_url: impl Into<String>) -> Self {
        Self {
            service_base_url: service_base_url.into(),
        }
    }

    pub fn service_base_url(&self) -> &str {
        &self.service_base_url
    }

    /// Canonical tile base path for given identifier.
    pub fn url(&self, identifier: &str) -> Result<String, InvalidIdentifier> {
        Ok(self.classify_and_normalize(identifier)?.1)
    }

    /// Resolve the identifier. The descriptor is named after the resolved URL.
    pub fn resolve(&self, identifier: &str) -> Result<TileSourceDescriptor, InvalidIdentifier> {
        let (kind, url) = self.classify_and_normalize(identifier)?;

        let (min_zoom, max_zoom) = match kind {
            IdentifierKind::Document | IdentifierKind::MapId => FULL_ZOOM_BOUNDS,
            IdentifierKind::Template => LAYER_ZOOM_BOUNDS,
        };

        log::debug!("Resolved '{identifier}' ({kind:?}) into '{url}'.");
        Ok(TileSourceDescriptor::new(url.clone(), url, min_zoom, max_zoom))
    }

    fn classify_and_normalize(
        &self,
        identifier: &str,
    ) -> Result<(IdentifierKind, String), InvalidIdentifier> {
        let kind = IdentifierKind::of(identifier)?;

        let url = match kind {
            IdentifierKind::Document => identifier.replace(".json", "/"),
            IdentifierKind::MapId => format!("{}{identifier}/", self.service_base_url),
            IdentifierKind::Template => {
                let Some(base) = identifier.strip_suffix(XYZ_SUFFIX) else {
                    return Err(InvalidIdentifier::UnsupportedTemplate(identifier.to_owned()));
                };
                format!("{base}/")
            }
        };

        // Placeholders are substituted by the tile layer, never by the server.
        if url.contains('{') {
            return Err(match kind {
                IdentifierKind::Template => {
                    InvalidIdentifier::UnsupportedTemplate(identifier.to_owned())
                }
                IdentifierKind::Document | IdentifierKind::MapId => {
                    InvalidIdentifier::Unrecognized(identifier.to_owned())
                }
            });
        }

        Ok((kind, url))
    }
}

/// Resolve using the default hosting service.
pub fn resolve(identifier: &str) -> Result<TileSourceDescriptor, InvalidIdentifier> {
    Resolver::default().resolve(identifier)
}
