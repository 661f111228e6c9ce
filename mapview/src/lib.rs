#![doc = include_str!("../README.md")]
#![deny(clippy::unwrap_used, rustdoc::broken_intra_doc_links)]

mod annotations;
mod clustering;
mod controller;
mod geojson;
mod icons;
pub mod io;
mod loader;
mod marker;
pub mod mercator;
mod overlays;
mod position;
mod resolver;
mod sources;
#[cfg(test)]
mod testing;
mod tiles;
mod view;

pub use annotations::{AnnotationRegistry, AnnotationState, DefaultMarkerGestures, MarkerGestures};
pub use clustering::{Cluster, ClusteringConfig, Size};
pub use controller::MapSourceController;
pub use geojson::{DocumentParser, GeoJsonParser, ParseError, PointFeature};
pub use icons::{
    BundledIcons, DEFAULT_MARKER_GLYPH, Icon, IconError, IconResolver, IconSlot, LoadTicket,
    resource_name,
};
pub use loader::{DocumentError, RemoteIconError};
pub use marker::{Marker, MarkerError, MarkerId, Tooltip};
pub use overlays::{
    ClusteringOverlay, Hit, ItemizedOverlay, MarkerOverlay, OverlayEntry, OverlayStack,
};
pub use position::{InvalidPosition, Pixels, Position, lat_lon, lon_lat};
pub use resolver::{
    EXAMPLE_MAP_ID, FULL_ZOOM_BOUNDS, IdentifierKind, InvalidIdentifier, LAYER_ZOOM_BOUNDS,
    MAPBOX_BASE_URL, Resolver, resolve,
};
pub use sources::{DEFAULT_FILE_EXTENSION, DEFAULT_TILE_SIZE, TileSource, TileSourceDescriptor};
pub use tiles::{Redraw, TileId, TileLayer, TileProvider};
pub use view::{MapEvents, MapView, MapViewOptions, NoMapEvents};
