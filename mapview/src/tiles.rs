//! Seams towards the tile layer, which fetches, caches and draws tiles of the current source.

use std::sync::Arc;

use crate::sources::TileSourceDescriptor;

/// Coordinates of the OSM-like tile.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct TileId {
    /// X number of the tile.
    pub x: u32,

    /// Y number of the tile.
    pub y: u32,

    /// Zoom level, where 0 means no zoom.
    /// See: <https://wiki.openstreetmap.org/wiki/Zoom_levels>
    pub zoom: u8,
}

/// Compositor drawing tiles of a [`TileSourceDescriptor`]. Tiles which are still in flight for
/// a replaced source are its business to discard.
pub trait TileLayer {
    /// Adopt a new source. Called by [`crate::MapSourceController::set_source`].
    fn set_tile_source(&mut self, source: Arc<TileSourceDescriptor>);

    /// Provider serving tiles to this layer.
    fn tile_provider(&mut self) -> &mut dyn TileProvider;
}

/// Already running tile provider. Layer switches push their source directly into it.
pub trait TileProvider {
    fn set_tile_source(&mut self, source: Arc<TileSourceDescriptor>);
}

/// Something which can be asked to draw the view again.
pub trait Redraw: Send + Sync {
    fn request_redraw(&self);
}

impl Redraw for egui::Context {
    fn request_redraw(&self) {
        self.request_repaint();
    }
}
