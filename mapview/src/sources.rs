//! Tile source descriptors consumed by the tile layer.

use crate::tiles::TileId;

/// Size of a single tile in pixels, for every source produced by the resolver.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Extension of the tile images, for every source produced by the resolver.
pub const DEFAULT_FILE_EXTENSION: &str = ".png";

/// Remote tile server definition, consumed by a [`crate::TileLayer`].
pub trait TileSource {
    fn tile_url(&self, tile_id: TileId) -> String;

    /// Size of each tile, should be a multiple of 256.
    fn tile_size(&self) -> u32 {
        DEFAULT_TILE_SIZE
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        19
    }
}

/// Immutable description of a tiled image source. Produced by [`crate::Resolver`] and shared
/// (behind an `Arc`) between the controller and the tile layer, so that replacing the current
/// source is a single pointer swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSourceDescriptor {
    name: String,
    url_template: String,
    min_zoom: u8,
    max_zoom: u8,
    tile_size: u32,
    file_extension: String,
}

impl TileSourceDescriptor {
    pub(crate) fn new(name: String, url_template: String, min_zoom: u8, max_zoom: u8) -> Self {
        debug_assert!(!url_template.is_empty());
        debug_assert!(min_zoom <= max_zoom);

        Self {
            name,
            url_template,
            min_zoom,
            max_zoom,
            tile_size: DEFAULT_TILE_SIZE,
            file_extension: DEFAULT_FILE_EXTENSION.to_owned(),
        }
    }

    /// Same source, under a different name and zoom bounds.
    pub(crate) fn relabeled(self, name: String, min_zoom: u8, max_zoom: u8) -> Self {
        Self {
            name,
            min_zoom,
            max_zoom,
            ..self
        }
    }

    /// Human readable name of the source. Either the resolved URL or, for layers, the identifier
    /// it was switched to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base path of the tiles. Zoom, column and row are appended to it.
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }
}

impl TileSource for TileSourceDescriptor {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "{}{}/{}/{}{}",
            self.url_template, tile_id.zoom, tile_id.x, tile_id.y, self.file_extension
        )
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }
}
