//! Project the lat/lon coordinates into a 2D x/y using the Web Mercator, so that markers can be
//! compared in screen space at a given zoom.
//! <https://en.wikipedia.org/wiki/Web_Mercator_projection>

use crate::{
    position::{Pixels, Position},
    sources::DEFAULT_TILE_SIZE,
};
use std::f64::consts::PI;

/// Number of pixels along one side of the whole world bitmap at given zoom.
pub(crate) fn total_pixels(zoom: f64) -> f64 {
    2f64.powf(zoom) * (DEFAULT_TILE_SIZE as f64)
}

/// Project geographical position into a 2D plane using Mercator.
pub fn project(position: Position, zoom: f64) -> Pixels {
    let total_pixels = total_pixels(zoom);

    let x = position.x().to_radians();
    let y = position.y().to_radians().tan().asinh();

    // Scale both x and y to 0-1 range.
    let x = (1. + (x / PI)) / 2.;
    let y = (1. - (y / PI)) / 2.;

    Pixels::new(x * total_pixels, y * total_pixels)
}

/// Transforms projected pixels back into a geographical position.
pub fn unproject(pixels: Pixels, zoom: f64) -> Position {
    let total_pixels = total_pixels(zoom);

    let lon = (pixels.x() / total_pixels * 2. - 1.) * PI;
    let lat = (-pixels.y() / total_pixels * 2. + 1.) * PI;

    Position::new(lon.to_degrees(), lat.sinh().atan().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{lat_lon, lon_lat};

    #[test]
    fn projecting_position() {
        let citadel = lon_lat(21.00027, 52.26470);
        let calculated = project(citadel, 20.);

        // Tile (585455, 345104) at zoom 20, shifted by the position on the tile.
        approx::assert_relative_eq!(calculated.x(), 585455. * 256. + 184., max_relative = 0.5);
        approx::assert_relative_eq!(calculated.y(), 345104. * 256. + 116.5, max_relative = 0.5);
    }

    #[test]
    fn whole_world_fits_in_one_tile_at_zoom_zero() {
        let top_left = project(lat_lon(85.0511, -180.), 0.);
        approx::assert_abs_diff_eq!(top_left.x(), 0., epsilon = 0.01);
        approx::assert_abs_diff_eq!(top_left.y(), 0., epsilon = 0.01);

        let center = project(lat_lon(0., 0.), 0.);
        approx::assert_relative_eq!(center.x(), 128.);
        approx::assert_relative_eq!(center.y(), 128.);
    }

    #[test]
    fn project_there_and_back() {
        let citadel = lat_lon(52.26470, 21.00027);
        let calculated = unproject(project(citadel, 16.), 16.);

        approx::assert_relative_eq!(calculated.x(), citadel.x(), max_relative = 1e-9);
        approx::assert_relative_eq!(calculated.y(), citadel.y(), max_relative = 1e-9);
    }
}
