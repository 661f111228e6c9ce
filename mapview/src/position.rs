//! Types and functions for working with positions.

/// Geographical position with latitude and longitude.
pub type Position = geo_types::Point;

/// Location projected on an abstract bitmap, see [`crate::mercator`].
pub type Pixels = geo_types::Point;

/// Construct `Position` from latitude and longitude.
pub fn lat_lon(lat: f64, lon: f64) -> Position {
    Position::new(lon, lat)
}

/// Construct `Position` from longitude and latitude. Note that it is common standard to write
/// coordinates starting with the latitude instead, which is what [`lat_lon`] is for.
pub fn lon_lat(lon: f64, lat: f64) -> Position {
    Position::new(lon, lat)
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
#[error("invalid position (lat: {lat}, lon: {lon})")]
pub struct InvalidPosition {
    pub lat: f64,
    pub lon: f64,
}

/// Check that latitude is within [-90, 90] and longitude within [-180, 180].
pub fn validate(position: Position) -> Result<Position, InvalidPosition> {
    let (lat, lon) = (position.y(), position.x());
    if (-90. ..=90.).contains(&lat) && (-180. ..=180.).contains(&lon) {
        Ok(position)
    } else {
        Err(InvalidPosition { lat, lon })
    }
}
