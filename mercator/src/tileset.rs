//! Tile set model: the subset of a TileJSON document the resolution pipeline works with.

use serde::{Deserialize, Serialize};

use crate::error::MercatorError;

/// Geometry kind of a tile source.
///
/// The kind drives ratio negotiation during URL canonicalization: raster tiles may carry a pixel
/// density marker, vector tiles never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// Pre-rendered raster tiles.
    Raster,
    /// Vector tiles.
    Vector,
}

/// Subset of a TileJSON document describing a tile source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tileset {
    /// Tile URL templates. Entries may be concrete or logical URLs.
    #[serde(default)]
    pub tiles: Vec<String>,
    /// Minimum zoom level for which the source has tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<u8>,
    /// Maximum zoom level for which the source has tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<u8>,
    /// Geographic extent as `[west, south, east, north]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f64; 4]>,
    /// Default position as `[longitude, latitude, zoom]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 3]>,
    /// Attribution to display when showing the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    /// Tiling scheme of the source, `xyz` or `tms`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

impl Tileset {
    /// Parses a tile set from the bytes of a TileJSON document.
    pub fn from_tilejson(data: &[u8]) -> Result<Self, MercatorError> {
        serde_json::from_slice(data)
            .map_err(|error| MercatorError::Other(format!("invalid TileJSON document: {error}")))
    }
}
