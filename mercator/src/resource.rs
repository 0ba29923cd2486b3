//! Resource model: the request half of the data exchanged with resource sources.

/// Kind of the requested resource.
///
/// Sources may use the kind to decide how to interpret the URL. The kind of resources routed to
/// an archive source selects between a tile lookup and metadata synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Anything that does not fit the other kinds.
    Unknown,
    /// A style document.
    Style,
    /// A source metadata (TileJSON) document.
    Source,
    /// A single map tile.
    Tile,
    /// A glyph range of a font stack.
    Glyphs,
    /// A sprite sheet image.
    SpriteImage,
    /// A sprite sheet index document.
    SpriteJson,
    /// A standalone image.
    Image,
}

/// Address of a tile within the tiling pyramid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileCoordinate {
    /// Column of the tile.
    pub x: i32,
    /// Row of the tile in the `xyz` scheme (top to bottom).
    pub y: i32,
    /// Zoom level.
    pub z: u8,
    /// Requested pixel density of the tile.
    pub ratio: f32,
}

impl TileCoordinate {
    /// Creates a new coordinate with the default pixel density.
    pub fn new(x: i32, y: i32, z: u8) -> Self {
        Self {
            x,
            y,
            z,
            ratio: 1.0,
        }
    }
}

/// Which storage layers are allowed to answer a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingMethod {
    /// Only local caches may answer; the network must not be touched.
    CacheOnly,
    /// Only the network may answer.
    NetworkOnly,
    /// Any layer may answer.
    #[default]
    All,
}

impl LoadingMethod {
    /// Whether this method allows loading over the network.
    pub fn uses_network(&self) -> bool {
        matches!(self, LoadingMethod::NetworkOnly | LoadingMethod::All)
    }

    /// Whether this method allows answering from a local cache.
    pub fn uses_cache(&self) -> bool {
        matches!(self, LoadingMethod::CacheOnly | LoadingMethod::All)
    }
}

/// A request for a map resource.
///
/// Created once by the caller and consumed by the resolution pipeline; the pipeline never mutates
/// it.
#[derive(Debug, Clone)]
pub struct Resource {
    /// URL of the resource. May use a logical scheme (`provider://...`), the archive scheme
    /// (`archive://...`) or a plain `http(s)` URL.
    pub url: String,
    /// Kind of the resource.
    pub kind: ResourceKind,
    /// Coordinate of the requested tile. Only meaningful for [`ResourceKind::Tile`] requests.
    pub tile: Option<TileCoordinate>,
    /// Which storage layers are allowed to answer this request.
    pub loading_method: LoadingMethod,
}

impl Resource {
    /// Creates a resource of the given kind.
    pub fn new(kind: ResourceKind, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            tile: None,
            loading_method: LoadingMethod::default(),
        }
    }

    /// Creates a tile request for the given coordinate.
    pub fn tile(url: impl Into<String>, x: i32, y: i32, z: u8, ratio: f32) -> Self {
        Self {
            url: url.into(),
            kind: ResourceKind::Tile,
            tile: Some(TileCoordinate { x, y, z, ratio }),
            loading_method: LoadingMethod::default(),
        }
    }

    /// Creates a source metadata (TileJSON) request.
    pub fn source(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Source, url)
    }

    /// Creates a style document request.
    pub fn style(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Style, url)
    }

    /// Creates a glyph range request.
    pub fn glyphs(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Glyphs, url)
    }

    /// Creates a sprite sheet image request.
    pub fn sprite_image(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::SpriteImage, url)
    }

    /// Creates a sprite sheet index request.
    pub fn sprite_json(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::SpriteJson, url)
    }

    /// Creates a standalone image request.
    pub fn image(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Image, url)
    }

    /// Replaces the loading method of this resource.
    pub fn with_loading_method(mut self, loading_method: LoadingMethod) -> Self {
        self.loading_method = loading_method;
        self
    }

    /// Whether this resource may be loaded over the network.
    pub fn uses_network_loading(&self) -> bool {
        self.loading_method.uses_network()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_method_predicates() {
        assert!(LoadingMethod::All.uses_network());
        assert!(LoadingMethod::All.uses_cache());
        assert!(LoadingMethod::NetworkOnly.uses_network());
        assert!(!LoadingMethod::NetworkOnly.uses_cache());
        assert!(!LoadingMethod::CacheOnly.uses_network());
        assert!(LoadingMethod::CacheOnly.uses_cache());
    }

    #[test]
    fn tile_constructor_sets_coordinate() {
        let resource = Resource::tile("provider://tiles/a.b/1/2/3.png", 2, 3, 1, 2.0);
        assert_eq!(resource.kind, ResourceKind::Tile);
        let tile = resource.tile.expect("tile coordinate must be set");
        assert_eq!((tile.x, tile.y, tile.z), (2, 3, 1));
        assert_eq!(tile.ratio, 2.0);
    }

    #[test]
    fn default_loading_method_uses_everything() {
        let resource = Resource::source("provider://user.map");
        assert!(resource.uses_network_loading());
        assert!(resource.loading_method.uses_cache());
    }
}
