//! Mercator is a resource resolution and tile-storage library for map rendering applications. It
//! turns an abstract request for a map resource (a tile, a style, a sprite sheet, a glyph range or
//! a source metadata document) into bytes, either by rewriting a provider-specific logical URL
//! into a concrete backend request or by serving it directly from a local tile archive.
//!
//! # Main components
//!
//! * [`Resource`] and [`Response`] are the data exchanged between the caller and the resolution
//!   pipeline. A resource is built once by the caller and consumed by the pipeline; the response
//!   is delivered through a single callback invocation.
//! * [`TileServerConfig`] describes a tile provider's URL layout: its base URL, the logical URI
//!   scheme it is addressed by, and the per-kind URL templates used for rewriting.
//! * The [`url`] module translates between provider-neutral logical URLs (`provider://...`) and
//!   concrete HTTPS URLs, in both directions. Translation is pure and does no I/O.
//! * [`ResourceSource`] is the contract every concrete source implements: a routing predicate and
//!   an asynchronous request operation with uniform cancellation semantics.
//!   [`ResourceResolver`] dispatches each request to the first source that accepts it.
//! * [`ArchiveSource`] answers tile and metadata requests from read-only SQLite tile archives on
//!   disk. [`HttpSource`] loads resources over HTTP with `reqwest`.
//!
//! # Example
//!
//! ```no_run
//! use mercator::url::normalize_source_url;
//! use mercator::{ArchiveSource, Resource, ResourceResolver, TileServerConfig};
//!
//! let config = TileServerConfig::default_configuration();
//! let concrete = normalize_source_url(&config, "mercator://user.map", "key")?;
//!
//! let mut resolver = ResourceResolver::new();
//! resolver.add_source(ArchiveSource::new());
//!
//! let resource = Resource::source("archive:///maps/world.mbtiles");
//! let handle = resolver.request(
//!     resource,
//!     Box::new(|response| {
//!         println!("got {} bytes", response.data.map(|d| d.len()).unwrap_or(0));
//!     }),
//! );
//! # drop(handle);
//! # Ok::<(), mercator::error::MercatorError>(())
//! ```
//!
//! Every stateful source confines its mutable state to one sequential worker. Requests submitted
//! to the same source are processed in submission order; the caller never blocks. Dropping the
//! returned request handle before completion guarantees the callback is never invoked.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub(crate) mod async_runtime;
pub mod error;
pub mod resource;
pub mod response;
pub mod source;
pub mod tile_server;
pub mod tileset;
pub mod url;

pub use resource::{LoadingMethod, Resource, ResourceKind, TileCoordinate};
pub use response::{ErrorKind, Response, ResponseError, Timestamp};
pub use source::{
    ArchiveSource, HttpSource, RequestHandle, ResourceResolver, ResourceSource, ResponseCallback,
    ResponseSlot,
};
pub use tile_server::{TileServerConfig, TileServerConfigBuilder};
pub use tileset::{SourceType, Tileset};
