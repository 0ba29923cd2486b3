//! Resource source backed by local tile archives.
//!
//! A tile archive is a read-only SQLite file with a `tiles` table keyed by
//! `(zoom_level, tile_column, tile_row)` and a `metadata` key/value table. The source answers
//! tile requests from the `tiles` table and synthesizes a TileJSON document for source metadata
//! requests, so a map style can reference an archive file exactly like a remote tile source.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use flate2::read::GzDecoder;
use percent_encoding::percent_decode_str;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde_json::{Map, Value};

use crate::error::MercatorError;
use crate::resource::{Resource, ResourceKind};
use crate::response::{ErrorKind, Response, ResponseError, Timestamp};
use crate::source::actor::SourceWorker;
use crate::source::{RequestHandle, ResourceSource, ResponseCallback};

/// URL prefix recognized by [`ArchiveSource`].
pub const ARCHIVE_SCHEME: &str = "archive://";

/// Version stamped into every synthesized metadata document.
const TILEJSON_VERSION: &str = "2.0.0";

/// Resource source that answers tile and metadata requests from tile archives on disk.
///
/// The archive path is the percent-decoded remainder of the URL after the `archive://` prefix;
/// everything from the first `?` on is a request-scoped query string rather than part of the
/// path. Archive handles are opened lazily and kept open for the lifetime of the source, keyed
/// by path; use [`close`](ArchiveSource::close) or [`close_all`](ArchiveSource::close_all) to
/// release them earlier.
///
/// All archive access happens on a dedicated worker thread, one request at a time in submission
/// order. The caller never blocks.
pub struct ArchiveSource {
    worker: SourceWorker<ArchiveStore>,
}

impl ArchiveSource {
    /// Creates the source and spawns its worker.
    pub fn new() -> Self {
        Self {
            worker: SourceWorker::spawn("mercator-archive", ArchiveStore::new),
        }
    }

    /// Closes the cached handle of the given archive, if it is open.
    pub fn close(&self, path: impl Into<String>) {
        let path = path.into();
        if let Err(error) = self.worker.submit(move |store| store.close(&path)) {
            log::warn!("Failed to submit archive close: {error}");
        }
    }

    /// Closes all cached archive handles.
    pub fn close_all(&self) {
        if let Err(error) = self.worker.submit(ArchiveStore::close_all) {
            log::warn!("Failed to submit archive close: {error}");
        }
    }
}

impl Default for ArchiveSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSource for ArchiveSource {
    fn can_request(&self, resource: &Resource) -> bool {
        resource.url.starts_with(ARCHIVE_SCHEME)
    }

    fn request(&self, resource: Resource, callback: ResponseCallback) -> RequestHandle {
        let (handle, slot) = RequestHandle::new(callback);

        // Only absolute path urls address a file on disk; reject the rest before they reach the
        // worker.
        if !resource.url.contains(":///") {
            slot.deliver(Response::no_content(ResponseError::new(
                ErrorKind::Other,
                "archive source only supports absolute path urls",
            )));
            return handle;
        }

        let worker_slot = slot.clone();
        let submitted = self.worker.submit(move |store| {
            if worker_slot.is_cancelled() {
                return;
            }
            let response = match resource.kind {
                ResourceKind::Tile => store.tile_response(&resource),
                _ => store.tilejson_response(&resource),
            };
            worker_slot.deliver(response);
        });

        if let Err(error) = submitted {
            slot.deliver(Response::from_error(ErrorKind::Other, error.to_string()));
        }

        handle
    }
}

/// Worker-owned archive state: a lazily populated path → handle map.
///
/// Entries are never evicted automatically; handles stay open until closed explicitly or until
/// the worker shuts down. The map is owned exclusively by one worker, so no locking is needed.
struct ArchiveStore {
    archives: HashMap<String, Connection>,
}

impl ArchiveStore {
    fn new() -> Self {
        Self {
            archives: HashMap::new(),
        }
    }

    /// Returns the cached handle for the path, opening the archive read-only on first access.
    fn open(&mut self, path: &str) -> Result<&Connection, MercatorError> {
        use std::collections::hash_map::Entry;

        match self.archives.entry(path.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                log::debug!("Opening tile archive {path}");
                let connection =
                    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
                Ok(entry.insert(connection))
            }
        }
    }

    fn close(&mut self, path: &str) {
        if self.archives.remove(path).is_some() {
            log::debug!("Closed tile archive {path}");
        }
    }

    fn close_all(&mut self) {
        self.archives.clear();
    }

    fn tile_response(&mut self, resource: &Resource) -> Response {
        match self.fetch_tile(resource) {
            Ok(response) => response,
            Err(error) => {
                log::info!("Tile request for {} failed: {error}", resource.url);
                Response::from_error(ErrorKind::Other, error.to_string())
            }
        }
    }

    fn fetch_tile(&mut self, resource: &Resource) -> Result<Response, MercatorError> {
        let decoded = url_to_path(&resource.url);
        let path = archive_path(&decoded);

        let Some(tile) = resource.tile else {
            return Ok(Response::from_error(
                ErrorKind::Other,
                "tile request without a tile coordinate",
            ));
        };

        let connection = self.open(path)?;

        // The archive stores rows bottom-to-top; flip to match the xyz scheme.
        let row = (1_i64 << tile.z) - 1 - i64::from(tile.y);
        let data: Option<Vec<u8>> = connection
            .query_row(
                "SELECT tile_data FROM tiles \
                 WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
                rusqlite::params![tile.z, tile.x, row],
                |db_row| db_row.get::<_, Option<Vec<u8>>>(0),
            )
            .optional()?
            .flatten();

        let Some(data) = data else {
            return Ok(Response::no_content(ResponseError::new(
                ErrorKind::Connection,
                "not found in tile archive",
            )));
        };

        let data = if is_gzip(&data) {
            decompress(&data)?
        } else {
            data
        };

        // Archive contents never change, so upstream caches may keep tiles forever.
        Ok(Response {
            data: Some(data.into()),
            etag: Some(resource.url.clone()),
            expires: Some(Timestamp::MAX),
            ..Response::default()
        })
    }

    fn tilejson_response(&mut self, resource: &Resource) -> Response {
        match self.synthesize_tilejson(resource) {
            Ok(response) => response,
            Err(error) => {
                log::info!("Metadata request for {} failed: {error}", resource.url);
                Response::from_error(ErrorKind::Other, error.to_string())
            }
        }
    }

    /// Builds a TileJSON document from the archive's `metadata` table.
    ///
    /// A `json` row is parsed as the base document; all other rows are folded in as members. Any
    /// failure aborts the whole request: a partial metadata document is as unsafe as none.
    fn synthesize_tilejson(&mut self, resource: &Resource) -> Result<Response, MercatorError> {
        let decoded = url_to_path(&resource.url);
        let path = archive_path(&decoded).to_string();
        let connection = self.open(&path)?;

        let mut doc = Map::new();
        let mut values = BTreeMap::new();

        let mut statement = connection.prepare("SELECT name, value FROM metadata")?;
        let mut rows = statement.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let value: String = row.get(1)?;
            if name == "json" {
                if let Ok(Value::Object(base)) = serde_json::from_str(&value) {
                    doc = base;
                }
            } else {
                values.insert(name, value);
            }
        }
        drop(rows);
        drop(statement);

        values.insert("tilejson".to_string(), TILEJSON_VERSION.to_string());
        values.insert("scheme".to_string(), "xyz".to_string());

        let format = values
            .get("format")
            .cloned()
            .unwrap_or_else(|| "png".to_string());
        if format != "pbf" && !values.contains_key("scale") {
            values.insert("scale".to_string(), "1".to_string());
        }

        // The request URL with a file parameter is the tile template, so subsequent tile
        // requests round-trip through this same source.
        let tile_url = format!("{}?file={{x}}/{{y}}/{{z}}.{}", resource.url, format);
        doc.insert(
            "tiles".to_string(),
            Value::Array(vec![Value::String(tile_url)]),
        );

        if !values.contains_key("minzoom") || !values.contains_key("maxzoom") {
            let (min, max) = connection.query_row(
                "SELECT MIN(zoom_level), MAX(zoom_level) FROM tiles",
                [],
                |row| {
                    Ok((
                        row.get::<_, Option<i64>>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                    ))
                },
            )?;
            values.insert("minzoom".to_string(), min.unwrap_or(0).to_string());
            values.insert("maxzoom".to_string(), max.unwrap_or(0).to_string());
        }

        let min_zoom = parse_zoom(&values, "minzoom")?;
        let max_zoom = parse_zoom(&values, "maxzoom")?;

        for (name, value) in &values {
            match name.as_str() {
                "scale" => {
                    doc.insert(name.clone(), Value::from(value.parse::<f64>().unwrap_or(0.0)));
                }
                "minzoom" => {
                    doc.insert(name.clone(), Value::from(min_zoom));
                }
                "maxzoom" => {
                    doc.insert(name.clone(), Value::from(max_zoom));
                }
                "bounds" => {
                    let bounds: Vec<f64> = value
                        .split(',')
                        .map(|component| component.trim().parse().unwrap_or(0.0))
                        .collect();
                    if bounds.len() != 4 {
                        return Err(MercatorError::Archive(format!(
                            "expected 4 bounds components, got {}",
                            bounds.len()
                        )));
                    }

                    let center_lon = (bounds[0] + bounds[2]) / 2.0;
                    let center_lat = (bounds[1] + bounds[3]) / 2.0;
                    let center_zoom = (min_zoom + max_zoom) / 2;

                    if format != "pbf" {
                        doc.insert(name.clone(), Value::from(bounds));
                    }
                    doc.insert(
                        "center".to_string(),
                        Value::Array(vec![
                            Value::from(center_lon),
                            Value::from(center_lat),
                            Value::from(center_zoom),
                        ]),
                    );
                }
                _ => {
                    doc.insert(name.clone(), Value::String(value.clone()));
                }
            }
        }

        let data = serde_json::to_vec(&Value::Object(doc))
            .map_err(|error| MercatorError::Other(error.to_string()))?;
        Ok(Response::from_data(data))
    }
}

fn parse_zoom(values: &BTreeMap<String, String>, name: &str) -> Result<i64, MercatorError> {
    let value = values
        .get(name)
        .ok_or_else(|| MercatorError::Archive(format!("missing {name} value")))?;
    value
        .parse()
        .map_err(|_| MercatorError::Archive(format!("invalid {name} value: {value}")))
}

/// Percent-decoded remainder of the URL after the archive prefix.
fn url_to_path(url: &str) -> String {
    let remainder = url.strip_prefix(ARCHIVE_SCHEME).unwrap_or(url);
    percent_decode_str(remainder)
        .decode_utf8_lossy()
        .into_owned()
}

/// File-system part of a decoded archive path, without the request-scoped query string.
fn archive_path(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

fn decompress(data: &[u8]) -> Result<Vec<u8>, MercatorError> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|error| MercatorError::Archive(format!("invalid gzip payload: {error}")))?;
    Ok(decompressed)
}
