//! Translation between provider-neutral logical URLs and concrete HTTPS URLs.
//!
//! Logical URLs (`provider://...`) abstract over regional and versioned provider endpoints.
//! *Normalization* expands a logical URL into the concrete URL used for transport, inserting the
//! access credential. *Canonicalization* is the inverse: it rewrites a concrete tile URL back
//! into its provider-neutral form so that cached responses can be reused across endpoint
//! variants.
//!
//! All functions here are pure functions of `(configuration, input URL, credential)`: no I/O, no
//! shared state. The two directions deliberately differ in their failure policy: normalization
//! of a source URL without a credential is a hard error, while canonicalization never fails and
//! echoes unrecognized input back unchanged.

mod parser;

use parser::{expand_template, PathParts, UrlParts};

use crate::error::MercatorError;
use crate::tile_server::TileServerConfig;
use crate::tileset::{SourceType, Tileset};

/// Tile size at which raster tiles are served with an explicit `@2x` density suffix.
const DENSITY_2X_TILE_SIZE: u16 = 512;

/// Returns true if the URL uses the configured provider scheme alias.
pub fn is_logical_url(config: &TileServerConfig, url: &str) -> bool {
    url.strip_prefix(config.uri_scheme_alias())
        .is_some_and(|rest| rest.starts_with("://"))
}

/// Expands a logical source (TileJSON) URL into a concrete URL.
///
/// `provider://{id}` becomes `{base}/v4/{id}.json?{key_param}={key}` (plus the configured query
/// suffix); a `style=` query parameter on the input is re-appended after normalization. URLs not
/// using the provider scheme are returned unchanged.
///
/// Unlike the other normalizers this one requires a credential: an empty `api_key` is an
/// [`MercatorError::InvalidCredential`] error, because silently emitting an unauthenticated
/// request would be a worse failure mode than refusing.
pub fn normalize_source_url(
    config: &TileServerConfig,
    url: &str,
    api_key: &str,
) -> Result<String, MercatorError> {
    if !is_logical_url(config, url) {
        return Ok(url.to_string());
    }
    if api_key.is_empty() {
        return Err(MercatorError::InvalidCredential);
    }

    let Some(parts) = UrlParts::parse(url) else {
        return Ok(url.to_string());
    };

    let mut result = format!(
        "{}{}?{}={}",
        config.base_url(),
        expand_template(config.source_template(), &parts),
        config.api_key_parameter_name(),
        api_key
    );
    if let Some(suffix) = config.source_query_suffix() {
        result.push('&');
        result.push_str(suffix);
    }
    append_query(&mut result, &parts);

    Ok(result)
}

/// Expands a logical style URL (`provider://styles/{user}/{id}[/draft]`) into a concrete URL.
///
/// Logical URLs without the style path marker (e.g. `provider://foo`) and non-scheme URLs are
/// returned unchanged. Trailing query parameters are preserved after the credential.
pub fn normalize_style_url(config: &TileServerConfig, url: &str, api_key: &str) -> String {
    normalize_for_domain(
        config,
        url,
        api_key,
        config.style_domain_name(),
        config.style_template(),
    )
}

/// Expands a logical sprite URL (`provider://sprites/{user}/{id}[/draft][@{ratio}x][.{ext}]`)
/// into a concrete URL.
///
/// Any other form, including a bare scheme followed only by slashes, is returned unchanged. A
/// query string is preserved literally, so a dangling `.png`-looking query suffix stays part of
/// the query rather than becoming an extension.
pub fn normalize_sprite_url(config: &TileServerConfig, url: &str, api_key: &str) -> String {
    normalize_for_domain(
        config,
        url,
        api_key,
        config.sprites_domain_name(),
        config.sprites_template(),
    )
}

/// Expands a logical glyph URL (`provider://fonts/{fontstack}/{range}.pbf`) into a concrete URL.
///
/// Only URLs with the font path marker are rewritten; any other scheme-prefixed path is returned
/// unchanged. This pass-through is intentional, matching the style/sprite normalizers.
pub fn normalize_glyphs_url(config: &TileServerConfig, url: &str, api_key: &str) -> String {
    normalize_for_domain(
        config,
        url,
        api_key,
        config.glyphs_domain_name(),
        config.glyphs_template(),
    )
}

/// Expands a logical tile URL (`provider://tiles/{idlist}/{z}/{x}/{y}[@{ratio}x].{ext}`) into a
/// concrete URL. Non-matching and non-scheme URLs are returned unchanged.
pub fn normalize_tile_url(config: &TileServerConfig, url: &str, api_key: &str) -> String {
    normalize_for_domain(
        config,
        url,
        api_key,
        config.tile_domain_name(),
        config.tile_template(),
    )
}

fn normalize_for_domain(
    config: &TileServerConfig,
    url: &str,
    api_key: &str,
    domain_name: &str,
    template: &str,
) -> String {
    if !is_logical_url(config, url) {
        return url.to_string();
    }
    let Some(parts) = UrlParts::parse(url) else {
        return url.to_string();
    };
    if parts.domain != domain_name {
        return url.to_string();
    }

    let mut result = format!(
        "{}{}?{}={}",
        config.base_url(),
        expand_template(template, &parts),
        config.api_key_parameter_name(),
        api_key
    );
    append_query(&mut result, &parts);
    result
}

/// Rewrites a concrete tile URL into its provider-neutral logical form.
///
/// Recognized URLs have a provider-family hostname and a
/// `{tile prefix}/{idlist}/{z}/{x}/{y}[.{suffix}]` path. The access credential parameter is
/// stripped wherever it occurs, preserving the relative order of all other parameters.
///
/// Ratio negotiation depends on the logical tile size, not on the URL: raster tiles at size 256
/// get a deferred `{ratio}` placeholder, at size 512 an explicit `@2x` marker; vector tiles
/// never carry a ratio marker.
///
/// Canonicalization never fails: input that does not match the recognized shape is returned
/// byte-for-byte unchanged.
pub fn canonicalize_tile_url(
    config: &TileServerConfig,
    url: &str,
    source_type: SourceType,
    tile_size: u16,
) -> String {
    let Some(parts) = UrlParts::parse(url) else {
        return url.to_string();
    };
    if !is_provider_host(config, parts.domain) {
        return url.to_string();
    }

    let prefix = config.tile_path_prefix();
    let Some(local_path) = parts.path.strip_prefix(prefix) else {
        return url.to_string();
    };
    if !local_path.starts_with('/') {
        return url.to_string();
    }

    let path = PathParts::parse(local_path);
    if path.filename.is_empty() || path.extension.len() <= 1 {
        return url.to_string();
    }

    let mut result = format!(
        "{}://{}",
        config.uri_scheme_alias(),
        config.tile_domain_name()
    );
    result.push_str(path.directory);
    result.push_str(path.filename);
    if source_type == SourceType::Raster {
        result.push_str(if tile_size == DENSITY_2X_TILE_SIZE {
            "@2x"
        } else {
            "{ratio}"
        });
    }
    result.push_str(strip_density_chunk(path.extension, source_type));

    let query = strip_query_parameter(parts.query, config.api_key_parameter_name());
    if !query.is_empty() {
        result.push('?');
        result.push_str(&query);
    }

    result
}

/// Rewrites every tile URL template of the tile set into its logical form, in place.
///
/// Only applied when the originating source URL is itself logical; tile sets obtained from
/// foreign endpoints are left untouched.
pub fn canonicalize_tileset(
    config: &TileServerConfig,
    tileset: &mut Tileset,
    source_url: &str,
    source_type: SourceType,
    tile_size: u16,
) {
    if !is_logical_url(config, source_url) {
        return;
    }
    for url in &mut tileset.tiles {
        *url = canonicalize_tile_url(config, url, source_type, tile_size);
    }
}

/// Whether the hostname belongs to the configured provider domain family.
///
/// Matches any hostname whose registrable label equals the configured domain marker, which
/// covers lettered CDN subdomains (`a.tiles.example.com`) as well as country-code variants
/// (`api.example.cn`).
fn is_provider_host(config: &TileServerConfig, host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    labels.len() >= 2 && labels[labels.len() - 2] == config.host_domain_name()
}

/// Appends the query of the input URL to an already normalized URL.
fn append_query(result: &mut String, parts: &UrlParts) {
    if !parts.query.is_empty() {
        result.push('&');
        result.push_str(parts.query);
    }
}

/// Removes the named parameter from a query string, keeping the order of the rest.
fn strip_query_parameter(query: &str, name: &str) -> String {
    if query.is_empty() {
        return String::new();
    }
    query
        .split('&')
        .filter(|pair| pair.split('=').next() != Some(name))
        .collect::<Vec<_>>()
        .join("&")
}

/// Drops a density chunk (`@2x`) captured at the start of an extension, so that the negotiated
/// ratio marker is not emitted twice for raster tiles.
fn strip_density_chunk(extension: &str, source_type: SourceType) -> &str {
    if source_type == SourceType::Raster && extension.starts_with('@') {
        match extension.find('.') {
            Some(dot) => &extension[dot..],
            None => extension,
        }
    } else {
        extension
    }
}
