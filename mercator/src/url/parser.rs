//! Structured breakdown of resource URLs.
//!
//! The rewrite rules in the parent module operate on a typed breakdown instead of raw string
//! offsets so that the many edge cases (draft styles, density suffixes, multi-id tile paths)
//! stay testable in isolation.

use std::collections::HashMap;

/// Breakdown of an absolute URL into scheme, domain, path and query.
///
/// For custom-scheme URLs like `provider://styles/user/id` the "domain" is the first path
/// segment after the scheme separator, which is how logical URLs encode the resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UrlParts<'a> {
    /// Scheme without the `://` separator.
    pub scheme: &'a str,
    /// Host, or the first segment of a custom-scheme URL.
    pub domain: &'a str,
    /// Path including the leading `/`; empty when the URL has none.
    pub path: &'a str,
    /// Query string without the leading `?`; empty when there is none.
    pub query: &'a str,
}

impl<'a> UrlParts<'a> {
    /// Parses the URL, returning `None` when it carries no `://` separator.
    pub(crate) fn parse(url: &'a str) -> Option<Self> {
        let scheme_end = url.find("://")?;
        let scheme = &url[..scheme_end];
        let rest = &url[scheme_end + 3..];

        let domain_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let domain = &rest[..domain_end];
        let rest = &rest[domain_end..];

        let (path, query) = match rest.find('?') {
            Some(query_start) => (&rest[..query_start], &rest[query_start + 1..]),
            None => (rest, ""),
        };

        Some(Self {
            scheme,
            domain,
            path,
            query,
        })
    }
}

/// Breakdown of a URL path into directory, file name and extension.
///
/// The extension starts at the first `.` or `@` of the file name, so a density suffix is carried
/// by the extension (`streets-v8@2x.png` splits into `streets-v8` and `@2x.png`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathParts<'a> {
    /// Directory part including the trailing `/`; empty when the path has no `/`.
    pub directory: &'a str,
    /// File name without its extension.
    pub filename: &'a str,
    /// Extension including its leading `.` or `@`; empty when there is none.
    pub extension: &'a str,
}

impl<'a> PathParts<'a> {
    pub(crate) fn parse(path: &'a str) -> Self {
        let (directory, file) = match path.rfind('/') {
            Some(slash) => path.split_at(slash + 1),
            None => ("", path),
        };

        let (filename, extension) = match file.find(['.', '@']) {
            Some(dot) => file.split_at(dot),
            None => (file, ""),
        };

        Self {
            directory,
            filename,
            extension,
        }
    }
}

/// Expands a configuration template by substituting URL part tokens.
///
/// Templates are validated at configuration time; a malformed template is logged and returned
/// verbatim rather than aborting the request.
pub(crate) fn expand_template(template: &str, parts: &UrlParts) -> String {
    let path_parts = PathParts::parse(parts.path);
    let vars = HashMap::from([
        ("domain".to_string(), parts.domain.to_string()),
        ("path".to_string(), parts.path.to_string()),
        ("directory".to_string(), path_parts.directory.to_string()),
        ("filename".to_string(), path_parts.filename.to_string()),
        ("extension".to_string(), path_parts.extension.to_string()),
    ]);

    strfmt::strfmt(template, &vars).unwrap_or_else(|error| {
        log::error!("Malformed URL template {template}: {error}");
        template.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_concrete_url() {
        let parts = UrlParts::parse("http://a.tiles.example.com/v4/a.b/0/0/0.png?access_token=key")
            .expect("url has a scheme");
        assert_eq!(parts.scheme, "http");
        assert_eq!(parts.domain, "a.tiles.example.com");
        assert_eq!(parts.path, "/v4/a.b/0/0/0.png");
        assert_eq!(parts.query, "access_token=key");
    }

    #[test]
    fn parses_logical_url_without_path() {
        let parts = UrlParts::parse("provider://user.map").expect("url has a scheme");
        assert_eq!(parts.scheme, "provider");
        assert_eq!(parts.domain, "user.map");
        assert_eq!(parts.path, "");
        assert_eq!(parts.query, "");
    }

    #[test]
    fn query_may_contain_nested_scheme() {
        let parts = UrlParts::parse("provider://user.map?style=provider://styles/user/id@0")
            .expect("url has a scheme");
        assert_eq!(parts.domain, "user.map");
        assert_eq!(parts.query, "style=provider://styles/user/id@0");
    }

    #[test]
    fn empty_domain_before_slashes() {
        let parts = UrlParts::parse("provider://////").expect("url has a scheme");
        assert_eq!(parts.domain, "");
        assert_eq!(parts.path, "////");
    }

    #[test]
    fn rejects_relative_url() {
        assert_eq!(UrlParts::parse("map/box/sprites@2x.json"), None);
        assert_eq!(UrlParts::parse(""), None);
    }

    #[test]
    fn path_splits_at_first_dot() {
        let parts = PathParts::parse("/user/streets-v8.json");
        assert_eq!(parts.directory, "/user/");
        assert_eq!(parts.filename, "streets-v8");
        assert_eq!(parts.extension, ".json");
    }

    #[test]
    fn density_suffix_belongs_to_extension() {
        let parts = PathParts::parse("/user/streets-v8@2x.png");
        assert_eq!(parts.filename, "streets-v8");
        assert_eq!(parts.extension, "@2x.png");
    }

    #[test]
    fn multi_part_extension_is_kept_whole() {
        let parts = PathParts::parse("/a.b/{z}/{x}/{y}.vector.pbf");
        assert_eq!(parts.directory, "/a.b/{z}/{x}/");
        assert_eq!(parts.filename, "{y}");
        assert_eq!(parts.extension, ".vector.pbf");
    }

    #[test]
    fn path_without_extension() {
        let parts = PathParts::parse("/user/streets-v11");
        assert_eq!(parts.directory, "/user/");
        assert_eq!(parts.filename, "streets-v11");
        assert_eq!(parts.extension, "");
    }

    #[test]
    fn expands_all_tokens() {
        let parts = UrlParts::parse("provider://sprites/user/streets-v8@2x.png")
            .expect("url has a scheme");
        let expanded = expand_template("/styles/v1{directory}{filename}/sprite{extension}", &parts);
        assert_eq!(expanded, "/styles/v1/user/streets-v8/sprite@2x.png");
    }
}
