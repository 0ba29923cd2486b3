//! Tile server configuration: an immutable description of a provider's URL layout.

/// Configuration of a tile provider's URL layout.
///
/// The configuration is constructed once with [`TileServerConfigBuilder`] and shared by
/// reference; it is never mutated afterwards. The only derivation operation,
/// [`with_base_url`](TileServerConfig::with_base_url), returns a new independent value.
///
/// URL templates may use the tokens `{domain}`, `{path}`, `{directory}`, `{filename}` and
/// `{extension}`, which are replaced with the corresponding parts of the logical URL being
/// rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileServerConfig {
    base_url: String,
    uri_scheme_alias: String,
    api_key_parameter_name: String,
    host_domain_name: String,
    source_template: String,
    source_query_suffix: Option<String>,
    style_template: String,
    style_domain_name: String,
    sprites_template: String,
    sprites_domain_name: String,
    glyphs_template: String,
    glyphs_domain_name: String,
    tile_template: String,
    tile_domain_name: String,
    default_style: String,
}

impl TileServerConfig {
    /// Configuration of the demo tile server. Mostly useful as a documentation aid; production
    /// applications configure their own provider with [`TileServerConfigBuilder`].
    pub fn default_configuration() -> Self {
        TileServerConfigBuilder::new("https://demotiles.mercator.dev", "mercator").build()
    }

    /// Scheme and host of the provider API, e.g. `https://api.example.com`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scheme by which logical URLs address this provider, without the `://` separator.
    pub fn uri_scheme_alias(&self) -> &str {
        &self.uri_scheme_alias
    }

    /// Name of the query parameter that carries the access credential.
    pub fn api_key_parameter_name(&self) -> &str {
        &self.api_key_parameter_name
    }

    /// Registrable domain name that identifies provider-hosted hostnames, including lettered CDN
    /// subdomains and country-code variants (`a.tiles.example.com`, `api.example.cn`).
    pub fn host_domain_name(&self) -> &str {
        &self.host_domain_name
    }

    /// URL template for source metadata documents.
    pub fn source_template(&self) -> &str {
        &self.source_template
    }

    /// Extra query parameter appended to normalized source URLs after the credential.
    pub fn source_query_suffix(&self) -> Option<&str> {
        self.source_query_suffix.as_deref()
    }

    /// URL template for style documents.
    pub fn style_template(&self) -> &str {
        &self.style_template
    }

    /// First path segment that marks a logical URL as a style URL.
    pub fn style_domain_name(&self) -> &str {
        &self.style_domain_name
    }

    /// URL template for sprite sheets.
    pub fn sprites_template(&self) -> &str {
        &self.sprites_template
    }

    /// First path segment that marks a logical URL as a sprite URL.
    pub fn sprites_domain_name(&self) -> &str {
        &self.sprites_domain_name
    }

    /// URL template for glyph ranges.
    pub fn glyphs_template(&self) -> &str {
        &self.glyphs_template
    }

    /// First path segment that marks a logical URL as a glyph URL.
    pub fn glyphs_domain_name(&self) -> &str {
        &self.glyphs_domain_name
    }

    /// URL template for tiles.
    pub fn tile_template(&self) -> &str {
        &self.tile_template
    }

    /// First path segment that marks a logical URL as a tile URL.
    pub fn tile_domain_name(&self) -> &str {
        &self.tile_domain_name
    }

    /// Logical URL of the provider's default style.
    pub fn default_style_url(&self) -> &str {
        &self.default_style
    }

    /// Returns a new configuration identical to this one except for the base URL.
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..self.clone()
        }
    }

    /// Path prefix concrete tile URLs carry on this provider, derived from the tile template.
    pub(crate) fn tile_path_prefix(&self) -> &str {
        self.tile_template.split("{path}").next().unwrap_or("")
    }
}

/// Constructor for a [`TileServerConfig`].
///
/// The builder starts from a conventional template set (`/v4/{domain}.json` sources,
/// `/styles/v1{path}` styles and so on) so that only provider-specific parts need to be set.
///
/// ```
/// use mercator::TileServerConfigBuilder;
///
/// let config = TileServerConfigBuilder::new("https://api.example.com", "provider")
///     .with_host_domain_name("example")
///     .with_api_key_parameter_name("access_token")
///     .build();
///
/// assert_eq!(config.base_url(), "https://api.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct TileServerConfigBuilder {
    config: TileServerConfig,
}

impl TileServerConfigBuilder {
    /// Initializes a builder for a provider reachable at `base_url` and addressed by logical
    /// URLs with the `uri_scheme_alias` scheme.
    pub fn new(base_url: impl Into<String>, uri_scheme_alias: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let uri_scheme_alias = uri_scheme_alias.into();
        let host_domain_name = uri_scheme_alias.clone();
        let default_style = format!("{uri_scheme_alias}://styles/{uri_scheme_alias}/basic");
        Self {
            config: TileServerConfig {
                base_url,
                uri_scheme_alias,
                api_key_parameter_name: "api_key".to_string(),
                host_domain_name,
                source_template: "/v4/{domain}.json".to_string(),
                source_query_suffix: None,
                style_template: "/styles/v1{path}".to_string(),
                style_domain_name: "styles".to_string(),
                sprites_template: "/styles/v1{directory}{filename}/sprite{extension}".to_string(),
                sprites_domain_name: "sprites".to_string(),
                glyphs_template: "/fonts/v1{path}".to_string(),
                glyphs_domain_name: "fonts".to_string(),
                tile_template: "/v4{path}".to_string(),
                tile_domain_name: "tiles".to_string(),
                default_style,
            },
        }
    }

    /// Sets the name of the query parameter that carries the access credential.
    pub fn with_api_key_parameter_name(mut self, name: impl Into<String>) -> Self {
        self.config.api_key_parameter_name = name.into();
        self
    }

    /// Sets the registrable domain name used to recognize provider-hosted hostnames.
    ///
    /// Defaults to the URI scheme alias.
    pub fn with_host_domain_name(mut self, name: impl Into<String>) -> Self {
        self.config.host_domain_name = name.into();
        self
    }

    /// Sets the source metadata URL template and an optional query suffix appended after the
    /// credential (e.g. `secure`).
    pub fn with_source_template(
        mut self,
        template: impl Into<String>,
        query_suffix: Option<&str>,
    ) -> Self {
        self.config.source_template = template.into();
        self.config.source_query_suffix = query_suffix.map(str::to_string);
        self
    }

    /// Sets the style URL template and the path segment that marks style URLs.
    pub fn with_style_template(
        mut self,
        template: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Self {
        self.config.style_template = template.into();
        self.config.style_domain_name = domain_name.into();
        self
    }

    /// Sets the sprite URL template and the path segment that marks sprite URLs.
    pub fn with_sprites_template(
        mut self,
        template: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Self {
        self.config.sprites_template = template.into();
        self.config.sprites_domain_name = domain_name.into();
        self
    }

    /// Sets the glyph URL template and the path segment that marks glyph URLs.
    pub fn with_glyphs_template(
        mut self,
        template: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Self {
        self.config.glyphs_template = template.into();
        self.config.glyphs_domain_name = domain_name.into();
        self
    }

    /// Sets the tile URL template and the path segment that marks tile URLs.
    pub fn with_tile_template(
        mut self,
        template: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Self {
        self.config.tile_template = template.into();
        self.config.tile_domain_name = domain_name.into();
        self
    }

    /// Sets the logical URL of the provider's default style.
    pub fn with_default_style(mut self, default_style: impl Into<String>) -> Self {
        self.config.default_style = default_style.into();
        self
    }

    /// Consumes the builder and returns the configuration.
    pub fn build(self) -> TileServerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_url_returns_derived_copy() {
        let config = TileServerConfigBuilder::new("https://api.example.com", "provider").build();
        let derived = config.with_base_url("https://api.other.com");

        assert_eq!(config.base_url(), "https://api.example.com");
        assert_eq!(derived.base_url(), "https://api.other.com");
        assert_eq!(derived.uri_scheme_alias(), config.uri_scheme_alias());
        assert_eq!(derived.tile_template(), config.tile_template());
    }

    #[test]
    fn host_domain_defaults_to_scheme_alias() {
        let config = TileServerConfigBuilder::new("https://api.example.com", "provider").build();
        assert_eq!(config.host_domain_name(), "provider");

        let config = TileServerConfigBuilder::new("https://api.example.com", "provider")
            .with_host_domain_name("example")
            .build();
        assert_eq!(config.host_domain_name(), "example");
    }

    #[test]
    fn tile_path_prefix_is_derived_from_template() {
        let config = TileServerConfigBuilder::new("https://api.example.com", "provider").build();
        assert_eq!(config.tile_path_prefix(), "/v4");

        let config = TileServerConfigBuilder::new("https://api.example.com", "provider")
            .with_tile_template("/tiles/v2{path}", "tiles")
            .build();
        assert_eq!(config.tile_path_prefix(), "/tiles/v2");
    }

    #[test]
    fn default_configuration_is_well_formed() {
        let config = TileServerConfig::default_configuration();
        assert!(config.base_url().starts_with("https://"));
        assert!(!config.uri_scheme_alias().is_empty());
        assert!(config.tile_template().contains("{path}"));
        assert_eq!(config.default_style_url(), "mercator://styles/mercator/basic");

        let config = TileServerConfigBuilder::new("https://api.example.com", "provider")
            .with_default_style("provider://styles/provider/streets")
            .build();
        assert_eq!(
            config.default_style_url(),
            "provider://styles/provider/streets"
        );
    }
}
