//! Tile source description and URL resolution.

use crate::coord::TileCoord;

/// A resolved tile source: a URL template plus optional mirror
/// subdomains.
///
/// The template carries `{z}`, `{x}`, `{y}` placeholders and may carry
/// `{s}`. Provider registries (which source maps to which template)
/// are external configuration; the pipeline only ever sees a resolved
/// `TileSource`.
///
/// # Example
///
/// ```
/// use tilepack::coord::TileCoord;
/// use tilepack::provider::TileSource;
///
/// let source = TileSource::new(
///     "osm",
///     "https://{s}.tile.example.org/{z}/{x}/{y}.png",
/// )
/// .with_subdomains(["a", "b", "c"]);
///
/// let tile = TileCoord { zoom: 12, x: 1950, y: 1592 };
/// // (1950 + 1592) % 3 == 2 -> subdomain "c"
/// assert_eq!(
///     source.tile_url(&tile),
///     "https://c.tile.example.org/12/1950/1592.png"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    name: String,
    url_template: String,
    subdomains: Vec<String>,
}

impl TileSource {
    /// Creates a tile source from a name and URL template.
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            subdomains: Vec::new(),
        }
    }

    /// Sets the subdomain list used for `{s}` substitution.
    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the source name, for logging and metadata.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw URL template.
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Resolves the fetch URL for a tile.
    ///
    /// Substitutes `{z}`, `{x}`, `{y}`, and, when the template carries
    /// a `{s}` placeholder, picks `subdomains[(x + y) % len]` to
    /// spread load across mirrors. With no subdomains configured the
    /// placeholder resolves to a single empty subdomain, matching the
    /// reference behavior.
    pub fn tile_url(&self, tile: &TileCoord) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string());

        if url.contains("{s}") {
            let subdomain = if self.subdomains.is_empty() {
                ""
            } else {
                let index = (tile.x as usize + tile.y as usize) % self.subdomains.len();
                &self.subdomains[index]
            };
            url = url.replace("{s}", subdomain);
        }

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(zoom: u8, x: u32, y: u32) -> TileCoord {
        TileCoord { zoom, x, y }
    }

    #[test]
    fn test_plain_template_substitution() {
        let source = TileSource::new("test", "https://x.example/{z}/{x}/{y}.png");
        assert_eq!(
            source.tile_url(&tile(12, 1950, 1592)),
            "https://x.example/12/1950/1592.png"
        );
    }

    #[test]
    fn test_subdomain_rotation() {
        let source = TileSource::new("osm", "https://{s}.tile.example/{z}/{x}/{y}.png")
            .with_subdomains(["a", "b", "c"]);

        // (x + y) % 3 selects the mirror
        assert!(source.tile_url(&tile(10, 0, 0)).starts_with("https://a."));
        assert!(source.tile_url(&tile(10, 0, 1)).starts_with("https://b."));
        assert!(source.tile_url(&tile(10, 1, 1)).starts_with("https://c."));
        assert!(source.tile_url(&tile(10, 2, 1)).starts_with("https://a.")); // wraps
    }

    #[test]
    fn test_subdomain_placeholder_with_empty_list() {
        // Reference behavior: fall back to a single empty subdomain
        // rather than leaving the placeholder in place
        let source = TileSource::new("bare", "https://{s}.tile.example/{z}/{x}/{y}.png");
        assert_eq!(
            source.tile_url(&tile(5, 3, 7)),
            "https://.tile.example/5/3/7.png"
        );
    }

    #[test]
    fn test_template_without_subdomain_ignores_list() {
        let source =
            TileSource::new("flat", "https://x.example/{z}/{x}/{y}.png").with_subdomains(["a"]);
        assert!(!source.tile_url(&tile(1, 0, 0)).contains('{'));
    }

    #[test]
    fn test_accessors() {
        let source = TileSource::new("osm", "https://x.example/{z}/{x}/{y}.png");
        assert_eq!(source.name(), "osm");
        assert_eq!(source.url_template(), "https://x.example/{z}/{x}/{y}.png");
    }
}
