//! Archive metadata sidecar.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::coord::GeoBoundingBox;

/// Name of the metadata entry inside the archive.
pub const METADATA_FILE_NAME: &str = "export.json";

/// Metadata describing an exported pack.
///
/// Persisted as the `export.json` sidecar inside the archive. The
/// bbox and zoom list always describe the *originally requested*
/// export, even when stop-and-pack truncated the download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// User-supplied region name (unsanitized).
    pub region: String,
    /// Requested bounding box.
    pub bbox: GeoBoundingBox,
    /// Requested zoom levels, ascending.
    pub zooms: Vec<u8>,
    /// Creation timestamp, ISO-8601 / RFC 3339.
    pub created_at: String,
    /// URL template of the tile source the pack was fetched from.
    pub tile_source: String,
}

impl ArchiveMetadata {
    /// Creates metadata stamped with the current time.
    pub fn new(
        region: impl Into<String>,
        bbox: GeoBoundingBox,
        zooms: Vec<u8>,
        tile_source: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            bbox,
            zooms,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            tile_source: tile_source.into(),
        }
    }
}
