//! Export planning
//!
//! Turns a bounding box plus a zoom selection into the full, ordered
//! list of tile jobs for a session. Planning is deterministic:
//! identical inputs always produce an identical job sequence, which is
//! what makes stop-and-pack behavior reproducible and testable.

use thiserror::Error;
use tracing::debug;

use crate::coord::{tile_range, CoordError, GeoBoundingBox, TileCoord, MAX_ZOOM};
use crate::provider::TileSource;

/// Heuristic average tile size in kilobytes, used for size estimates.
///
/// An observed average for 256x256 raster tiles; an estimate for user
/// display, not a guarantee.
pub const AVG_TILE_SIZE_KB: f64 = 8.5;

/// Errors that reject an export before any network activity.
#[derive(Debug, Error)]
pub enum PlanError {
    /// No bounding box was supplied with the request.
    #[error("no bounding box selected for export")]
    MissingBoundingBox,

    /// No tile source was resolved before starting.
    #[error("no tile source resolved for export")]
    UnresolvedTileSource,

    /// The zoom selection normalized to nothing.
    #[error("zoom selection is empty")]
    EmptyZoomSelection,

    /// Projection failure while enumerating ranges.
    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// An ordered, deduplicated set of zoom levels in `[0, 18]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomSelection(Vec<u8>);

impl ZoomSelection {
    /// Builds a selection from a `(from, to)` pair.
    ///
    /// The pair is sorted (so `(13, 12)` means `12..=13`) and clamped
    /// into the supported range before use.
    pub fn range(from: u8, to: u8) -> Self {
        let lo = from.min(to).min(MAX_ZOOM);
        let hi = from.max(to).min(MAX_ZOOM);
        Self((lo..=hi).collect())
    }

    /// Builds a selection from explicit levels.
    ///
    /// Levels are clamped into range, sorted ascending, and deduplicated.
    pub fn levels(levels: impl IntoIterator<Item = u8>) -> Self {
        let mut levels: Vec<u8> = levels.into_iter().map(|z| z.min(MAX_ZOOM)).collect();
        levels.sort_unstable();
        levels.dedup();
        Self(levels)
    }

    /// The selected levels, ascending.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for ZoomSelection {
    /// An empty selection; planning rejects it until levels are chosen.
    fn default() -> Self {
        Self(Vec::new())
    }
}

/// A single planned tile fetch: the coordinate plus its resolved URL.
///
/// URLs are resolved at planning time so the job list is
/// self-contained and covered by the plan's determinism guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileJob {
    /// Tile address.
    pub coord: TileCoord,
    /// Fully resolved fetch URL.
    pub url: String,
}

/// The complete, ordered job list for an export session.
///
/// Jobs are ordered by zoom ascending, then `x` ascending, then `y`
/// ascending; the total count is fixed once planning completes.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    jobs: Vec<TileJob>,
}

impl ExportPlan {
    /// Enumerates the full job list for a bounding box and zoom selection.
    ///
    /// # Arguments
    ///
    /// * `bbox` - Geographic region to export
    /// * `zooms` - Zoom levels to cover
    /// * `source` - Tile source used to resolve fetch URLs
    pub fn build(
        bbox: &GeoBoundingBox,
        zooms: &ZoomSelection,
        source: &TileSource,
    ) -> Result<Self, PlanError> {
        if zooms.is_empty() {
            return Err(PlanError::EmptyZoomSelection);
        }

        let mut jobs = Vec::new();
        for &zoom in zooms.as_slice() {
            let range = tile_range(bbox, zoom)?;
            debug!(
                zoom,
                x_min = range.x_min,
                x_max = range.x_max,
                y_min = range.y_min,
                y_max = range.y_max,
                tiles = range.count(),
                "Planned tile range"
            );
            for coord in range.coords() {
                jobs.push(TileJob {
                    url: source.tile_url(&coord),
                    coord,
                });
            }
        }

        debug!(total = jobs.len(), "Export plan complete");
        Ok(Self { jobs })
    }

    /// The planned jobs in execution order.
    pub fn jobs(&self) -> &[TileJob] {
        &self.jobs
    }

    /// Consumes the plan, yielding the job queue.
    pub fn into_jobs(self) -> Vec<TileJob> {
        self.jobs
    }

    /// Total number of planned tiles.
    pub fn tile_count(&self) -> u64 {
        self.jobs.len() as u64
    }

    /// Estimated download size in megabytes for this plan.
    pub fn estimated_size_mb(&self) -> f64 {
        estimated_size_mb(self.tile_count())
    }
}

/// Estimates download size in megabytes from a tile count.
///
/// `tile_count x 8.5 KB / 1024`, a display heuristic only.
pub fn estimated_size_mb(tile_count: u64) -> f64 {
    tile_count as f64 * AVG_TILE_SIZE_KB / 1024.0
}
