//! Archive building
//!
//! Accumulates successfully fetched tile bytes and finalizes them,
//! together with the [`ArchiveMetadata`] sidecar, into a single
//! gzip-compressed tar blob. Entries follow the compatibility layout:
//!
//! ```text
//! <pack>/
//!   export.json            metadata sidecar
//!   <z>/<x>/<y>.png        one entry per fetched tile
//! ```
//!
//! A cancelled session simply drops the builder; nothing is ever
//! partially persisted or delivered.

mod metadata;
mod naming;

pub use metadata::{ArchiveMetadata, METADATA_FILE_NAME};
pub use naming::{sanitize_pack_name, FALLBACK_PACK_NAME};

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;
use tracing::debug;

use crate::coord::TileCoord;

/// Errors that can occur while finalizing or materializing an archive.
///
/// These are terminal for a session: a pipeline that cannot package
/// its output has failed.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Metadata could not be serialized.
    #[error("failed to serialize archive metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// An entry could not be written into the tar stream.
    #[error("failed to write archive entry {path}: {source}")]
    Entry {
        path: String,
        source: std::io::Error,
    },

    /// The compressed stream could not be finished.
    #[error("failed to finish archive stream: {0}")]
    Finish(#[source] std::io::Error),

    /// The archive blob could not be written to disk.
    #[error("failed to write archive to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Accumulates fetched tiles and packages them into one archive.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: BTreeMap<String, Bytes>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the raw bytes for a fetched tile under its `z/x/y.png`
    /// path. A repeated coordinate replaces the previous bytes.
    pub fn add_tile(&mut self, coord: &TileCoord, bytes: Bytes) {
        self.entries.insert(coord.entry_path(), bytes);
    }

    /// Number of tiles accumulated so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total accumulated tile bytes.
    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|b| b.len() as u64).sum()
    }

    /// Packages all accumulated tiles plus the metadata sidecar into a
    /// gzip-compressed tar blob named from the sanitized pack name.
    pub fn finalize(
        self,
        pack_name: &str,
        metadata: &ArchiveMetadata,
    ) -> Result<ExportArchive, ArchiveError> {
        let stem = sanitize_pack_name(pack_name);
        let mtime = chrono::Utc::now().timestamp().max(0) as u64;

        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut tar = tar::Builder::new(encoder);

        let sidecar = serde_json::to_vec_pretty(metadata)?;
        append_entry(
            &mut tar,
            &format!("{}/{}", stem, METADATA_FILE_NAME),
            &sidecar,
            mtime,
        )?;

        for (path, bytes) in &self.entries {
            append_entry(&mut tar, &format!("{}/{}", stem, path), bytes, mtime)?;
        }

        let encoder = tar.into_inner().map_err(ArchiveError::Finish)?;
        let data = encoder.finish().map_err(ArchiveError::Finish)?;

        debug!(
            pack = %stem,
            tiles = self.entries.len(),
            compressed_bytes = data.len(),
            "Archive finalized"
        );

        Ok(ExportArchive {
            file_name: format!("{}.tar.gz", stem),
            data,
            metadata: metadata.clone(),
        })
    }
}

fn append_entry<W: Write>(
    tar: &mut tar::Builder<W>,
    path: &str,
    data: &[u8],
    mtime: u64,
) -> Result<(), ArchiveError> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    header.set_cksum();
    tar.append_data(&mut header, path, data)
        .map_err(|source| ArchiveError::Entry {
            path: path.to_string(),
            source,
        })
}

/// A finalized export: the packaged blob plus its metadata.
///
/// This only ever becomes visible to callers after a successful
/// finalize; cancelled sessions never produce one.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    file_name: String,
    data: Vec<u8>,
    metadata: ArchiveMetadata,
}

impl ExportArchive {
    /// Archive filename, `<sanitized-pack>.tar.gz`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The compressed archive bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Compressed size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The metadata that was written into the sidecar.
    pub fn metadata(&self) -> &ArchiveMetadata {
        &self.metadata
    }

    /// Writes the archive blob into `dir`, returning the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ArchiveError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.data).map_err(|source| ArchiveError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
