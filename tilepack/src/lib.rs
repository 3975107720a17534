//! Tilepack - Offline map tile export
//!
//! This library plans, fetches, and packages rectangular map regions
//! into self-contained offline tile archives. A region is described by
//! a geographic bounding box and a set of Web Mercator zoom levels;
//! the output is a gzip-compressed tar archive of `z/x/y.png` tiles
//! plus an `export.json` metadata sidecar.
//!
//! # High-Level API
//!
//! Most callers only need the [`service`] module:
//!
//! ```ignore
//! use tilepack::coord::GeoBoundingBox;
//! use tilepack::plan::ZoomSelection;
//! use tilepack::provider::{ReqwestClient, TileSource};
//! use tilepack::service::{ExportRequest, ExportService};
//!
//! let service = ExportService::new(ReqwestClient::new()?);
//! let handle = service.start(
//!     ExportRequest::new("Algarve Coast")
//!         .with_bbox(GeoBoundingBox::new(37.0, -8.6, 37.2, -8.4)?)
//!         .with_zooms(ZoomSelection::range(12, 14))
//!         .with_source(TileSource::new("osm", "https://tile.example/{z}/{x}/{y}.png")),
//! )?;
//!
//! // The handle controls the running session.
//! handle.pause();
//! handle.resume();
//! let outcome = handle.wait().await;
//! ```

pub mod archive;
pub mod coord;
pub mod error;
pub mod executor;
pub mod plan;
pub mod provider;
pub mod service;
pub mod session;

pub use error::{ExportError, ExportOutcome};

/// Version of the tilepack library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
