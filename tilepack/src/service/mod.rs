//! Export service and session handles
//!
//! The [`ExportService`] is the single entry point callers use: it
//! validates an [`ExportRequest`], plans the job queue, and spawns a
//! [`FetchExecutor`](crate::executor::FetchExecutor) task. The
//! returned [`ExportHandle`] carries all interaction with the running
//! session: pause, resume, stop-and-pack, cancel, progress, and
//! awaiting the outcome.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::archive::ArchiveMetadata;
use crate::coord::GeoBoundingBox;
use crate::error::{ExportError, ExportOutcome};
use crate::executor::{ControlSignal, FetchExecutor, RetryPolicy, SIGNAL_CHANNEL_CAPACITY};
use crate::plan::{ExportPlan, PlanError, ZoomSelection};
use crate::provider::{HttpClient, TileSource};
use crate::session::ProgressSnapshot;

/// A fully described export request.
///
/// The bounding box and tile source are optional at the type level so
/// callers can assemble a request incrementally; [`ExportService::start`]
/// rejects a request that is still missing either.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// User-facing region name; also seeds the archive name.
    pub region_name: String,
    /// Geographic region to export.
    pub bbox: Option<GeoBoundingBox>,
    /// Zoom levels to cover.
    pub zooms: ZoomSelection,
    /// Tile source to fetch from.
    pub source: Option<TileSource>,
}

impl ExportRequest {
    pub fn new(region_name: impl Into<String>) -> Self {
        Self {
            region_name: region_name.into(),
            bbox: None,
            zooms: ZoomSelection::default(),
            source: None,
        }
    }

    pub fn with_bbox(mut self, bbox: GeoBoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_zooms(mut self, zooms: ZoomSelection) -> Self {
        self.zooms = zooms;
        self
    }

    pub fn with_source(mut self, source: TileSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// Spawns and supervises export sessions.
///
/// Generic over the HTTP client so the whole pipeline can run against
/// scripted responses in tests.
pub struct ExportService<C: HttpClient> {
    client: Arc<C>,
    policy: RetryPolicy,
}

impl<C: HttpClient> ExportService<C> {
    /// Creates a service with the default retry policy.
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
            policy: RetryPolicy::default(),
        }
    }

    /// Overrides the per-tile retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Plans the request and spawns a fetch session.
    ///
    /// Validation happens before any network activity: a request with
    /// no bounding box, no tile source, or an empty zoom selection is
    /// rejected here.
    pub fn start(&self, request: ExportRequest) -> Result<ExportHandle, PlanError> {
        let bbox = request.bbox.ok_or(PlanError::MissingBoundingBox)?;
        let source = request.source.ok_or(PlanError::UnresolvedTileSource)?;

        let plan = ExportPlan::build(&bbox, &request.zooms, &source)?;
        info!(
            region = %request.region_name,
            tiles = plan.tile_count(),
            estimated_mb = plan.estimated_size_mb(),
            source = source.name(),
            "Starting export session"
        );

        let metadata = ArchiveMetadata::new(
            request.region_name.clone(),
            bbox,
            request.zooms.as_slice().to_vec(),
            source.url_template(),
        );

        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let (progress_tx, progress_rx) = watch::channel(ProgressSnapshot {
            state: Default::default(),
            done: 0,
            total: plan.tile_count(),
            failed_count: 0,
            bytes_downloaded: 0,
            elapsed: std::time::Duration::ZERO,
        });

        let executor = FetchExecutor::new(
            Arc::clone(&self.client),
            plan,
            request.region_name,
            metadata,
            self.policy.clone(),
            signal_rx,
            cancel.clone(),
            progress_tx,
        );
        let outcome = tokio::spawn(executor.run());

        Ok(ExportHandle {
            signal_tx,
            cancel,
            progress_rx,
            outcome,
        })
    }
}

/// Handle to a running export session.
///
/// Control methods are non-blocking; each takes effect at the next job
/// boundary. Signals sent to a session that already terminated are
/// silently dropped.
pub struct ExportHandle {
    signal_tx: mpsc::Sender<ControlSignal>,
    cancel: CancellationToken,
    progress_rx: watch::Receiver<ProgressSnapshot>,
    outcome: JoinHandle<ExportOutcome>,
}

impl ExportHandle {
    /// Requests a pause before the next fetch.
    pub fn pause(&self) {
        let _ = self.signal_tx.try_send(ControlSignal::Pause);
    }

    /// Requests that a paused session continue.
    pub fn resume(&self) {
        let _ = self.signal_tx.try_send(ControlSignal::Resume);
    }

    /// Stops fetching and packages everything fetched so far.
    pub fn stop_and_pack(&self) {
        let _ = self.signal_tx.try_send(ControlSignal::StopAndPack);
    }

    /// Aborts the session, discarding all fetched data.
    ///
    /// Unlike the queued signals this takes effect immediately, even
    /// mid-fetch.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that observers can use to follow cancellation.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The most recent progress snapshot.
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress_rx.borrow().clone()
    }

    /// A watch receiver for following progress updates.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress_rx.clone()
    }

    /// Waits for the session to reach its terminal state.
    pub async fn wait(self) -> ExportOutcome {
        match self.outcome.await {
            Ok(outcome) => outcome,
            // Only reachable if the executor task panicked or the
            // runtime shut down under it.
            Err(error) => {
                warn!(%error, "Export task terminated abnormally");
                ExportOutcome::Failed(ExportError::Aborted(error.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for ExportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportHandle")
            .field("progress", &self.progress())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::provider::{MockHttpClient, ProviderError};
    use crate::session::ExportState;

    fn request() -> ExportRequest {
        ExportRequest::new("Algarve Coast")
            .with_bbox(GeoBoundingBox::new(37.0, -8.6, 37.2, -8.4).unwrap())
            .with_zooms(ZoomSelection::range(12, 13))
            .with_source(TileSource::new(
                "osm",
                "https://tile.example/{z}/{x}/{y}.png",
            ))
    }

    #[tokio::test]
    async fn test_start_rejects_missing_bbox() {
        let service = ExportService::new(MockHttpClient::new(Ok(Bytes::new())));
        let mut req = request();
        req.bbox = None;

        let result = service.start(req);
        assert!(matches!(result, Err(PlanError::MissingBoundingBox)));
    }

    #[tokio::test]
    async fn test_start_rejects_missing_source() {
        let service = ExportService::new(MockHttpClient::new(Ok(Bytes::new())));
        let mut req = request();
        req.source = None;

        let result = service.start(req);
        assert!(matches!(result, Err(PlanError::UnresolvedTileSource)));
    }

    #[tokio::test]
    async fn test_start_rejects_empty_zoom_selection() {
        let service = ExportService::new(MockHttpClient::new(Ok(Bytes::new())));
        let req = request().with_zooms(ZoomSelection::default());

        let result = service.start(req);
        assert!(matches!(result, Err(PlanError::EmptyZoomSelection)));
    }

    #[tokio::test]
    async fn test_full_session_through_handle() {
        let service =
            ExportService::new(MockHttpClient::new(Ok(Bytes::from_static(b"pixels"))));
        let handle = service.start(request()).unwrap();

        // 12 tiles at zoom 12 plus 35 at zoom 13.
        assert_eq!(handle.progress().total, 47);

        let outcome = handle.wait().await;
        let archive = outcome.into_archive().expect("should complete");
        assert_eq!(archive.file_name(), "Algarve_Coast.tar.gz");
        assert_eq!(archive.metadata().zooms, vec![12, 13]);
    }

    #[tokio::test]
    async fn test_cancel_through_handle() {
        let service =
            ExportService::new(MockHttpClient::new(Ok(Bytes::from_static(b"pixels"))));
        let handle = service.start(request()).unwrap();
        handle.cancel();

        let outcome = handle.wait().await;
        // Cancellation may race the last few fetches, but the outcome
        // is terminal either way and a cancelled run yields no archive.
        if outcome.is_cancelled() {
            assert!(outcome.into_archive().is_none());
        }
    }

    #[tokio::test]
    async fn test_progress_reaches_terminal_state() {
        let service =
            ExportService::new(MockHttpClient::new(Ok(Bytes::from_static(b"pixels"))));
        let handle = service.start(request()).unwrap();

        let mut progress = handle.subscribe();
        let outcome = handle.wait().await;
        assert!(outcome.is_completed());

        let snapshot = progress
            .wait_for(|snapshot| snapshot.state.is_terminal())
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot.state, ExportState::Completed);
        assert_eq!(snapshot.done, 47);
        assert_eq!(snapshot.failed_count, 0);
    }

    #[tokio::test]
    async fn test_dropped_handle_while_paused_terminates_session() {
        let service =
            ExportService::new(MockHttpClient::new(Ok(Bytes::from_static(b"pixels"))));
        let handle = service.start(request()).unwrap();
        handle.pause();

        let mut progress = handle.subscribe();
        progress
            .wait_for(|snapshot| snapshot.state.is_paused())
            .await
            .unwrap();

        // Nothing can resume or cancel the session any more; it must
        // still reach a terminal state rather than stay suspended.
        drop(handle);

        let snapshot = progress
            .wait_for(|snapshot| snapshot.state.is_terminal())
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot.state, ExportState::Cancelled);
    }

    struct PanickingClient;

    impl HttpClient for PanickingClient {
        async fn get(&self, _url: &str) -> Result<Bytes, ProviderError> {
            panic!("client blew up");
        }
    }

    #[tokio::test]
    async fn test_panicked_task_surfaces_as_failed() {
        let service = ExportService::new(PanickingClient);
        let handle = service.start(request()).unwrap();

        let outcome = handle.wait().await;
        assert!(matches!(
            outcome,
            ExportOutcome::Failed(ExportError::Aborted(_))
        ));
    }
}
