//! Export command: plan, fetch, and package a region.

use std::path::PathBuf;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tilepack::coord::{area_km2, GeoBoundingBox};
use tilepack::plan::{ExportPlan, ZoomSelection};
use tilepack::provider::{ReqwestClient, TileSource};
use tilepack::service::{ExportRequest, ExportService};
use tilepack::ExportOutcome;

use crate::error::CliError;

/// Arguments for the export command.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Name for the exported pack (also the archive filename stem)
    pub name: String,

    /// Southern bounding box edge in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub south: f64,

    /// Western bounding box edge in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub west: f64,

    /// Northern bounding box edge in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub north: f64,

    /// Eastern bounding box edge in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub east: f64,

    /// Lowest zoom level to export
    #[arg(long)]
    pub min_zoom: u8,

    /// Highest zoom level to export
    #[arg(long)]
    pub max_zoom: u8,

    /// Tile URL template with {z}/{x}/{y} and optional {s} placeholders
    #[arg(long)]
    pub template: String,

    /// Comma-separated subdomains substituted for {s}
    #[arg(long)]
    pub subdomains: Option<String>,

    /// Directory the archive is written into
    #[arg(long, default_value = ".")]
    pub output: PathBuf,

    /// Print the plan and estimated size without downloading anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the export command.
pub async fn run(args: ExportArgs) -> Result<(), CliError> {
    let bbox = GeoBoundingBox::new(args.south, args.west, args.north, args.east)
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    let zooms = ZoomSelection::range(args.min_zoom, args.max_zoom);
    let source = build_source(&args.template, args.subdomains.as_deref());

    let plan = ExportPlan::build(&bbox, &zooms, &source)?;

    println!("Export plan for {}:", style(&args.name).bold());
    println!("  Region: {:.4} km²", area_km2(&bbox));
    println!("  Zoom levels: {}-{}", args.min_zoom, args.max_zoom);
    println!("  Tiles: {}", plan.tile_count());
    println!("  Estimated size: {:.1} MB", plan.estimated_size_mb());
    println!();

    if args.dry_run {
        println!("Dry run; nothing downloaded.");
        return Ok(());
    }

    let total = plan.tile_count();
    let client =
        ReqwestClient::new().map_err(|e| CliError::Export(format!("HTTP client: {}", e)))?;
    let service = ExportService::new(client);
    let handle = service.start(
        ExportRequest::new(&args.name)
            .with_bbox(bbox)
            .with_zooms(zooms)
            .with_source(source),
    )?;

    // First Ctrl+C cancels the session; the run loop below then
    // observes the terminal state and exits normally.
    let token = handle.cancellation_token();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, cancelling export...");
        token.cancel();
    })
    .map_err(|e| CliError::Export(format!("Failed to set signal handler: {}", e)))?;

    println!("Press Ctrl+C to cancel");
    let bar = progress_bar(total);

    let mut progress = handle.subscribe();
    let outcome_fut = handle.wait();
    tokio::pin!(outcome_fut);

    let outcome = loop {
        tokio::select! {
            outcome = &mut outcome_fut => break outcome,
            changed = progress.changed() => {
                if changed.is_ok() {
                    let snapshot = progress.borrow_and_update().clone();
                    bar.set_position(snapshot.done);
                    bar.set_message(format!(
                        "{} ({} failed)",
                        snapshot.state, snapshot.failed_count
                    ));
                }
            }
        }
    };

    finish(outcome, &args.output, &bar)
}

/// Maps a terminal outcome to the process result.
///
/// Only a delivered archive exits zero; cancellation and failure both
/// surface as errors so scripts can tell them apart from success.
fn finish(
    outcome: ExportOutcome,
    output: &std::path::Path,
    bar: &ProgressBar,
) -> Result<(), CliError> {
    match outcome {
        ExportOutcome::Completed(archive) => {
            bar.finish_and_clear();
            let path = archive
                .write_to(output)
                .map_err(|e| CliError::Write(e.to_string()))?;
            println!(
                "{} {} ({:.1} MB)",
                style("Exported").green().bold(),
                path.display(),
                archive.len() as f64 / (1024.0 * 1024.0),
            );
            Ok(())
        }
        ExportOutcome::Cancelled => {
            bar.abandon_with_message("cancelled");
            Err(CliError::Cancelled)
        }
        ExportOutcome::Failed(error) => {
            bar.abandon_with_message("failed");
            Err(CliError::Export(error.to_string()))
        }
    }
}

fn build_source(template: &str, subdomains: Option<&str>) -> TileSource {
    let source = TileSource::new("custom", template);
    match subdomains {
        Some(list) => source.with_subdomains(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        ),
        None => source,
    }
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} tiles {msg}",
        )
        .expect("static progress template")
        .progress_chars("#>-"),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_source_with_subdomain_list() {
        let source = build_source("https://{s}.tile.example/{z}/{x}/{y}.png", Some("a, b,c,"));
        let tile = tilepack::coord::TileCoord { zoom: 1, x: 0, y: 0 };
        // (0 + 0) % 3 picks the first subdomain
        assert_eq!(source.tile_url(&tile), "https://a.tile.example/1/0/0.png");
    }

    #[test]
    fn test_build_source_without_subdomains() {
        let source = build_source("https://tile.example/{z}/{x}/{y}.png", None);
        let tile = tilepack::coord::TileCoord { zoom: 2, x: 1, y: 3 };
        assert_eq!(source.tile_url(&tile), "https://tile.example/2/1/3.png");
    }

    #[test]
    fn test_cancelled_outcome_exits_nonzero() {
        let dir = tempfile::tempdir().unwrap();
        let result = finish(
            ExportOutcome::Cancelled,
            dir.path(),
            &ProgressBar::hidden(),
        );
        assert!(matches!(result, Err(CliError::Cancelled)));
    }

    #[test]
    fn test_failed_outcome_exits_nonzero() {
        let dir = tempfile::tempdir().unwrap();
        let result = finish(
            ExportOutcome::Failed(tilepack::ExportError::Aborted("boom".to_string())),
            dir.path(),
            &ProgressBar::hidden(),
        );
        assert!(matches!(result, Err(CliError::Export(_))));
    }
}
