mod config;
mod export;
mod image_prep;
mod pipeline;
mod storage;
mod vision;

use pipeline::{ExtractionRecord, FlatRow, ValidationPolicy};
use storage::{ArtifactStore, LocalDirStore};
use tracing::{info, warn};
use vision::VisionClient;

const CONFIG_PATH: &str = "expense_scan.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: expense_scan <image>...");
        std::process::exit(2);
    }

    let cfg = if std::path::Path::new(CONFIG_PATH).exists() {
        config::Config::load(CONFIG_PATH)?
    } else {
        info!(path = CONFIG_PATH, "No config file found, using defaults");
        config::Config::default()
    };

    // Collaborators are built once and passed by reference below.
    let vision = VisionClient::from_config(&cfg.vision)?;
    let store = LocalDirStore::new(&cfg.storage.root);
    let policy = ValidationPolicy {
        enforce_total_reconciliation: cfg.pipeline.enforce_total_reconciliation,
    };

    let mut failed = 0usize;
    for path in &paths {
        let span = tracing::info_span!("expense_form", file = %path);
        let _guard = span.enter();

        match process_form(path, &cfg, &vision, &store, &policy).await {
            Ok(()) => {}
            Err(e) => {
                failed += 1;
                tracing::error!(error = %e, "Recognition failed");
                println!("recognition failed for {path}: {e}");
            }
        }
    }

    info!(total = paths.len(), failed, "Batch complete");
    Ok(())
}

/// One form, end to end: read, prepare, recognize, normalize, export,
/// store. A failure anywhere reports this form and leaves the batch
/// running.
async fn process_form(
    path: &str,
    cfg: &config::Config,
    vision: &VisionClient,
    store: &dyn ArtifactStore,
    policy: &ValidationPolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let image_bytes = std::fs::read(path)?;

    let mut prepared = image_prep::prepare_for_vision(&image_bytes, cfg.image.max_dimension)?;
    if cfg.image.enhance {
        prepared = image_prep::enhance_contrast(&prepared)?;
    }

    let raw_text = vision.recognize(&prepared).await?;
    let record = pipeline::recognize(&raw_text, policy)?;
    let rows = pipeline::flatten(&record)?;
    if rows.is_empty() {
        warn!("record has no line items, exporting a header-only spreadsheet");
    }

    let spreadsheet = export::render_csv(&rows)?;
    let location = store
        .save_spreadsheet(&spreadsheet, &record.submitter, &record.document_id)
        .await?;

    print_summary(&record, &rows, &location);
    Ok(())
}

fn print_summary(record: &ExtractionRecord, rows: &[FlatRow], location: &str) {
    println!("document: {}  date: {}", record.document_id, record.date);
    println!(
        "submitter: {}  department: {}",
        record.submitter, record.department
    );
    for row in rows {
        println!("  - {}: {}", row.item_name, row.item_amount);
    }
    if let Some(first) = rows.first() {
        println!("total: {}", first.total_amount);
    }
    println!("saved: {location}");
}
