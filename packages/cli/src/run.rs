//! One extraction run: list pages, read them, extract records, export.

use std::path::{Path, PathBuf};
use std::time::Instant;

use propscrape_cli_utils::{IndicatifProgress, MultiProgress};
use propscrape_extract::batch::extract_all_concurrent;
use propscrape_listing_models::RawDocument;

use crate::CliError;
use crate::config::Settings;

/// Runs the extraction described by `settings`.
///
/// # Errors
///
/// Returns [`CliError`] if the input directory cannot be listed or the
/// output cannot be written. Unreadable or unparseable pages are logged and
/// skipped.
pub async fn run(settings: &Settings, multi: &MultiProgress) -> Result<(), CliError> {
    let start = Instant::now();
    log::info!("Parsing listing pages from {}", settings.input_dir.display());

    let mut files = list_html_files(&settings.input_dir)?;
    if files.is_empty() {
        log::warn!("No .html files found in {}", settings.input_dir.display());
        return Ok(());
    }
    if let Some(limit) = settings.limit
        && files.len() > limit
    {
        log::info!("Processing the first {limit} of {} files", files.len());
        files.truncate(limit);
    }

    let documents = read_documents(&files).await;
    let progress = IndicatifProgress::files_bar(multi, "Parsing");
    let report = extract_all_concurrent(documents, settings.jobs, progress).await;

    if report.records.is_empty() {
        log::error!("No listing data could be extracted from any file");
        return Ok(());
    }

    if settings.test_run {
        propscrape_export::write_csv(std::io::stdout().lock(), &report.records)?;
    }

    std::fs::create_dir_all(&settings.output_dir)?;
    let output_path = settings.output_path();
    propscrape_export::write_records_to_path(&output_path, &report.records)?;

    log::info!(
        "Finished in {:.1}s: {} ({} pages read, {} files listed)",
        start.elapsed().as_secs_f64(),
        report.summary(),
        report.records.len() + report.skipped.len(),
        files.len(),
    );
    Ok(())
}

/// Lists the `.html` files directly inside `dir`, sorted by name.
///
/// # Errors
///
/// Returns [`CliError::InputDir`] if the directory cannot be read.
pub fn list_html_files(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let input_error = |source| CliError::InputDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(input_error)? {
        let path = entry.map_err(input_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads each file as UTF-8 text. Files that cannot be read are logged and
/// left out.
async fn read_documents(files: &[PathBuf]) -> Vec<RawDocument> {
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let filename = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        match tokio::fs::read_to_string(path).await {
            Ok(html) => documents.push(RawDocument::new(filename, html)),
            Err(e) => log::error!("Failed to read {filename}: {e}"),
        }
    }
    documents
}
