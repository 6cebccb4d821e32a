// src/pipeline.rs
use crate::config::CompanyConfig;
use crate::edgar::models::{FilingInfo, FilingMetadata};
use crate::edgar::EdgarClient;
use crate::extractors::flatten::DocumentFlattener;
use crate::storage::year::METADATA_FILE;
use crate::storage::FilingStore;
use crate::utils::AppError;
use std::path::{Path, PathBuf};

/// Outcome of a batch run. One failed item never stops the rest.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<PathBuf>,
    pub skipped: usize,
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failures.is_empty()
    }
}

/// Flattens one primary document and writes its artifact next to it.
pub fn clean_document(
    store: &FilingStore,
    flattener: &DocumentFlattener,
    primary_doc: &Path,
) -> Result<PathBuf, AppError> {
    let artifact = flattener.flatten_file(primary_doc)?;
    Ok(store.write_artifact(primary_doc, &artifact)?)
}

/// Cleans every primary document under `root`.
pub fn clean_directory(
    store: &FilingStore,
    flattener: &DocumentFlattener,
    root: &Path,
) -> Result<BatchReport, AppError> {
    let documents = store.primary_documents(root)?;
    tracing::info!("Found {} primary documents under {}", documents.len(), root.display());

    let mut report = BatchReport::default();
    for doc in documents {
        tracing::info!("Cleaning file: {}", doc.display());
        match clean_document(store, flattener, &doc) {
            Ok(output) => {
                tracing::info!("Cleaned data saved to: {}", output.display());
                report.succeeded.push(output);
            }
            Err(e) => {
                tracing::error!("Failed to clean {}: {}", doc.display(), e);
                report.failures.push((doc, e.to_string()));
            }
        }
    }

    tracing::info!(
        "Cleaning finished. Success: {}, Failures: {}",
        report.succeeded.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Saves a downloaded primary document with its metadata record.
/// The record goes first: a folder holding the document always knows its year.
pub fn store_filing(store: &FilingStore, filing: &FilingInfo, content: &[u8]) -> Result<PathBuf, AppError> {
    let dir = store.filing_dir(&filing.ticker, &filing.form_type, &filing.accession_number);
    store.save_metadata(&dir, &FilingMetadata::from_filing(filing))?;

    let target = dir.join(store.primary_document_suffix());
    std::fs::write(&target, content)?;
    tracing::info!("Saved {} ({} bytes)", target.display(), content.len());
    Ok(target)
}

/// Downloads the primary documents of a company's filings into the store.
/// Filings already on disk with their metadata are skipped; a failed filing
/// is recorded and the rest still run.
pub async fn download_company(
    client: &EdgarClient,
    store: &FilingStore,
    company: &CompanyConfig,
) -> Result<BatchReport, AppError> {
    tracing::info!(
        "Starting downloads for {} ({}) filed after {}...",
        company.ticker, company.form_type, company.after
    );
    let filings = client
        .find_filings(&company.ticker, &company.form_type, company.after, company.before)
        .await?;
    tracing::info!("Found {} {} filings for {}", filings.len(), company.form_type, company.ticker);

    let mut report = BatchReport::default();
    for filing in filings {
        if !filing.has_html_primary_doc() {
            tracing::info!("Skipping {}: primary document {} is not HTML", filing.accession_number, filing.primary_doc);
            report.skipped += 1;
            continue;
        }

        let dir = store.filing_dir(&filing.ticker, &filing.form_type, &filing.accession_number);
        let target = dir.join(store.primary_document_suffix());
        if target.exists() && dir.join(METADATA_FILE).exists() {
            tracing::debug!("Already downloaded: {}", target.display());
            report.skipped += 1;
            continue;
        }

        let saved = match client.download_filing_doc(&filing.primary_doc_url()).await {
            Ok(content) => store_filing(store, &filing, &content),
            Err(e) => Err(e.into()),
        };
        match saved {
            Ok(target) => report.succeeded.push(target),
            Err(e) => {
                tracing::error!("Failed to download {}: {}", filing.accession_number, e);
                report.failures.push((dir, e.to_string()));
            }
        }
    }

    tracing::info!("Completed downloads for {}.", company.ticker);
    Ok(report)
}
