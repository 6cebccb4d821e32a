// src/storage/mod.rs
pub mod year;

use crate::config::Config;
use crate::edgar::models::FilingMetadata;
use crate::extractors::flatten::FlattenedArtifact;
use crate::utils::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

pub use year::{resolve_year, YearSource};

/// One accession folder: `<base>/<TICKER>/<form>/<accession>/`.
#[derive(Debug, Clone)]
pub struct FilingRef {
    pub accession: String,
    pub dir: PathBuf,
    pub year: Option<(i32, YearSource)>,
    pub has_artifact: bool,
}

/// Writes the artifact to `output_path`, creating parent directories as needed.
pub fn persist(artifact: &FlattenedArtifact, output_path: &Path) -> Result<(), StorageError> {
    let write_error = |source: std::io::Error| StorageError::ArtifactWrite {
        path: output_path.to_path_buf(),
        source,
    };

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
    }
    fs::write(output_path, artifact.render()).map_err(write_error)?;

    tracing::debug!("Saved artifact to {}", output_path.display());
    Ok(())
}

/// The on-disk filing tree. The base directory is always passed in, never global.
pub struct FilingStore {
    base_dir: PathBuf,
    primary_document_suffix: String,
    artifact_name: String,
}

impl FilingStore {
    pub fn new<P: AsRef<Path>>(base_dir: P, primary_document_suffix: &str, artifact_name: &str) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            primary_document_suffix: primary_document_suffix.to_string(),
            artifact_name: artifact_name.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.base_dir, &config.primary_document_suffix, &config.artifact_name)
    }

    pub fn primary_document_suffix(&self) -> &str {
        &self.primary_document_suffix
    }

    /// Folder of one filing, e.g. `base/AAPL/10-K/0000320193-23-000106`.
    pub fn filing_dir(&self, ticker: &str, form_type: &str, accession: &str) -> PathBuf {
        self.base_dir
            .join(ticker.to_uppercase())
            .join(form_type)
            .join(accession)
    }

    /// Artifact location for a primary document: a sibling file in the same folder.
    pub fn artifact_path_for(&self, primary_doc: &Path) -> PathBuf {
        match primary_doc.parent() {
            Some(dir) => dir.join(&self.artifact_name),
            None => PathBuf::from(&self.artifact_name),
        }
    }

    pub fn is_primary_document(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&self.primary_document_suffix))
    }

    /// All primary documents under `root`, in sorted path order.
    pub fn primary_documents(&self, root: &Path) -> Result<Vec<PathBuf>, StorageError> {
        if !root.is_dir() {
            return Err(StorageError::ArtifactNotFound(format!(
                "directory {} does not exist",
                root.display()
            )));
        }

        let mut found = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                // Symlinked directories are not followed
                if entry.file_type()?.is_dir() {
                    pending.push(path);
                } else if self.is_primary_document(&path) {
                    found.push(path);
                }
            }
        }
        found.sort();
        Ok(found)
    }

    /// Flattened artifact for `primary_doc`, written next to it.
    pub fn write_artifact(&self, primary_doc: &Path, artifact: &FlattenedArtifact) -> Result<PathBuf, StorageError> {
        let output_path = self.artifact_path_for(primary_doc);
        persist(artifact, &output_path)?;
        Ok(output_path)
    }

    /// Saves the download record of a filing as JSON in its folder.
    pub fn save_metadata(&self, filing_dir: &Path, metadata: &FilingMetadata) -> Result<PathBuf, StorageError> {
        if !filing_dir.exists() {
            fs::create_dir_all(filing_dir)?;
        }

        let file_path = filing_dir.join(year::METADATA_FILE);
        let metadata_str = serde_json::to_string_pretty(metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str)?;

        tracing::debug!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }

    /// Ticker directories present under the base directory.
    pub fn companies(&self) -> Result<Vec<String>, StorageError> {
        let mut tickers = list_dirs(&self.base_dir)?;
        tickers.sort();
        Ok(tickers)
    }

    /// Accession folders for a company and form type, sorted by folder name.
    pub fn filings(&self, ticker: &str, form_type: &str) -> Result<Vec<FilingRef>, StorageError> {
        let form_dir = self.base_dir.join(ticker.to_uppercase()).join(form_type);
        if !form_dir.is_dir() {
            tracing::debug!("No {} directory for {}", form_type, ticker);
            return Ok(Vec::new());
        }

        let mut accessions = list_dirs(&form_dir)?;
        accessions.sort();

        Ok(accessions
            .into_iter()
            .map(|accession| {
                let dir = form_dir.join(&accession);
                FilingRef {
                    has_artifact: dir.join(&self.artifact_name).is_file(),
                    year: resolve_year(&dir),
                    accession,
                    dir,
                }
            })
            .collect())
    }

    /// Years with a cleaned artifact, newest first, without duplicates.
    pub fn years_for(&self, ticker: &str, form_type: &str) -> Result<Vec<i32>, StorageError> {
        Ok(cleaned_years(&self.filings(ticker, form_type)?))
    }

    /// Artifact of the first filing (by folder name) in `filings` resolved to `year`.
    pub fn artifact_in(&self, filings: &[FilingRef], ticker: &str, year: i32) -> Result<PathBuf, StorageError> {
        filings
            .iter()
            .find(|filing| filing.has_artifact && filing.year.map(|(y, _)| y) == Some(year))
            .map(|filing| filing.dir.join(&self.artifact_name))
            .ok_or_else(|| {
                StorageError::ArtifactNotFound(format!("No cleaned data available for {} in {}", ticker, year))
            })
    }
}

/// Years of the cleaned filings in `filings`, newest first, without duplicates.
pub fn cleaned_years(filings: &[FilingRef]) -> Vec<i32> {
    let mut years: Vec<i32> = filings
        .iter()
        .filter(|filing| filing.has_artifact)
        .filter_map(|filing| filing.year.map(|(year, _)| year))
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

fn list_dirs(dir: &Path) -> Result<Vec<String>, StorageError> {
    if !dir.is_dir() {
        return Err(StorageError::ArtifactNotFound(format!(
            "directory {} does not exist",
            dir.display()
        )));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn store(base: &Path) -> FilingStore {
        FilingStore::new(base, "primary-document.html", "cleaned_data.txt")
    }

    fn add_filing(store: &FilingStore, ticker: &str, accession: &str, cleaned: bool) -> PathBuf {
        let dir = store.filing_dir(ticker, "10-K", accession);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("primary-document.html"), "<p>x</p>").unwrap();
        if cleaned {
            fs::write(dir.join("cleaned_data.txt"), "Text Content:\nx\n\nTables:\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_persist_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("AAPL/10-K/acc/cleaned_data.txt");
        let artifact = FlattenedArtifact {
            text: vec!["Hello".to_string()],
            tables: vec![vec![vec!["A".to_string(), "B".to_string()]]],
        };

        persist(&artifact, &out).unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "Text Content:\nHello\n\nTables:\nA\tB\n\n");
    }

    #[test]
    fn test_persist_reports_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let result = persist(&FlattenedArtifact::default(), &blocker.join("cleaned_data.txt"));

        assert!(matches!(result, Err(StorageError::ArtifactWrite { .. })));
    }

    #[test]
    fn test_primary_documents_found_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        add_filing(&store, "AAPL", "0000320193-23-000106", false);
        add_filing(&store, "MSFT", "0000950170-23-035122", false);
        fs::write(store.filing_dir("MSFT", "10-K", "0000950170-23-035122").join("full-submission.txt"), "").unwrap();

        let docs = store.primary_documents(dir.path()).unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs[0].starts_with(dir.path().join("AAPL")));
        assert_eq!(
            store.artifact_path_for(&docs[1]),
            store.filing_dir("MSFT", "10-K", "0000950170-23-035122").join("cleaned_data.txt")
        );
    }

    #[test]
    fn test_years_only_for_cleaned_filings_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        add_filing(&store, "AAPL", "0000320193-21-000105", true);
        add_filing(&store, "AAPL", "0000320193-23-000106", true);
        add_filing(&store, "AAPL", "0000320193-22-000108", true);
        add_filing(&store, "AAPL", "0000320193-20-000096", false);

        assert_eq!(store.years_for("AAPL", "10-K").unwrap(), vec![2023, 2022, 2021]);
        assert!(store.years_for("TSLA", "10-K").unwrap().is_empty());
    }

    #[test]
    fn test_metadata_year_wins_over_folder_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let filing = add_filing(&store, "V", "0001403161-98-000001", true);
        let metadata = FilingMetadata {
            accession_number: "0001403161-98-000001".to_string(),
            cik: "0001403161".to_string(),
            ticker: "V".to_string(),
            company_name: "VISA INC.".to_string(),
            form_type: "10-K".to_string(),
            filing_date: NaiveDate::from_ymd_opt(2008, 11, 21).unwrap(),
            report_date: NaiveDate::from_ymd_opt(2008, 9, 30),
            primary_doc: "d10k.htm".to_string(),
            source_url: "https://www.sec.gov/Archives/edgar/data/1403161/000140316198000001/d10k.htm".to_string(),
            downloaded_at: Utc::now(),
        };
        store.save_metadata(&filing, &metadata).unwrap();

        let filings = store.filings("V", "10-K").unwrap();

        assert_eq!(filings[0].year, Some((2008, YearSource::Metadata)));
        assert_eq!(
            store.artifact_in(&filings, "V", 2008).unwrap(),
            filing.join("cleaned_data.txt")
        );
    }

    #[test]
    fn test_artifact_for_missing_year() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        add_filing(&store, "MSFT", "0000950170-23-035122", true);

        let filings = store.filings("MSFT", "10-K").unwrap();
        let result = store.artifact_in(&filings, "MSFT", 2019);

        assert!(matches!(result, Err(StorageError::ArtifactNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_primary_documents_ignores_symlink_loop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let filing = add_filing(&store, "AAPL", "0000320193-23-000106", false);
        std::os::unix::fs::symlink(dir.path(), filing.join("loop")).unwrap();

        let docs = store.primary_documents(dir.path()).unwrap();

        assert_eq!(docs, vec![filing.join("primary-document.html")]);
    }

    #[test]
    fn test_artifact_in_listed_filings() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let cleaned = add_filing(&store, "AAPL", "0000320193-23-000106", true);
        add_filing(&store, "AAPL", "0000320193-22-000108", false);

        let filings = store.filings("AAPL", "10-K").unwrap();

        assert_eq!(cleaned_years(&filings), vec![2023]);
        assert_eq!(store.artifact_in(&filings, "AAPL", 2023).unwrap(), cleaned.join("cleaned_data.txt"));
        assert!(matches!(
            store.artifact_in(&filings, "AAPL", 2022),
            Err(StorageError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_companies_lists_ticker_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        add_filing(&store, "V", "0001403161-23-000099", false);
        add_filing(&store, "AAPL", "0000320193-23-000106", false);

        assert_eq!(store.companies().unwrap(), vec!["AAPL", "V"]);
        assert!(FilingStore::new(dir.path().join("missing"), "x", "y").companies().is_err());
    }
}
