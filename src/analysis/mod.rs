// src/analysis/mod.rs
//! Turns a (company, year, analysis) query into a prompt.
//!
//! Each requested year is resolved to its cleaned artifact, searched with the
//! category's pattern, and the excerpts are stitched into one prompt. Years
//! without an artifact or without a match are skipped and reported, not fatal.

pub mod catalog;
pub mod completion;
pub mod prompt;

use crate::config::Config;
use crate::extractors::search::{search, SearchResult};
use crate::storage::{cleaned_years, FilingStore};
use crate::utils::error::{AnalysisError, StorageError};
use crate::utils::AppError;

pub use completion::CompletionClient;
pub use prompt::{AnalysisMode, YearExcerpt};

/// Why a year contributed nothing to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoArtifact,
    PatternNotMatched,
}

#[derive(Debug)]
pub struct PreparedAnalysis {
    pub company: String,
    pub analysis: String,
    pub years: Vec<i32>,
    pub excerpts: Vec<YearExcerpt>,
    pub skipped: Vec<(i32, SkipReason)>,
    pub prompt: String,
}

pub struct Analyzer<'a> {
    config: &'a Config,
    store: &'a FilingStore,
}

impl<'a> Analyzer<'a> {
    pub fn new(config: &'a Config, store: &'a FilingStore) -> Self {
        Self { config, store }
    }

    /// Builds the prompt for one query without calling any external service.
    pub fn prepare(
        &self,
        company: &str,
        year: i32,
        analysis_name: &str,
        mode: AnalysisMode,
    ) -> Result<PreparedAnalysis, AppError> {
        let ticker = self.config.ticker_for(company);
        let display_name = self.config.display_name(&ticker);
        let form_type = self.config.form_type_for(&ticker);

        let spec = catalog::find_analysis(&self.config.analyses, &ticker, analysis_name)
            .ok_or_else(|| AnalysisError::UnknownAnalysis {
                company: display_name.clone(),
                analysis: analysis_name.to_string(),
            })?;

        // Listed once: every lookup below reuses the resolved years
        let filings = self.store.filings(&ticker, &form_type)?;
        let available = cleaned_years(&filings);
        let years = prompt::select_years(&available, year, mode, self.config.trend_years);
        tracing::info!("Running '{}' for {} over {:?}", spec.name, display_name, years);

        let mut excerpts = Vec::new();
        let mut skipped = Vec::new();
        for &yr in &years {
            let path = match self.store.artifact_in(&filings, &ticker, yr) {
                Ok(path) => path,
                Err(StorageError::ArtifactNotFound(msg)) => {
                    tracing::warn!("{}", msg);
                    skipped.push((yr, SkipReason::NoArtifact));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match search(&path, &spec.pattern, spec.lines_before, spec.lines_after)? {
                SearchResult::Match(excerpt) => excerpts.push(YearExcerpt { year: yr, text: excerpt.text }),
                SearchResult::NotFound => {
                    tracing::warn!("'{}' not found for {} in {} ({})", spec.pattern, display_name, yr, path.display());
                    skipped.push((yr, SkipReason::PatternNotMatched));
                }
            }
        }

        if excerpts.is_empty() {
            return Err(AnalysisError::NoData {
                company: display_name,
                years: years.iter().map(|y| y.to_string()).collect::<Vec<_>>().join(", "),
            }
            .into());
        }

        let prompt = prompt::build_prompt(&spec.instruction, &display_name, mode, &excerpts);
        Ok(PreparedAnalysis {
            company: display_name,
            analysis: spec.name.clone(),
            years,
            excerpts,
            skipped,
            prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_artifact(store: &FilingStore, ticker: &str, accession: &str, body: &str) {
        let dir = store.filing_dir(ticker, "10-K", accession);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cleaned_data.txt"), body).unwrap();
    }

    fn setup(base: &Path) -> (Config, FilingStore) {
        let config = Config {
            base_dir: base.to_path_buf(),
            ..Config::default()
        };
        let store = FilingStore::from_config(&config);
        write_artifact(&store, "AAPL", "0000320193-22-000108", "Text Content:\n\nTables:\nRegion\tSales\nAmericas\t$\t169,658\nEurope\t$\t95,118\n\n");
        write_artifact(&store, "AAPL", "0000320193-23-000106", "Text Content:\n\nTables:\nRegion\tSales\nAmericas\t$\t162,560\nEurope\t$\t94,294\n\n");
        write_artifact(&store, "AAPL", "0000320193-21-000105", "Text Content:\nNo segment table this year\n\nTables:\n");
        (config, store)
    }

    #[test]
    fn test_single_year_prompt_uses_catalog_window() {
        let dir = tempfile::tempdir().unwrap();
        let (config, store) = setup(dir.path());

        let prepared = Analyzer::new(&config, &store)
            .prepare("Apple", 2023, "Sales by Geographic Region", AnalysisMode::SingleYear)
            .unwrap();

        assert_eq!(prepared.years, vec![2023]);
        assert_eq!(
            prepared.excerpts[0].text,
            "Tables:\nRegion\tSales\nAmericas\t$\t162,560\nEurope\t$\t94,294\n\n"
        );
        assert!(prepared.prompt.starts_with("Analyze the regional sales trends for Apple Inc."));
        assert!(prepared.prompt.contains("Analyze the following data for Apple in 2023:"));
    }

    #[test]
    fn test_trend_skips_years_without_match() {
        let dir = tempfile::tempdir().unwrap();
        let (config, store) = setup(dir.path());

        let prepared = Analyzer::new(&config, &store)
            .prepare("AAPL", 2023, "Sales by Geographic Region", AnalysisMode::Trend)
            .unwrap();

        assert_eq!(prepared.years, vec![2021, 2022, 2023]);
        assert_eq!(prepared.skipped, vec![(2021, SkipReason::PatternNotMatched)]);
        assert!(prepared.prompt.contains("for Apple from 2022 to 2023:"));
    }

    #[test]
    fn test_unknown_analysis_for_company() {
        let dir = tempfile::tempdir().unwrap();
        let (config, store) = setup(dir.path());

        let result = Analyzer::new(&config, &store)
            .prepare("Apple", 2023, "Consumer Credit Analysis", AnalysisMode::SingleYear);

        assert!(matches!(result, Err(AppError::Analysis(AnalysisError::UnknownAnalysis { .. }))));
    }

    #[test]
    fn test_missing_year_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let (config, store) = setup(dir.path());

        let result = Analyzer::new(&config, &store)
            .prepare("Apple", 2015, "Sales by Geographic Region", AnalysisMode::SingleYear);

        assert!(matches!(result, Err(AppError::Analysis(AnalysisError::NoData { .. }))));
    }
}
