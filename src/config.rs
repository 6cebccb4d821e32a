// src/config.rs
use crate::analysis::catalog::{default_analyses, AnalysisSpec};
use crate::utils::AppError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_BASE_DIR: &str = "sec_filings_new/sec-edgar-filings";
// SEC requires a User-Agent with contact details; override in the config file
const DEFAULT_USER_AGENT: &str = "filing_digest admin@example.com";
// SEC asks for 10 requests/second max. Be conservative. >100ms delay.
const DEFAULT_REQUEST_DELAY_MS: u64 = 150;

/// Everything the pipeline needs, passed explicitly into each component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the `<TICKER>/<form>/<accession>/` tree
    pub base_dir: PathBuf,
    pub user_agent: String,
    pub request_delay_ms: u64,
    /// Files whose name ends with this are flattened
    pub primary_document_suffix: String,
    /// Artifact file name written next to each primary document
    pub artifact_name: String,
    /// Number of years covered by a trend analysis, selected year included
    pub trend_years: usize,
    pub companies: Vec<CompanyConfig>,
    pub analyses: Vec<AnalysisSpec>,
    pub completion: CompletionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyConfig {
    pub ticker: String,
    pub name: String,
    #[serde(default = "default_form_type")]
    pub form_type: String,
    /// Only filings dated on or after this day are downloaded
    pub after: NaiveDate,
    #[serde(default)]
    pub before: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the bearer token
    pub api_key_env: String,
}

fn default_form_type() -> String {
    "10-K".to_string()
}

fn company(ticker: &str, name: &str) -> CompanyConfig {
    CompanyConfig {
        ticker: ticker.to_string(),
        name: name.to_string(),
        form_type: default_form_type(),
        after: NaiveDate::from_ymd_opt(1995, 1, 1).unwrap_or_default(),
        before: None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            primary_document_suffix: "primary-document.html".to_string(),
            artifact_name: "cleaned_data.txt".to_string(),
            trend_years: 5,
            companies: vec![
                company("MSFT", "Microsoft"),
                company("V", "Visa"),
                company("AAPL", "Apple"),
            ],
            analyses: default_analyses(),
            completion: CompletionConfig::default(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.awanllm.com/v1/completions".to_string(),
            model: "Awanllm-Llama-3-8B-Dolfin".to_string(),
            api_key_env: "COMPLETION_API_KEY".to_string(),
        }
    }
}

impl Config {
    /// Loads a JSON config file; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Cannot read config {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Checks cross references and compiles every analysis pattern once.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.trend_years == 0 {
            return Err(AppError::Config("trend_years must be at least 1".to_string()));
        }
        for analysis in &self.analyses {
            if self.company(&analysis.ticker).is_none() {
                return Err(AppError::Config(format!(
                    "Analysis '{}' refers to unknown company {}",
                    analysis.name, analysis.ticker
                )));
            }
            Regex::new(&analysis.pattern).map_err(|e| {
                AppError::Config(format!("Invalid regex pattern '{}': {}", analysis.pattern, e))
            })?;
        }
        Ok(())
    }

    /// Finds a company by ticker or display name, ignoring case.
    pub fn company(&self, ticker_or_name: &str) -> Option<&CompanyConfig> {
        self.companies.iter().find(|c| {
            c.ticker.eq_ignore_ascii_case(ticker_or_name) || c.name.eq_ignore_ascii_case(ticker_or_name)
        })
    }

    /// Display name for a ticker directory; unknown tickers show as-is.
    pub fn display_name(&self, ticker: &str) -> String {
        self.company(ticker)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| ticker.to_string())
    }

    /// Ticker directory for a display name or ticker; unknown input is used as-is.
    pub fn ticker_for(&self, ticker_or_name: &str) -> String {
        self.company(ticker_or_name)
            .map(|c| c.ticker.clone())
            .unwrap_or_else(|| ticker_or_name.to_string())
    }

    pub fn form_type_for(&self, ticker: &str) -> String {
        self.company(ticker)
            .map(|c| c.form_type.clone())
            .unwrap_or_else(default_form_type)
    }
}
