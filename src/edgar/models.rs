// src/edgar/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Structure representing the EDGAR company submission index.
/// Only the fields the downloader reads are kept.
/// Example: https://data.sec.gov/submissions/CIK0000320193.json
#[derive(Debug, Deserialize)]
pub struct CompanySubmission {
    pub name: String,
    pub filings: Filings,
}

#[derive(Debug, Deserialize)]
pub struct Filings {
    pub recent: FilingsList,
    #[serde(default)]
    pub files: Vec<FilingFile>,
}

/// An older page of the submission history, e.g. `CIK0000320193-submissions-001.json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingFile {
    pub name: String,
    pub filing_count: u32,
    pub filing_from: String,
    pub filing_to: String,
}

/// Column-oriented filing list as served by EDGAR: index `i` of each vector is one filing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingsList {
    pub accession_number: Vec<String>,
    pub filing_date: Vec<String>,
    #[serde(default)]
    pub report_date: Vec<String>,
    pub form: Vec<String>,
    pub primary_document: Vec<String>,
}

/// Raw company ticker data from https://www.sec.gov/files/company_tickers.json
#[derive(Debug, Deserialize)]
pub struct CompanyTicker {
    pub cik_str: u64,
    pub ticker: String,
    pub title: String,
}

/// Simple struct representing a specific filing we want to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingInfo {
    pub accession_number: String,
    pub filing_date: NaiveDate,
    pub report_date: Option<NaiveDate>,
    pub form_type: String,
    pub ticker: String,
    pub company_name: String,
    pub cik: String,
    pub primary_doc: String,
}

impl FilingInfo {
    /// Constructs the URL to access the primary document of this filing
    pub fn primary_doc_url(&self) -> String {
        let acc_no_dashes = self.accession_number.replace('-', "");
        format!(
            "https://www.sec.gov/Archives/edgar/data/{}/{}/{}",
            self.cik.trim_start_matches('0'),
            acc_no_dashes,
            self.primary_doc
        )
    }

    pub fn has_html_primary_doc(&self) -> bool {
        let doc = self.primary_doc.to_ascii_lowercase();
        doc.ends_with(".htm") || doc.ends_with(".html")
    }
}

/// Download record kept next to each filing; the store reads the filing year from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingMetadata {
    pub accession_number: String,
    pub cik: String,
    pub ticker: String,
    pub company_name: String,
    pub form_type: String,
    pub filing_date: NaiveDate,
    pub report_date: Option<NaiveDate>,
    pub primary_doc: String,
    pub source_url: String,
    pub downloaded_at: DateTime<Utc>,
}

impl FilingMetadata {
    pub fn from_filing(filing: &FilingInfo) -> Self {
        Self {
            accession_number: filing.accession_number.clone(),
            cik: filing.cik.clone(),
            ticker: filing.ticker.clone(),
            company_name: filing.company_name.clone(),
            form_type: filing.form_type.clone(),
            filing_date: filing.filing_date,
            report_date: filing.report_date,
            primary_doc: filing.primary_doc.clone(),
            source_url: filing.primary_doc_url(),
            downloaded_at: Utc::now(),
        }
    }
}
