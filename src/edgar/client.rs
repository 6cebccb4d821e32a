// src/edgar/client.rs
use crate::edgar::models::{CompanySubmission, CompanyTicker, FilingInfo, FilingsList};
use crate::utils::error::EdgarError;
use chrono::NaiveDate;
use reqwest::header;
use std::collections::HashMap;
use std::time::Duration;

const TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const SUBMISSIONS_BASE_URL: &str = "https://data.sec.gov/submissions";

/// Thin EDGAR adapter: CIK lookup, submission index, document download.
/// Requests are strictly sequential with a fixed delay before each one.
pub struct EdgarClient {
    http: reqwest::Client,
    request_delay: Duration,
}

impl EdgarClient {
    /// Creates a reqwest client configured for EDGAR interaction.
    pub fn new(user_agent: &str, request_delay_ms: u64) -> Result<Self, EdgarError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent) // SEC rejects requests without a contact User-Agent
            .timeout(Duration::from_secs(60))
            .build()?;
        tracing::debug!("Using User-Agent: {}", user_agent);

        Ok(Self {
            http,
            request_delay: Duration::from_millis(request_delay_ms),
        })
    }

    /// Sends a GET after the rate-limit delay and maps error statuses.
    async fn get(&self, url: &str) -> Result<reqwest::Response, EdgarError> {
        tokio::time::sleep(self.request_delay).await;

        let response = self.http.get(url)
            .header(header::ACCEPT, "application/json,text/html,text/plain,*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received 403 Forbidden - check User-Agent and rate limits.");
                return Err(EdgarError::RateLimited);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EdgarError::FilingDocNotFound(url.to_string()));
            }
            return Err(EdgarError::Http(status));
        }
        Ok(response)
    }

    /// Downloads a filing document as raw bytes; decoding is left to the flattener.
    pub async fn download_filing_doc(&self, url: &str) -> Result<Vec<u8>, EdgarError> {
        tracing::info!("Downloading document from: {}", url);
        let body = self.get(url).await?.bytes().await?;
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }

    /// Gets the zero-padded CIK (Central Index Key) for a ticker symbol
    pub async fn get_cik_from_ticker(&self, ticker: &str) -> Result<String, EdgarError> {
        let tickers: HashMap<String, CompanyTicker> = self.get(TICKERS_URL).await?.json().await?;
        lookup_cik(&tickers, ticker)
    }

    /// Fetches the company submission data for a given CIK
    pub async fn get_company_submissions(&self, cik: &str) -> Result<CompanySubmission, EdgarError> {
        let url = format!("{}/CIK{}.json", SUBMISSIONS_BASE_URL, cik);
        Ok(self.get(&url).await?.json().await?)
    }

    /// Finds filings of `form_type` for a ticker filed within `[after, before]`,
    /// oldest first. Walks the recent list and every older history page.
    pub async fn find_filings(
        &self,
        ticker: &str,
        form_type: &str,
        after: NaiveDate,
        before: Option<NaiveDate>,
    ) -> Result<Vec<FilingInfo>, EdgarError> {
        let cik = self.get_cik_from_ticker(ticker).await?;
        let submissions = self.get_company_submissions(&cik).await?;
        let filter = FilingFilter { form_type, after, before };

        let mut filings = select_filings(&submissions.filings.recent, &filter, ticker, &submissions.name, &cik)?;

        for page in &submissions.filings.files {
            tracing::debug!(
                "Fetching history page {} ({} filings, {} to {})",
                page.name, page.filing_count, page.filing_from, page.filing_to
            );
            let url = format!("{}/{}", SUBMISSIONS_BASE_URL, page.name);
            let list: FilingsList = self.get(&url).await?.json().await?;
            filings.extend(select_filings(&list, &filter, ticker, &submissions.name, &cik)?);
        }

        filings.sort_by(|a, b| a.filing_date.cmp(&b.filing_date));
        filings.dedup_by(|a, b| a.accession_number == b.accession_number);
        Ok(filings)
    }
}

pub struct FilingFilter<'a> {
    pub form_type: &'a str,
    pub after: NaiveDate,
    pub before: Option<NaiveDate>,
}

impl FilingFilter<'_> {
    fn accepts(&self, form: &str, filing_date: NaiveDate) -> bool {
        form == self.form_type
            && filing_date >= self.after
            && self.before.map_or(true, |before| filing_date <= before)
    }
}

fn lookup_cik(tickers: &HashMap<String, CompanyTicker>, ticker: &str) -> Result<String, EdgarError> {
    tickers
        .values()
        .find(|company| company.ticker.eq_ignore_ascii_case(ticker))
        .map(|company| {
            tracing::debug!("Resolved {} to CIK {} ({})", ticker, company.cik_str, company.title);
            format!("{:010}", company.cik_str) // Format CIK with leading zeros to 10 digits
        })
        .ok_or_else(|| EdgarError::TickerNotFound(ticker.to_uppercase()))
}

/// Picks the rows of a column-oriented filing list accepted by `filter`.
pub fn select_filings(
    list: &FilingsList,
    filter: &FilingFilter,
    ticker: &str,
    company_name: &str,
    cik: &str,
) -> Result<Vec<FilingInfo>, EdgarError> {
    let mut filings = Vec::new();

    for (i, acc_num) in list.accession_number.iter().enumerate() {
        let form = list.form.get(i)
            .ok_or_else(|| EdgarError::Parse("Missing form type".to_string()))?;
        let raw_date = list.filing_date.get(i)
            .ok_or_else(|| EdgarError::Parse("Missing filing date".to_string()))?;
        let filing_date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|_| EdgarError::Parse(format!("Invalid filing date '{}'", raw_date)))?;

        if !filter.accepts(form, filing_date) {
            continue;
        }

        let primary_doc = list.primary_document.get(i)
            .ok_or_else(|| EdgarError::Parse("Missing primary document".to_string()))?;
        // Report date is blank for some older filings
        let report_date = list.report_date.get(i)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        filings.push(FilingInfo {
            accession_number: acc_num.clone(),
            filing_date,
            report_date,
            form_type: form.clone(),
            ticker: ticker.to_uppercase(),
            company_name: company_name.to_string(),
            cik: cik.to_string(),
            primary_doc: primary_doc.clone(),
        });
    }

    Ok(filings)
}
