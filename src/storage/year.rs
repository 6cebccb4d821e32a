// src/storage/year.rs
//! Fiscal year of an accession folder.
//!
//! Sources, most trusted first:
//! 1. `filing-metadata.json` written by the EDGAR downloader (filing date),
//! 2. the `FILED AS OF DATE` line of the `full-submission.txt` SGML header,
//! 3. the two-digit year embedded in the accession number folder name.
//!
//! The last one guesses the century with a cutoff at `30` and is only used
//! when nothing better exists.

use crate::edgar::models::FilingMetadata;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::Path;

pub const METADATA_FILE: &str = "filing-metadata.json";
pub const SUBMISSION_FILE: &str = "full-submission.txt";

// The SGML header sits at the very top of the submission file
const SUBMISSION_HEADER_BYTES: u64 = 64 * 1024;
const CENTURY_CUTOFF: u32 = 30;

static FILED_AS_OF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"FILED AS OF DATE:\s*(\d{8})").expect("Failed to compile FILED_AS_OF_RE")
});

// e.g. 0000320193-23-000106
static ACCESSION_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-([0-9]{2})-[0-9]+$").expect("Failed to compile ACCESSION_YEAR_RE")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSource {
    Metadata,
    SubmissionHeader,
    FolderName,
}

/// Resolves the filing year of one accession folder.
pub fn resolve_year(filing_dir: &Path) -> Option<(i32, YearSource)> {
    if let Some(year) = year_from_metadata(filing_dir) {
        return Some((year, YearSource::Metadata));
    }
    if let Some(year) = year_from_submission_header(filing_dir) {
        return Some((year, YearSource::SubmissionHeader));
    }
    let folder = filing_dir.file_name()?.to_str()?;
    let year = year_from_folder_name(folder)?;
    tracing::warn!(
        "No filing metadata in {}, guessed year {} from folder name",
        filing_dir.display(),
        year
    );
    Some((year, YearSource::FolderName))
}

fn year_from_metadata(filing_dir: &Path) -> Option<i32> {
    let raw = std::fs::read_to_string(filing_dir.join(METADATA_FILE)).ok()?;
    match serde_json::from_str::<FilingMetadata>(&raw) {
        Ok(metadata) => Some(metadata.filing_date.year()),
        Err(e) => {
            tracing::warn!("Ignoring unreadable {} in {}: {}", METADATA_FILE, filing_dir.display(), e);
            None
        }
    }
}

fn year_from_submission_header(filing_dir: &Path) -> Option<i32> {
    let file = std::fs::File::open(filing_dir.join(SUBMISSION_FILE)).ok()?;
    let mut header = Vec::new();
    file.take(SUBMISSION_HEADER_BYTES).read_to_end(&mut header).ok()?;
    let header = String::from_utf8_lossy(&header);

    let caps = FILED_AS_OF_RE.captures(&header)?;
    NaiveDate::parse_from_str(&caps[1], "%Y%m%d")
        .ok()
        .map(|date| date.year())
}

/// Four-digit year from an accession folder name such as `0000320193-23-000106`.
pub fn year_from_folder_name(folder: &str) -> Option<i32> {
    let caps = ACCESSION_YEAR_RE.captures(folder)?;
    let short: u32 = caps[1].parse().ok()?;
    let century = if short < CENTURY_CUTOFF { 2000 } else { 1900 };
    Some((century + short) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_name_century_cutoff() {
        assert_eq!(year_from_folder_name("0000320193-23-000106"), Some(2023));
        assert_eq!(year_from_folder_name("0000320193-29-000001"), Some(2029));
        assert_eq!(year_from_folder_name("0000320193-30-000001"), Some(1930));
        assert_eq!(year_from_folder_name("0000320193-97-000004"), Some(1997));
        assert_eq!(year_from_folder_name("not-an-accession"), None);
    }

    #[test]
    fn test_submission_header_beats_folder_name() {
        let dir = tempfile::tempdir().unwrap();
        let filing = dir.path().join("0000320193-29-000001");
        std::fs::create_dir(&filing).unwrap();
        std::fs::write(
            filing.join(SUBMISSION_FILE),
            "<SEC-HEADER>\nACCESSION NUMBER:\t\t0000320193-29-000001\nFILED AS OF DATE:\t\t20231103\n",
        )
        .unwrap();

        assert_eq!(resolve_year(&filing), Some((2023, YearSource::SubmissionHeader)));
    }

    #[test]
    fn test_folder_name_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let filing = dir.path().join("0000789019-19-000010");
        std::fs::create_dir(&filing).unwrap();

        assert_eq!(resolve_year(&filing), Some((2019, YearSource::FolderName)));
    }
}
