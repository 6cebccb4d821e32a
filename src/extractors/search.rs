// src/extractors/search.rs
use crate::utils::error::ExtractError;
use regex::Regex;
use std::io::ErrorKind;
use std::path::Path;

/// Shown to the user when no line of an artifact matches.
pub const NOT_FOUND_MESSAGE: &str = "Relevant data segment not found.";

/// Lines around the first matching line of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    pub text: String,      // Window lines joined, terminators preserved
    pub line_index: usize, // Zero-based index of the matching line
    pub start: usize,      // First line of the window (inclusive)
    pub end: usize,        // Last line of the window (exclusive)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    Match(Excerpt),
    NotFound,
}

impl SearchResult {
    pub fn excerpt(&self) -> Option<&Excerpt> {
        match self {
            SearchResult::Match(excerpt) => Some(excerpt),
            SearchResult::NotFound => None,
        }
    }

    /// Text to display: the window, or the not-found message.
    pub fn display_text(&self) -> &str {
        match self {
            SearchResult::Match(excerpt) => &excerpt.text,
            SearchResult::NotFound => NOT_FOUND_MESSAGE,
        }
    }
}

/// Finds the first line of the artifact at `artifact_path` matching `pattern` and
/// returns lines `[max(i - lines_before, 0), min(i + lines_after, N))`.
///
/// The artifact is only read. An invalid pattern is an error; no match is
/// `SearchResult::NotFound`.
pub fn search(
    artifact_path: &Path,
    pattern: &str,
    lines_before: usize,
    lines_after: usize,
) -> Result<SearchResult, ExtractError> {
    let search_pattern = Regex::new(pattern)?;

    let contents = std::fs::read_to_string(artifact_path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ExtractError::ArtifactNotFound(artifact_path.to_path_buf())
        } else {
            ExtractError::ArtifactRead {
                path: artifact_path.to_path_buf(),
                source,
            }
        }
    })?;

    let result = search_text(&contents, &search_pattern, lines_before, lines_after);
    match &result {
        SearchResult::Match(excerpt) => tracing::debug!(
            "Pattern '{}' matched line {} of {} (window {}..{})",
            pattern,
            excerpt.line_index,
            artifact_path.display(),
            excerpt.start,
            excerpt.end
        ),
        SearchResult::NotFound => {
            tracing::debug!("Pattern '{}' not found in {}", pattern, artifact_path.display())
        }
    }
    Ok(result)
}

/// In-memory core of [`search`].
pub fn search_text(
    contents: &str,
    search_pattern: &Regex,
    lines_before: usize,
    lines_after: usize,
) -> SearchResult {
    let lines: Vec<&str> = contents.split_inclusive('\n').collect();

    let Some(line_index) = lines
        .iter()
        .position(|line| search_pattern.is_match(line_content(line)))
    else {
        return SearchResult::NotFound;
    };

    let start = line_index.saturating_sub(lines_before);
    let end = line_index.saturating_add(lines_after).min(lines.len()).max(start);

    SearchResult::Match(Excerpt {
        text: lines[start..end].concat(),
        line_index,
        start,
        end,
    })
}

fn line_content(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
