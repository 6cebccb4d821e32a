// src/analysis/prompt.rs

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    SingleYear,
    /// The selected year and the preceding available years
    Trend,
}

/// Text found for one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearExcerpt {
    pub year: i32,
    pub text: String,
}

/// Years to search: the selected one, or for a trend the selected year and up
/// to `count - 1` earlier available years. Returned oldest first.
pub fn select_years(available: &[i32], selected: i32, mode: AnalysisMode, count: usize) -> Vec<i32> {
    match mode {
        AnalysisMode::SingleYear => vec![selected],
        AnalysisMode::Trend => {
            let mut years: Vec<i32> = available.iter().copied().filter(|y| *y <= selected).collect();
            if !years.contains(&selected) {
                years.push(selected);
            }
            years.sort_unstable();
            years.dedup();
            let skip = years.len().saturating_sub(count);
            years.split_off(skip)
        }
    }
}

/// Assembles the prompt sent to the completion model.
pub fn build_prompt(instruction: &str, company: &str, mode: AnalysisMode, excerpts: &[YearExcerpt]) -> String {
    let header = match (mode, excerpts.first(), excerpts.last()) {
        (AnalysisMode::Trend, Some(first), Some(last)) => format!(
            "Perform a trend analysis based on the following data for {} from {} to {}:",
            company, first.year, last.year
        ),
        (_, Some(only), _) => format!("Analyze the following data for {} in {}:", company, only.year),
        (_, None, _) => format!("Analyze the following data for {}:", company),
    };

    let combined: String = excerpts
        .iter()
        .map(|e| format!("Data for {}:\n{}\n\n", e.year, e.text))
        .collect();

    format!("{}\n\n{}\n\n{}", instruction, header, combined)
}
