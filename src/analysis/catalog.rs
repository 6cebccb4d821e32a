// src/analysis/catalog.rs
use serde::{Deserialize, Serialize};

/// One analysis category: which line to look for, how much context to keep,
/// and how to frame it for the completion model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisSpec {
    pub ticker: String,
    pub name: String,
    pub pattern: String,
    pub lines_before: usize,
    pub lines_after: usize,
    pub instruction: String,
}

fn spec(ticker: &str, name: &str, pattern: &str, lines_before: usize, lines_after: usize, instruction: &str) -> AnalysisSpec {
    AnalysisSpec {
        ticker: ticker.to_string(),
        name: name.to_string(),
        pattern: pattern.to_string(),
        lines_before,
        lines_after,
        instruction: instruction.to_string(),
    }
}

pub fn default_analyses() -> Vec<AnalysisSpec> {
    vec![
        spec(
            "AAPL",
            "Sales by Geographic Region",
            r"Americas.*\$",
            2,
            6,
            "Analyze the regional sales trends for Apple Inc., highlighting significant variations and discussing potential influences from economic and market conditions.",
        ),
        spec(
            "AAPL",
            "Net Sales by Category",
            r"iPhone \(1\).*\$",
            2,
            6,
            "Explore the category-wise sales data for Apple Inc., analyzing trends and projecting future performance based on past data.",
        ),
        spec(
            "MSFT",
            "Net Income from Operations",
            r"Net income.*\$",
            2,
            20,
            "Examine the trend in Microsoft's net income from operations, interpreting the operational efficiency and fiscal management over the years.",
        ),
        spec(
            "MSFT",
            "Investing Activities Analysis",
            r"Additions to property and equipment.*\(",
            1,
            6,
            "Delve into Microsoft's investment activities, focusing on capital expenditures and their implications on financial strategy and company growth.",
        ),
        spec(
            "V",
            "Consumer Credit Analysis",
            r"Consumer credit\t\$",
            1,
            6,
            "Assess Visa's performance across different payment segments with a focus on consumer credit, discussing the implications for market trends and strategic business decisions.",
        ),
    ]
}

/// Categories offered for a ticker, in catalog order.
pub fn analyses_for<'a>(analyses: &'a [AnalysisSpec], ticker: &'a str) -> impl Iterator<Item = &'a AnalysisSpec> + 'a {
    analyses.iter().filter(move |a| a.ticker.eq_ignore_ascii_case(ticker))
}

pub fn find_analysis<'a>(analyses: &'a [AnalysisSpec], ticker: &str, name: &str) -> Option<&'a AnalysisSpec> {
    analyses
        .iter()
        .find(|a| a.ticker.eq_ignore_ascii_case(ticker) && a.name.eq_ignore_ascii_case(name))
}
