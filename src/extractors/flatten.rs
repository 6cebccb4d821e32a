// src/extractors/flatten.rs

// --- Imports ---
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;

// --- Artifact layout ---
pub const TEXT_HEADER: &str = "Text Content:";
pub const TABLES_HEADER: &str = "Tables:";

// --- CSS Selectors (Lazy Static) ---
// Every row of a table, including rows of nested tables
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

// Header and data cells are collected alike
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td, th").expect("Failed to compile CELL_SELECTOR")
});

// --- Data Structures ---

/// One table: rows of non-empty, trimmed cell strings.
pub type Table = Vec<Vec<String>>;

/// The two semantic containers produced from one filing document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedArtifact {
    pub text: Vec<String>,  // Paragraph contents in document order
    pub tables: Vec<Table>, // Tables in document order
}

impl FlattenedArtifact {
    /// Renders the artifact in the on-disk `cleaned_data.txt` layout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(TEXT_HEADER);
        out.push('\n');
        out.push_str(&self.text.join("\n"));
        out.push_str("\n\n");
        out.push_str(TABLES_HEADER);
        out.push('\n');
        for table in &self.tables {
            for row in table {
                out.push_str(&row.join("\t"));
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Reads a rendered artifact back.
    ///
    /// Tables are split on blank lines and rows on tabs, so non-empty cells
    /// come back exactly. A row that lost every cell during flattening renders
    /// as a blank line, so the table it sits in is split in two at that row.
    pub fn parse(rendered: &str) -> Result<Self, ExtractError> {
        let body = rendered
            .strip_prefix(TEXT_HEADER)
            .and_then(|rest| rest.strip_prefix('\n'))
            .ok_or_else(|| ExtractError::MalformedArtifact(format!("missing '{}' header", TEXT_HEADER)))?;

        let separator = format!("\n\n{}\n", TABLES_HEADER);
        let (text_part, tables_part) = body
            .split_once(&separator)
            .ok_or_else(|| ExtractError::MalformedArtifact(format!("missing '{}' section", TABLES_HEADER)))?;

        let text = if text_part.is_empty() {
            Vec::new()
        } else {
            text_part.split('\n').map(str::to_string).collect()
        };

        let mut tables = Vec::new();
        let mut current: Table = Vec::new();
        for line in tables_part.lines() {
            if line.is_empty() {
                tables.push(std::mem::take(&mut current));
            } else {
                current.push(line.split('\t').map(str::to_string).collect());
            }
        }
        if !current.is_empty() {
            // Unterminated last table (hand-edited file)
            tables.push(current);
        }

        Ok(Self { text, tables })
    }
}

// --- Main Flattener Structure ---
#[derive(Debug, Default)]
pub struct DocumentFlattener;

impl DocumentFlattener {
    pub fn new() -> Self { Self {} }

    /// Reads one filing document (UTF-8 only) and flattens it.
    pub fn flatten_file(&self, path: &Path) -> Result<FlattenedArtifact, ExtractError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractError::DocumentRead {
            path: path.to_path_buf(),
            source,
        })?;
        let html = String::from_utf8(bytes)
            .map_err(|_| ExtractError::DocumentDecode(path.to_path_buf()))?;

        tracing::debug!("Read {} bytes from {}", html.len(), path.display());
        Ok(self.flatten_html(&html))
    }

    pub fn flatten_html(&self, html_content: &str) -> FlattenedArtifact {
        let document = Html::parse_document(html_content);
        self.flatten(&document)
    }

    /// Walks the whole tree in document order, collecting paragraph text and tables.
    pub fn flatten(&self, document: &Html) -> FlattenedArtifact {
        let mut artifact = FlattenedArtifact::default();

        for element in document.tree.root().descendants().filter_map(ElementRef::wrap) {
            match element.value().name() {
                "p" => {
                    let text = element_text(element);
                    if !text.is_empty() {
                        artifact.text.push(text);
                    }
                }
                "table" => artifact.tables.push(self.flatten_table(element)),
                _ => {}
            }
        }

        tracing::debug!(
            "Flattened document: {} paragraphs, {} tables",
            artifact.text.len(),
            artifact.tables.len()
        );
        artifact
    }

    /// Builds one table; empty cells are dropped, so rows may come out shorter than rendered.
    fn flatten_table(&self, table: ElementRef) -> Table {
        table
            .select(&ROW_SELECTOR)
            .map(|row| {
                row.select(&CELL_SELECTOR)
                    .map(element_text)
                    .filter(|cell| !cell.is_empty())
                    .collect()
            })
            .collect()
    }
}

/// Descendant text with every whitespace run (line breaks and tabs included)
/// collapsed to one space, so a paragraph or cell always renders on one line.
fn element_text(element: ElementRef) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_two_tables_flatten_in_order() {
        let html = r#"
            <html><body>
            <table>
              <tr><th>Region</th><th>Sales</th></tr>
              <tr><td>Americas</td><td>$10</td></tr>
            </table>
            <table><tr><td>Total</td><td>$10</td></tr></table>
            </body></html>
        "#;

        let artifact = DocumentFlattener::new().flatten_html(html);

        assert_eq!(
            artifact.tables,
            vec![
                vec![row(&["Region", "Sales"]), row(&["Americas", "$10"])],
                vec![row(&["Total", "$10"])],
            ]
        );
        assert!(artifact.text.is_empty());
    }

    #[test]
    fn test_paragraphs_trimmed_and_empty_ones_skipped() {
        let html = r#"
            <body>
            <p>  First paragraph. </p>
            <p>   </p>
            <div><p>Nested <b>bold</b> text</p></div>
            <p>&nbsp;</p>
            <p>Last</p>
            </body>
        "#;

        let artifact = DocumentFlattener::new().flatten_html(html);

        assert_eq!(artifact.text, vec!["First paragraph.", "Nested bold text", "Last"]);
    }

    #[test]
    fn test_empty_cells_dropped_keeping_order() {
        let html = r#"
            <table>
              <tr><td>Net sales</td><td> </td><td>$</td><td>383,285</td></tr>
              <tr><td></td><td>&nbsp;</td></tr>
            </table>
        "#;

        let artifact = DocumentFlattener::new().flatten_html(html);

        assert_eq!(artifact.tables.len(), 1);
        assert_eq!(artifact.tables[0][0], row(&["Net sales", "$", "383,285"]));
        assert!(artifact.tables[0][1].is_empty(), "row with only blank cells shrinks to nothing");
        for table in &artifact.tables {
            for r in table {
                assert!(r.iter().all(|cell| !cell.is_empty()));
            }
        }
    }

    #[test]
    fn test_paragraphs_and_tables_interleaved() {
        let html = r#"
            <p>Intro</p>
            <table><tr><td>A</td></tr></table>
            <p>Between</p>
            <table><tr><td><p>Cell paragraph</p></td></tr></table>
        "#;

        let artifact = DocumentFlattener::new().flatten_html(html);

        // Paragraphs inside table cells are visited by the same walk
        assert_eq!(artifact.text, vec!["Intro", "Between", "Cell paragraph"]);
        assert_eq!(artifact.tables, vec![vec![row(&["A"])], vec![row(&["Cell paragraph"])]]);
    }

    #[test]
    fn test_render_layout() {
        let artifact = FlattenedArtifact {
            text: vec!["One".to_string(), "Two".to_string()],
            tables: vec![
                vec![row(&["Region", "Sales"]), row(&["Americas", "$10"])],
                vec![row(&["Total", "$10"])],
            ],
        };

        assert_eq!(
            artifact.render(),
            "Text Content:\nOne\nTwo\n\nTables:\nRegion\tSales\nAmericas\t$10\n\nTotal\t$10\n\n"
        );
    }

    #[test]
    fn test_tables_survive_render_and_parse() {
        let html = r#"
            <p>Geographic data</p>
            <table>
              <tr><th>Region</th><th></th><th>2023</th></tr>
              <tr><td>Americas</td><td>$</td><td>162,560</td></tr>
              <tr><td>Europe</td><td>$</td><td>94,294</td></tr>
            </table>
            <table><tr><td>Total</td><td>$10</td></tr></table>
        "#;
        let artifact = DocumentFlattener::new().flatten_html(html);

        let parsed = FlattenedArtifact::parse(&artifact.render()).unwrap();

        assert_eq!(parsed.tables, artifact.tables);
        assert_eq!(parsed.text, artifact.text);
    }

    #[test]
    fn test_wrapped_cell_and_paragraph_stay_on_one_line() {
        let html = "<p>Total net sales\n      increased\tby 3%</p>\
            <table><tr><td>Net sales\n      (1)</td><td>$10</td></tr>\
            <tr><td>Net<b>income</b></td><td>$\r\n 2</td></tr></table>";

        let artifact = DocumentFlattener::new().flatten_html(html);

        assert_eq!(artifact.text, vec!["Total net sales increased by 3%"]);
        assert_eq!(
            artifact.tables,
            vec![vec![row(&["Net sales (1)", "$10"]), row(&["Netincome", "$ 2"])]]
        );
        assert_eq!(FlattenedArtifact::parse(&artifact.render()).unwrap(), artifact);
    }

    #[test]
    fn test_parse_splits_table_at_row_without_cells() {
        let artifact = FlattenedArtifact {
            text: Vec::new(),
            tables: vec![vec![row(&["A"]), Vec::new(), row(&["B"])]],
        };

        let parsed = FlattenedArtifact::parse(&artifact.render()).unwrap();

        assert_eq!(parsed.tables, vec![vec![row(&["A"])], vec![row(&["B"])]]);
    }

    #[test]
    fn test_parse_without_paragraphs() {
        let parsed = FlattenedArtifact::parse("Text Content:\n\n\nTables:\nA\tB\n\n").unwrap();
        assert!(parsed.text.is_empty());
        assert_eq!(parsed.tables, vec![vec![row(&["A", "B"])]]);
    }

    #[test]
    fn test_parse_rejects_foreign_file() {
        assert!(matches!(
            FlattenedArtifact::parse("<html></html>"),
            Err(ExtractError::MalformedArtifact(_))
        ));
    }

    #[test]
    fn test_flatten_file_rejects_non_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("primary-document.html");
        std::fs::write(&path, [0x3c, 0x70, 0x3e, 0xff, 0xfe, 0x3c, 0x2f, 0x70, 0x3e]).unwrap();

        let result = DocumentFlattener::new().flatten_file(&path);

        assert!(matches!(result, Err(ExtractError::DocumentDecode(_))));
    }

    #[test]
    fn test_flatten_file_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = DocumentFlattener::new().flatten_file(&dir.path().join("absent.html"));
        assert!(matches!(result, Err(ExtractError::DocumentRead { .. })));
    }
}
