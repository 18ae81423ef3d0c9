use scraper::{ElementRef, Html, Selector};
use tramtimes_core::error::AppError;
use tramtimes_core::traits::TableReader;

/// Reads departure table rows with `scraper`.
///
/// Every `tr` inside a `table` is visited in document order. Header rows
/// made only of `th` are skipped; for the rest, the direct `td` children
/// give the row's cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperTableReader;

impl ScraperTableReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for ScraperTableReader {
    fn read_rows(&self, html: &str) -> Result<Vec<Vec<String>>, AppError> {
        let document = Html::parse_document(html);
        let row_selector = Selector::parse("table tr")
            .map_err(|e| AppError::ParseError(format!("Invalid row selector: {e}")))?;

        let rows = document
            .select(&row_selector)
            .map(|row| {
                row.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| cell.value().name() == "td")
                    .map(cell_text)
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();

        Ok(rows)
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
