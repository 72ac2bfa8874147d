//! Generic table-row adapter.
//!
//! The default layout across the bank sites: one `<tr>` per currency with
//! label, buy, and sell in the first three cells. Rows with fewer cells
//! (headers, separators, ads wedged into the table) are skipped.

use super::RateQuote;
use scraper::{ElementRef, Html, Selector};

/// Extract quotes from every table row, skipping the first `skip` rows.
pub fn extract(doc: &Html, skip: usize) -> Vec<RateQuote> {
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    let mut quotes = Vec::new();
    for row in doc.select(&row_sel).skip(skip) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() < 3 {
            continue;
        }

        let label = cell_text(&cells[0]);
        if label.is_empty() {
            continue;
        }

        quotes.push(RateQuote {
            label,
            buy: non_empty(cell_text(&cells[1])),
            sell: non_empty(cell_text(&cells[2])),
        });
    }
    quotes
}

pub(super) fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

pub(super) fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_three_cell_rows() {
        let html = r#"
        <table>
          <tr><td>USD</td><td>30.10</td><td>30.40</td></tr>
          <tr><td>EUR</td><td>33.00</td><td>33.50</td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc, 0);

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].label, "USD");
        assert_eq!(quotes[0].buy.as_deref(), Some("30.10"));
        assert_eq!(quotes[0].sell.as_deref(), Some("30.40"));
        assert_eq!(quotes[1].label, "EUR");
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let html = r#"
        <table>
          <tr><th>Kur</th></tr>
          <tr><td>Döviz</td><td>Alış</td></tr>
          <tr><td>USD</td><td>30.10</td><td>30.40</td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc, 0);

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].label, "USD");
    }

    #[test]
    fn test_skip_prefix_drops_header_rows() {
        let html = r#"
        <table><tbody>
          <tr><td>banner</td><td>x</td><td>y</td></tr>
          <tr><td>date</td><td>x</td><td>y</td></tr>
          <tr><td>Döviz</td><td>Alış</td><td>Satış</td></tr>
          <tr><td>USD</td><td>30.10</td><td>30.40</td></tr>
          <tr><td>EUR</td><td>33.00</td><td>33.50</td></tr>
        </tbody></table>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc, 3);

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].label, "USD");
        assert_eq!(quotes[1].label, "EUR");
    }

    #[test]
    fn test_missing_cells_become_none() {
        let html = r#"
        <table>
          <tr><td>USD</td><td>30.10</td><td></td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc, 0);

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].buy.as_deref(), Some("30.10"));
        assert_eq!(quotes[0].sell, None);
    }

    #[test]
    fn test_nested_markup_in_cells() {
        let html = r#"
        <table>
          <tr><td><span>USD</span></td><td><div><b>30.10</b></div></td><td><div>30.40</div></td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc, 0);

        assert_eq!(quotes[0].label, "USD");
        assert_eq!(quotes[0].buy.as_deref(), Some("30.10"));
    }

    #[test]
    fn test_empty_document() {
        let doc = Html::parse_document("<html><body><p>no rates today</p></body></html>");
        assert!(extract(&doc, 0).is_empty());
    }
}
