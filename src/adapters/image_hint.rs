//! Image-hint adapter.
//!
//! Some exchange offices show flag images instead of currency names. The
//! label cell holds only an `<img>`, so currency identity is inferred from a
//! filename/alt fragment: "dolar" → USD, "euro" → EUR, "sterlin" → GBP.
//! Rows without a recognized fragment are skipped.

use super::table::{cell_text, non_empty};
use super::RateQuote;
use scraper::{ElementRef, Html, Selector};

/// Map an image src/alt fragment to a currency code.
fn currency_from_hint(hint: &str) -> Option<&'static str> {
    let hint = hint.to_lowercase();
    if hint.contains("dolar") {
        Some("USD")
    } else if hint.contains("euro") {
        Some("EUR")
    } else if hint.contains("sterlin") {
        Some("GBP")
    } else {
        None
    }
}

pub fn extract(doc: &Html) -> Vec<RateQuote> {
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let img_sel = Selector::parse("img").unwrap();

    let mut quotes = Vec::new();
    for row in doc.select(&row_sel) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() < 3 {
            continue;
        }

        let Some(img) = row.select(&img_sel).next() else {
            continue;
        };
        let hint = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("alt"))
            .unwrap_or_default();
        let Some(code) = currency_from_hint(hint) else {
            continue;
        };

        quotes.push(RateQuote {
            label: code.to_string(),
            buy: non_empty(cell_text(&cells[1])),
            sell: non_empty(cell_text(&cells[2])),
        });
    }
    quotes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infers_currency_from_img_src() {
        let html = r#"
        <table>
          <tr><td><img src="/img/dolar.png"></td><td><div>30.10</div></td><td><div>30.40</div></td></tr>
          <tr><td><img src="/img/euro.png"></td><td><div>33.00</div></td><td><div>33.50</div></td></tr>
          <tr><td><img src="/img/sterlin.png"></td><td><div>38.20</div></td><td><div>38.90</div></td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc);

        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0].label, "USD");
        assert_eq!(quotes[0].buy.as_deref(), Some("30.10"));
        assert_eq!(quotes[1].label, "EUR");
        assert_eq!(quotes[2].label, "GBP");
        assert_eq!(quotes[2].sell.as_deref(), Some("38.90"));
    }

    #[test]
    fn test_falls_back_to_alt_attribute() {
        let html = r#"
        <table>
          <tr><td><img alt="Amerikan dolar kuru"></td><td>30.10</td><td>30.40</td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc);

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].label, "USD");
    }

    #[test]
    fn test_unrecognized_images_skipped() {
        let html = r#"
        <table>
          <tr><td><img src="/img/logo.png"></td><td>1</td><td>2</td></tr>
          <tr><td>no image here</td><td>3</td><td>4</td></tr>
          <tr><td><img src="/img/euro.gif"></td><td>33.00</td><td>33.50</td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc);

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].label, "EUR");
    }
}
