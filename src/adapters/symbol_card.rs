//! Symbol-card adapter.
//!
//! Limasol Bank's layout: a list of `.exchange-rates__item` cards, each with
//! name/buy/sell child elements. The name shows a currency symbol (€, £, $)
//! rather than a code. Cards without a recognized symbol are skipped.

use super::RateQuote;
use scraper::{Html, Selector};

fn currency_from_symbol(name: &str) -> Option<&'static str> {
    if name.contains('€') {
        Some("EUR")
    } else if name.contains('£') {
        Some("GBP")
    } else if name.contains('$') {
        Some("USD")
    } else {
        None
    }
}

pub fn extract(doc: &Html) -> Vec<RateQuote> {
    let item_sel = Selector::parse(".exchange-rates__item").unwrap();
    let name_sel = Selector::parse(".exchange-rates__item__name").unwrap();
    let buy_sel = Selector::parse(".exchange-rates__item__buy").unwrap();
    let sell_sel = Selector::parse(".exchange-rates__item__sell").unwrap();

    let mut quotes = Vec::new();
    for item in doc.select(&item_sel) {
        let Some(name) = item.select(&name_sel).next() else {
            continue;
        };
        let name_text = name.text().collect::<String>();
        let Some(code) = currency_from_symbol(&name_text) else {
            continue;
        };

        let side_text = |sel: &Selector| {
            item.select(sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        };

        quotes.push(RateQuote {
            label: code.to_string(),
            buy: side_text(&buy_sel),
            sell: side_text(&sell_sel),
        });
    }
    quotes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_cards_by_symbol() {
        let html = r#"
        <div class="exchange-rates">
          <div class="exchange-rates__item">
            <span class="exchange-rates__item__name">Euro (€)</span>
            <span class="exchange-rates__item__buy">33.00</span>
            <span class="exchange-rates__item__sell">33.50</span>
          </div>
          <div class="exchange-rates__item">
            <span class="exchange-rates__item__name">£ Sterlin</span>
            <span class="exchange-rates__item__buy">38.20</span>
            <span class="exchange-rates__item__sell">38.90</span>
          </div>
          <div class="exchange-rates__item">
            <span class="exchange-rates__item__name">$ Dolar</span>
            <span class="exchange-rates__item__buy">30.10</span>
            <span class="exchange-rates__item__sell">30.40</span>
          </div>
        </div>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc);

        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0].label, "EUR");
        assert_eq!(quotes[1].label, "GBP");
        assert_eq!(quotes[2].label, "USD");
        assert_eq!(quotes[2].buy.as_deref(), Some("30.10"));
    }

    #[test]
    fn test_card_with_missing_side_keeps_other_side() {
        let html = r#"
        <div class="exchange-rates__item">
          <span class="exchange-rates__item__name">€</span>
          <span class="exchange-rates__item__buy">33.00</span>
        </div>"#;
        let doc = Html::parse_document(html);
        let quotes = extract(&doc);

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].buy.as_deref(), Some("33.00"));
        assert_eq!(quotes[0].sell, None);
    }

    #[test]
    fn test_card_without_symbol_is_skipped() {
        let html = r#"
        <div class="exchange-rates__item">
          <span class="exchange-rates__item__name">Altın (gram)</span>
          <span class="exchange-rates__item__buy">2000</span>
          <span class="exchange-rates__item__sell">2050</span>
        </div>"#;
        let doc = Html::parse_document(html);
        assert!(extract(&doc).is_empty());
    }
}
