//! Per-site extraction strategies over rendered HTML.
//!
//! Every supported site gets one [`SiteAdapter`] variant encoding its markup
//! layout. The registry is closed: an unknown host is an explicit
//! "unsupported site" failure at dispatch, never a silent fallback. Adapters
//! are pure functions over a parsed document and must tolerate broken
//! markup — a row missing cells is skipped, not an error.

pub mod image_hint;
pub mod symbol_card;
pub mod table;

use scraper::Html;
use url::Url;

/// One currency quote as scraped, before normalization.
///
/// Either side may be absent; the writer handles each independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuote {
    /// Raw currency label: a code, a Turkish name, a symbol, or a code the
    /// adapter inferred from markup hints.
    pub label: String,
    pub buy: Option<String>,
    pub sell: Option<String>,
}

/// Extraction strategy for one site's markup layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteAdapter {
    /// Every `<tr>` with at least three cells is (label, buy, sell).
    GenericTable,
    /// Generic table, but the first `skip` rows are header/noise.
    SkipPrefixTable { skip: usize },
    /// Currency identity comes from an `<img>` src/alt fragment
    /// ("dolar", "euro", "sterlin") instead of visible text.
    ImageHint,
    /// Card list keyed on a visible currency symbol (€, £, $).
    SymbolCard,
}

impl SiteAdapter {
    /// Run this strategy over a rendered document.
    pub fn extract(&self, doc: &Html) -> Vec<RateQuote> {
        match self {
            SiteAdapter::GenericTable => table::extract(doc, 0),
            SiteAdapter::SkipPrefixTable { skip } => table::extract(doc, *skip),
            SiteAdapter::ImageHint => image_hint::extract(doc),
            SiteAdapter::SymbolCard => symbol_card::extract(doc),
        }
    }
}

/// Normalize a URL into an adapter dispatch key: lowercase hostname with the
/// scheme, `www.` prefix, and path stripped.
pub fn adapter_key(url: &str) -> String {
    let host = match Url::parse(url) {
        Ok(parsed) => parsed.host_str().map(|h| h.to_string()),
        // Bare hostnames ("galipdoviz.com/kurlar") don't parse as URLs.
        Err(_) => Url::parse(&format!("https://{url}"))
            .ok()
            .and_then(|p| p.host_str().map(|h| h.to_string())),
    };
    let host = host.unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Look up the adapter for a normalized host. `None` means the site is
/// unsupported and its run must fail with an explicit error.
pub fn adapter_for_host(host: &str) -> Option<SiteAdapter> {
    match host {
        "galipdoviz.com" => Some(SiteAdapter::ImageHint),
        "limasolbank.com.tr" => Some(SiteAdapter::SymbolCard),
        "sunexchange.com" => Some(SiteAdapter::SkipPrefixTable { skip: 3 }),
        "iktisatbank.com" | "koopbank.com" | "creditwestbank.com" => {
            Some(SiteAdapter::GenericTable)
        }
        _ => None,
    }
}
