//! Currency-label normalization.
//!
//! Scraped pages label currencies inconsistently: ISO codes, Turkish names,
//! bare symbols, or whatever the site's designer felt like. Everything must
//! resolve to a canonical code before persistence; labels that don't resolve
//! are dropped by the caller.

/// The fixed set of canonical currency codes Ratewatch persists.
pub const CANONICAL_CODES: &[&str] = &[
    "USD", "EUR", "GBP", "TRY", "AUD", "CHF", "CAD", "JPY", "SEK", "NOK", "DKK",
];

/// Accepted raw labels per canonical code, matched case-insensitively.
///
/// The table must stay collision-free: no label may appear under two codes.
/// A unit test enforces this.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("USD", &["Dolar", "Amerikan Doları", "ABD Doları", "US Dollar", "$"]),
    ("EUR", &["Euro", "Avro", "€"]),
    ("GBP", &["Sterlin", "İngiliz Sterlini", "Pound", "£"]),
    ("TRY", &["TL", "Türk Lirası", "Lira", "₺"]),
    ("AUD", &["Avustralya Doları", "Australian Dollar"]),
    ("CHF", &["İsviçre Frangı", "Frank", "Swiss Franc"]),
    ("CAD", &["Kanada Doları", "Canadian Dollar"]),
    ("JPY", &["Japon Yeni", "Yen", "¥"]),
    ("SEK", &["İsveç Kronu"]),
    ("NOK", &["Norveç Kronu"]),
    ("DKK", &["Danimarka Kronu"]),
];

/// Resolve a raw scraped label to a canonical currency code.
///
/// Two passes: exact match against the code set (whitespace stripped,
/// case-folded), then a case-insensitive scan of the synonym table using the
/// trimmed original label. `None` means the observation must be dropped —
/// raw or guessed codes are never persisted.
pub fn normalize(label: &str) -> Option<&'static str> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }

    let compact: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if let Some(code) = CANONICAL_CODES.iter().copied().find(|c| *c == compact) {
        return Some(code);
    }

    let folded = trimmed.to_lowercase();
    for &(code, labels) in SYNONYMS {
        if labels.iter().any(|l| l.to_lowercase() == folded) {
            return Some(code);
        }
    }

    None
}
