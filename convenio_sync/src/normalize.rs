//! Canonical comparison keys for spreadsheet labels.

/// Trim surrounding whitespace and uppercase.
///
/// Uppercasing is Unicode-aware and locale-independent (`"iguaçu"` becomes
/// `"IGUAÇU"`). Accents are kept: `"AMÉRICAS"` and `"AMERICAS"` are different
/// keys, which is why the alias tables list both spellings.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}
