//! CSV row streams.
//!
//! Two exports feed the import:
//!
//! | stream     | columns                          |
//! |------------|----------------------------------|
//! | prices     | `Convenio`, `VACINAS`, `Preco`   |
//! | acceptance | `Convênios`, `Unidade`, `Aceita` |
//!
//! Header whitespace is trimmed and a leading UTF-8 BOM is skipped. Extra
//! columns are ignored. Cell values are kept verbatim; trimming and case
//! folding happen later in [`crate::aliases`].

use std::fs::File;
use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::error::ImportError;

/// Default price export file name.
pub const DEFAULT_PRICES_FILE: &str = "convenios_precos.csv";
/// Default acceptance export file name.
pub const DEFAULT_ACCEPTANCE_FILE: &str = "convenios_unidades.csv";

const PRICE_COLUMNS: &[&str] = &["Convenio", "VACINAS"];
const ACCEPTANCE_COLUMNS: &[&str] = &["Convênios", "Unidade"];

/// One line of the price export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceRow {
    /// Raw partner label.
    #[serde(rename = "Convenio")]
    pub partner: String,
    /// Raw catalog item label.
    #[serde(rename = "VACINAS")]
    pub item: String,
    /// Raw price cell; `None` when empty or the column is absent.
    #[serde(rename = "Preco", default)]
    pub price_text: Option<String>,
}

impl PriceRow {
    /// Price with lenient parsing: a leading decimal number is honoured
    /// (`"150,00"` is 150.0), anything unparseable is 0.0.
    pub fn price(&self) -> f64 {
        self.price_text.as_deref().map_or(0.0, lenient_f64)
    }
}

/// One line of the acceptance export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AcceptanceRow {
    /// Raw partner label.
    #[serde(rename = "Convênios")]
    pub partner: String,
    /// Raw site label.
    #[serde(rename = "Unidade")]
    pub site: String,
    /// Raw acceptance cell.
    #[serde(rename = "Aceita", default)]
    pub accepted_text: Option<String>,
}

impl AcceptanceRow {
    /// Only the literal `SIM` means accepted.
    pub fn accepted(&self) -> bool {
        self.accepted_text.as_deref() == Some("SIM")
    }
}

/// Longest leading decimal literal of `text` (after leading whitespace),
/// or 0.0 when there is none or it is zero.
fn lenient_f64(text: &str) -> f64 {
    let s = text.trim_start();
    let b = s.as_bytes();
    let mut end = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while b.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if b.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while b.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return 0.0;
    }
    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(b.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while b.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn reader<R: io::Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(rdr)
}

fn read_rows<R, T>(label: &str, rdr: R, required: &[&str]) -> Result<Vec<T>, ImportError>
where
    R: io::Read,
    T: for<'de> Deserialize<'de>,
{
    let malformed = |message: String| ImportError::InputMalformed {
        input: label.to_string(),
        message,
    };

    let mut rdr = reader(rdr);
    let headers = rdr
        .headers()
        .map_err(|e| malformed(format!("unreadable header: {e}")))?
        .clone();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(malformed(format!("missing column(s) {}", missing.join(", "))));
    }

    rdr.deserialize()
        .enumerate()
        .map(|(i, row)| row.map_err(|e| malformed(format!("record {}: {e}", i + 1))))
        .collect()
}

fn open(path: &Path) -> Result<File, ImportError> {
    File::open(path).map_err(|source| ImportError::InputMissing {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse price rows from any reader; `label` names the stream in errors.
pub fn price_rows_from_reader<R: io::Read>(
    label: &str,
    rdr: R,
) -> Result<Vec<PriceRow>, ImportError> {
    read_rows(label, rdr, PRICE_COLUMNS)
}

/// Parse acceptance rows from any reader; `label` names the stream in errors.
pub fn acceptance_rows_from_reader<R: io::Read>(
    label: &str,
    rdr: R,
) -> Result<Vec<AcceptanceRow>, ImportError> {
    read_rows(label, rdr, ACCEPTANCE_COLUMNS)
}

/// Read the price export at `path`.
pub fn read_price_rows(path: &Path) -> Result<Vec<PriceRow>, ImportError> {
    price_rows_from_reader(&path.display().to_string(), open(path)?)
}

/// Read the acceptance export at `path`.
pub fn read_acceptance_rows(path: &Path) -> Result<Vec<AcceptanceRow>, ImportError> {
    acceptance_rows_from_reader(&path.display().to_string(), open(path)?)
}
