//! Serde model of the JSON document the vision models return.
//!
//! Every field is optional: the models only fill in what they can read
//! from the page, and the reconciliation step treats absence as "leave
//! the draft field alone".

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::error::ExtractionError;

/// Structured data extracted by a vision model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedDocument {
    pub supplier: Option<ExtractedSupplier>,
    pub invoice_data: Option<ExtractedInvoiceData>,
    #[serde(default)]
    pub line_items: Vec<ExtractedLineItem>,
}

/// Supplier block of the extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedSupplier {
    pub name: Option<String>,
    /// Tax identification number.
    pub vat: Option<String>,
}

/// Invoice header block of the extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedInvoiceData {
    pub invoice_number: Option<String>,
    /// Issue date; models answer under either key.
    pub date: Option<String>,
    pub invoice_date: Option<String>,
    pub due_date: Option<String>,
    /// ISO currency code.
    pub currency: Option<String>,
}

impl ExtractedInvoiceData {
    /// Issue date, whichever key the model used.
    pub fn issue_date(&self) -> Option<&str> {
        self.date.as_deref().or(self.invoice_date.as_deref())
    }
}

/// One extracted line item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedLineItem {
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub unit_price: Option<Decimal>,
    /// Tax rate in percent.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub tax_rate: Option<Decimal>,
}

impl ExtractedDocument {
    /// Parse a raw model response.
    ///
    /// JSON response modes normally return a bare object, but models
    /// occasionally wrap the answer in a Markdown fence or lead with
    /// prose; both are stripped before parsing.
    pub fn from_response(raw: &str) -> Result<Self, ExtractionError> {
        let json = extract_json(raw).ok_or(ExtractionError::NoJson)?;
        serde_json::from_str(json).map_err(|e| ExtractionError::Parse(e.to_string()))
    }
}

/// Locate the JSON object inside a model response.
fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();

    let body = if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        }
    } else {
        trimmed
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end >= start).then(|| &body[start..=end])
}

/// Accept a JSON number or a numeric string for decimal fields.
///
/// Vision models are loose about typing: `"quantity": "2"` and
/// `"tax_rate": "21%"` both occur in practice. Anything unparseable
/// becomes `None` so reconciliation falls back to its defaults.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        serde_json::Value::String(s) => parse_decimal_string(&s),
        _ => None,
    }))
}

fn parse_decimal_string(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_end_matches('%').trim().replace(' ', "");
    // "1,234.56" drops thousands separators; a lone "," is a decimal comma.
    let cleaned = if cleaned.contains('.') {
        cleaned.replace(',', "")
    } else {
        cleaned.replace(',', ".")
    };
    cleaned.parse().ok()
}
