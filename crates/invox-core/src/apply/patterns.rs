//! Regex patterns for cleaning extracted field values.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Formal document number: 1-5 digit branch, dash, 1-8 digit sequence
    /// (e.g. `00001-00000042`), the fiscal numbering used by LATAM
    /// localizations.
    pub static ref DOCUMENT_NUMBER: Regex = Regex::new(r"(\d{1,5}-\d{1,8})").unwrap();
}
