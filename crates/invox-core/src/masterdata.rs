//! Accounting master data lookups.
//!
//! The records digitization reconciles against (partners, currencies,
//! purchase taxes) live in the host accounting system. This module seams
//! them behind a trait with a JSON-file-backed implementation so the
//! pipeline can run standalone.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A business partner (supplier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: u32,
    pub name: String,
    /// Tax identification number.
    #[serde(default)]
    pub vat: Option<String>,
}

/// A currency record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub id: u32,
    /// ISO 4217 code, e.g. `USD`.
    pub code: String,
}

/// Whether a tax applies to purchases or sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxUse {
    Purchase,
    Sale,
}

/// A tax record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tax {
    pub id: u32,
    pub name: String,
    /// Rate in percent.
    pub amount: Decimal,
    pub tax_use: TaxUse,
    /// Company the tax belongs to; `None` means shared across companies.
    #[serde(default)]
    pub company_id: Option<u32>,
}

/// Best-effort lookups against the accounting directory.
///
/// Every method mirrors a `limit=1` search: the first match wins and a
/// miss is not an error; reconciliation simply leaves the field unset.
pub trait MasterData: Send + Sync {
    /// Exact match on the partner's tax id.
    fn partner_by_vat(&self, vat: &str) -> Option<Partner>;

    /// Case-insensitive substring match on the partner name.
    fn partner_by_name(&self, name: &str) -> Option<Partner>;

    /// Match on the ISO currency code (case-insensitive).
    fn currency_by_code(&self, code: &str) -> Option<Currency>;

    /// Purchase tax with the given percentage rate, scoped to the company.
    fn purchase_tax_by_rate(&self, rate: Decimal, company_id: u32) -> Option<Tax>;
}

/// Directory loaded from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonMasterData {
    pub partners: Vec<Partner>,
    pub currencies: Vec<Currency>,
    pub taxes: Vec<Tax>,
}

impl JsonMasterData {
    /// An empty directory; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the directory from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl MasterData for JsonMasterData {
    fn partner_by_vat(&self, vat: &str) -> Option<Partner> {
        self.partners
            .iter()
            .find(|p| p.vat.as_deref() == Some(vat))
            .cloned()
    }

    fn partner_by_name(&self, name: &str) -> Option<Partner> {
        let needle = name.to_lowercase();
        self.partners
            .iter()
            .find(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
    }

    fn currency_by_code(&self, code: &str) -> Option<Currency> {
        self.currencies
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .cloned()
    }

    fn purchase_tax_by_rate(&self, rate: Decimal, company_id: u32) -> Option<Tax> {
        self.taxes
            .iter()
            .find(|t| {
                t.amount == rate
                    && t.tax_use == TaxUse::Purchase
                    && t.company_id.is_none_or(|id| id == company_id)
            })
            .cloned()
    }
}
