//! Invoice draft records that digitization writes into.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Journal entry type for a draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    /// Supplier invoice; the only type the digitization flow creates.
    #[default]
    InInvoice,
    /// Supplier refund.
    InRefund,
}

/// Lifecycle state of the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Editable draft awaiting validation.
    #[default]
    Draft,
    /// Posted to the books.
    Posted,
}

/// Digitization status flag on a draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractStatus {
    /// Digitization has not run for this draft.
    #[default]
    NotRequested,
    /// Extraction finished; a human still has to validate the fields.
    WaitingValidation,
    /// Extraction failed; see `extract_error`.
    Error,
}

impl ExtractStatus {
    /// Wire/code representation of the flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractStatus::NotRequested => "not_requested",
            ExtractStatus::WaitingValidation => "waiting_validation",
            ExtractStatus::Error => "error",
        }
    }
}

/// A single line on the invoice draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Product/service description.
    pub description: String,

    /// Quantity.
    pub quantity: Decimal,

    /// Unit price (net).
    pub unit_price: Decimal,

    /// Matched purchase tax record, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<u32>,

    /// Tax rate in percent applied to this line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Decimal>,

    /// Net amount for this line.
    pub total_net: Decimal,

    /// Tax amount for this line.
    pub tax_amount: Decimal,

    /// Gross amount for this line.
    pub total_gross: Decimal,
}

impl InvoiceLine {
    /// Create a line with amounts still at zero; call
    /// [`InvoiceDraft::recompute_totals`] after adding lines.
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            tax_id: None,
            tax_rate: None,
            total_net: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_gross: Decimal::ZERO,
        }
    }
}

/// Totals across all draft lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub net: Decimal,
    pub tax: Decimal,
    pub gross: Decimal,
}

/// A supplier invoice draft.
///
/// This is the record digitization writes into: header fields reconciled
/// against master data, lines copied from the AI extraction, and a status
/// flag plus message log so users can see what happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    /// Journal entry type.
    pub move_type: MoveType,

    /// Record state.
    pub state: RecordState,

    /// Matched partner record id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<u32>,

    /// Display name of the matched partner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,

    /// Free-form reference; holds the raw extracted invoice number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Normalized document number (`NNNNN-NNNNNNNN`) when recognized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,

    /// Invoice issue date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,

    /// Payment due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Matched currency record id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<u32>,

    /// ISO currency code.
    pub currency_code: String,

    /// Invoice lines.
    pub lines: Vec<InvoiceLine>,

    /// Totals across lines.
    pub totals: InvoiceTotals,

    /// Digitization status flag.
    pub extract_status: ExtractStatus,

    /// Error text when `extract_status` is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_error: Option<String>,

    /// Name of the uploaded source file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,

    /// User-visible messages posted during processing, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl InvoiceDraft {
    /// Create an empty supplier invoice draft.
    pub fn new(default_currency: &str) -> Self {
        Self {
            move_type: MoveType::InInvoice,
            state: RecordState::Draft,
            partner_id: None,
            partner_name: None,
            reference: None,
            document_number: None,
            invoice_date: None,
            due_date: None,
            currency_id: None,
            currency_code: default_currency.to_string(),
            lines: Vec::new(),
            totals: InvoiceTotals::default(),
            extract_status: ExtractStatus::NotRequested,
            extract_error: None,
            source_filename: None,
            messages: Vec::new(),
        }
    }

    /// Append a user-visible message to the draft's log.
    pub fn post_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Recompute line amounts and draft totals from quantity, unit price,
    /// and tax rate.
    pub fn recompute_totals(&mut self) {
        let mut totals = InvoiceTotals::default();

        for line in &mut self.lines {
            line.total_net = (line.quantity * line.unit_price).round_dp(2);
            line.tax_amount = match line.tax_rate {
                Some(rate) => (line.total_net * rate / Decimal::ONE_HUNDRED).round_dp(2),
                None => Decimal::ZERO,
            };
            line.total_gross = line.total_net + line.tax_amount;

            totals.net += line.total_net;
            totals.tax += line.tax_amount;
            totals.gross += line.total_gross;
        }

        self.totals = totals;
    }
}
