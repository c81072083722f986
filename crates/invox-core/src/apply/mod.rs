//! Reconciliation of extracted data against the invoice draft.
//!
//! Matching is best-effort throughout: a miss leaves the draft field
//! unset and records a warning instead of failing the document.

pub mod patterns;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use crate::masterdata::MasterData;
use crate::models::config::ExtractionConfig;
use crate::models::extracted::{ExtractedDocument, ExtractedLineItem};
use crate::models::invoice::{InvoiceDraft, InvoiceLine};

/// What a reconciliation pass changed, plus anything worth surfacing.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    /// A partner was matched and written.
    pub partner_matched: bool,

    /// A currency was matched and written.
    pub currency_matched: bool,

    /// Number of lines written to the draft.
    pub lines_written: usize,

    /// Non-fatal issues encountered while mapping fields.
    pub warnings: Vec<String>,
}

impl ApplyReport {
    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Write extracted data onto the draft.
///
/// Header fields are reconciled against master data first, then any
/// existing lines are replaced by the extracted ones (so re-processing a
/// document never duplicates lines) and totals are recomputed.
pub fn apply_extraction(
    draft: &mut InvoiceDraft,
    extracted: &ExtractedDocument,
    masterdata: &dyn MasterData,
    config: &ExtractionConfig,
    company_id: u32,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    apply_supplier(draft, extracted, masterdata, &mut report);
    apply_header(draft, extracted, masterdata, config, &mut report);
    apply_lines(draft, extracted, masterdata, company_id, &mut report);
    draft.recompute_totals();

    report
}

fn apply_supplier(
    draft: &mut InvoiceDraft,
    extracted: &ExtractedDocument,
    masterdata: &dyn MasterData,
    report: &mut ApplyReport,
) {
    let Some(supplier) = &extracted.supplier else {
        return;
    };

    // VAT is the stronger key; the name search only runs when no VAT was
    // extracted at all.
    let partner = if let Some(vat) = supplier.vat.as_deref().filter(|v| !v.trim().is_empty()) {
        masterdata.partner_by_vat(vat.trim())
    } else if let Some(name) = supplier.name.as_deref().filter(|n| !n.trim().is_empty()) {
        masterdata.partner_by_name(name.trim())
    } else {
        return;
    };

    match partner {
        Some(partner) => {
            draft.partner_id = Some(partner.id);
            draft.partner_name = Some(partner.name);
            report.partner_matched = true;
        }
        None => {
            let key = supplier
                .vat
                .as_deref()
                .or(supplier.name.as_deref())
                .unwrap_or_default();
            report.warn(format!("no partner matched supplier '{key}'"));
        }
    }
}

fn apply_header(
    draft: &mut InvoiceDraft,
    extracted: &ExtractedDocument,
    masterdata: &dyn MasterData,
    config: &ExtractionConfig,
    report: &mut ApplyReport,
) {
    let Some(inv) = &extracted.invoice_data else {
        return;
    };

    if let Some(raw) = inv.issue_date() {
        match parse_date(raw) {
            Some(date) => draft.invoice_date = Some(date),
            None => report.warn(format!("unparseable invoice date '{raw}'")),
        }
    }

    if let Some(raw) = inv.due_date.as_deref() {
        match parse_date(raw) {
            Some(date) => draft.due_date = Some(date),
            None => report.warn(format!("unparseable due date '{raw}'")),
        }
    }

    if let Some(raw_number) = inv
        .invoice_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        // The raw value always lands in the reference as a safe fallback.
        draft.reference = Some(raw_number.to_string());

        if config.normalize_document_number {
            match patterns::DOCUMENT_NUMBER.captures(raw_number) {
                Some(caps) => {
                    let clean = caps[1].to_string();
                    draft.document_number = Some(clean.clone());
                    draft.reference = Some(clean);
                }
                None => report.warn(format!(
                    "no formal document number pattern in '{raw_number}'"
                )),
            }
        }
    }

    if let Some(code) = inv
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        match masterdata.currency_by_code(code) {
            Some(currency) => {
                draft.currency_id = Some(currency.id);
                draft.currency_code = currency.code;
                report.currency_matched = true;
            }
            None => report.warn(format!("unknown currency '{code}'")),
        }
    }
}

fn apply_lines(
    draft: &mut InvoiceDraft,
    extracted: &ExtractedDocument,
    masterdata: &dyn MasterData,
    company_id: u32,
    report: &mut ApplyReport,
) {
    // Replace any previous lines so re-processing cannot duplicate them.
    draft.lines.clear();

    for item in &extracted.line_items {
        let line = build_line(item, masterdata, company_id, report);
        draft.lines.push(line);
    }

    report.lines_written = draft.lines.len();
}

fn build_line(
    item: &ExtractedLineItem,
    masterdata: &dyn MasterData,
    company_id: u32,
    report: &mut ApplyReport,
) -> InvoiceLine {
    let description = item
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "Unnamed item".to_string());

    let mut line = InvoiceLine::new(
        description,
        item.quantity.unwrap_or(Decimal::ONE),
        item.unit_price.unwrap_or(Decimal::ZERO),
    );

    if let Some(rate) = item.tax_rate {
        match masterdata.purchase_tax_by_rate(rate, company_id) {
            Some(tax) => {
                line.tax_id = Some(tax.id);
                line.tax_rate = Some(tax.amount);
            }
            None => report.warn(format!(
                "no purchase tax with rate {rate}% for '{}'",
                line.description
            )),
        }
    }

    line
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masterdata::{Currency, JsonMasterData, Partner, Tax, TaxUse};
    use crate::models::extracted::ExtractedDocument;
    use pretty_assertions::assert_eq;

    fn directory() -> JsonMasterData {
        JsonMasterData {
            partners: vec![Partner {
                id: 7,
                name: "ACME Corporation".to_string(),
                vat: Some("30-12345678-9".to_string()),
            }],
            currencies: vec![Currency {
                id: 2,
                code: "EUR".to_string(),
            }],
            taxes: vec![Tax {
                id: 21,
                name: "VAT 21%".to_string(),
                amount: Decimal::from(21),
                tax_use: TaxUse::Purchase,
                company_id: Some(1),
            }],
        }
    }

    fn extracted(raw: &str) -> ExtractedDocument {
        ExtractedDocument::from_response(raw).unwrap()
    }

    fn apply(draft: &mut InvoiceDraft, raw: &str) -> ApplyReport {
        apply_extraction(
            draft,
            &extracted(raw),
            &directory(),
            &ExtractionConfig::default(),
            1,
        )
    }

    #[test]
    fn full_extraction_writes_header_and_lines() {
        let mut draft = InvoiceDraft::new("USD");
        let report = apply(
            &mut draft,
            r#"{
                "supplier": {"name": "ACME Corporation", "vat": "30-12345678-9"},
                "invoice_data": {
                    "invoice_number": "FACTURA A 0001-00000042",
                    "date": "2024-03-15",
                    "due_date": "2024-04-15",
                    "currency": "EUR"
                },
                "line_items": [
                    {"description": "Widgets", "quantity": 2, "unit_price": 100.0, "tax_rate": 21},
                    {"description": "Shipping", "quantity": 1, "unit_price": 50.0}
                ]
            }"#,
        );

        assert!(report.partner_matched);
        assert!(report.currency_matched);
        assert_eq!(report.lines_written, 2);
        assert!(report.warnings.is_empty());

        assert_eq!(draft.partner_id, Some(7));
        assert_eq!(draft.partner_name.as_deref(), Some("ACME Corporation"));
        assert_eq!(draft.document_number.as_deref(), Some("0001-00000042"));
        assert_eq!(draft.reference.as_deref(), Some("0001-00000042"));
        assert_eq!(
            draft.invoice_date,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2024, 4, 15));
        assert_eq!(draft.currency_id, Some(2));
        assert_eq!(draft.currency_code, "EUR");

        assert_eq!(draft.lines[0].tax_id, Some(21));
        assert_eq!(draft.lines[0].total_net, Decimal::from(200));
        assert_eq!(draft.lines[0].tax_amount, Decimal::from(42));
        assert_eq!(draft.lines[1].tax_id, None);
        assert_eq!(draft.totals.net, Decimal::from(250));
        assert_eq!(draft.totals.gross, Decimal::from(292));
    }

    #[test]
    fn partner_matching_prefers_vat_over_name() {
        let mut draft = InvoiceDraft::new("USD");
        // The name is wrong but VAT matches; VAT wins.
        apply(
            &mut draft,
            r#"{"supplier": {"name": "Some Other Name", "vat": "30-12345678-9"}}"#,
        );
        assert_eq!(draft.partner_id, Some(7));
    }

    #[test]
    fn unknown_vat_does_not_fall_back_to_name() {
        let mut draft = InvoiceDraft::new("USD");
        let report = apply(
            &mut draft,
            r#"{"supplier": {"name": "ACME Corporation", "vat": "99-99999999-9"}}"#,
        );
        assert_eq!(draft.partner_id, None);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("no partner matched"));
    }

    #[test]
    fn name_only_supplier_uses_substring_match() {
        let mut draft = InvoiceDraft::new("USD");
        apply(&mut draft, r#"{"supplier": {"name": "acme"}}"#);
        assert_eq!(draft.partner_id, Some(7));
    }

    #[test]
    fn raw_invoice_number_without_pattern_stays_in_reference() {
        let mut draft = InvoiceDraft::new("USD");
        let report = apply(
            &mut draft,
            r#"{"invoice_data": {"invoice_number": "INV/2024/071"}}"#,
        );

        assert_eq!(draft.reference.as_deref(), Some("INV/2024/071"));
        assert_eq!(draft.document_number, None);
        assert!(report.warnings[0].contains("document number"));
    }

    #[test]
    fn normalization_can_be_disabled() {
        let mut draft = InvoiceDraft::new("USD");
        let config = ExtractionConfig {
            normalize_document_number: false,
            ..ExtractionConfig::default()
        };
        let report = apply_extraction(
            &mut draft,
            &extracted(r#"{"invoice_data": {"invoice_number": "A 0001-00000042"}}"#),
            &directory(),
            &config,
            1,
        );

        assert_eq!(draft.reference.as_deref(), Some("A 0001-00000042"));
        assert_eq!(draft.document_number, None);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn bad_dates_warn_and_leave_fields_unset() {
        let mut draft = InvoiceDraft::new("USD");
        let report = apply(
            &mut draft,
            r#"{"invoice_data": {"date": "15/03/2024", "due_date": "next month"}}"#,
        );

        assert_eq!(draft.invoice_date, None);
        assert_eq!(draft.due_date, None);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn unknown_currency_warns_and_keeps_default() {
        let mut draft = InvoiceDraft::new("USD");
        let report = apply(&mut draft, r#"{"invoice_data": {"currency": "ARS"}}"#);

        assert_eq!(draft.currency_code, "USD");
        assert_eq!(draft.currency_id, None);
        assert!(report.warnings[0].contains("unknown currency"));
    }

    #[test]
    fn line_defaults_fill_missing_values() {
        let mut draft = InvoiceDraft::new("USD");
        apply(&mut draft, r#"{"line_items": [{}]}"#);

        assert_eq!(draft.lines[0].description, "Unnamed item");
        assert_eq!(draft.lines[0].quantity, Decimal::ONE);
        assert_eq!(draft.lines[0].unit_price, Decimal::ZERO);
    }

    #[test]
    fn unmatched_tax_rate_leaves_line_untaxed() {
        let mut draft = InvoiceDraft::new("USD");
        let report = apply(
            &mut draft,
            r#"{"line_items": [{"description": "X", "quantity": 1, "unit_price": 100, "tax_rate": 27}]}"#,
        );

        assert_eq!(draft.lines[0].tax_id, None);
        assert_eq!(draft.lines[0].tax_rate, None);
        assert_eq!(draft.totals.gross, Decimal::from(100));
        assert!(report.warnings[0].contains("no purchase tax"));
    }

    #[test]
    fn reprocessing_replaces_existing_lines() {
        let mut draft = InvoiceDraft::new("USD");
        apply(
            &mut draft,
            r#"{"line_items": [{"description": "Old A"}, {"description": "Old B"}]}"#,
        );
        assert_eq!(draft.lines.len(), 2);

        apply(
            &mut draft,
            r#"{"line_items": [{"description": "New", "quantity": 1, "unit_price": 10}]}"#,
        );
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].description, "New");
        assert_eq!(draft.totals.net, Decimal::from(10));
    }

    #[test]
    fn empty_extraction_changes_nothing() {
        let mut draft = InvoiceDraft::new("USD");
        let report = apply(&mut draft, "{}");

        assert_eq!(draft.partner_id, None);
        assert_eq!(draft.invoice_date, None);
        assert!(draft.lines.is_empty());
        assert_eq!(report.lines_written, 0);
        assert!(report.warnings.is_empty());
    }
}
