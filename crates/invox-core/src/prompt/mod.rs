//! Prompt templates and selection.
//!
//! Which instruction text goes to the vision model depends on company
//! configuration: an explicitly pinned template wins, then a lookup by
//! `{document_type}_{provider}` code, then a generic fallback.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use invox_providers::Provider;

use crate::error::{PromptError, Result};

/// Generic instruction used when no template matches.
pub const GENERIC_FALLBACK: &str = "Analyze this document and extract the key data \
(issuer, date, total, line items) as a JSON object.";

/// JSON shape the default invoice templates ask for. Kept in one place so
/// it always matches what the response parser expects.
const INVOICE_JSON_SHAPE: &str = r#"{"supplier": {"name": string, "vat": string}, "invoice_data": {"invoice_number": string, "date": "YYYY-MM-DD", "due_date": "YYYY-MM-DD", "currency": "ISO 4217 code"}, "line_items": [{"description": string, "quantity": number, "unit_price": number, "tax_rate": number}]}"#;

/// Kind of document being digitized; selects which prompt code to look up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    Invoice,
    Expense,
    Other,
}

impl DocumentType {
    /// Short identifier used in prompt template codes.
    pub fn code(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Expense => "expense",
            DocumentType::Other => "other",
        }
    }
}

/// A stored instruction template for the vision models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Human-readable name.
    pub name: String,

    /// Unique lookup code, e.g. `invoice_google`.
    pub code: String,

    /// Provider the template is written for.
    pub provider: Provider,

    /// Document type the template extracts.
    #[serde(default)]
    pub document_type: DocumentType,

    /// Inactive templates are kept but never selected.
    #[serde(default = "default_active")]
    pub active: bool,

    /// The instruction text itself.
    pub template: String,
}

fn default_active() -> bool {
    true
}

/// Library of prompt templates with unique codes.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: Vec<PromptTemplate>,
}

impl PromptLibrary {
    /// Built-in templates for invoice extraction on both providers.
    pub fn builtin() -> Self {
        let google = PromptTemplate {
            name: "Invoice extraction (Gemini)".to_string(),
            code: "invoice_google".to_string(),
            provider: Provider::Google,
            document_type: DocumentType::Invoice,
            active: true,
            template: format!(
                "You are digitizing a supplier invoice. Extract the data from the \
                 attached document image and answer with a single JSON object shaped \
                 exactly like this: {INVOICE_JSON_SHAPE}. Dates must be ISO \
                 (YYYY-MM-DD) and tax_rate is the VAT percentage as a number. Omit \
                 any field you cannot read from the document."
            ),
        };

        let openai = PromptTemplate {
            name: "Invoice extraction (OpenAI)".to_string(),
            code: "invoice_openai".to_string(),
            provider: Provider::OpenAi,
            document_type: DocumentType::Invoice,
            active: true,
            template: format!(
                "Extract the supplier invoice data from this image. Respond only with \
                 a JSON object of this exact shape: {INVOICE_JSON_SHAPE}. Use ISO \
                 dates (YYYY-MM-DD), give tax_rate as the VAT percentage, and leave \
                 out fields that are not visible on the document."
            ),
        };

        Self {
            templates: vec![google, openai],
        }
    }

    /// Built-ins plus templates from a JSON file.
    ///
    /// The file holds a JSON array of templates; a code colliding with an
    /// existing one is an error, mirroring the unique-code constraint of
    /// the template table this replaces.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let templates: Vec<PromptTemplate> = serde_json::from_str(&content)?;
        Self::builtin().with_templates(templates)
    }

    /// Add templates, enforcing code uniqueness.
    pub fn with_templates(mut self, templates: Vec<PromptTemplate>) -> Result<Self> {
        for template in templates {
            if self.by_code(&template.code).is_some() {
                return Err(PromptError::DuplicateCode(template.code).into());
            }
            self.templates.push(template);
        }
        Ok(self)
    }

    /// Find a template by code.
    pub fn by_code(&self, code: &str) -> Option<&PromptTemplate> {
        self.templates.iter().find(|t| t.code == code)
    }

    /// All templates, in insertion order.
    pub fn templates(&self) -> &[PromptTemplate] {
        &self.templates
    }

    /// Select the instruction text for a digitization run.
    ///
    /// Priority: the company's pinned code, then the
    /// `{document_type}_{provider}` code, then [`GENERIC_FALLBACK`].
    pub fn select(
        &self,
        pinned: Option<&str>,
        document_type: DocumentType,
        provider: Provider,
    ) -> &str {
        if let Some(code) = pinned {
            match self.by_code(code).filter(|t| t.active) {
                Some(template) => return &template.template,
                None => warn!(
                    code,
                    "Pinned prompt code not found or inactive; falling back to code lookup"
                ),
            }
        }

        let code = format!("{}_{}", document_type.code(), provider.code());
        if let Some(template) = self.by_code(&code).filter(|t| t.active) {
            return &template.template;
        }

        GENERIC_FALLBACK
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}
