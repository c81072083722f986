//! Core library for AI invoice digitization.
//!
//! This crate provides:
//! - Document conversion (PDF first page or image to a vision payload)
//! - Prompt template selection driven by company configuration
//! - Parsing of AI responses into extracted invoice data
//! - Reconciliation against accounting master data and invoice field writes

pub mod apply;
pub mod digitize;
pub mod document;
pub mod error;
pub mod masterdata;
pub mod models;
pub mod prompt;

pub use error::{InvoxError, Result};
pub use models::config::InvoxConfig;
pub use models::extracted::ExtractedDocument;
pub use models::invoice::{ExtractStatus, InvoiceDraft, InvoiceLine, InvoiceTotals};
pub use document::{convert_for_vision, DocumentFile, DocumentKind, VisionImage};
pub use document::render::{MockPageRenderer, PageRenderer, PdfiumRenderer};
pub use prompt::{DocumentType, PromptLibrary, PromptTemplate};
pub use masterdata::{Currency, JsonMasterData, MasterData, Partner, Tax, TaxUse};
pub use apply::{apply_extraction, ApplyReport};
pub use digitize::{DigitizeOutcome, Digitizer};

/// Re-export provider types.
pub use invox_providers::{
    create_provider, MockProvider, Provider, ProviderError, ProviderSettings, VisionProvider,
    VisionRequest,
};
