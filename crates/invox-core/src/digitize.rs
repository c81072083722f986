//! The digitization orchestrator.
//!
//! Runs the end-to-end sequence for one document: convert it to an image,
//! select a prompt, call the configured provider, parse the JSON answer,
//! and reconcile it onto the invoice draft. Failures mark the draft with
//! an error status instead of propagating, so a bulk caller can keep
//! going with the next document.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, info};

use invox_providers::{
    create_provider, ProviderError, ProviderSettings, VisionProvider, VisionRequest,
};

use crate::apply::{apply_extraction, ApplyReport};
use crate::document::render::{PageRenderer, PdfiumRenderer};
use crate::document::{convert_for_vision, DocumentFile};
use crate::error::{InvoxError, Result};
use crate::masterdata::MasterData;
use crate::models::config::InvoxConfig;
use crate::models::extracted::ExtractedDocument;
use crate::models::invoice::{ExtractStatus, InvoiceDraft};
use crate::prompt::PromptLibrary;

/// Result of a digitization run for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigitizeOutcome {
    /// Extraction ran and fields were written; warnings may remain.
    Completed { warnings: Vec<String> },

    /// The engine is disabled in configuration; the draft was left untouched.
    Skipped,

    /// Extraction failed; the draft carries the error status and message.
    Failed { error: String },
}

impl DigitizeOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Drives the extraction sequence for single documents.
pub struct Digitizer {
    config: InvoxConfig,
    prompts: PromptLibrary,
    provider: Box<dyn VisionProvider>,
    renderer: Box<dyn PageRenderer>,
    masterdata: Box<dyn MasterData>,
}

/// Stand-in provider for a disabled configuration. Never reached: the
/// digitizer skips before any provider call when the engine is off.
struct DisabledProvider;

#[async_trait]
impl VisionProvider for DisabledProvider {
    async fn extract(&self, _request: &VisionRequest) -> std::result::Result<String, ProviderError> {
        Err(ProviderError::MissingApiKey)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

impl Digitizer {
    /// Assemble a digitizer from parts; tests inject mocks here.
    pub fn new(
        config: InvoxConfig,
        prompts: PromptLibrary,
        provider: Box<dyn VisionProvider>,
        renderer: Box<dyn PageRenderer>,
        masterdata: Box<dyn MasterData>,
    ) -> Self {
        Self {
            config,
            prompts,
            provider,
            renderer,
            masterdata,
        }
    }

    /// Build the production digitizer for a configuration.
    ///
    /// When the engine is enabled this fails fast on a missing API key so
    /// the problem surfaces before any document is touched.
    pub fn from_config(
        config: InvoxConfig,
        prompts: PromptLibrary,
        masterdata: Box<dyn MasterData>,
    ) -> Result<Self> {
        let provider: Box<dyn VisionProvider> = if config.company.enabled {
            let api_key = config.company.resolved_api_key().ok_or_else(|| {
                InvoxError::Config("missing API key in company configuration".to_string())
            })?;

            let mut settings =
                ProviderSettings::new(api_key).with_timeout(config.http.timeout_secs);
            if let Some(url) = config.http.base_url_for(config.company.provider) {
                settings = settings.with_base_url(url);
            }

            create_provider(config.company.provider, settings)?
        } else {
            Box::new(DisabledProvider)
        };

        Ok(Self::new(
            config,
            prompts,
            provider,
            Box::new(PdfiumRenderer::new()),
            masterdata,
        ))
    }

    /// The active configuration.
    pub fn config(&self) -> &InvoxConfig {
        &self.config
    }

    /// Run the extraction sequence for one document, updating the draft.
    pub async fn digitize(
        &self,
        draft: &mut InvoiceDraft,
        document: &DocumentFile,
    ) -> DigitizeOutcome {
        if !self.config.company.enabled {
            debug!(file = %document.filename, "Digitization disabled; skipping");
            return DigitizeOutcome::Skipped;
        }

        let provider = self.config.company.provider;
        info!(file = %document.filename, %provider, "Starting AI digitization");
        let start = Instant::now();

        match self.run(draft, document).await {
            Ok(report) => {
                draft.extract_status = ExtractStatus::WaitingValidation;
                draft.extract_error = None;
                draft.post_message(format!("AI digitization completed using {provider}."));

                info!(
                    file = %document.filename,
                    elapsed_ms = %start.elapsed().as_millis(),
                    lines = report.lines_written,
                    warnings = report.warnings.len(),
                    "Digitization complete"
                );
                DigitizeOutcome::Completed {
                    warnings: report.warnings,
                }
            }
            Err(e) => {
                let message = format!("AI digitization failed: {e}");
                error!(file = %document.filename, "{message}");

                draft.extract_status = ExtractStatus::Error;
                draft.extract_error = Some(message.clone());
                draft.post_message(message.clone());

                DigitizeOutcome::Failed { error: message }
            }
        }
    }

    async fn run(&self, draft: &mut InvoiceDraft, document: &DocumentFile) -> Result<ApplyReport> {
        let image = convert_for_vision(document, &self.config.render, self.renderer.as_ref())?;

        let prompt = self.prompts.select(
            self.config.company.prompt_code.as_deref(),
            self.config.company.document_type,
            self.config.company.provider,
        );

        let request = VisionRequest {
            model: self.config.company.model.clone(),
            prompt: prompt.to_string(),
            image_base64: image.to_base64(),
            image_mime: image.mime.to_string(),
        };

        let response = self.provider.extract(&request).await?;
        debug!(response_len = response.len(), "Raw extraction response: {response}");

        let extracted = ExtractedDocument::from_response(&response)?;

        Ok(apply_extraction(
            draft,
            &extracted,
            self.masterdata.as_ref(),
            &self.config.extraction,
            self.config.company.company_id,
        ))
    }
}
