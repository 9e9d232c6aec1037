use crate::config::DelegationConfig;
use crate::delegation::token::issue_token;
use crate::storage::CommunicationStore;
use anyhow::{Context, Result};
use extractors::EmailInfoExtractor;
use shared_types::{
    AgentCommunication, DelegationToken, ExtractionResult, Extractor, InputRecord,
    ProcessingStatus,
};
use std::sync::Arc;
use tracing::info;

/// Extracts event details from a message and hands them off through a
/// delegation token
pub struct EmailAgent {
    extractor: EmailInfoExtractor,
    store: Arc<dyn CommunicationStore>,
    settings: DelegationConfig,
}

impl EmailAgent {
    pub fn new(
        extractor: EmailInfoExtractor,
        store: Arc<dyn CommunicationStore>,
        settings: DelegationConfig,
    ) -> Self {
        Self {
            extractor,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &DelegationConfig {
        &self.settings
    }

    /// Extract, issue a pending token and log the hand-off
    pub async fn process(&self, input: &InputRecord) -> Result<(ExtractionResult, DelegationToken)> {
        let extraction = self.extractor.extract(input);
        info!(
            path = ?extraction.path,
            priority = extraction.priority.as_str(),
            "Message analysed"
        );

        let now = chrono::Utc::now().timestamp();
        let token = issue_token(
            &self.settings.from_agent,
            &self.settings.to_agent,
            &self.settings.scopes,
            extraction.clone(),
            self.settings.token_ttl_hours,
            now,
        );

        self.store
            .create_communication(AgentCommunication {
                id: None,
                delegation_token_id: token.id.clone(),
                from_agent: token.agent_from.clone(),
                to_agent: token.agent_to.clone(),
                email_content: input.content.clone(),
                parsed_info: extraction.clone(),
                calendar_event: None,
                user_consent_given: None,
                processing_status: ProcessingStatus::Processing,
                created_at: now,
                updated_at: now,
            })
            .await
            .context("Failed to store delegation token")?;

        info!(token_id = %token.id, "Delegation token issued and stored");
        Ok((extraction, token))
    }
}
