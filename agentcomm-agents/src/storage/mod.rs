pub mod migrations;
pub mod sqlite_storage;

pub use migrations::run_migrations;
pub use sqlite_storage::SqliteCommunicationStore;

use anyhow::Result;
use async_trait::async_trait;
use shared_types::{AgentCommunication, CalendarEvent, ProcessingStatus};

/// Log of agent-to-agent delegations, keyed by delegation token id
#[async_trait]
pub trait CommunicationStore: Send + Sync {
    async fn create_communication(&self, communication: AgentCommunication) -> Result<i64>;

    async fn record_consent(
        &self,
        delegation_token_id: &str,
        consent_given: bool,
        status: ProcessingStatus,
    ) -> Result<()>;

    async fn attach_calendar_event(
        &self,
        delegation_token_id: &str,
        event: &CalendarEvent,
    ) -> Result<()>;

    async fn get_communication(&self, delegation_token_id: &str)
        -> Result<Option<AgentCommunication>>;

    /// Newest first
    async fn recent_communications(&self, limit: usize) -> Result<Vec<AgentCommunication>>;
}
