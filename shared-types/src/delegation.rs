use crate::extraction::{ExtractionResult, Priority};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle of a delegation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum DelegationStatus {
    Pending,
    Approved,
    Denied,
    Used,
}

impl DelegationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelegationStatus::Pending => "pending",
            DelegationStatus::Approved => "approved",
            DelegationStatus::Denied => "denied",
            DelegationStatus::Used => "used",
        }
    }
}

impl std::fmt::Display for DelegationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hand-off record from the email agent to the calendar agent.
///
/// This is plain data: it is not signed and carries no secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DelegationToken {
    pub id: String,
    pub agent_from: String,
    pub agent_to: String,
    pub scope: Vec<String>,
    pub email_data: ExtractionResult,
    pub issued_at: i64,  // Unix timestamp
    pub expires_at: i64, // Unix timestamp
    pub status: DelegationStatus,
}

/// Calendar event drafted by the calendar agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub start_time: String,
    pub location: String,
    pub attendees: Vec<String>,
    pub priority: Priority,
}

/// Processing state of a logged agent communication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ProcessingStatus::Pending),
            "processing" => Some(ProcessingStatus::Processing),
            "completed" => Some(ProcessingStatus::Completed),
            "failed" => Some(ProcessingStatus::Failed),
            _ => None,
        }
    }
}

/// One logged delegation between agents
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AgentCommunication {
    pub id: Option<i64>,
    pub delegation_token_id: String,
    pub from_agent: String,
    pub to_agent: String,
    pub email_content: String,
    pub parsed_info: ExtractionResult,
    pub calendar_event: Option<CalendarEvent>,
    pub user_consent_given: Option<bool>,
    pub processing_status: ProcessingStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Response containing recent communications
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct CommunicationHistoryResponse {
    pub communications: Vec<AgentCommunication>,
}
