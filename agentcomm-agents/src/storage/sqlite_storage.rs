use super::CommunicationStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row};
use shared_types::{AgentCommunication, CalendarEvent, ExtractionResult, ProcessingStatus};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SqliteCommunicationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCommunicationStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Database connection lock poisoned"))
    }
}

const SELECT_COLUMNS: &str = "SELECT id, delegation_token_id, from_agent, to_agent, email_content,
        parsed_info, calendar_event, user_consent_given, processing_status, created_at, updated_at
     FROM agent_communications";

/// Columns as stored, before the JSON fields are decoded
struct CommunicationRow {
    id: i64,
    delegation_token_id: String,
    from_agent: String,
    to_agent: String,
    email_content: String,
    parsed_info: String,
    calendar_event: Option<String>,
    user_consent_given: Option<bool>,
    processing_status: String,
    created_at: i64,
    updated_at: i64,
}

impl CommunicationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            delegation_token_id: row.get(1)?,
            from_agent: row.get(2)?,
            to_agent: row.get(3)?,
            email_content: row.get(4)?,
            parsed_info: row.get(5)?,
            calendar_event: row.get(6)?,
            user_consent_given: row.get(7)?,
            processing_status: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_communication(self) -> Result<AgentCommunication> {
        let parsed_info = serde_json::from_str::<ExtractionResult>(&self.parsed_info).with_context(|| {
            format!("Invalid parsed_info for token {}", self.delegation_token_id)
        })?;
        let calendar_event = self
            .calendar_event
            .as_deref()
            .map(serde_json::from_str::<CalendarEvent>)
            .transpose()
            .with_context(|| {
                format!("Invalid calendar_event for token {}", self.delegation_token_id)
            })?;
        let processing_status = ProcessingStatus::parse(&self.processing_status)
            .ok_or_else(|| {
                anyhow::anyhow!("Unknown processing status: {}", self.processing_status)
            })?;

        Ok(AgentCommunication {
            id: Some(self.id),
            delegation_token_id: self.delegation_token_id,
            from_agent: self.from_agent,
            to_agent: self.to_agent,
            email_content: self.email_content,
            parsed_info,
            calendar_event,
            user_consent_given: self.user_consent_given,
            processing_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl CommunicationStore for SqliteCommunicationStore {
    async fn create_communication(&self, communication: AgentCommunication) -> Result<i64> {
        let conn = self.lock()?;
        let parsed_info = serde_json::to_string(&communication.parsed_info)?;
        let calendar_event = communication
            .calendar_event
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            "INSERT INTO agent_communications
             (delegation_token_id, from_agent, to_agent, email_content, parsed_info,
              calendar_event, user_consent_given, processing_status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                communication.delegation_token_id,
                communication.from_agent,
                communication.to_agent,
                communication.email_content,
                parsed_info,
                calendar_event,
                communication.user_consent_given,
                communication.processing_status.as_str(),
                communication.created_at,
                communication.updated_at,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn record_consent(
        &self,
        delegation_token_id: &str,
        consent_given: bool,
        status: ProcessingStatus,
    ) -> Result<()> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        let updated = conn.execute(
            "UPDATE agent_communications
             SET user_consent_given = ?, processing_status = ?, updated_at = ?
             WHERE delegation_token_id = ?",
            rusqlite::params![consent_given, status.as_str(), now, delegation_token_id],
        )?;

        if updated == 0 {
            return Err(anyhow::anyhow!(
                "No communication found for token {}",
                delegation_token_id
            ));
        }

        Ok(())
    }

    async fn attach_calendar_event(
        &self,
        delegation_token_id: &str,
        event: &CalendarEvent,
    ) -> Result<()> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();
        let event_json = serde_json::to_string(event)?;

        let updated = conn.execute(
            "UPDATE agent_communications
             SET calendar_event = ?, processing_status = ?, updated_at = ?
             WHERE delegation_token_id = ?",
            rusqlite::params![
                event_json,
                ProcessingStatus::Completed.as_str(),
                now,
                delegation_token_id
            ],
        )?;

        if updated == 0 {
            return Err(anyhow::anyhow!(
                "No communication found for token {}",
                delegation_token_id
            ));
        }

        Ok(())
    }

    async fn get_communication(
        &self,
        delegation_token_id: &str,
    ) -> Result<Option<AgentCommunication>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                &format!("{} WHERE delegation_token_id = ?", SELECT_COLUMNS),
                [delegation_token_id],
                CommunicationRow::from_row,
            )
            .optional()?;

        row.map(CommunicationRow::into_communication).transpose()
    }

    async fn recent_communications(&self, limit: usize) -> Result<Vec<AgentCommunication>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT ?",
            SELECT_COLUMNS
        ))?;

        let rows = stmt
            .query_map([limit as i64], CommunicationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(CommunicationRow::into_communication)
            .collect()
    }
}
