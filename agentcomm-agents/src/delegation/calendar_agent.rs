use crate::delegation::consent::ConsentProvider;
use crate::delegation::token::{ensure_not_expired, transition, TokenError};
use crate::storage::CommunicationStore;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use shared_types::{
    AgentCommunication, CalendarEvent, DelegationStatus, DelegationToken, ExtractionResult,
    ProcessingStatus,
};
use std::sync::Arc;
use tracing::{error, info};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Asks for consent and drafts calendar events from delegated extractions
pub struct CalendarAgent {
    store: Arc<dyn CommunicationStore>,
    consent: Arc<dyn ConsentProvider>,
}

impl CalendarAgent {
    pub fn new(store: Arc<dyn CommunicationStore>, consent: Arc<dyn ConsentProvider>) -> Self {
        Self { store, consent }
    }

    /// Ask the user whether the token may be used and record the answer.
    ///
    /// A failure to record the answer is logged; the decision still stands.
    pub async fn request_access(&self, token: &mut DelegationToken) -> Result<bool> {
        let message = consent_message(token);
        let approved = self
            .consent
            .request_consent(&message)
            .await
            .context("Failed to obtain user consent")?;

        let next = if approved {
            DelegationStatus::Approved
        } else {
            DelegationStatus::Denied
        };
        transition(token, next)?;

        let status = if approved {
            ProcessingStatus::Completed
        } else {
            ProcessingStatus::Failed
        };
        match self.store.record_consent(&token.id, approved, status).await {
            Ok(()) => info!(
                token_id = %token.id,
                "User consent {} and recorded",
                if approved { "granted" } else { "denied" }
            ),
            Err(err) => error!(token_id = %token.id, "Failed to update consent: {:#}", err),
        }

        Ok(approved)
    }

    /// Draft the event for an approved, unexpired token and mark the token used
    pub async fn create_event(&self, token: &mut DelegationToken) -> Result<CalendarEvent> {
        let now = chrono::Utc::now();
        ensure_not_expired(token, now.timestamp())?;

        if token.status != DelegationStatus::Approved {
            return Err(TokenError::InvalidTransition {
                token_id: token.id.clone(),
                from: token.status,
                to: DelegationStatus::Used,
            }
            .into());
        }

        let event = draft_event(&token.email_data, now.date_naive());

        self.store
            .attach_calendar_event(&token.id, &event)
            .await
            .context("Failed to store calendar event")?;
        transition(token, DelegationStatus::Used)?;

        info!(token_id = %token.id, event_id = %event.id, "Calendar event created and stored");
        Ok(event)
    }

    /// Newest communications first; a storage failure yields an empty list
    pub async fn history(&self, limit: usize) -> Vec<AgentCommunication> {
        match self.store.recent_communications(limit).await {
            Ok(communications) => communications,
            Err(err) => {
                error!("Failed to fetch communication history: {:#}", err);
                Vec::new()
            }
        }
    }
}

fn consent_message(token: &DelegationToken) -> String {
    let data = &token.email_data;
    let title = data
        .event_title
        .as_deref()
        .or(data.subject.as_deref())
        .unwrap_or_default();

    format!(
        "{} requests permission:\n\n\
         Create calendar event: \"{}\"\n\
         Date: {}\n\
         Time: {}\n\
         Location: {}\n\
         Scopes: {}\n\n\
         Do you grant permission to create this calendar event?",
        token.agent_to,
        title,
        data.event_date
            .as_ref()
            .map(|d| d.as_str())
            .unwrap_or("To be scheduled"),
        data.event_time
            .as_ref()
            .map(|t| t.as_str())
            .unwrap_or("To be determined"),
        data.location.as_deref().unwrap_or("Virtual/TBD"),
        token.scope.join(", "),
    )
}

/// Fill a calendar event from an extraction, defaulting whatever is missing
pub fn draft_event(data: &ExtractionResult, today: NaiveDate) -> CalendarEvent {
    CalendarEvent {
        id: format!("event_{}", uuid::Uuid::new_v4().simple()),
        title: data
            .event_title
            .clone()
            .or_else(|| data.subject.clone())
            .unwrap_or_else(|| "New Meeting".to_string()),
        description: data
            .description
            .clone()
            .unwrap_or_else(|| "Created from email analysis by AI agents".to_string()),
        start_date: data
            .event_date
            .as_ref()
            .map(|d| d.as_str().to_string())
            .unwrap_or_else(|| (today + Duration::days(7)).format("%Y-%m-%d").to_string()),
        start_time: data
            .event_time
            .as_ref()
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| "2:00 PM".to_string()),
        location: data
            .location
            .clone()
            .unwrap_or_else(|| "Virtual Meeting".to_string()),
        attendees: data.attendees.clone(),
        priority: data.priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DelegationConfig;
    use crate::delegation::consent::StaticConsent;
    use crate::delegation::email_agent::EmailAgent;
    use crate::storage::{run_migrations, SqliteCommunicationStore};
    use extractors::EmailInfoExtractor;
    use rusqlite::Connection;
    use shared_types::{ExtractionPath, InputRecord, NormalizedValue, Priority};
    use std::sync::Mutex;

    fn store() -> Arc<SqliteCommunicationStore> {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        Arc::new(SqliteCommunicationStore::new(Arc::new(Mutex::new(conn))))
    }

    async fn delegated(
        store: Arc<SqliteCommunicationStore>,
        text: &str,
    ) -> DelegationToken {
        let agent = EmailAgent::new(
            EmailInfoExtractor::new(),
            store,
            DelegationConfig::default(),
        );
        let (_, token) = agent.process(&InputRecord::text(text)).await.unwrap();
        token
    }

    #[test]
    fn test_draft_event_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let event = draft_event(&ExtractionResult::empty(ExtractionPath::General), today);

        assert!(event.id.starts_with("event_"));
        assert_eq!(event.title, "New Meeting");
        assert_eq!(event.description, "Created from email analysis by AI agents");
        assert_eq!(event.start_date, "2024-03-08");
        assert_eq!(event.start_time, "2:00 PM");
        assert_eq!(event.location, "Virtual Meeting");
        assert!(event.attendees.is_empty());
        assert_eq!(event.priority, Priority::Low);
    }

    #[test]
    fn test_draft_event_uses_extraction() {
        let mut data = ExtractionResult::empty(ExtractionPath::Event);
        data.subject = Some("Budget review".to_string());
        data.event_date = Some(NormalizedValue::Raw("Friday".to_string()));
        data.event_time = Some(NormalizedValue::Normalized("3:00 PM".to_string()));
        data.location = Some("Room 204".to_string());
        data.attendees = vec!["a@x.com".to_string()];
        data.priority = Priority::High;

        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let event = draft_event(&data, today);

        assert_eq!(event.title, "Budget review");
        assert_eq!(event.start_date, "Friday");
        assert_eq!(event.start_time, "3:00 PM");
        assert_eq!(event.location, "Room 204");
        assert_eq!(event.attendees, vec!["a@x.com".to_string()]);
        assert_eq!(event.priority, Priority::High);
    }

    #[test]
    fn test_consent_message_fallbacks() {
        let token = crate::delegation::token::issue_token(
            "Agent A",
            "Agent B",
            &["calendar:write".to_string()],
            ExtractionResult::empty(ExtractionPath::General),
            24,
            0,
        );

        let message = consent_message(&token);
        assert!(message.starts_with("Agent B requests permission"));
        assert!(message.contains("Date: To be scheduled"));
        assert!(message.contains("Time: To be determined"));
        assert!(message.contains("Location: Virtual/TBD"));
        assert!(message.contains("Scopes: calendar:write"));
    }

    #[tokio::test]
    async fn test_approved_delegation_creates_event() {
        let store = store();
        let mut token = delegated(
            store.clone(),
            "Let's set up a meeting for Friday at 3pm in Room 204.",
        )
        .await;
        let agent = CalendarAgent::new(store.clone(), Arc::new(StaticConsent(true)));

        assert!(agent.request_access(&mut token).await.unwrap());
        assert_eq!(token.status, DelegationStatus::Approved);

        let event = agent.create_event(&mut token).await.unwrap();
        assert_eq!(token.status, DelegationStatus::Used);
        assert_eq!(event.start_date, "Friday");
        assert_eq!(event.start_time, "3:00 PM");

        let logged = store.get_communication(&token.id).await.unwrap().unwrap();
        assert_eq!(logged.user_consent_given, Some(true));
        assert_eq!(logged.processing_status, ProcessingStatus::Completed);
        assert_eq!(logged.calendar_event, Some(event));

        // A used token cannot create a second event
        assert!(agent.create_event(&mut token).await.is_err());
    }

    #[tokio::test]
    async fn test_denied_delegation_cannot_create_event() {
        let store = store();
        let mut token = delegated(store.clone(), "Quick call tomorrow at 10:00").await;
        let agent = CalendarAgent::new(store.clone(), Arc::new(StaticConsent(false)));

        assert!(!agent.request_access(&mut token).await.unwrap());
        assert_eq!(token.status, DelegationStatus::Denied);

        let logged = store.get_communication(&token.id).await.unwrap().unwrap();
        assert_eq!(logged.user_consent_given, Some(false));
        assert_eq!(logged.processing_status, ProcessingStatus::Failed);

        let err = agent.create_event(&mut token).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TokenError>(),
            Some(TokenError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_expired_token_cannot_create_event() {
        let store = store();
        let mut token = delegated(store.clone(), "Demo at 2pm").await;
        let agent = CalendarAgent::new(store.clone(), Arc::new(StaticConsent(true)));

        agent.request_access(&mut token).await.unwrap();
        token.expires_at = token.issued_at - 1;

        let err = agent.create_event(&mut token).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TokenError>(),
            Some(TokenError::Expired { .. })
        ));
        assert_eq!(token.status, DelegationStatus::Approved);
    }

    #[tokio::test]
    async fn test_consent_recording_failure_keeps_decision() {
        let store = store();
        let agent = CalendarAgent::new(store, Arc::new(StaticConsent(true)));
        let mut token = crate::delegation::token::issue_token(
            "Agent A",
            "Agent B",
            &[],
            ExtractionResult::empty(ExtractionPath::Event),
            24,
            chrono::Utc::now().timestamp(),
        );

        assert!(agent.request_access(&mut token).await.unwrap());
        assert_eq!(token.status, DelegationStatus::Approved);
    }

    #[tokio::test]
    async fn test_history_newest_first_and_degrades() {
        let store = store();
        let first = delegated(store.clone(), "Meeting at 9:00").await;
        let second = delegated(store.clone(), "Workshop at 11:00").await;
        let agent = CalendarAgent::new(store, Arc::new(StaticConsent(true)));

        let history = agent.history(DEFAULT_HISTORY_LIMIT).await;
        let tokens: Vec<_> = history
            .iter()
            .map(|c| c.delegation_token_id.clone())
            .collect();
        assert_eq!(tokens, vec![second.id, first.id]);

        let conn = Connection::open_in_memory().unwrap();
        let broken = Arc::new(SqliteCommunicationStore::new(Arc::new(Mutex::new(conn))));
        let agent = CalendarAgent::new(broken, Arc::new(StaticConsent(true)));
        assert!(agent.history(DEFAULT_HISTORY_LIMIT).await.is_empty());
    }
}
