pub mod calendar_agent;
pub mod consent;
pub mod email_agent;
pub mod token;

pub use calendar_agent::{draft_event, CalendarAgent, DEFAULT_HISTORY_LIMIT};
pub use consent::{ConsentProvider, StaticConsent, StdinConsent};
pub use email_agent::EmailAgent;
pub use token::{ensure_not_expired, issue_token, transition, TokenError};
