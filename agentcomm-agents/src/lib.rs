pub mod config;
pub mod delegation;
pub mod storage;

pub use config::{AgentCommConfig, DatabaseConfig, DelegationConfig};
pub use delegation::{CalendarAgent, ConsentProvider, EmailAgent, StaticConsent, StdinConsent, TokenError};
pub use storage::{CommunicationStore, SqliteCommunicationStore};
