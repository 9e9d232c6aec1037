pub mod delegation;
pub mod extraction;

pub use delegation::{
    AgentCommunication, CalendarEvent, CommunicationHistoryResponse, DelegationStatus,
    DelegationToken, ProcessingStatus,
};

// Re-export extraction types
pub use extraction::*;
