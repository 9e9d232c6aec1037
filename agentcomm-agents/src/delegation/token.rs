use shared_types::{DelegationStatus, DelegationToken, ExtractionResult};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token {token_id} cannot move from {from} to {to}")]
    InvalidTransition {
        token_id: String,
        from: DelegationStatus,
        to: DelegationStatus,
    },

    #[error("Token {token_id} expired at {expires_at}")]
    Expired { token_id: String, expires_at: i64 },
}

/// Issue a pending token carrying the extraction
pub fn issue_token(
    agent_from: &str,
    agent_to: &str,
    scope: &[String],
    email_data: ExtractionResult,
    ttl_hours: i64,
    now: i64,
) -> DelegationToken {
    DelegationToken {
        id: format!("token_{}", uuid::Uuid::new_v4().simple()),
        agent_from: agent_from.to_string(),
        agent_to: agent_to.to_string(),
        scope: scope.to_vec(),
        email_data,
        issued_at: now,
        expires_at: now + ttl_hours * 3600,
        status: DelegationStatus::Pending,
    }
}

/// Move a token to `to` if the lifecycle allows it.
///
/// Allowed: pending to approved or denied, approved to used.
pub fn transition(token: &mut DelegationToken, to: DelegationStatus) -> Result<(), TokenError> {
    let allowed = matches!(
        (token.status, to),
        (DelegationStatus::Pending, DelegationStatus::Approved)
            | (DelegationStatus::Pending, DelegationStatus::Denied)
            | (DelegationStatus::Approved, DelegationStatus::Used)
    );

    if !allowed {
        return Err(TokenError::InvalidTransition {
            token_id: token.id.clone(),
            from: token.status,
            to,
        });
    }

    token.status = to;
    Ok(())
}

pub fn ensure_not_expired(token: &DelegationToken, now: i64) -> Result<(), TokenError> {
    if now > token.expires_at {
        return Err(TokenError::Expired {
            token_id: token.id.clone(),
            expires_at: token.expires_at,
        });
    }
    Ok(())
}
