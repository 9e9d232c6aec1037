use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Source of the user's decision on a delegation request
#[async_trait]
pub trait ConsentProvider: Send + Sync {
    async fn request_consent(&self, message: &str) -> Result<bool>;
}

/// Always answers the same way
pub struct StaticConsent(pub bool);

#[async_trait]
impl ConsentProvider for StaticConsent {
    async fn request_consent(&self, _message: &str) -> Result<bool> {
        Ok(self.0)
    }
}

/// Prints the request to stderr and reads a y/N answer from stdin
pub struct StdinConsent;

#[async_trait]
impl ConsentProvider for StdinConsent {
    async fn request_consent(&self, message: &str) -> Result<bool> {
        let mut stderr = tokio::io::stderr();
        stderr
            .write_all(format!("{}\n\nApprove? [y/N] ", message).as_bytes())
            .await?;
        stderr.flush().await?;

        let mut answer = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut answer)
            .await?;

        Ok(is_affirmative(&answer))
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
