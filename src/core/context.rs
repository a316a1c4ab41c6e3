//! Per-operation deadline and cancellation

use crate::types::LedgerError;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Bounds a single ledger operation
///
/// The engine checks the context before every call into the persistence
/// port and before committing, so an expired or cancelled operation never
/// writes anything.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

impl OperationContext {
    /// No deadline, never cancelled unless the token is triggered
    pub fn background() -> Self {
        Self::default()
    }

    /// Expire `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::default().deadline_at(Instant::now() + timeout)
    }

    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fail fast if the operation may no longer proceed
    ///
    /// # Errors
    ///
    /// - `Cancelled` if the token was triggered
    /// - `Timeout` if the deadline has passed
    pub fn check(&self, operation: &str) -> Result<(), LedgerError> {
        if self.cancellation.is_cancelled() {
            return Err(LedgerError::cancelled(operation));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(LedgerError::timeout(operation));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_context_always_proceeds() {
        assert!(OperationContext::background().check("process").is_ok());
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let ctx = OperationContext::background().deadline_at(Instant::now());
        assert!(matches!(
            ctx.check("process"),
            Err(LedgerError::Timeout { .. })
        ));
    }

    #[test]
    fn test_cancelled_token_wins_over_deadline() {
        let token = CancellationToken::new();
        let ctx = OperationContext::with_timeout(Duration::from_secs(60))
            .with_cancellation(token.clone());

        assert!(ctx.check("process").is_ok());
        token.cancel();
        assert!(matches!(
            ctx.check("process"),
            Err(LedgerError::Cancelled { .. })
        ));
    }
}
