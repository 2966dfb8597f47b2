//! Checkout state machine.

use crate::error::CommerceError;
use crate::ids::{OrderId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// States of a single checkout attempt.
///
/// `Initiated -> Validated -> Committed` on success, `Initiated -> Aborted`
/// or `Validated -> Aborted` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// Cart loaded, nothing checked yet.
    #[default]
    Initiated,
    /// Every line fits the stock held under lock.
    Validated,
    /// Stock decremented and cart cleared.
    Committed,
    /// Nothing applied.
    Aborted,
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Initiated => "initiated",
            CheckoutState::Validated => "validated",
            CheckoutState::Committed => "committed",
            CheckoutState::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Committed | CheckoutState::Aborted)
    }

    /// Whether `self -> next` is a legal move.
    pub fn can_transition_to(&self, next: CheckoutState) -> bool {
        matches!(
            (self, next),
            (CheckoutState::Initiated, CheckoutState::Validated)
                | (CheckoutState::Initiated, CheckoutState::Aborted)
                | (CheckoutState::Validated, CheckoutState::Committed)
                | (CheckoutState::Validated, CheckoutState::Aborted)
        )
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one checkout attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutFlow {
    /// Order id assigned up front so aborted attempts can be correlated in logs.
    pub order_id: OrderId,
    pub user_id: UserId,
    pub state: CheckoutState,
    /// Error kind that caused the abort.
    pub abort_reason: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckoutFlow {
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            order_id: OrderId::generate(),
            user_id,
            state: CheckoutState::Initiated,
            abort_reason: None,
            started_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, next: CheckoutState) -> Result<(), CommerceError> {
        if !self.state.can_transition_to(next) {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.state.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_validated(&mut self) -> Result<(), CommerceError> {
        self.transition(CheckoutState::Validated)
    }

    pub fn mark_committed(&mut self) -> Result<(), CommerceError> {
        self.transition(CheckoutState::Committed)
    }

    /// Abort with the error that stopped the checkout.
    pub fn abort(&mut self, reason: &CommerceError) -> Result<(), CommerceError> {
        self.transition(CheckoutState::Aborted)?;
        self.abort_reason = Some(reason.kind().to_string());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut flow = CheckoutFlow::new(UserId::new("alice"));
        assert_eq!(flow.state, CheckoutState::Initiated);
        flow.mark_validated().unwrap();
        flow.mark_committed().unwrap();
        assert!(flow.is_terminal());
        assert!(flow.abort_reason.is_none());
    }

    #[test]
    fn test_abort_records_reason() {
        let mut flow = CheckoutFlow::new(UserId::new("alice"));
        flow.abort(&CommerceError::EmptyCart(UserId::new("alice")))
            .unwrap();
        assert_eq!(flow.state, CheckoutState::Aborted);
        assert_eq!(flow.abort_reason.as_deref(), Some("empty_cart"));
    }

    #[test]
    fn test_cannot_commit_without_validation() {
        let mut flow = CheckoutFlow::new(UserId::new("alice"));
        let err = flow.mark_committed().unwrap_err();
        assert_eq!(
            err,
            CommerceError::InvalidCheckoutTransition {
                from: "initiated".to_string(),
                to: "committed".to_string(),
            }
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut flow = CheckoutFlow::new(UserId::new("alice"));
        flow.abort(&CommerceError::Overflow).unwrap();
        assert!(flow.mark_validated().is_err());
        assert!(!CheckoutState::Committed.can_transition_to(CheckoutState::Aborted));
    }
}
