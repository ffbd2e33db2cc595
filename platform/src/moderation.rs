//! Generic review-lifecycle state machine: `pending -> {approved, rejected,
//! hidden}`, `approved -> {hidden, rejected}`, `rejected -> {approved,
//! pending}`, `hidden -> {approved, rejected}`. No terminal state; any
//! admin may re-moderate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    Hidden,
    Reported,
}

impl ReviewStatus {
    pub fn can_transition(self, to: ReviewStatus) -> bool {
        use ReviewStatus::*;
        matches!(
            (self, to),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Hidden)
                | (Approved, Hidden) | (Approved, Rejected)
                | (Rejected, Approved) | (Rejected, Pending)
                | (Hidden, Approved) | (Hidden, Rejected)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReviewStatus::*;

    #[test]
    fn pending_can_move_to_any_moderation_outcome() {
        assert!(Pending.can_transition(Approved));
        assert!(Pending.can_transition(Rejected));
        assert!(Pending.can_transition(Hidden));
    }

    #[test]
    fn approved_cannot_return_to_pending() {
        assert!(!Approved.can_transition(Pending));
    }

    #[test]
    fn rejected_can_be_reinstated_or_sent_back_to_pending() {
        assert!(Rejected.can_transition(Approved));
        assert!(Rejected.can_transition(Pending));
        assert!(!Rejected.can_transition(Hidden));
    }

    #[test]
    fn self_transition_is_not_allowed() {
        assert!(!Approved.can_transition(Approved));
    }
}
