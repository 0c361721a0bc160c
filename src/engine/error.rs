use super::ActionKind;
use thiserror::Error;

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The referenced item or user does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The service understood the request and refused it.
    #[error("Rejected: {0}")]
    Rejected(String),
    /// The service could not be reached or timed out.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Classification of every failure the engine can observe.
///
/// Nothing here is fatal: the worst outcome is an item awaiting retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The candidate list (or an owner profile) could not be loaded.
    #[error("Failed to load feed: {0}")]
    FeedLoad(#[source] ServiceError),

    /// A connect or like call failed.
    #[error("{action} failed: {source}")]
    Action {
        action: ActionKind,
        #[source]
        source: ServiceError,
    },

    /// Recording a durable view failed. Logged only.
    #[error("Failed to record view: {0}")]
    Recording(#[source] ServiceError),

    /// The platform has no share capability.
    #[error("Sharing is not available")]
    CapabilityUnavailable,
}

impl EngineError {
    /// Whether the error should be shown to the viewer.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, EngineError::FeedLoad(_) | EngineError::Action { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_load_and_action_errors_are_user_facing() {
        let svc = ServiceError::Unavailable("offline".into());
        assert!(EngineError::FeedLoad(svc.clone()).is_user_facing());
        assert!(EngineError::Action {
            action: ActionKind::Connect,
            source: svc.clone()
        }
        .is_user_facing());
        assert!(!EngineError::Recording(svc).is_user_facing());
        assert!(!EngineError::CapabilityUnavailable.is_user_facing());
    }

    #[test]
    fn test_action_error_message_names_action() {
        let err = EngineError::Action {
            action: ActionKind::Like,
            source: ServiceError::Rejected("nope".into()),
        };
        assert_eq!(err.to_string(), "like failed: Rejected: nope");
    }
}
