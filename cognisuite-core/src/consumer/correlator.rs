//! Thread identifier bookkeeping.

use serde_json::Value;

use crate::defaults::protocol::UNASSIGNED_THREAD;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionId {
    #[default]
    Unassigned,
    Assigned(String),
}

/// Holds the backend-issued `thread_id` for one session.
///
/// The first identifier seen is kept; later ones are ignored until
/// [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct SessionCorrelator {
    id: SessionId,
}

impl SessionCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self.id, SessionId::Assigned(_))
    }

    pub fn get(&self) -> Option<&str> {
        match &self.id {
            SessionId::Assigned(id) => Some(id),
            SessionId::Unassigned => None,
        }
    }

    /// Value sent on the wire: the identifier, or `new` while unassigned.
    pub fn wire_value(&self) -> &str {
        self.get().unwrap_or(UNASSIGNED_THREAD)
    }

    /// Adopt `payload.thread_id` if no identifier is held yet.
    ///
    /// Returns `true` when an identifier was adopted.
    pub fn observe(&mut self, payload: &Value) -> bool {
        if self.is_assigned() {
            return false;
        }
        match payload.get("thread_id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() && id != UNASSIGNED_THREAD => {
                tracing::debug!(target: "cognisuite::session", thread_id=%id, "session identifier assigned");
                self.id = SessionId::Assigned(id.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.id = SessionId::Unassigned;
    }
}
