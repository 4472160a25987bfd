use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serialized state of one actor.
///
/// `state` is opaque to the store; only the actor type that wrote it knows
/// how to decode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub actor_id: String,
    /// Tag of the actor implementation, e.g. `"battle"`.
    pub actor_type: String,
    pub state: Vec<u8>,
    pub updated_at: DateTime<Utc>,
}

impl ActorSnapshot {
    pub fn new(actor_id: impl Into<String>, actor_type: impl Into<String>, state: Vec<u8>) -> Self {
        Self {
            actor_id: actor_id.into(),
            actor_type: actor_type.into(),
            state,
            updated_at: Utc::now(),
        }
    }
}
