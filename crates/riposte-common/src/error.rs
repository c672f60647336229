//! Error types for the combat core.
//!
//! Combat state problems (stale targets, double transitions, overlapping
//! locks) are handled structurally and never surface here. These errors cover
//! API misuse by the host: unknown actors, invalid tuning values, and requests
//! that a lock currently refuses.

use thiserror::Error;

use crate::ids::ActorId;

/// Top-level error type for combat operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombatError {
    /// Actor not present in the simulation
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// Actor exists but is already dead
    #[error("actor is dead: {0}")]
    ActorDead(ActorId),

    /// Actor has the wrong role for the request
    #[error("actor {actor} is not a {expected}")]
    WrongRole {
        /// Actor the request targeted
        actor: ActorId,
        /// Role the request needed
        expected: &'static str,
    },

    /// A tuning value is out of range
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A lock is held and the request cannot start
    #[error("lock busy: {0}")]
    LockBusy(&'static str),
}

impl CombatError {
    /// Builds an [`CombatError::InvalidConfig`].
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;
