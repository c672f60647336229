//! ID types for actors, timed tasks and telegraphs.
//!
//! IDs are handed out by an [`IdAllocator`] owned by the simulation so that
//! two runs with the same inputs produce the same IDs.

use serde::{Deserialize, Serialize};

/// Unique identifier for a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u64);

impl ActorId {
    /// Creates an actor ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid actor ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) actor ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Handle to a scheduled timed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Creates a task handle from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Unique identifier for an attack telegraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TelegraphId(u64);

impl TelegraphId {
    /// Creates a telegraph ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Monotonic allocator for every ID kind.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next_actor: u64,
    next_task: u64,
    next_telegraph: u64,
}

impl IdAllocator {
    /// Creates a fresh allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next actor ID (never [`ActorId::NULL`]).
    pub fn next_actor(&mut self) -> ActorId {
        self.next_actor += 1;
        ActorId(self.next_actor)
    }

    /// Allocates the next task handle.
    pub fn next_task(&mut self) -> TaskHandle {
        self.next_task += 1;
        TaskHandle(self.next_task)
    }

    /// Allocates the next telegraph ID.
    pub fn next_telegraph(&mut self) -> TelegraphId {
        self.next_telegraph += 1;
        TelegraphId(self.next_telegraph)
    }
}
