//! Timed task scheduler.
//!
//! A timed task is an ordered list of steps, each a duration followed by an
//! action. Tasks only move when the scheduler is ticked:
//! - `advance(dt)` adds `dt` to every live task's current step
//! - `pop_due()` hands out the next step whose time has elapsed
//!
//! A completed step resets the task's clock, so the following step starts
//! counting on the next tick. Zero-duration steps are therefore the only ones
//! that chain within a single tick.
//!
//! Steps carry plain action values instead of callbacks. The owner of the
//! scheduler interprets them, which keeps it free to mutate the rest of the
//! simulation (including cancelling tasks) while handling a step.

use std::collections::{BTreeMap, VecDeque};

use riposte_common::{ActorId, IdAllocator, TaskHandle};
use tracing::trace;

/// One step of a timed task.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<A> {
    /// Seconds to wait before the action fires.
    pub duration: f32,
    /// Action handed back when the step completes.
    pub action: A,
}

impl<A> Step<A> {
    /// Step that fires after `duration` seconds.
    #[must_use]
    pub fn after(duration: f32, action: A) -> Self {
        Self {
            duration: duration.max(0.0),
            action,
        }
    }

    /// Step that fires as soon as it becomes current.
    #[must_use]
    pub fn now(action: A) -> Self {
        Self::after(0.0, action)
    }
}

/// A step that just completed.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<A> {
    /// Task the step belonged to.
    pub handle: TaskHandle,
    /// Actor that owns the task.
    pub owner: ActorId,
    /// Task label (for diagnostics).
    pub label: &'static str,
    /// The step's action.
    pub action: A,
    /// Whether this was the task's final step.
    pub last: bool,
}

#[derive(Debug, Clone)]
struct TimedTask<A> {
    owner: ActorId,
    label: &'static str,
    steps: VecDeque<Step<A>>,
    elapsed: f32,
}

impl<A> TimedTask<A> {
    fn is_due(&self) -> bool {
        self.steps
            .front()
            .is_some_and(|step| self.elapsed >= step.duration)
    }
}

/// Owns and advances every live timed task.
#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    tasks: BTreeMap<TaskHandle, TimedTask<A>>,
    ids: IdAllocator,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
            ids: IdAllocator::new(),
        }
    }
}

impl<A> Scheduler<A> {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a new task and return its handle.
    ///
    /// An empty step list produces a handle that is already finished.
    pub fn schedule(
        &mut self,
        owner: ActorId,
        label: &'static str,
        steps: impl IntoIterator<Item = Step<A>>,
    ) -> TaskHandle {
        let handle = self.ids.next_task();
        let steps: VecDeque<Step<A>> = steps.into_iter().collect();
        if steps.is_empty() {
            return handle;
        }
        trace!(?handle, %owner, label, steps = steps.len(), "task scheduled");
        self.tasks.insert(
            handle,
            TimedTask {
                owner,
                label,
                steps,
                elapsed: 0.0,
            },
        );
        handle
    }

    /// Halt and discard a task. Unknown or finished handles are ignored.
    ///
    /// Returns `true` if a live task was removed.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let removed = self.tasks.remove(&handle).is_some();
        if removed {
            trace!(?handle, "task cancelled");
        }
        removed
    }

    /// Cancel every task owned by `owner`, returning how many were removed.
    pub fn cancel_owner(&mut self, owner: ActorId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| task.owner != owner);
        let removed = before - self.tasks.len();
        if removed > 0 {
            trace!(%owner, removed, "owner tasks cancelled");
        }
        removed
    }

    /// Check if a task is still live.
    #[must_use]
    pub fn is_active(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    /// Number of live tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if no task is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Handles of the live tasks owned by `owner`.
    #[must_use]
    pub fn tasks_of(&self, owner: ActorId) -> Vec<TaskHandle> {
        self.tasks
            .iter()
            .filter(|(_, task)| task.owner == owner)
            .map(|(handle, _)| *handle)
            .collect()
    }

    /// Steps still pending on a task, in order.
    pub fn pending_steps(&self, handle: TaskHandle) -> impl Iterator<Item = &Step<A>> {
        self.tasks
            .get(&handle)
            .into_iter()
            .flat_map(|task| task.steps.iter())
    }

    /// Add `dt` to the current step of every live task.
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for task in self.tasks.values_mut() {
            task.elapsed += dt;
        }
    }

    /// Complete the next due step, if any.
    ///
    /// Tasks are visited in ascending handle order. A task whose last step
    /// completes is removed before its action is returned.
    pub fn pop_due(&mut self) -> Option<Fired<A>> {
        let handle = self
            .tasks
            .iter()
            .find(|(_, task)| task.is_due())
            .map(|(handle, _)| *handle)?;

        let task = self.tasks.get_mut(&handle)?;
        let step = task.steps.pop_front()?;
        task.elapsed = 0.0;
        let owner = task.owner;
        let label = task.label;
        let last = task.steps.is_empty();
        if last {
            self.tasks.remove(&handle);
        }
        trace!(?handle, %owner, label, last, "task step fired");

        Some(Fired {
            handle,
            owner,
            label,
            action: step.action,
            last,
        })
    }

    /// Advance by `dt` and hand every due step to `on_complete`.
    ///
    /// The callback receives the scheduler itself, so it may cancel or
    /// schedule tasks while a step is being handled.
    pub fn tick<F>(&mut self, dt: f32, mut on_complete: F)
    where
        F: FnMut(&mut Self, Fired<A>),
    {
        self.advance(dt);
        while let Some(fired) = self.pop_due() {
            on_complete(self, fired);
        }
    }
}
