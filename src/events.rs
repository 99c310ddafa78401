use std::fmt;

use crossbeam_channel::{Receiver, Sender};

use crate::openmeteo::WeatherReading;

/// Capacity of the event queue. Deliberately small: a stalled dispatcher
/// throttles producers through blocking sends instead of buffering stale
/// input.
pub const QUEUE_CAPACITY: usize = 2;

/// Build the bounded FIFO queue connecting producers to the dispatcher.
pub fn channel() -> (Sender<Event>, Receiver<Event>) {
    crossbeam_channel::bounded(QUEUE_CAPACITY)
}

/// Identifies a registered widget. Assigned at registration, stable for the
/// process lifetime, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub(crate) u32);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Identifies a scheduled task within its owning widget. Monotonically
/// increasing per widget; retired ids are never reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Composite key for the scheduled-task map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub widget: WidgetId,
    pub task: TaskId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Update,
    Task,
    Removed,
}

/// Value produced by a completed background operation.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    /// A timer elapsed.
    Tick,
    /// A weather fetch returned a reading.
    Weather(WeatherReading),
}

#[derive(Debug)]
pub enum Payload {
    Empty,
    Text(String),
    TaskDone {
        task: TaskId,
        outcome: anyhow::Result<TaskOutput>,
    },
}

/// A queued occurrence. Produced by any collaborator holding the queue
/// sender; consumed exactly once by the dispatcher.
#[derive(Debug)]
pub struct Event {
    pub kind: EventKind,
    pub target: Option<WidgetId>,
    pub payload: Payload,
}

impl Event {
    pub fn update(target: WidgetId, text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Update,
            target: Some(target),
            payload: Payload::Text(text.into()),
        }
    }

    pub fn task_done(
        widget: WidgetId,
        task: TaskId,
        outcome: anyhow::Result<TaskOutput>,
    ) -> Self {
        Self {
            kind: EventKind::Task,
            target: Some(widget),
            payload: Payload::TaskDone { task, outcome },
        }
    }
}

/// The subset of an [`Event`] handed to a widget once its target has been
/// resolved.
#[derive(Debug)]
pub struct Message {
    pub kind: EventKind,
    pub payload: Payload,
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Self {
            kind: event.kind,
            payload: event.payload,
        }
    }
}
