use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use chrono::Timelike;
use crossbeam_channel::Sender;

use crate::events::{Event, TaskId, TaskKey, TaskOutput, WidgetId};

/// Runs background operations on behalf of widgets and funnels their
/// completions back into the event queue.
///
/// Operations execute on their own threads and never touch widget or
/// framebuffer state; enqueuing the completion event is their only contact
/// with the rest of the system.
pub struct TaskScheduler {
    completions: Sender<Event>,
    tasks: HashMap<TaskKey, thread::JoinHandle<()>>,
    next_ids: HashMap<WidgetId, u32>,
}

impl TaskScheduler {
    pub fn new(completions: Sender<Event>) -> Self {
        Self {
            completions,
            tasks: HashMap::new(),
            next_ids: HashMap::new(),
        }
    }

    /// Start `operation` concurrently. Whether it succeeds or fails, a task
    /// completion event targeting `widget` is eventually enqueued; a full
    /// queue blocks the task thread, not the dispatcher.
    pub fn spawn<F>(&mut self, widget: WidgetId, operation: F) -> TaskId
    where
        F: FnOnce() -> Result<TaskOutput> + Send + 'static,
    {
        let task = self.allocate(widget);
        let completions = self.completions.clone();

        let handle = thread::spawn(move || {
            let outcome = operation();
            if completions
                .send(Event::task_done(widget, task, outcome))
                .is_err()
            {
                log::warn!("Queue disconnected, dropping completion of {widget}/{task}");
            }
        });

        self.tasks.insert(TaskKey { widget, task }, handle);
        log::debug!("Scheduled {task} for {widget}");
        task
    }

    fn allocate(&mut self, widget: WidgetId) -> TaskId {
        let next = self.next_ids.entry(widget).or_insert(0);
        let task = TaskId(*next);
        *next += 1;
        task
    }

    /// Remove a finished task from the tracking map. Returns `false` when
    /// the key was already retired, which marks a stale or duplicate
    /// completion.
    pub fn complete(&mut self, key: TaskKey) -> bool {
        self.tasks.remove(&key).is_some()
    }

    pub fn contains(&self, key: TaskKey) -> bool {
        self.tasks.contains_key(&key)
    }

    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }
}

/// A sleep operation completing with [`TaskOutput::Tick`].
pub fn timer(duration: Duration) -> impl FnOnce() -> Result<TaskOutput> + Send + 'static {
    move || {
        thread::sleep(duration);
        Ok(TaskOutput::Tick)
    }
}

/// A sleep operation waking at the next wall-clock minute.
pub fn minute_boundary() -> impl FnOnce() -> Result<TaskOutput> + Send + 'static {
    || {
        let second = chrono::Local::now().second() as u64;
        thread::sleep(Duration::from_secs(60u64.saturating_sub(second).max(1)));
        Ok(TaskOutput::Tick)
    }
}

/// Per-dispatch-cycle context handed to the active widget. A fresh value is
/// built for every cycle so neither the changed flag nor the widget scope
/// can leak between widgets.
pub struct EventCtx<'a> {
    scheduler: &'a mut TaskScheduler,
    widget: WidgetId,
    changed: bool,
}

impl<'a> EventCtx<'a> {
    pub(crate) fn new(scheduler: &'a mut TaskScheduler, widget: WidgetId) -> Self {
        Self {
            scheduler,
            widget,
            changed: false,
        }
    }

    /// Report that this widget's visual output no longer matches the panel.
    /// The only trigger for a render and flush this cycle.
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Schedule a background operation owned by the active widget.
    pub fn spawn_task<F>(&mut self, operation: F) -> TaskId
    where
        F: FnOnce() -> Result<TaskOutput> + Send + 'static,
    {
        self.scheduler.spawn(self.widget, operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, Payload};

    #[test]
    fn task_ids_are_monotonic_per_widget() {
        let (tx, _rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);

        let a = WidgetId(1);
        let b = WidgetId(2);
        assert_eq!(scheduler.spawn(a, timer(Duration::from_secs(60))), TaskId(0));
        assert_eq!(scheduler.spawn(a, timer(Duration::from_secs(60))), TaskId(1));
        assert_eq!(scheduler.spawn(b, timer(Duration::from_secs(60))), TaskId(0));
        assert_eq!(scheduler.outstanding(), 3);
    }

    #[test]
    fn completion_is_enqueued_with_the_task_key() {
        let (tx, rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);

        let widget = WidgetId(7);
        let task = scheduler.spawn(widget, timer(Duration::from_millis(1)));

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.kind, EventKind::Task);
        assert_eq!(event.target, Some(widget));
        match event.payload {
            Payload::TaskDone { task: id, outcome } => {
                assert_eq!(id, task);
                assert_eq!(outcome.unwrap(), TaskOutput::Tick);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn failures_still_produce_a_completion() {
        let (tx, rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);

        scheduler.spawn(WidgetId(1), || Err(anyhow::anyhow!("fetch failed")));

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        match event.payload {
            Payload::TaskDone { outcome, .. } => assert!(outcome.is_err()),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn complete_removes_exactly_once() {
        let (tx, _rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);

        let widget = WidgetId(4);
        let task = scheduler.spawn(widget, timer(Duration::from_secs(60)));
        let key = TaskKey { widget, task };

        assert!(scheduler.contains(key));
        assert!(scheduler.complete(key));
        assert!(!scheduler.contains(key));
        assert!(!scheduler.complete(key));
    }

    #[test]
    fn ctx_starts_each_cycle_unchanged() {
        let (tx, _rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);

        let mut ctx = EventCtx::new(&mut scheduler, WidgetId(0));
        assert!(!ctx.changed());
        ctx.mark_changed();
        assert!(ctx.changed());

        let ctx = EventCtx::new(&mut scheduler, WidgetId(0));
        assert!(!ctx.changed());
    }
}
