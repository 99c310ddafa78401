use std::collections::BTreeMap;

use anyhow::Result;
use crossbeam_channel::Receiver;
use embedded_graphics::primitives::Rectangle;

use crate::display::{Display, DisplayMode};
use crate::events::{Event, EventKind, Message, Payload, TaskKey, WidgetId};
use crate::panel::Panel;
use crate::scheduler::{EventCtx, TaskScheduler};
use crate::widgets::Widget;

struct WidgetEntry {
    widget: Box<dyn Widget>,
    region: Rectangle,
}

/// The event loop. Exclusively owns the widget registry, the framebuffer
/// behind [`Display`], and the scheduled-task map; everything else talks to
/// it through the event queue.
pub struct Dispatcher<P> {
    display: Display<P>,
    scheduler: TaskScheduler,
    events: Receiver<Event>,
    widgets: BTreeMap<WidgetId, WidgetEntry>,
    next_widget: u32,
}

impl<P: Panel> Dispatcher<P> {
    pub fn new(display: Display<P>, scheduler: TaskScheduler, events: Receiver<Event>) -> Self {
        Self {
            display,
            scheduler,
            events,
            widgets: BTreeMap::new(),
            next_widget: 0,
        }
    }

    /// Add a widget to the registry. The widget set is fixed once the loop
    /// starts; regions never move or resize afterwards.
    pub fn register(&mut self, widget: Box<dyn Widget>, region: Rectangle) -> Result<WidgetId> {
        self.display.frame().check_region(&region)?;

        let id = WidgetId(self.next_widget);
        self.next_widget += 1;
        self.widgets.insert(id, WidgetEntry { widget, region });
        log::debug!("Registered {id} at {region:?}");
        Ok(id)
    }

    /// First-render setup: deliver a synthetic added message to every
    /// widget in registration order (letting each schedule its initial
    /// background work), paint them all into the framebuffer, transmit one
    /// full frame, then switch the panel into partial-refresh mode.
    pub fn start(&mut self) -> Result<()> {
        log::info!("Rendering initial frame for {} widgets", self.widgets.len());

        self.display.set_mode(DisplayMode::Full)?;
        self.display.clear()?;

        for (&id, entry) in self.widgets.iter_mut() {
            let mut ctx = EventCtx::new(&mut self.scheduler, id);
            entry.widget.update(
                &mut ctx,
                Message {
                    kind: EventKind::Added,
                    payload: Payload::Empty,
                },
            );
            self.display
                .compose(&entry.region, |canvas| entry.widget.view(canvas))?;
        }

        self.display.refresh_full()?;
        self.display.set_mode(DisplayMode::Partial)?;
        log::info!(
            "Entering partial refresh mode with {} background tasks scheduled",
            self.scheduler.outstanding()
        );
        Ok(())
    }

    /// Run forever. Returns only on a fatal panel error or a disconnected
    /// queue.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        loop {
            self.tick()?;
        }
    }

    /// Process exactly one event, blocking until one is available.
    pub fn tick(&mut self) -> Result<()> {
        let event = self.events.recv()?;
        self.dispatch(event)
    }

    fn dispatch(&mut self, event: Event) -> Result<()> {
        // Task bookkeeping comes first and happens even when the target no
        // longer resolves: the map entry must be gone before any widget
        // hears about the completion.
        if event.kind == EventKind::Task {
            let key = match (event.target, &event.payload) {
                (Some(widget), Payload::TaskDone { task, .. }) => TaskKey {
                    widget,
                    task: *task,
                },
                _ => {
                    log::warn!("Malformed task completion event, dropping");
                    return Ok(());
                }
            };

            if !self.scheduler.complete(key) {
                debug_assert!(false, "duplicate or stale task completion: {key:?}");
                log::warn!("Stale task completion for {key:?}, dropping");
                return Ok(());
            }
        }

        let Some(target) = event.target else {
            log::debug!("Event {:?} has no target, dropping", event.kind);
            return Ok(());
        };
        let Some(entry) = self.widgets.get_mut(&target) else {
            log::debug!("No widget registered as {target}, dropping {:?}", event.kind);
            return Ok(());
        };

        let mut ctx = EventCtx::new(&mut self.scheduler, target);
        entry.widget.update(&mut ctx, Message::from(event));

        if ctx.changed() {
            log::debug!("{target} changed, flushing {:?}", entry.region);
            self.display
                .compose(&entry.region, |canvas| entry.widget.view(canvas))?;
            self.display.refresh_region(&entry.region)?;
        }

        Ok(())
    }
}
