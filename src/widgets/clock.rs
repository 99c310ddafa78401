use std::time::Duration;

use anyhow::anyhow;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use u8g2_fonts::{fonts, types, FontRenderer};

use crate::events::{EventKind, Message};
use crate::framebuffer::FrameBuffer;
use crate::scheduler::{self, EventCtx};
use crate::widgets::Widget;

/// Shows the current wall-clock time. Keeps no state of its own: the time
/// is read from the system clock at every paint, and a single outstanding
/// wake-up timer drives the repaints.
pub struct Clock {
    interval: Option<Duration>,
}

impl Clock {
    /// Minute-aligned clock: each timer wakes at the next minute boundary.
    pub fn new() -> Self {
        Self { interval: None }
    }

    /// Fixed-interval clock.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Clock {
    fn update(&mut self, ctx: &mut EventCtx, message: Message) {
        match message.kind {
            EventKind::Added | EventKind::Task => {
                ctx.mark_changed();
                match self.interval {
                    Some(interval) => ctx.spawn_task(scheduler::timer(interval)),
                    None => ctx.spawn_task(scheduler::minute_boundary()),
                };
            }
            _ => {}
        }
    }

    fn view(&self, canvas: &mut FrameBuffer) -> anyhow::Result<()> {
        canvas.fill(false);

        let now = chrono::Local::now();
        FontRenderer::new::<fonts::u8g2_font_logisoso32_tf>()
            .render_aligned(
                format_args!("{}", now.format("%H:%M")),
                canvas.bounding_box().center(),
                types::VerticalPosition::Center,
                types::HorizontalAlignment::Center,
                types::FontColor::Transparent(BinaryColor::On),
                canvas,
            )
            .map_err(|_| anyhow!("Unable to render clock face"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Payload, TaskId, TaskKey, TaskOutput, WidgetId};
    use crate::scheduler::TaskScheduler;

    fn message(kind: EventKind) -> Message {
        Message {
            kind,
            payload: Payload::Empty,
        }
    }

    #[test]
    fn added_schedules_exactly_one_timer() {
        let (tx, _rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);
        let mut clock = Clock::with_interval(Duration::from_secs(60));

        let mut ctx = EventCtx::new(&mut scheduler, WidgetId(0));
        clock.update(&mut ctx, message(EventKind::Added));

        assert!(ctx.changed());
        assert_eq!(scheduler.outstanding(), 1);
    }

    #[test]
    fn tick_marks_changed_and_reschedules() {
        let (tx, _rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);
        let mut clock = Clock::with_interval(Duration::from_secs(60));

        let widget = WidgetId(0);
        let mut ctx = EventCtx::new(&mut scheduler, widget);
        clock.update(&mut ctx, message(EventKind::Added));

        // The dispatcher retires the finished timer before notifying us.
        scheduler.complete(TaskKey {
            widget,
            task: TaskId(0),
        });

        let mut ctx = EventCtx::new(&mut scheduler, widget);
        clock.update(
            &mut ctx,
            Message {
                kind: EventKind::Task,
                payload: Payload::TaskDone {
                    task: TaskId(0),
                    outcome: Ok(TaskOutput::Tick),
                },
            },
        );

        assert!(ctx.changed());
        assert_eq!(scheduler.outstanding(), 1);
        assert!(scheduler.contains(TaskKey {
            widget,
            task: TaskId(1),
        }));
    }

    #[test]
    fn other_kinds_are_ignored() {
        let (tx, _rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);
        let mut clock = Clock::with_interval(Duration::from_secs(60));

        let mut ctx = EventCtx::new(&mut scheduler, WidgetId(0));
        clock.update(&mut ctx, message(EventKind::Update));
        clock.update(&mut ctx, message(EventKind::Removed));

        assert!(!ctx.changed());
        assert_eq!(scheduler.outstanding(), 0);
    }

    #[test]
    fn view_paints_into_the_canvas() {
        let clock = Clock::new();
        let mut canvas = FrameBuffer::new(200, 60);
        clock.view(&mut canvas).unwrap();

        assert!(canvas.pack_full().iter().any(|byte| *byte != 0xFF));
    }
}
