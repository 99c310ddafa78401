use anyhow::anyhow;
use embedded_graphics::geometry::AnchorPoint;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use u8g2_fonts::{fonts, types, FontRenderer};

use crate::events::{EventKind, Message, Payload};
use crate::framebuffer::FrameBuffer;
use crate::scheduler::EventCtx;
use crate::widgets::Widget;

/// Greets whoever an update event names. Repaints only when the name
/// actually changes.
#[derive(Default)]
pub struct Greeter {
    name: String,
}

impl Greeter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Widget for Greeter {
    fn update(&mut self, ctx: &mut EventCtx, message: Message) {
        if message.kind != EventKind::Update {
            return;
        }

        if let Payload::Text(name) = message.payload {
            if self.name != name {
                self.name = name;
                ctx.mark_changed();
            }
        }
    }

    fn view(&self, canvas: &mut FrameBuffer) -> anyhow::Result<()> {
        canvas.fill(false);

        FontRenderer::new::<fonts::u8g2_font_helvB14_te>()
            .render_aligned(
                format_args!("Hallo {}!", self.name),
                canvas.bounding_box().anchor_point(AnchorPoint::CenterLeft) + Point::new(10, 0),
                types::VerticalPosition::Center,
                types::HorizontalAlignment::Left,
                types::FontColor::Transparent(BinaryColor::On),
                canvas,
            )
            .map_err(|_| anyhow!("Unable to render greeting"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WidgetId;
    use crate::scheduler::TaskScheduler;

    fn update(text: &str) -> Message {
        Message {
            kind: EventKind::Update,
            payload: Payload::Text(text.to_string()),
        }
    }

    #[test]
    fn new_name_marks_changed() {
        let (tx, _rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);
        let mut greeter = Greeter::default();

        let mut ctx = EventCtx::new(&mut scheduler, WidgetId(0));
        greeter.update(&mut ctx, update("Welt"));

        assert!(ctx.changed());
        assert_eq!(greeter.name, "Welt");
    }

    #[test]
    fn repeated_name_is_idempotent() {
        let (tx, _rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);
        let mut greeter = Greeter::new("Welt");

        let mut ctx = EventCtx::new(&mut scheduler, WidgetId(0));
        greeter.update(&mut ctx, update("Welt"));

        assert!(!ctx.changed());
    }

    #[test]
    fn non_update_kinds_and_foreign_payloads_are_ignored() {
        let (tx, _rx) = crate::events::channel();
        let mut scheduler = TaskScheduler::new(tx);
        let mut greeter = Greeter::default();

        let mut ctx = EventCtx::new(&mut scheduler, WidgetId(0));
        greeter.update(
            &mut ctx,
            Message {
                kind: EventKind::Added,
                payload: Payload::Empty,
            },
        );
        greeter.update(
            &mut ctx,
            Message {
                kind: EventKind::Update,
                payload: Payload::Empty,
            },
        );

        assert!(!ctx.changed());
        assert_eq!(greeter.name, "");
    }

    #[test]
    fn view_paints_the_greeting() {
        let greeter = Greeter::new("Welt");
        let mut canvas = FrameBuffer::new(200, 40);
        greeter.view(&mut canvas).unwrap();

        assert!(canvas.pack_full().iter().any(|byte| *byte != 0xFF));
    }
}
