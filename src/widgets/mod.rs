pub mod clock;
pub mod greeter;
pub mod weather;

pub use clock::Clock;
pub use greeter::Greeter;
pub use weather::Weather;

use crate::events::Message;
use crate::framebuffer::FrameBuffer;
use crate::scheduler::EventCtx;

pub trait Widget {
    /// React to a message: mutate private state, optionally mark the widget
    /// changed and schedule background work. Must not block or perform I/O;
    /// anything slow goes through `ctx.spawn_task` and comes back as a
    /// later task message.
    fn update(&mut self, ctx: &mut EventCtx, message: Message);

    /// Fully repaint the widget's rectangle from current state. `canvas` is
    /// sized to the widget's registered region; partial-refresh
    /// optimization happens a layer up, never here.
    fn view(&self, canvas: &mut FrameBuffer) -> anyhow::Result<()>;
}
