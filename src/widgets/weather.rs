use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use embedded_graphics::geometry::AnchorPoint;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use u8g2_fonts::{fonts, types, FontRenderer};

use crate::events::{EventKind, Message, Payload, TaskOutput};
use crate::framebuffer::FrameBuffer;
use crate::openmeteo::{OpenMeteoClient, WeatherReading};
use crate::scheduler::EventCtx;
use crate::widgets::Widget;

/// Shows the last fetched weather reading. All network traffic happens in
/// scheduled background tasks; a failed fetch keeps the stale reading on
/// the panel and the next fetch stays scheduled either way.
pub struct Weather {
    client: OpenMeteoClient,
    refresh: Duration,
    reading: Option<WeatherReading>,
}

impl Weather {
    pub fn new(client: OpenMeteoClient, refresh: Duration) -> Self {
        Self {
            client,
            refresh,
            reading: None,
        }
    }

    fn schedule_fetch(&self, ctx: &mut EventCtx, delay: Duration) {
        let client = self.client.clone();
        ctx.spawn_task(move || {
            thread::sleep(delay);
            client.current().map(TaskOutput::Weather)
        });
    }
}

impl Widget for Weather {
    fn update(&mut self, ctx: &mut EventCtx, message: Message) {
        match message.kind {
            EventKind::Added => {
                self.schedule_fetch(ctx, Duration::ZERO);
            }
            EventKind::Task => {
                if let Payload::TaskDone { outcome, .. } = message.payload {
                    match outcome {
                        Ok(TaskOutput::Weather(reading)) => {
                            if self.reading.as_ref() != Some(&reading) {
                                log::info!(
                                    "Weather changed: {:.1}°C, {:.0} km/h",
                                    reading.temperature,
                                    reading.windspeed
                                );
                                self.reading = Some(reading);
                                ctx.mark_changed();
                            }
                        }
                        Ok(other) => {
                            log::warn!("Unexpected task output for weather widget: {other:?}");
                        }
                        Err(err) => {
                            log::warn!("Weather fetch failed, keeping last reading: {err:?}");
                        }
                    }
                }

                self.schedule_fetch(ctx, self.refresh);
            }
            _ => {}
        }
    }

    fn view(&self, canvas: &mut FrameBuffer) -> anyhow::Result<()> {
        canvas.fill(false);

        let temperature = FontRenderer::new::<fonts::u8g2_font_logisoso32_tf>();
        let details = FontRenderer::new::<fonts::u8g2_font_unifont_tf>();

        match self.reading.as_ref() {
            Some(reading) => {
                temperature
                    .render_aligned(
                        format_args!("{:.1}°C", reading.temperature),
                        canvas.bounding_box().anchor_point(AnchorPoint::CenterLeft)
                            + Point::new(10, 0),
                        types::VerticalPosition::Center,
                        types::HorizontalAlignment::Left,
                        types::FontColor::Transparent(BinaryColor::On),
                        canvas,
                    )
                    .map_err(|_| anyhow!("Unable to render temperature"))?;

                details
                    .render_aligned(
                        format_args!(
                            "{}  Wind {:.0} km/h",
                            reading.describe(),
                            reading.windspeed
                        ),
                        canvas.bounding_box().anchor_point(AnchorPoint::CenterRight)
                            + Point::new(-10, 0),
                        types::VerticalPosition::Center,
                        types::HorizontalAlignment::Right,
                        types::FontColor::Transparent(BinaryColor::On),
                        canvas,
                    )
                    .map_err(|_| anyhow!("Unable to render weather details"))?;
            }
            None => {
                details
                    .render_aligned(
                        "Warte auf Wetterdaten...",
                        canvas.bounding_box().anchor_point(AnchorPoint::CenterLeft)
                            + Point::new(10, 0),
                        types::VerticalPosition::Center,
                        types::HorizontalAlignment::Left,
                        types::FontColor::Transparent(BinaryColor::On),
                        canvas,
                    )
                    .map_err(|_| anyhow!("Unable to render weather placeholder"))?;
            }
        }

        Ok(())
    }
}
