use std::io::BufRead;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::Sender;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

mod config;
mod dispatcher;
mod display;
mod events;
mod framebuffer;
mod openmeteo;
mod panel;
mod retry;
mod scheduler;
mod widgets;

use dispatcher::Dispatcher;
use display::Display;
use events::{Event, WidgetId};
use openmeteo::OpenMeteoClient;
use scheduler::TaskScheduler;
use widgets::{Clock, Greeter, Weather};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => {
            log::info!("System exited cleanly");
            Ok(())
        }
        Err(err) => {
            log::error!("System exited with error: {:?}", err);
            Err(err)
        }
    }
}

fn run() -> Result<()> {
    log::info!("Starting up");

    let config = config::Config::load("piink.json")?;

    let (events_tx, events_rx) = events::channel();
    let display = Display::new(panel::SimulatedPanel, panel::WIDTH, panel::HEIGHT);
    let scheduler = TaskScheduler::new(events_tx.clone());
    let mut dispatcher = Dispatcher::new(display, scheduler, events_rx);

    dispatcher.register(
        Box::new(Clock::new()),
        Rectangle::new(Point::new(0, 0), Size::new(panel::WIDTH, 120)),
    )?;
    let greeter = dispatcher.register(
        Box::new(Greeter::default()),
        Rectangle::new(Point::new(0, 120), Size::new(panel::WIDTH, 160)),
    )?;
    dispatcher.register(
        Box::new(Weather::new(
            OpenMeteoClient::new(config.latitude, config.longitude),
            Duration::from_secs(config.weather_refresh_minutes * 60),
        )),
        Rectangle::new(Point::new(0, 280), Size::new(panel::WIDTH, 200)),
    )?;

    spawn_input_producer(events_tx, greeter);

    log::info!("Display configured, entering event loop");
    dispatcher.run()
}

/// Thin ingress producer: each stdin line becomes an update event for the
/// greeter. A full queue blocks this thread, surfacing backpressure to
/// whoever is piping input.
fn spawn_input_producer(events: Sender<Event>, greeter: WidgetId) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(name) => {
                    if events.send(Event::update(greeter, name.trim())).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    log::warn!("Failed to read from stdin: {err}");
                    break;
                }
            }
        }
        log::info!("Input producer stopped");
    });
}
