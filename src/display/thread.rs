use core::convert::Infallible;
use std::time::Duration;

use embedded_canvas::Canvas;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
};
use tokio::sync::mpsc::{Receiver, Sender};

use crate::log;
use crate::schedule::{DisplayMode, RefreshState};

use super::face::WatchFace;
use super::{burn_in_translation, COLOR_BG};

#[derive(Debug, Clone)]
pub enum DisplayCommand {
    Frame(RefreshState),
}

#[derive(Debug, Clone)]
pub enum DisplayResponse {
    Drawn,
    Closed,
}

/// Owns the simulator panel. Runs on its own OS thread; SDL wants window
/// calls from the thread that created it.
pub(crate) fn run_thread(
    face: WatchFace,
    size: Size,
    tx: Sender<DisplayResponse>,
    mut rx: Receiver<DisplayCommand>,
) -> Result<(), Infallible> {
    println!("{} Starting simulator window", log::THREAD);

    let mut display = SimulatorDisplay::<Rgb565>::new(size);
    let output_settings = OutputSettingsBuilder::new().scale(2).build();
    let mut window = Window::new("Always-on clock", &output_settings);
    window.update(&display);

    loop {
        // Coalesce queued frames, keeping only the newest.
        let mut command = rx.try_recv();
        let mut frames_dropped: u32 = 0;

        loop {
            let next = rx.try_recv();
            if next.is_err() {
                break;
            }
            frames_dropped += 1;
            command = next;
        }

        if frames_dropped > 0 {
            println!("{} Dropped {} frames", log::WARN, frames_dropped);
        }

        match command {
            Ok(DisplayCommand::Frame(state)) => {
                display.clear(COLOR_BG)?;

                let mut canvas = Canvas::<Rgb565>::new(size);
                face.draw(&mut canvas, &state)?;

                let offset = match state.mode {
                    DisplayMode::Ambient {
                        burn_in_protection: true,
                    } => burn_in_translation(state.instant),
                    _ => Point::zero(),
                };
                canvas.place_at(offset).draw(&mut display)?;
                window.update(&display);

                if tx.blocking_send(DisplayResponse::Drawn).is_err() {
                    println!("{} Main thread gone, stopping display", log::ERROR);
                    return Ok(());
                }
            }
            Err(_) => {
                if window
                    .events()
                    .any(|event| matches!(event, SimulatorEvent::Quit))
                {
                    println!("{} Window closed", log::SCREEN);
                    let _ = tx.blocking_send(DisplayResponse::Closed);
                    return Ok(());
                }
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }
}
