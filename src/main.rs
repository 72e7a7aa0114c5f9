use std::env;
use std::sync::Arc;
use std::time::Duration;

mod clock;
mod display;
mod log;
mod mode;
mod schedule;

use embedded_graphics::prelude::Size;
use tokio::sync::mpsc;

use clock::SystemClock;
use display::face::WatchFace;
use display::thread::{DisplayCommand, DisplayResponse};
use schedule::scheduler::RefreshScheduler;
use schedule::wake::{TokioWakeAlarm, WakeEvent};
use schedule::{DisplayMode, Interval};

// Simulated watch panel, a round wearable's bounding square.
const WIDTH: u32 = 240;
const HEIGHT: u32 = 240;

// Update cadence per display mode. The original always-on sample drives both
// at one second; ambient can be slowed independently.
const ACTIVE_INTERVAL: Interval = Interval::from_secs(1);
const AMBIENT_INTERVAL: Interval = Interval::from_secs(1);

// How often the demo host flips between active and ambient.
const MODE_DEMO_PERIOD: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    // --deny-wake demos the host refusing exact wake registrations: the face
    // freezes in ambient mode until the next mode change.
    let deny_wake = env::args().any(|arg| arg == "--deny-wake");

    let clock = Arc::new(SystemClock);

    // Channels between the scheduler, the display thread and the demo host
    let (frame_tx, frame_rx) = mpsc::channel::<DisplayCommand>(16);
    let (screen_tx, mut screen_rx) = mpsc::channel::<DisplayResponse>(16);
    let (mode_tx, mode_rx) = mpsc::channel::<DisplayMode>(16);
    let (wake_tx, wake_rx) = mpsc::channel::<WakeEvent>(4);

    // The simulator window needs its own OS thread.
    let face = WatchFace::new(ACTIVE_INTERVAL, AMBIENT_INTERVAL);
    std::thread::spawn(move || {
        display::thread::run_thread(face, Size::new(WIDTH, HEIGHT), screen_tx, frame_rx)
            .expect("Could not run display thread");
    });

    let demo_source = tokio::spawn(mode::run_demo_source(mode_tx.clone(), MODE_DEMO_PERIOD));

    let alarm = TokioWakeAlarm::new(clock.clone(), wake_tx);
    let alarm = if deny_wake {
        alarm.without_permission()
    } else {
        alarm
    };
    let scheduler = RefreshScheduler::new(
        clock,
        alarm,
        mode_rx,
        wake_rx,
        frame_tx,
        ACTIVE_INTERVAL,
        AMBIENT_INTERVAL,
    );
    let refresh_loop = tokio::spawn(scheduler.run());

    // Drain display responses until the window closes.
    while let Some(response) = screen_rx.recv().await {
        if matches!(response, DisplayResponse::Closed) {
            break;
        }
    }

    // Close the mode stream so the refresh loop exits through its teardown
    // path and cancels any pending wake.
    demo_source.abort();
    drop(mode_tx);
    refresh_loop.await.expect("refresh loop exits cleanly");
    println!("{} Shutdown", log::STATE);
}
