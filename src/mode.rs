use std::time::Duration;

use tokio::sync::mpsc::Sender;
use tokio::time::sleep;

use crate::log;
use crate::schedule::DisplayMode;

/// Demo stand-in for the host's ambient-state callback: flips the display
/// between active and ambient (with burn-in protection) on a fixed period.
pub(crate) async fn run_demo_source(tx: Sender<DisplayMode>, period: Duration) {
    let mut mode = DisplayMode::Active;

    loop {
        sleep(period).await;

        mode = match mode {
            DisplayMode::Active => DisplayMode::Ambient {
                burn_in_protection: true,
            },
            DisplayMode::Ambient { .. } => DisplayMode::Active,
        };
        println!("{} Host switched display to {}", log::STATE, mode.label());

        if tx.send(mode).await.is_err() {
            break;
        }
    }
}
