use std::sync::Arc;

use debug_print::debug_println;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::sleep;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use crate::clock::WallClock;
use crate::display::thread::DisplayCommand;
use crate::log;

use super::wake::{WakeAlarm, WakeEvent};
use super::{DisplayMode, Interval, RefreshState};

/// Drives the refresh loop for one screen: interval-aligned ticks while the
/// display is active, alarm-driven wakes while it is ambient.
///
/// Everything the host provides comes in through the constructor: the clock,
/// the wake alarm, the mode event channel and the frame sink. The loop itself
/// never touches wall-clock side effects directly.
pub struct RefreshScheduler<A: WakeAlarm> {
    clock: Arc<dyn WallClock>,
    alarm: A,
    modes: ReceiverStream<DisplayMode>,
    wakes: Receiver<WakeEvent>,
    frames: Sender<DisplayCommand>,
    active_interval: Interval,
    ambient_interval: Interval,
    mode: DisplayMode,
    state: RefreshState,
}

impl<A: WakeAlarm> RefreshScheduler<A> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: Arc<dyn WallClock>,
        alarm: A,
        modes: Receiver<DisplayMode>,
        wakes: Receiver<WakeEvent>,
        frames: Sender<DisplayCommand>,
        active_interval: Interval,
        ambient_interval: Interval,
    ) -> Self {
        let state = RefreshState {
            instant: clock.now(),
            time_of_day: clock.time_of_day(),
            draw_count: 0,
            mode: DisplayMode::Active,
        };
        Self {
            clock,
            alarm,
            modes: ReceiverStream::new(modes),
            wakes,
            frames,
            active_interval,
            ambient_interval,
            mode: DisplayMode::Active,
            state,
        }
    }

    /// Runs until the mode stream ends or the display goes away. Any pending
    /// wake registration is cancelled on the way out.
    pub async fn run(mut self) {
        // The initial paint is treated like a mode change.
        let mut keep_going = self.refresh().await;

        while keep_going {
            keep_going = match self.mode {
                DisplayMode::Active => self.active_tick().await,
                DisplayMode::Ambient { .. } => self.ambient_tick().await,
            };
        }

        self.alarm.cancel();
        println!("{} Refresh loop stopped", log::STATE);
    }

    /// Sleep until the next active-aligned instant, unless the mode changes
    /// first.
    async fn active_tick(&mut self) -> bool {
        let delay = self.clock.now().delay_to_next_aligned(self.active_interval);
        tokio::select! {
            _ = sleep(delay) => self.refresh().await,
            mode = self.modes.next() => self.switch_mode(mode).await,
        }
    }

    /// Register a one-shot wake for the next ambient-aligned instant, then
    /// wait for it (or for a mode change).
    async fn ambient_tick(&mut self) -> bool {
        let at = self.clock.now().next_aligned(self.ambient_interval);
        if let Err(err) = self.alarm.schedule_at(at) {
            // Non-fatal: the face freezes until the next mode change.
            println!("{} {}, screen will not be refreshed", log::WAKE, err);
            let mode = self.modes.next().await;
            return self.switch_mode(mode).await;
        }

        loop {
            tokio::select! {
                wake = self.wakes.recv() => match wake {
                    // An alarm cancelled after its send leaves the event
                    // queued; only the current registration may refresh.
                    Some(wake) if wake.at != at => continue,
                    Some(_) => return self.refresh().await,
                    None => return false,
                },
                mode = self.modes.next() => return self.switch_mode(mode).await,
            }
        }
    }

    /// Applies a mode event. `None` means the host closed the stream and the
    /// screen is being torn down.
    async fn switch_mode(&mut self, mode: Option<DisplayMode>) -> bool {
        let Some(mode) = mode else { return false };

        self.alarm.cancel();
        if mode != self.mode {
            println!("{} Display mode is now {}", log::STATE, mode.label());
            self.mode = mode;
        }
        // Refresh right away so a mode switch is never visually stale.
        self.refresh().await
    }

    async fn refresh(&mut self) -> bool {
        self.state.instant = self.clock.now();
        self.state.time_of_day = self.clock.time_of_day();
        self.state.draw_count += 1;
        self.state.mode = self.mode;

        debug_println!(
            "{} {}",
            log::STATE,
            serde_json::to_string(&self.state).expect("refresh state serializes")
        );

        // A closed frame channel means the display thread is gone.
        self.frames
            .send(DisplayCommand::Frame(self.state.clone()))
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::NaiveTime;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;

    use crate::clock::WallClock;
    use crate::display::thread::DisplayCommand;
    use crate::schedule::wake::{WakeAlarm, WakeError, WakeEvent};
    use crate::schedule::{DisplayMode, Instant, Interval, RefreshState};

    use super::RefreshScheduler;

    /// Advances in lockstep with tokio's paused test time.
    struct TestClock {
        base_ms: u64,
        started: tokio::time::Instant,
    }

    impl TestClock {
        fn at(base_ms: u64) -> Self {
            Self {
                base_ms,
                started: tokio::time::Instant::now(),
            }
        }
    }

    impl WallClock for TestClock {
        fn now(&self) -> Instant {
            Instant(self.base_ms + self.started.elapsed().as_millis() as u64)
        }

        fn time_of_day(&self) -> NaiveTime {
            let secs = (self.now().as_millis() / 1000 % 86_400) as u32;
            NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).expect("in range")
        }
    }

    struct FakeAlarm {
        scheduled: Arc<Mutex<Vec<Instant>>>,
        cancelled: Arc<AtomicUsize>,
        deny: bool,
    }

    impl WakeAlarm for FakeAlarm {
        fn schedule_at(&mut self, at: Instant) -> Result<(), WakeError> {
            if self.deny {
                return Err(WakeError::Denied(at));
            }
            self.scheduled.lock().expect("lock").push(at);
            Ok(())
        }

        fn cancel(&mut self) {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        mode_tx: mpsc::Sender<DisplayMode>,
        wake_tx: mpsc::Sender<WakeEvent>,
        frame_rx: mpsc::Receiver<DisplayCommand>,
        scheduled: Arc<Mutex<Vec<Instant>>>,
        cancelled: Arc<AtomicUsize>,
        task: JoinHandle<()>,
    }

    fn spawn_scheduler(base_ms: u64, deny: bool, ambient_ms: u64) -> Harness {
        let (mode_tx, mode_rx) = mpsc::channel(8);
        let (wake_tx, wake_rx) = mpsc::channel(8);
        let (frame_tx, frame_rx) = mpsc::channel(8);
        let scheduled = Arc::new(Mutex::new(Vec::new()));
        let cancelled = Arc::new(AtomicUsize::new(0));

        let scheduler = RefreshScheduler::new(
            Arc::new(TestClock::at(base_ms)),
            FakeAlarm {
                scheduled: scheduled.clone(),
                cancelled: cancelled.clone(),
                deny,
            },
            mode_rx,
            wake_rx,
            frame_tx,
            Interval::from_millis(1000),
            Interval::from_millis(ambient_ms),
        );

        Harness {
            mode_tx,
            wake_tx,
            frame_rx,
            scheduled,
            cancelled,
            task: tokio::spawn(scheduler.run()),
        }
    }

    async fn next_frame(rx: &mut mpsc::Receiver<DisplayCommand>) -> RefreshState {
        match rx.recv().await.expect("frame") {
            DisplayCommand::Frame(state) => state,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn active_ticks_land_on_interval_boundaries() {
        let mut h = spawn_scheduler(500, false, 1000);

        let first = next_frame(&mut h.frame_rx).await;
        assert_eq!(first.draw_count, 1);
        assert_eq!(first.instant, Instant(500));
        assert_eq!(first.mode, DisplayMode::Active);

        let second = next_frame(&mut h.frame_rx).await;
        assert_eq!(second.draw_count, 2);
        assert_eq!(second.instant, Instant(1000));

        let third = next_frame(&mut h.frame_rx).await;
        assert_eq!(third.draw_count, 3);
        assert_eq!(third.instant, Instant(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn mode_switch_refreshes_immediately_and_registers_wake() {
        let mut h = spawn_scheduler(3200, false, 1000);

        let first = next_frame(&mut h.frame_rx).await;
        assert_eq!(first.instant, Instant(3200));

        h.mode_tx
            .send(DisplayMode::Ambient {
                burn_in_protection: true,
            })
            .await
            .expect("send mode");

        // Immediate refresh at the switch instant, no alignment delay.
        let second = next_frame(&mut h.frame_rx).await;
        assert_eq!(second.draw_count, 2);
        assert_eq!(second.instant, Instant(3200));
        assert!(second.mode.is_ambient());

        // Deliver the wake; once the follow-up frame arrives the registration
        // for the aligned instant must have been made.
        h.wake_tx
            .send(WakeEvent { at: Instant(4000) })
            .await
            .expect("send wake");
        let third = next_frame(&mut h.frame_rx).await;
        assert_eq!(third.draw_count, 3);
        assert_eq!(h.scheduled.lock().expect("lock")[0], Instant(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn ambient_rate_is_independent_of_active_rate() {
        let mut h = spawn_scheduler(500, false, 4000);
        next_frame(&mut h.frame_rx).await;

        h.mode_tx
            .send(DisplayMode::Ambient {
                burn_in_protection: false,
            })
            .await
            .expect("send mode");
        next_frame(&mut h.frame_rx).await;

        h.wake_tx
            .send(WakeEvent { at: Instant(4000) })
            .await
            .expect("send wake");
        next_frame(&mut h.frame_rx).await;
        assert_eq!(h.scheduled.lock().expect("lock")[0], Instant(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_wake_from_cancelled_registration_is_ignored() {
        let mut h = spawn_scheduler(3200, false, 1000);
        next_frame(&mut h.frame_rx).await;

        h.mode_tx
            .send(DisplayMode::Ambient {
                burn_in_protection: false,
            })
            .await
            .expect("send mode");
        let second = next_frame(&mut h.frame_rx).await;
        assert_eq!(second.draw_count, 2);

        // A wake left queued by an earlier, cancelled registration must not
        // produce a refresh; the current registration is for 4000ms.
        h.wake_tx
            .send(WakeEvent { at: Instant(100) })
            .await
            .expect("send wake");
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(h.frame_rx.try_recv().is_err());

        // The wake matching the registration still lands.
        h.wake_tx
            .send(WakeEvent { at: Instant(4000) })
            .await
            .expect("send wake");
        let third = next_frame(&mut h.frame_rx).await;
        assert_eq!(third.draw_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn denied_wake_freezes_ambient_refreshes_until_mode_change() {
        let mut h = spawn_scheduler(0, true, 1000);

        let first = next_frame(&mut h.frame_rx).await;
        assert_eq!(first.draw_count, 1);

        h.mode_tx
            .send(DisplayMode::Ambient {
                burn_in_protection: false,
            })
            .await
            .expect("send mode");
        let second = next_frame(&mut h.frame_rx).await;
        assert_eq!(second.draw_count, 2);

        // Registration was denied, so the counter stops advancing.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(h.frame_rx.try_recv().is_err());
        assert!(h.scheduled.lock().expect("lock").is_empty());

        // A switch back to active resumes refreshes.
        h.mode_tx
            .send(DisplayMode::Active)
            .await
            .expect("send mode");
        let third = next_frame(&mut h.frame_rx).await;
        assert_eq!(third.draw_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_in_ambient_cancels_pending_wake() {
        let mut h = spawn_scheduler(100, false, 1000);
        next_frame(&mut h.frame_rx).await;

        h.mode_tx
            .send(DisplayMode::Ambient {
                burn_in_protection: true,
            })
            .await
            .expect("send mode");
        next_frame(&mut h.frame_rx).await;

        let cancels_before = h.cancelled.load(Ordering::SeqCst);
        drop(h.mode_tx);
        h.task.await.expect("scheduler exits cleanly");
        assert!(h.cancelled.load(Ordering::SeqCst) > cancels_before);
    }
}
