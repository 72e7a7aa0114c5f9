use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::clock::WallClock;

use super::Instant;

#[derive(Error, Debug)]
pub enum WakeError {
    #[error("host denied exact wake registration for {0}")]
    Denied(Instant),
}

/// Fired on the scheduler's wake channel when a registration comes due.
#[derive(Debug, Clone, Copy)]
pub struct WakeEvent {
    pub at: Instant,
}

/// One-shot wake signal, the stand-in for a platform alarm. At most one
/// registration is outstanding at a time; scheduling again replaces any
/// pending one.
pub trait WakeAlarm {
    fn schedule_at(&mut self, at: Instant) -> Result<(), WakeError>;
    fn cancel(&mut self);
}

/// Wake alarm backed by a spawned tokio timer task.
pub struct TokioWakeAlarm {
    clock: Arc<dyn WallClock>,
    tx: Sender<WakeEvent>,
    exact_alarms_allowed: bool,
    pending: Option<JoinHandle<()>>,
}

impl TokioWakeAlarm {
    pub fn new(clock: Arc<dyn WallClock>, tx: Sender<WakeEvent>) -> Self {
        Self {
            clock,
            tx,
            exact_alarms_allowed: true,
            pending: None,
        }
    }

    /// Models a host that refuses exact alarm registrations.
    pub fn without_permission(mut self) -> Self {
        self.exact_alarms_allowed = false;
        self
    }
}

impl WakeAlarm for TokioWakeAlarm {
    fn schedule_at(&mut self, at: Instant) -> Result<(), WakeError> {
        self.cancel();

        if !self.exact_alarms_allowed {
            return Err(WakeError::Denied(at));
        }

        let delay = Duration::from_millis(at.as_millis().saturating_sub(self.clock.now().as_millis()));
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            // A closed channel means the scheduler is already torn down.
            let _ = tx.send(WakeEvent { at }).await;
        }));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}
