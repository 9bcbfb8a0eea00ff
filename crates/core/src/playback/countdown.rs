use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::messages::ConsoleEvent;

/// Length of the on-screen playback overlay.
pub const PLAYBACK_OVERLAY_SECS: u64 = 200;

/// Tick cadence of the overlay countdown.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Client-only countdown shown after a successful play. Expiry removes the
/// overlay and nothing else; it never touches backend state. The task must
/// be cancelled on standby and on teardown, which the `Drop` impl
/// guarantees for every exit path.
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Spawn a countdown emitting one tick per `tick` with the remaining
    /// seconds, then a final finished event.
    pub fn start(total_secs: u64, tick: Duration, tx: mpsc::Sender<ConsoleEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick);
            // The first tick of a tokio interval is immediate; skip it so the
            // countdown advances once per period.
            ticker.tick().await;

            let mut remaining = total_secs;
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                if tx.send(ConsoleEvent::CountdownTick(remaining)).await.is_err() {
                    // Receiver gone; the overlay no longer exists.
                    return;
                }
            }
            let _ = tx.send(ConsoleEvent::CountdownFinished).await;
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
