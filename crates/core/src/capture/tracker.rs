use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::api::client::ShowApi;
use crate::capture::session::CaptureSession;

/// Default photo poll cadence while a session is active.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Commands accepted by the capture tracker task.
#[derive(Debug, Clone)]
pub enum CaptureCommand {
    Capture {
        show_id: String,
        user_ids: Vec<String>,
    },
    SelectPhoto {
        photo_id: String,
    },
    Approve,
    Shutdown,
}

/// Events emitted by the tracker. Every state change carries a full session
/// snapshot; failures leave the session interactive.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    SessionUpdated(CaptureSession),
    Error(String),
}

/// Runs one capture session as an async task: a select loop over the command
/// channel and a poll interval that is only armed while a session is active.
/// The task exits on `Shutdown` or when the command channel closes, taking
/// the interval with it on every exit path.
pub struct CaptureTracker {
    api: Arc<dyn ShowApi>,
    session: CaptureSession,
    poll_interval: Duration,
}

impl CaptureTracker {
    pub fn new(api: Arc<dyn ShowApi>, poll_interval: Duration) -> Self {
        Self {
            api,
            session: CaptureSession::new(),
            poll_interval,
        }
    }

    /// Spawn the tracker, returning its command sender, event receiver, and
    /// task handle.
    pub fn spawn(
        api: Arc<dyn ShowApi>,
        poll_interval: Duration,
    ) -> (
        mpsc::Sender<CaptureCommand>,
        mpsc::Receiver<CaptureEvent>,
        JoinHandle<()>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(32);
        let tracker = Self::new(api, poll_interval);
        let handle = tokio::spawn(tracker.run(cmd_rx, event_tx));
        (cmd_tx, event_rx, handle)
    }

    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<CaptureCommand>,
        tx: mpsc::Sender<CaptureEvent>,
    ) {
        log::info!("capture tracker started (poll every {:?})", self.poll_interval);
        let mut poll = interval(self.poll_interval);
        // The first tick of a tokio interval fires immediately; consume it
        // up front. The interval is re-armed when a session activates.
        poll.tick().await;

        loop {
            tokio::select! {
                maybe_cmd = rx.recv() => match maybe_cmd {
                    Some(CaptureCommand::Capture { show_id, user_ids }) => {
                        let was_idle = !self.session.is_active();
                        self.handle_capture(&show_id, &user_ids, &tx).await;
                        if was_idle && self.session.is_active() {
                            // Re-arm the interval so polling starts one full
                            // period from activation, not from spawn time.
                            poll.reset();
                        }
                    }
                    Some(CaptureCommand::SelectPhoto { photo_id }) => {
                        match self.session.select_photo(&photo_id) {
                            Ok(()) => self.emit_snapshot(&tx).await,
                            Err(msg) => self.emit_error(msg, &tx).await,
                        }
                    }
                    Some(CaptureCommand::Approve) => {
                        self.handle_approve(&tx).await;
                    }
                    Some(CaptureCommand::Shutdown) | None => break,
                },
                _ = poll.tick(), if self.session.is_active() => {
                    self.refresh_photos(&tx).await;
                }
            }
        }
        log::info!("capture tracker stopped");
    }

    async fn handle_capture(
        &mut self,
        show_id: &str,
        user_ids: &[String],
        tx: &mpsc::Sender<CaptureEvent>,
    ) {
        if !self.session.can_capture() {
            self.emit_error("capture limit reached (3 attempts)".to_string(), tx)
                .await;
            return;
        }
        let result = self
            .api
            .capture_photo(self.session.session_id(), show_id, user_ids, Utc::now())
            .await;
        match result {
            Ok(receipt) => {
                self.session.record_capture(receipt.session_id);
                // Refresh right away rather than waiting for the next poll.
                self.refresh_photos(tx).await;
            }
            Err(e) => self.emit_error(e.to_string(), tx).await,
        }
    }

    async fn handle_approve(&mut self, tx: &mpsc::Sender<CaptureEvent>) {
        let (session_id, photo_id) = match self.session.approve_target() {
            Some((s, p)) => (s.to_string(), p.to_string()),
            None => {
                self.emit_error("select a photo before approving".to_string(), tx)
                    .await;
                return;
            }
        };
        match self.api.approve_photo(&session_id, &photo_id).await {
            Ok(()) => {
                self.session.reset();
                self.emit_snapshot(tx).await;
            }
            Err(e) => self.emit_error(e.to_string(), tx).await,
        }
    }

    async fn refresh_photos(&mut self, tx: &mpsc::Sender<CaptureEvent>) {
        let session_id = match self.session.session_id() {
            Some(id) => id.to_string(),
            None => return,
        };
        match self.api.fetch_photos(&session_id).await {
            Ok(photos) => {
                self.session.set_photos(photos);
                self.emit_snapshot(tx).await;
            }
            Err(e) => {
                log::warn!("photo poll failed: {}", e);
                self.emit_error(e.to_string(), tx).await;
            }
        }
    }

    async fn emit_snapshot(&self, tx: &mpsc::Sender<CaptureEvent>) {
        let _ = tx.send(CaptureEvent::SessionUpdated(self.session.clone())).await;
    }

    async fn emit_error(&self, message: String, tx: &mpsc::Sender<CaptureEvent>) {
        let _ = tx.send(CaptureEvent::Error(message)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::api::error::ApiError;
    use crate::api::types::{CaptureReceipt, CreatedShow, ShowUpdate};
    use crate::capture::session::Photo;
    use crate::show::show::{Participant, Show};

    /// Stub backend: counts calls and serves a scripted photo list.
    #[derive(Default)]
    struct StubApi {
        captures: AtomicUsize,
        photo_fetches: AtomicUsize,
        approvals: AtomicUsize,
        photos: Mutex<Vec<Photo>>,
        fail_approve: bool,
    }

    fn unsupported<T>() -> Result<T, ApiError> {
        Err(ApiError::InvalidRequest("not under test".to_string()))
    }

    #[async_trait]
    impl ShowApi for StubApi {
        async fn create_show(&self, _: DateTime<Utc>) -> Result<CreatedShow, ApiError> {
            unsupported()
        }
        async fn fetch_waiting_users(&self) -> Result<Vec<Participant>, ApiError> {
            unsupported()
        }
        async fn fetch_available_shows(&self) -> Result<Vec<Show>, ApiError> {
            unsupported()
        }
        async fn fetch_show(&self, _: &str) -> Result<Show, ApiError> {
            unsupported()
        }
        async fn assign_user_to_show(&self, _: &str, _: &str) -> Result<(), ApiError> {
            unsupported()
        }
        async fn capture_photo(
            &self,
            _session_id: Option<&str>,
            _show_id: &str,
            _user_ids: &[String],
            _timestamp: DateTime<Utc>,
        ) -> Result<CaptureReceipt, ApiError> {
            self.captures.fetch_add(1, Ordering::SeqCst);
            Ok(CaptureReceipt {
                session_id: "sess-1".to_string(),
            })
        }
        async fn fetch_photos(&self, _: &str) -> Result<Vec<Photo>, ApiError> {
            self.photo_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.photos.lock().unwrap().clone())
        }
        async fn approve_photo(&self, _: &str, _: &str) -> Result<(), ApiError> {
            self.approvals.fetch_add(1, Ordering::SeqCst);
            if self.fail_approve {
                return Err(ApiError::Rejected {
                    status: 500,
                    message: "approval failed".to_string(),
                });
            }
            Ok(())
        }
        async fn send_user_details(&self, _: &str) -> Result<(), ApiError> {
            unsupported()
        }
        async fn send_play_signal(&self, _: &str, _: &[String], _: &str) -> Result<(), ApiError> {
            unsupported()
        }
        async fn send_standby_signal(&self, _: &str) -> Result<(), ApiError> {
            unsupported()
        }
        async fn update_show_status(&self, _: &str, _: &str) -> Result<Show, ApiError> {
            unsupported()
        }
        async fn update_show(&self, _: &str, _: ShowUpdate) -> Result<Show, ApiError> {
            unsupported()
        }
        async fn remove_user_from_show(&self, _: &str, _: &str) -> Result<Show, ApiError> {
            unsupported()
        }
        async fn delete_show(&self, _: &str) -> Result<(), ApiError> {
            unsupported()
        }
    }

    async fn next_snapshot(rx: &mut mpsc::Receiver<CaptureEvent>) -> CaptureSession {
        loop {
            match rx.recv().await.expect("tracker event") {
                CaptureEvent::SessionUpdated(session) => return session,
                CaptureEvent::Error(e) => panic!("unexpected tracker error: {}", e),
            }
        }
    }

    #[tokio::test]
    async fn capture_assigns_session_and_fetches_photos() {
        let api = Arc::new(StubApi::default());
        api.photos.lock().unwrap().push(Photo {
            id: "p1".to_string(),
            url: "http://photos/p1.jpg".to_string(),
        });
        let (tx, mut rx, handle) =
            CaptureTracker::spawn(api.clone(), Duration::from_secs(3600));

        tx.send(CaptureCommand::Capture {
            show_id: "show-1".to_string(),
            user_ids: vec!["u1".to_string()],
        })
        .await
        .unwrap();

        let session = next_snapshot(&mut rx).await;
        assert_eq!(session.session_id(), Some("sess-1"));
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.photos().len(), 1);
        assert_eq!(api.captures.load(Ordering::SeqCst), 1);

        tx.send(CaptureCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn fourth_capture_is_refused_without_a_network_call() {
        let api = Arc::new(StubApi::default());
        let (tx, mut rx, handle) =
            CaptureTracker::spawn(api.clone(), Duration::from_secs(3600));

        for _ in 0..3 {
            tx.send(CaptureCommand::Capture {
                show_id: "show-1".to_string(),
                user_ids: vec![],
            })
            .await
            .unwrap();
            next_snapshot(&mut rx).await;
        }

        tx.send(CaptureCommand::Capture {
            show_id: "show-1".to_string(),
            user_ids: vec![],
        })
        .await
        .unwrap();
        match rx.recv().await.unwrap() {
            CaptureEvent::Error(msg) => assert!(msg.contains("capture limit")),
            other => panic!("expected error event, got {:?}", other),
        }
        assert_eq!(api.captures.load(Ordering::SeqCst), 3);

        tx.send(CaptureCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn approval_resets_the_session() {
        let api = Arc::new(StubApi::default());
        api.photos.lock().unwrap().push(Photo {
            id: "p1".to_string(),
            url: "http://photos/p1.jpg".to_string(),
        });
        let (tx, mut rx, handle) =
            CaptureTracker::spawn(api.clone(), Duration::from_secs(3600));

        tx.send(CaptureCommand::Capture {
            show_id: "show-1".to_string(),
            user_ids: vec![],
        })
        .await
        .unwrap();
        next_snapshot(&mut rx).await;

        tx.send(CaptureCommand::SelectPhoto {
            photo_id: "p1".to_string(),
        })
        .await
        .unwrap();
        let session = next_snapshot(&mut rx).await;
        assert_eq!(session.selected_photo(), Some("p1"));

        tx.send(CaptureCommand::Approve).await.unwrap();
        let session = next_snapshot(&mut rx).await;
        assert!(!session.is_active());
        assert_eq!(session.attempts(), 0);
        assert!(session.photos().is_empty());
        assert!(session.selected_photo().is_none());
        assert_eq!(api.approvals.load(Ordering::SeqCst), 1);

        tx.send(CaptureCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn polling_runs_while_active_and_stops_on_shutdown() {
        let api = Arc::new(StubApi::default());
        let (tx, mut rx, handle) =
            CaptureTracker::spawn(api.clone(), Duration::from_millis(20));

        // Idle: the poll branch is disarmed, no fetches happen.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(api.photo_fetches.load(Ordering::SeqCst), 0);

        tx.send(CaptureCommand::Capture {
            show_id: "show-1".to_string(),
            user_ids: vec![],
        })
        .await
        .unwrap();
        next_snapshot(&mut rx).await;

        // Active: the interval drives repeated fetches (plus the immediate
        // post-capture one).
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(api.photo_fetches.load(Ordering::SeqCst) >= 2);

        tx.send(CaptureCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
        let after_shutdown = api.photo_fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(api.photo_fetches.load(Ordering::SeqCst), after_shutdown);
    }

    #[tokio::test]
    async fn failed_approval_keeps_the_session_interactive() {
        let api = Arc::new(StubApi {
            fail_approve: true,
            ..StubApi::default()
        });
        api.photos.lock().unwrap().push(Photo {
            id: "p1".to_string(),
            url: "http://photos/p1.jpg".to_string(),
        });
        let (tx, mut rx, handle) =
            CaptureTracker::spawn(api.clone(), Duration::from_secs(3600));

        tx.send(CaptureCommand::Capture {
            show_id: "show-1".to_string(),
            user_ids: vec![],
        })
        .await
        .unwrap();
        next_snapshot(&mut rx).await;
        tx.send(CaptureCommand::SelectPhoto {
            photo_id: "p1".to_string(),
        })
        .await
        .unwrap();
        next_snapshot(&mut rx).await;

        tx.send(CaptureCommand::Approve).await.unwrap();
        match rx.recv().await.unwrap() {
            CaptureEvent::Error(msg) => assert_eq!(msg, "approval failed"),
            other => panic!("expected error event, got {:?}", other),
        }

        // Session state survived the failure.
        tx.send(CaptureCommand::SelectPhoto {
            photo_id: "p1".to_string(),
        })
        .await
        .unwrap();
        let session = next_snapshot(&mut rx).await;
        assert!(session.is_active());

        tx.send(CaptureCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}
