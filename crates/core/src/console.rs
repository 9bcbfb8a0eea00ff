use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::client::ShowApi;
use crate::api::types::ShowUpdate;
use crate::capture::tracker::{CaptureCommand, CaptureEvent, CaptureTracker};
use crate::messages::{ConsoleCommand, ConsoleEvent, Language};
use crate::playback::countdown::{Countdown, COUNTDOWN_TICK};
use crate::playback::sequencer::{run_play_sequence, send_standby};
use crate::show::assignment::AssignmentPlanner;
use crate::show::show::{merge_show, Participant, Show};

/// Owned, mutable per-session state: the show and waiting-user caches, the
/// assignment planner, the capture tracker's channels, the countdown handle,
/// and the mutually-exclusive success/error banners. All of it is discarded
/// when the console is dropped; the backend owns the real state.
pub struct SessionConsole {
    api: Arc<dyn ShowApi>,
    language: Language,
    countdown_secs: u64,
    shows: Vec<Show>,
    waiting_users: Vec<Participant>,
    planner: AssignmentPlanner,
    capture_tx: mpsc::Sender<CaptureCommand>,
    capture_handle: Option<JoinHandle<()>>,
    forward_handle: Option<JoinHandle<()>>,
    countdown: Option<Countdown>,
    events_tx: mpsc::Sender<ConsoleEvent>,
    playing_show: Option<String>,
    error: Option<String>,
    success: Option<String>,
}

impl SessionConsole {
    /// Build the console and spawn its capture tracker. The returned
    /// receiver carries capture snapshots and countdown ticks for the shell
    /// to render.
    pub fn new(
        api: Arc<dyn ShowApi>,
        language: Language,
        poll_interval: Duration,
        countdown_secs: u64,
    ) -> (Self, mpsc::Receiver<ConsoleEvent>) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let (capture_tx, mut capture_events, capture_handle) =
            CaptureTracker::spawn(api.clone(), poll_interval);

        // Funnel tracker events onto the console's single event channel.
        let forward_tx = events_tx.clone();
        let forward_handle = tokio::spawn(async move {
            while let Some(event) = capture_events.recv().await {
                let mapped = match event {
                    CaptureEvent::SessionUpdated(session) => ConsoleEvent::CaptureUpdated(session),
                    CaptureEvent::Error(message) => ConsoleEvent::CaptureError(message),
                };
                if forward_tx.send(mapped).await.is_err() {
                    break;
                }
            }
        });

        let console = Self {
            api,
            language,
            countdown_secs,
            shows: Vec::new(),
            waiting_users: Vec::new(),
            planner: AssignmentPlanner::new(),
            capture_tx,
            capture_handle: Some(capture_handle),
            forward_handle: Some(forward_handle),
            countdown: None,
            events_tx,
            playing_show: None,
            error: None,
            success: None,
        };
        (console, events_rx)
    }

    /// Execute one command. Banners from the previous action are cleared
    /// first. Returns `false` once the console has shut down.
    pub async fn execute(&mut self, command: ConsoleCommand) -> bool {
        self.error = None;
        self.success = None;

        match command {
            ConsoleCommand::RefreshShows => self.refresh_shows().await,
            ConsoleCommand::RefreshUsers => self.refresh_users().await,
            ConsoleCommand::ScheduleShow { start_time } => {
                match self.api.create_show(start_time).await {
                    Ok(created) => {
                        self.success = Some(format!(
                            "Show scheduled successfully! Start: {} End: {}",
                            created.start_time_formatted, created.end_time_formatted
                        ));
                    }
                    Err(e) => self.error = Some(e.to_string()),
                }
            }
            ConsoleCommand::UpdateShow { show_id, update } => {
                match self.api.update_show(&show_id, update).await {
                    Ok(updated) => {
                        merge_show(&mut self.shows, updated);
                        self.success = Some("Show updated".to_string());
                    }
                    Err(e) => self.error = Some(e.to_string()),
                }
            }
            ConsoleCommand::UpdateStatus { show_id, status } => {
                match self.api.update_show_status(&show_id, &status).await {
                    Ok(updated) => {
                        merge_show(&mut self.shows, updated);
                        self.success = Some("Show status updated".to_string());
                    }
                    Err(e) => self.error = Some(e.to_string()),
                }
            }
            ConsoleCommand::RemoveUser { show_id, user_id } => {
                match self.api.remove_user_from_show(&show_id, &user_id).await {
                    Ok(updated) => {
                        merge_show(&mut self.shows, updated);
                        self.success = Some("User removed successfully".to_string());
                    }
                    Err(e) => self.error = Some(e.to_string()),
                }
            }
            ConsoleCommand::DeleteShow { show_id } => {
                match self.api.delete_show(&show_id).await {
                    Ok(()) => {
                        self.shows.retain(|s| s.id != show_id);
                        self.success = Some("Show deleted successfully".to_string());
                    }
                    Err(e) => self.error = Some(e.to_string()),
                }
            }
            ConsoleCommand::ToggleUser { user_id } => self.toggle_user(&user_id),
            ConsoleCommand::SelectShow { show_id } => self.select_show(&show_id),
            ConsoleCommand::AssignSelected => self.assign_selected().await,
            ConsoleCommand::Play { show_id } => self.play(&show_id).await,
            ConsoleCommand::Standby { show_id } => self.standby(&show_id).await,
            ConsoleCommand::Capture { show_id } => self.capture(&show_id).await,
            ConsoleCommand::SelectPhoto { photo_id } => {
                self.send_capture(CaptureCommand::SelectPhoto { photo_id }).await;
            }
            ConsoleCommand::ApprovePhoto => {
                self.send_capture(CaptureCommand::Approve).await;
            }
            ConsoleCommand::Shutdown => {
                self.shutdown().await;
                return false;
            }
        }
        true
    }

    async fn refresh_shows(&mut self) {
        match self.api.fetch_available_shows().await {
            Ok(shows) => self.shows = shows,
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    async fn refresh_users(&mut self) {
        match self.api.fetch_waiting_users().await {
            Ok(users) => self.waiting_users = users,
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn toggle_user(&mut self, user_id: &str) {
        let user = match self.waiting_users.iter().find(|u| u.id == user_id) {
            Some(user) => user.clone(),
            None => {
                self.error = Some(format!("unknown user id: {}", user_id));
                return;
            }
        };
        if let Err(msg) = self.planner.toggle_user(&user) {
            self.error = Some(msg);
        }
    }

    fn select_show(&mut self, show_id: &str) {
        let show = match self.shows.iter().find(|s| s.id == show_id) {
            Some(show) => show.clone(),
            None => {
                self.error = Some(format!("unknown show id: {}", show_id));
                return;
            }
        };
        if let Err(msg) = self.planner.select_show(&show) {
            self.error = Some(msg);
        }
    }

    /// Fire one assignment call per selected participant, concurrently.
    /// Best-effort batch: every issued call runs to completion, the first
    /// failure is surfaced, nothing is rolled back. Both caches are
    /// refreshed afterwards so the backend's actual state is shown.
    async fn assign_selected(&mut self) {
        let batch = match self.planner.plan() {
            Ok(batch) => batch,
            Err(msg) => {
                self.error = Some(msg);
                return;
            }
        };

        let api = &self.api;
        let results = join_all(
            batch
                .user_ids
                .iter()
                .map(|user_id| api.assign_user_to_show(user_id, &batch.show_id)),
        )
        .await;

        let assigned = results.iter().filter(|r| r.is_ok()).count();
        match results.into_iter().find_map(|r| r.err()) {
            Some(first_error) => {
                log::warn!(
                    "assignment batch: {}/{} calls succeeded before surfacing: {}",
                    assigned,
                    batch.user_ids.len(),
                    first_error
                );
                self.error = Some(first_error.to_string());
            }
            None => {
                self.planner.clear();
                self.success = Some(format!(
                    "Successfully assigned {} user(s) to the show",
                    assigned
                ));
            }
        }

        // Re-read both caches; partial assignment is visible rather than
        // patched over. Banner from the batch outcome is kept.
        if let Ok(shows) = self.api.fetch_available_shows().await {
            self.shows = shows;
        }
        if let Ok(users) = self.api.fetch_waiting_users().await {
            self.waiting_users = users;
        }
    }

    async fn play(&mut self, show_id: &str) {
        let show = match self.shows.iter().find(|s| s.id == show_id) {
            Some(show) => show.clone(),
            None => {
                self.error = Some(format!("unknown show id: {}", show_id));
                return;
            }
        };
        match run_play_sequence(self.api.as_ref(), &show, self.language).await {
            Ok(updated) => {
                merge_show(&mut self.shows, updated);
                self.playing_show = Some(show.id.clone());
                // Restart the overlay countdown for the new playback.
                self.countdown = Some(Countdown::start(
                    self.countdown_secs,
                    COUNTDOWN_TICK,
                    self.events_tx.clone(),
                ));
                self.success = Some(match self.language {
                    Language::En => "Show is now playing".to_string(),
                    Language::Es => "El show se está reproduciendo".to_string(),
                });
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    async fn standby(&mut self, show_id: &str) {
        match send_standby(self.api.as_ref(), show_id).await {
            Ok(()) => {
                self.playing_show = None;
                self.countdown = None;
                self.success = Some(match self.language {
                    Language::En => "Show placed on standby".to_string(),
                    Language::Es => "El show está en espera".to_string(),
                });
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    async fn capture(&mut self, show_id: &str) {
        let user_ids = match self.shows.iter().find(|s| s.id == show_id) {
            Some(show) => show.participant_ids(),
            None => {
                self.error = Some(format!("unknown show id: {}", show_id));
                return;
            }
        };
        self.send_capture(CaptureCommand::Capture {
            show_id: show_id.to_string(),
            user_ids,
        })
        .await;
    }

    async fn send_capture(&mut self, command: CaptureCommand) {
        if self.capture_tx.send(command).await.is_err() {
            self.error = Some("capture tracker is not running".to_string());
        }
    }

    /// Tear down background work: the capture tracker, its forwarder, and
    /// any running countdown.
    pub async fn shutdown(&mut self) {
        let _ = self.capture_tx.send(CaptureCommand::Shutdown).await;
        self.countdown = None;
        if let Some(handle) = self.capture_handle.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.forward_handle.take() {
            // The tracker is gone; nothing left worth forwarding.
            handle.abort();
            let _ = handle.await;
        }
    }

    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    pub fn waiting_users(&self) -> &[Participant] {
        &self.waiting_users
    }

    pub fn selected_users(&self) -> &[Participant] {
        self.planner.selected()
    }

    pub fn target_show(&self) -> Option<&Show> {
        self.planner.target_show()
    }

    pub fn playing_show(&self) -> Option<&str> {
        self.playing_show.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing_show.is_some()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }
}
