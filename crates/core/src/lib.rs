pub use api::client::{ApiClient, ShowApi, SUPPORTED_LANGUAGES};
pub use api::error::ApiError;
pub use api::types::{CaptureReceipt, CreatedShow, ShowUpdate};
pub use capture::session::{CaptureSession, Photo, MAX_CAPTURE_ATTEMPTS};
pub use capture::tracker::{CaptureCommand, CaptureEvent, CaptureTracker, DEFAULT_POLL_INTERVAL};
pub use config::{
    resolve_base_url, ConfigError, ConfigManager, Settings, API_URL_ENV_VAR, DEFAULT_API_BASE_URL,
};
pub use console::SessionConsole;
pub use messages::{ConsoleCommand, ConsoleEvent, Language};
pub use playback::countdown::{Countdown, COUNTDOWN_TICK, PLAYBACK_OVERLAY_SECS};
pub use playback::sequencer::{run_play_sequence, send_standby, PlayStep, PlaybackError};
pub use show::assignment::{AssignmentBatch, AssignmentPlanner, MAX_SELECTED};
pub use show::show::{
    merge_show, Participant, Show, DEFAULT_SHOW_DURATION_MINS, SHOW_CAPACITY, STATUS_PLAYED,
    STATUS_SCHEDULED,
};

mod api;
mod capture;
mod config;
mod console;
pub mod messages;
mod playback;
mod show;
