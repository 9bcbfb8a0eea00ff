pub mod countdown;
pub mod sequencer;

pub use countdown::{Countdown, COUNTDOWN_TICK, PLAYBACK_OVERLAY_SECS};
pub use sequencer::{run_play_sequence, send_standby, PlayStep, PlaybackError};
