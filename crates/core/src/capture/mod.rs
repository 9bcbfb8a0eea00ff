pub mod session;
pub mod tracker;

pub use session::{CaptureSession, Photo, MAX_CAPTURE_ATTEMPTS};
pub use tracker::{CaptureCommand, CaptureEvent, CaptureTracker, DEFAULT_POLL_INTERVAL};
