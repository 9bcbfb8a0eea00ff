use serde::{Deserialize, Serialize};

/// Maximum capture attempts per session before the capture action is
/// disabled.
pub const MAX_CAPTURE_ATTEMPTS: u8 = 3;

/// A photo attempt inside a capture session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Photo {
    #[serde(rename = "photoId")]
    pub id: String,
    pub url: String,
}

/// Client-side state of one photo-capture session.
///
/// Idle (no session id) -> Active (id assigned by the backend on the first
/// capture) -> Idle again on approval, which discards everything. The photo
/// list is replaced wholesale on every poll; last response wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaptureSession {
    session_id: Option<String>,
    photos: Vec<Photo>,
    attempts: u8,
    selected_photo: Option<String>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    pub fn selected_photo(&self) -> Option<&str> {
        self.selected_photo.as_deref()
    }

    /// Whether another capture may be issued.
    pub fn can_capture(&self) -> bool {
        self.attempts < MAX_CAPTURE_ATTEMPTS
    }

    /// Record a successful capture call. The backend assigns the session id
    /// on the first call and echoes it afterwards.
    pub fn record_capture(&mut self, session_id: String) {
        if self.session_id.is_none() {
            self.session_id = Some(session_id);
        }
        self.attempts += 1;
    }

    /// Replace the photo list with the latest poll response.
    pub fn set_photos(&mut self, photos: Vec<Photo>) {
        self.photos = photos;
    }

    /// Mark a photo as the approval candidate. Exactly one photo may be
    /// selected at a time.
    pub fn select_photo(&mut self, photo_id: &str) -> Result<(), String> {
        if !self.photos.iter().any(|p| p.id == photo_id) {
            return Err(format!("unknown photo id: {}", photo_id));
        }
        self.selected_photo = Some(photo_id.to_string());
        Ok(())
    }

    /// The (session, photo) pair an approve call would target, if both a
    /// session and a selection exist.
    pub fn approve_target(&self) -> Option<(&str, &str)> {
        match (self.session_id.as_deref(), self.selected_photo.as_deref()) {
            (Some(session), Some(photo)) => Some((session, photo)),
            _ => None,
        }
    }

    /// Approval is terminal: drop the session id, photo list, attempt
    /// counter, and selection.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
