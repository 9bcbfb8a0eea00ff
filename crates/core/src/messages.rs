use chrono::{DateTime, Utc};

use crate::api::types::ShowUpdate;
use crate::capture::session::CaptureSession;

/// Playback language selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Es,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            other => Err(format!(
                "unsupported language \"{}\" (expected \"en\" or \"es\")",
                other
            )),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Commands dispatched to the session console.
#[derive(Debug, Clone)]
pub enum ConsoleCommand {
    // Cache refresh
    RefreshShows,
    RefreshUsers,

    // Scheduling and editing
    ScheduleShow {
        start_time: DateTime<Utc>,
    },
    UpdateShow {
        show_id: String,
        update: ShowUpdate,
    },
    UpdateStatus {
        show_id: String,
        status: String,
    },
    RemoveUser {
        show_id: String,
        user_id: String,
    },
    DeleteShow {
        show_id: String,
    },

    // Assignment planning
    ToggleUser {
        user_id: String,
    },
    SelectShow {
        show_id: String,
    },
    AssignSelected,

    // Playback
    Play {
        show_id: String,
    },
    Standby {
        show_id: String,
    },

    // Photo capture
    Capture {
        show_id: String,
    },
    SelectPhoto {
        photo_id: String,
    },
    ApprovePhoto,

    Shutdown,
}

/// Events delivered on the console's event channel by its background tasks.
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    CaptureUpdated(CaptureSession),
    CaptureError(String),
    CountdownTick(u64),
    CountdownFinished,
}
