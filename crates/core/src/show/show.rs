use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of participants a show can hold.
pub const SHOW_CAPACITY: usize = 4;

/// Default show length in minutes.
pub const DEFAULT_SHOW_DURATION_MINS: i64 = 15;

pub const STATUS_SCHEDULED: &str = "scheduled";

/// Status marker written after a successful play sequence. The backend treats
/// status as free text, so this is a constant rather than an enum variant.
pub const STATUS_PLAYED: &str = "ha sido reproducido";

/// A participant waiting for, or assigned to, a show. The descriptive
/// attributes are opaque to this client; they are displayed during playback
/// and forwarded verbatim in the participant-detail signal.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engraving: Option<String>,
}

/// A scheduled timed session with up to four assigned participants. The wire
/// form keeps the backend's field names ("clients" for the roster).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    #[serde(rename = "_id")]
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub duration: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "clients")]
    pub participants: Vec<Participant>,
}

impl Show {
    /// Scheduled end time, derived from the start time and duration.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(self.duration)
    }

    /// How many more participants this show can accept.
    pub fn remaining_capacity(&self) -> usize {
        SHOW_CAPACITY.saturating_sub(self.participants.len())
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= SHOW_CAPACITY
    }

    pub fn participant_ids(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.id.clone()).collect()
    }
}

/// Replace the cached show matching `updated` by id, preserving list order.
/// Shows the cache has never seen are left alone; the next refresh picks
/// them up.
pub fn merge_show(shows: &mut [Show], updated: Show) {
    if let Some(slot) = shows.iter_mut().find(|s| s.id == updated.id) {
        *slot = updated;
    }
}
