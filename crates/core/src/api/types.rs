use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capture::session::Photo;
use crate::show::show::Show;

/// The create-show response: the show itself plus the server-formatted
/// start/end strings shown in the scheduling confirmation.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatedShow {
    #[serde(flatten)]
    pub show: Show,
    pub start_time_formatted: String,
    pub end_time_formatted: String,
}

/// The capture response. The backend assigns the session id on the first
/// capture call and echoes it on later ones.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReceipt {
    pub session_id: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct PhotosResponse {
    #[serde(default)]
    pub photos: Vec<Photo>,
}

/// Editable show fields for `PATCH /shows/{id}`.
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShowUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
