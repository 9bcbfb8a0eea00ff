use crate::api::client::ShowApi;
use crate::api::error::ApiError;
use crate::messages::Language;
use crate::show::show::{Show, STATUS_PLAYED};

/// The three ordered steps of the play protocol. Each step's success is a
/// precondition for the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStep {
    UserDetails,
    PlaySignal,
    StatusUpdate,
}

impl PlayStep {
    fn describe(&self, language: Language) -> &'static str {
        match (self, language) {
            (PlayStep::UserDetails, Language::En) => "sending participant details",
            (PlayStep::UserDetails, Language::Es) => "el envío de los datos de los participantes",
            (PlayStep::PlaySignal, Language::En) => "sending the play signal",
            (PlayStep::PlaySignal, Language::Es) => "el envío de la señal de reproducción",
            (PlayStep::StatusUpdate, Language::En) => "updating the show status",
            (PlayStep::StatusUpdate, Language::Es) => "la actualización del estado del show",
        }
    }
}

/// A play-sequence failure, tagged with the step that aborted the pipeline
/// and rendered in the selected language.
#[derive(Debug)]
pub struct PlaybackError {
    pub step: PlayStep,
    pub source: ApiError,
    language: Language,
}

impl std::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.language {
            Language::En => write!(
                f,
                "Playback failed while {}: {}",
                self.step.describe(self.language),
                self.source
            ),
            Language::Es => write!(
                f,
                "La reproducción falló durante {}: {}",
                self.step.describe(self.language),
                self.source
            ),
        }
    }
}

impl std::error::Error for PlaybackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Run the strict three-step play sequence for `show`:
/// 1. forward the show's roster to the participant-detail signaling endpoint;
/// 2. send the play signal with the show id, participant ids, and language;
/// 3. mark the show as played and return the updated show for a keyed merge.
///
/// The first failure aborts the remaining steps; the caller must only flip
/// its playing state when this returns `Ok`.
pub async fn run_play_sequence(
    api: &dyn ShowApi,
    show: &Show,
    language: Language,
) -> Result<Show, PlaybackError> {
    let fail = |step: PlayStep| move |source: ApiError| PlaybackError {
        step,
        source,
        language,
    };

    api.send_user_details(&show.id)
        .await
        .map_err(fail(PlayStep::UserDetails))?;

    let user_ids = show.participant_ids();
    api.send_play_signal(&show.id, &user_ids, language.code())
        .await
        .map_err(fail(PlayStep::PlaySignal))?;

    let updated = api
        .update_show_status(&show.id, STATUS_PLAYED)
        .await
        .map_err(fail(PlayStep::StatusUpdate))?;

    log::info!("show {} played ({} participants)", show.id, user_ids.len());
    Ok(updated)
}

/// Send the standby signal. On success the caller resets its playing flag
/// and cancels the countdown overlay.
pub async fn send_standby(api: &dyn ShowApi, show_id: &str) -> Result<(), ApiError> {
    api.send_standby_signal(show_id).await
}
