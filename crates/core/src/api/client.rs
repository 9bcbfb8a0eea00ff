use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::types::{CaptureReceipt, CreatedShow, ErrorBody, PhotosResponse, ShowUpdate};
use crate::capture::session::Photo;
use crate::show::show::{Participant, Show, DEFAULT_SHOW_DURATION_MINS};

/// Languages the play signal accepts.
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["en", "es"];

/// The backend surface the console, sequencer, and tracker are driven
/// through. Implemented by [`ApiClient`] in production and by stubs in tests.
#[async_trait]
pub trait ShowApi: Send + Sync {
    async fn create_show(&self, start_time: DateTime<Utc>) -> Result<CreatedShow, ApiError>;
    async fn fetch_waiting_users(&self) -> Result<Vec<Participant>, ApiError>;
    async fn fetch_available_shows(&self) -> Result<Vec<Show>, ApiError>;
    async fn fetch_show(&self, show_id: &str) -> Result<Show, ApiError>;
    async fn assign_user_to_show(&self, user_id: &str, show_id: &str) -> Result<(), ApiError>;
    async fn capture_photo(
        &self,
        session_id: Option<&str>,
        show_id: &str,
        user_ids: &[String],
        timestamp: DateTime<Utc>,
    ) -> Result<CaptureReceipt, ApiError>;
    async fn fetch_photos(&self, session_id: &str) -> Result<Vec<Photo>, ApiError>;
    async fn approve_photo(&self, session_id: &str, photo_id: &str) -> Result<(), ApiError>;
    async fn send_user_details(&self, show_id: &str) -> Result<(), ApiError>;
    async fn send_play_signal(
        &self,
        show_id: &str,
        user_ids: &[String],
        language: &str,
    ) -> Result<(), ApiError>;
    async fn send_standby_signal(&self, show_id: &str) -> Result<(), ApiError>;
    async fn update_show_status(&self, show_id: &str, status: &str) -> Result<Show, ApiError>;
    async fn update_show(&self, show_id: &str, update: ShowUpdate) -> Result<Show, ApiError>;
    async fn remove_user_from_show(&self, show_id: &str, user_id: &str) -> Result<Show, ApiError>;
    async fn delete_show(&self, show_id: &str) -> Result<(), ApiError>;
}

/// Thin typed wrapper over the backend REST surface. One HTTP request per
/// operation, JSON throughout, no retries; a failed call surfaces
/// immediately to the caller.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    /// Check the response status; on a non-2xx, decode the `{"message"}`
    /// error body and fall back to `fallback` when it is absent.
    async fn check(resp: reqwest::Response, fallback: &str) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| fallback.to_string());
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let resp = Self::check(resp, fallback).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ShowApi for ApiClient {
    async fn create_show(&self, start_time: DateTime<Utc>) -> Result<CreatedShow, ApiError> {
        let resp = self
            .send(self.http.post(self.url("/shows")).json(&json!({
                "startTime": start_time,
                "duration": DEFAULT_SHOW_DURATION_MINS,
            })))
            .await?;
        Self::decode(resp, "Failed to schedule show").await
    }

    async fn fetch_waiting_users(&self) -> Result<Vec<Participant>, ApiError> {
        let resp = self.send(self.http.get(self.url("/users/waiting"))).await?;
        Self::decode(resp, "Failed to fetch users").await
    }

    async fn fetch_available_shows(&self) -> Result<Vec<Show>, ApiError> {
        let resp = self.send(self.http.get(self.url("/shows/available"))).await?;
        Self::decode(resp, "Failed to fetch shows").await
    }

    async fn fetch_show(&self, show_id: &str) -> Result<Show, ApiError> {
        let resp = self
            .send(self.http.get(self.url(&format!("/shows/{}", show_id))))
            .await?;
        Self::decode(resp, "Failed to fetch show").await
    }

    async fn assign_user_to_show(&self, user_id: &str, show_id: &str) -> Result<(), ApiError> {
        let resp = self
            .send(
                self.http
                    .patch(self.url(&format!("/users/{}/show", user_id)))
                    .json(&json!({ "showId": show_id })),
            )
            .await?;
        Self::check(resp, "Failed to assign user to show").await?;
        Ok(())
    }

    async fn capture_photo(
        &self,
        session_id: Option<&str>,
        show_id: &str,
        user_ids: &[String],
        timestamp: DateTime<Utc>,
    ) -> Result<CaptureReceipt, ApiError> {
        let resp = self
            .send(self.http.post(self.url("/photos/capture")).json(&json!({
                "sessionId": session_id,
                "showId": show_id,
                "userIds": user_ids,
                "timestamp": timestamp,
            })))
            .await?;
        Self::decode(resp, "Failed to capture photo").await
    }

    async fn fetch_photos(&self, session_id: &str) -> Result<Vec<Photo>, ApiError> {
        let resp = self
            .send(
                self.http
                    .get(self.url("/photos"))
                    .query(&[("sessionId", session_id)]),
            )
            .await?;
        let body: PhotosResponse = Self::decode(resp, "Failed to fetch photos").await?;
        Ok(body.photos)
    }

    async fn approve_photo(&self, session_id: &str, photo_id: &str) -> Result<(), ApiError> {
        let resp = self
            .send(self.http.post(self.url("/photos/approve")).json(&json!({
                "sessionId": session_id,
                "photoId": photo_id,
            })))
            .await?;
        Self::check(resp, "Failed to approve photo").await?;
        Ok(())
    }

    async fn send_user_details(&self, show_id: &str) -> Result<(), ApiError> {
        // Forward the show's current roster to the signaling endpoint.
        let show = self.fetch_show(show_id).await?;
        let resp = self
            .send(self.http.post(self.url("/osc/send-users")).json(&json!({
                "showId": show_id,
                "users": show.participants,
            })))
            .await?;
        Self::check(resp, "Failed to send user details").await?;
        Ok(())
    }

    async fn send_play_signal(
        &self,
        show_id: &str,
        user_ids: &[String],
        language: &str,
    ) -> Result<(), ApiError> {
        if show_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("missing show id".to_string()));
        }
        if !SUPPORTED_LANGUAGES.contains(&language) {
            return Err(ApiError::InvalidRequest(format!(
                "invalid language \"{}\" (expected one of: {})",
                language,
                SUPPORTED_LANGUAGES.join(", ")
            )));
        }
        let resp = self
            .send(self.http.post(self.url("/osc/play")).json(&json!({
                "showId": show_id,
                "userIds": user_ids,
                "language": language,
            })))
            .await?;
        Self::check(resp, "Failed to send play signal").await?;
        Ok(())
    }

    async fn send_standby_signal(&self, show_id: &str) -> Result<(), ApiError> {
        let resp = self
            .send(
                self.http
                    .post(self.url("/osc/standby"))
                    .json(&json!({ "showId": show_id })),
            )
            .await?;
        Self::check(resp, "Failed to send standby signal").await?;
        Ok(())
    }

    async fn update_show_status(&self, show_id: &str, status: &str) -> Result<Show, ApiError> {
        let resp = self
            .send(
                self.http
                    .patch(self.url(&format!("/shows/{}/status", show_id)))
                    .json(&json!({ "status": status })),
            )
            .await?;
        Self::decode(resp, "Failed to update show status").await
    }

    async fn update_show(&self, show_id: &str, update: ShowUpdate) -> Result<Show, ApiError> {
        let resp = self
            .send(
                self.http
                    .patch(self.url(&format!("/shows/{}", show_id)))
                    .json(&update),
            )
            .await?;
        Self::decode(resp, "Failed to update show").await
    }

    async fn remove_user_from_show(&self, show_id: &str, user_id: &str) -> Result<Show, ApiError> {
        let resp = self
            .send(
                self.http
                    .patch(self.url(&format!("/shows/{}/remove-user/{}", show_id, user_id))),
            )
            .await?;
        Self::decode(resp, "Failed to remove user").await
    }

    async fn delete_show(&self, show_id: &str) -> Result<(), ApiError> {
        let resp = self
            .send(self.http.delete(self.url(&format!("/shows/{}", show_id))))
            .await?;
        Self::check(resp, "Failed to delete show").await?;
        Ok(())
    }
}
