//! REST client for the remote game API (`/validate` and `/ai-move`).

use super::{
    MoveRequest, MoveResponse, MoveService, MoveValidator, ServiceError, ServiceErrorKind,
    ValidationRequest, Verdict,
};
use crate::games::catchup::Move;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// HTTP client for the remote validator and bot move service.
#[derive(Debug, Clone)]
pub struct RestGameApi {
    base_url: String,
    client: reqwest::Client,
}

impl RestGameApi {
    /// Creates a client for `base_url` with a per-request timeout.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        info!(timeout_ms = timeout.as_millis() as u64, "Created game API client");
        Ok(Self { base_url, client })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ServiceError>
    where
        Req: serde::Serialize + ?Sized,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Sending request");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "Game API returned an error status");
            return Err(ServiceError::new(
                ServiceErrorKind::Status,
                format!("HTTP {} from {}", status, path),
            ));
        }

        let parsed = response.json::<Resp>().await.map_err(|e| {
            ServiceError::new(ServiceErrorKind::Decode, format!("Bad response from {}: {}", path, e))
        })?;
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl MoveValidator for RestGameApi {
    #[instrument(skip(self, request), fields(proposed = ?request.proposed))]
    async fn validate(&self, request: &ValidationRequest) -> Result<Verdict, ServiceError> {
        let verdict: Verdict = self.post("validate", request).await?;
        debug!(valid = verdict.valid, reason = ?verdict.reason, "Validator answered");
        Ok(verdict)
    }
}

#[async_trait::async_trait]
impl MoveService for RestGameApi {
    #[instrument(skip(self, request), fields(difficulty = request.difficulty, is_p1_turn = request.is_p1_turn))]
    async fn request_move(&self, request: &MoveRequest) -> Result<Move, ServiceError> {
        let response: MoveResponse = self.post("ai-move", request).await?;

        let numbers = response.numbers.ok_or_else(|| {
            ServiceError::new(ServiceErrorKind::Rejected, "AI service returned no move")
        })?;

        let mv = Move::new(numbers).map_err(|e| {
            ServiceError::new(ServiceErrorKind::Decode, format!("AI service returned a malformed move: {}", e))
        })?;
        debug!(%mv, "AI service proposed move");
        Ok(mv)
    }

    fn name(&self) -> &str {
        "remote AI"
    }
}
