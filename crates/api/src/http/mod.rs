//! reqwest-backed gateway speaking to the hosted test API.

mod wire;

use std::env;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use thiserror::Error;
use url::Url;

use exam_core::model::{AnswerValue, AttemptId, AttemptReport, QuestionId, Test, TestId};

use crate::credentials::{CredentialProvider, StaticToken};
use crate::gateway::{ApiError, AttemptGateway, TestGateway};

use self::wire::{AnswerBody, ErrorBody, ReportDoc, StartedAttemptDoc, TestDoc};

const BASE_URL_VAR: &str = "EXAM_API_URL";
const TOKEN_VAR: &str = "EXAM_API_TOKEN";

/// Connection settings for [`HttpGateway`].
#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl HttpConfig {
    /// Read settings from `EXAM_API_URL` and `EXAM_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError::MissingBaseUrl` when `EXAM_API_URL` is unset
    /// or blank. A missing token is fine; requests go out unauthenticated.
    pub fn from_env() -> Result<Self, HttpInitError> {
        let base_url = env::var(BASE_URL_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(HttpInitError::MissingBaseUrl)?;
        let token = env::var(TOKEN_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Ok(Self { base_url, token })
    }
}

/// Failures while building an [`HttpGateway`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpInitError {
    #[error("EXAM_API_URL is not set")]
    MissingBaseUrl,

    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Gateway for the hosted REST backend.
///
/// Endpoints mirror the server routes under `/api/v1/test`. Every request
/// carries a bearer token when the credential provider has one.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// Build a gateway for `base_url`, authenticating via `credentials`.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError::InvalidBaseUrl` unless `base_url` parses as
    /// an absolute `http` or `https` URL.
    pub fn new(
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, HttpInitError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|err| HttpInitError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpInitError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }

        Ok(Self {
            client: Client::new(),
            base: trimmed.to_string(),
            credentials,
        })
    }

    /// Build a gateway from [`HttpConfig`] with a static bearer token.
    ///
    /// # Errors
    ///
    /// Same as [`HttpGateway::new`].
    pub fn from_config(config: &HttpConfig) -> Result<Self, HttpInitError> {
        let credentials: Arc<dyn CredentialProvider> = match &config.token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(StaticToken::anonymous()),
        };
        Self::new(&config.base_url, credentials)
    }

    fn test_url(&self, id: TestId) -> String {
        format!("{}/api/v1/test/{id}", self.base)
    }

    fn start_url(&self, id: TestId) -> String {
        format!("{}/api/v1/test/{id}/start", self.base)
    }

    fn answer_url(&self, id: AttemptId) -> String {
        format!("{}/api/v1/test/submissions/{id}/answer", self.base)
    }

    fn submit_url(&self, id: AttemptId) -> String {
        format!("{}/api/v1/test/submissions/{id}/submit", self.base)
    }

    fn report_url(&self, id: AttemptId) -> String {
        format!("{}/api/v1/test/submissions/{id}", self.base)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Map a non-success status to the gateway error taxonomy.
///
/// `404` means the resource is gone, the attempt-policy statuses carry the
/// server's refusal, and everything else counts as transport trouble.
fn classify_status(status: StatusCode, detail: Option<String>) -> ApiError {
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN | StatusCode::CONFLICT => {
            ApiError::AttemptDenied {
                reason: detail.unwrap_or_else(|| format!("request rejected ({status})")),
            }
        }
        _ => match detail {
            Some(detail) => ApiError::transport(format!("server returned {status}: {detail}")),
            None => ApiError::transport(format!("server returned {status}")),
        },
    }
}

async fn fail_from_response(response: Response) -> ApiError {
    let status = response.status();
    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail)
        .filter(|detail| !detail.trim().is_empty());
    classify_status(status, detail)
}

#[async_trait]
impl TestGateway for HttpGateway {
    async fn fetch_test(&self, id: TestId) -> Result<Test, ApiError> {
        tracing::debug!(%id, "fetching test");
        let response = self
            .authorize(self.client.get(self.test_url(id)))
            .send()
            .await
            .map_err(ApiError::transport)?;
        if !response.status().is_success() {
            return Err(fail_from_response(response).await);
        }
        let doc: TestDoc = response.json().await.map_err(ApiError::transport)?;
        doc.into_domain()
    }
}

#[async_trait]
impl AttemptGateway for HttpGateway {
    async fn start_attempt(&self, test_id: TestId) -> Result<AttemptId, ApiError> {
        tracing::debug!(%test_id, "starting attempt");
        let response = self
            .authorize(self.client.post(self.start_url(test_id)))
            .send()
            .await
            .map_err(ApiError::transport)?;
        if !response.status().is_success() {
            return Err(fail_from_response(response).await);
        }
        let doc: StartedAttemptDoc = response.json().await.map_err(ApiError::transport)?;
        Ok(doc.attempt_id())
    }

    async fn save_answer(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        value: &AnswerValue,
    ) -> Result<(), ApiError> {
        tracing::debug!(%attempt_id, %question_id, "saving answer");
        let body = AnswerBody::new(question_id, value);
        let response = self
            .authorize(self.client.post(self.answer_url(attempt_id)))
            .json(&body)
            .send()
            .await
            .map_err(ApiError::transport)?;
        if !response.status().is_success() {
            return Err(fail_from_response(response).await);
        }
        Ok(())
    }

    async fn submit_attempt(&self, attempt_id: AttemptId) -> Result<(), ApiError> {
        tracing::debug!(%attempt_id, "submitting attempt");
        let response = self
            .authorize(self.client.post(self.submit_url(attempt_id)))
            .send()
            .await
            .map_err(ApiError::transport)?;
        if !response.status().is_success() {
            return Err(fail_from_response(response).await);
        }
        Ok(())
    }

    async fn fetch_report(&self, attempt_id: AttemptId) -> Result<AttemptReport, ApiError> {
        tracing::debug!(%attempt_id, "fetching report");
        let response = self
            .authorize(self.client.get(self.report_url(attempt_id)))
            .send()
            .await
            .map_err(ApiError::transport)?;
        if !response.status().is_success() {
            return Err(fail_from_response(response).await);
        }
        let doc: ReportDoc = response.json().await.map_err(ApiError::transport)?;
        doc.into_domain()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
