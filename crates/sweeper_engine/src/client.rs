//! HTTP adapter for the chat service. Wire DTOs stay private to this module
//! and are mapped onto core entities before anything else sees them.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sweeper_core::{ContainerId, ContainerInfo, ContainerKind, MediaKind, Message, MessageId};

use crate::{ApiError, ApiFailure};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub token: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Messages requested per history page.
    pub page_size: usize,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            page_size: 200,
        }
    }
}

/// Sequential source of message records. Lazy, finite, and non-restartable
/// within one run: once a page is consumed the cursor has moved on.
#[async_trait]
pub trait MessageSource: Send {
    /// The next page of history, newest first. `None` once exhausted.
    async fn next_page(&mut self) -> Result<Option<Vec<Message>>, ApiError>;
}

/// Bulk-delete operation. A call succeeds or fails as a unit; partial
/// deletion is never reported.
#[async_trait]
pub trait BatchDeleter: Send + Sync {
    async fn delete_batch(
        &self,
        container: ContainerId,
        ids: &[MessageId],
    ) -> Result<(), ApiError>;
}

/// Bearer-token client for the chat service's JSON API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    settings: ClientSettings,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        reqwest::Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(ApiFailure::InvalidBaseUrl, err.to_string()))?;

        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiFailure::Network, err.to_string()))?;

        Ok(Self { settings, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Resolve container metadata. Failure here is fatal to a run: the scan
    /// never starts against a container that cannot be looked up.
    pub async fn resolve(&self, container: ContainerId) -> Result<ContainerInfo, ApiError> {
        let url = self.endpoint(&format!("v1/chats/{container}"));
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.settings.token)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response)?;
        let dto: ContainerDto = response
            .json()
            .await
            .map_err(|err| ApiError::new(ApiFailure::MalformedResponse, err.to_string()))?;
        Ok(dto.into_info())
    }

    /// Begin reading the container's history, newest first. The returned
    /// stream owns its cursor and cannot be restarted.
    pub fn history(&self, container: ContainerId) -> HistoryStream {
        HistoryStream {
            client: self.clone(),
            container,
            before_id: None,
            exhausted: false,
        }
    }
}

#[async_trait]
impl BatchDeleter for ChatClient {
    async fn delete_batch(
        &self,
        container: ContainerId,
        ids: &[MessageId],
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("v1/chats/{container}/messages/delete"));
        let body = DeleteRequest {
            message_ids: ids.iter().map(|id| id.0).collect(),
        };
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response)?;
        Ok(())
    }
}

/// Cursor over one container's history.
pub struct HistoryStream {
    client: ChatClient,
    container: ContainerId,
    before_id: Option<i64>,
    exhausted: bool,
}

#[async_trait]
impl MessageSource for HistoryStream {
    async fn next_page(&mut self) -> Result<Option<Vec<Message>>, ApiError> {
        if self.exhausted {
            return Ok(None);
        }

        let url = self
            .client
            .endpoint(&format!("v1/chats/{}/messages", self.container));
        let mut request = self
            .client
            .http
            .get(&url)
            .bearer_auth(&self.client.settings.token)
            .query(&[("limit", self.client.settings.page_size.to_string())]);
        if let Some(before) = self.before_id {
            request = request.query(&[("before_id", before.to_string())]);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let response = check_status(response)?;
        let page: HistoryPageDto = response
            .json()
            .await
            .map_err(|err| ApiError::new(ApiFailure::MalformedResponse, err.to_string()))?;

        if page.messages.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        // Pages are newest-first; the next page starts before the oldest id
        // seen so far.
        self.before_id = page.messages.iter().map(|m| m.id).min();
        let messages = page
            .messages
            .into_iter()
            .map(MessageDto::into_message)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(messages))
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let kind = match status.as_u16() {
        401 | 403 => ApiFailure::Unauthorized,
        404 => ApiFailure::ContainerNotFound,
        code => ApiFailure::HttpStatus(code),
    };
    Err(ApiError::new(kind, status.to_string()))
}

fn map_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiFailure::Timeout, err.to_string());
    }
    ApiError::new(ApiFailure::Network, err.to_string())
}

#[derive(Debug, Deserialize)]
struct ContainerDto {
    id: i64,
    title: Option<String>,
    username: Option<String>,
    #[serde(rename = "type")]
    kind: ContainerKind,
}

impl ContainerDto {
    fn into_info(self) -> ContainerInfo {
        let title = self
            .title
            .or(self.username)
            .unwrap_or_else(|| self.id.to_string());
        ContainerInfo {
            id: ContainerId(self.id),
            title,
            kind: self.kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryPageDto {
    messages: Vec<MessageDto>,
}

#[derive(Debug, Deserialize)]
struct MessageDto {
    id: i64,
    /// Unix seconds, as the source delivers timestamps.
    date: i64,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    media: Option<MediaDto>,
}

#[derive(Debug, Deserialize)]
struct MediaDto {
    kind: MediaKind,
}

impl MessageDto {
    fn into_message(self) -> Result<Message, ApiError> {
        let date = DateTime::<Utc>::from_timestamp(self.date, 0).ok_or_else(|| {
            ApiError::new(
                ApiFailure::MalformedResponse,
                format!("message {} has an out-of-range date {}", self.id, self.date),
            )
        })?;
        Ok(Message {
            id: MessageId(self.id),
            date,
            text: self.text,
            media: self.media.map(|media| media.kind),
        })
    }
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    message_ids: Vec<i64>,
}
