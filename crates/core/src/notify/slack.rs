//! Slack Web API notifier.
//!
//! Notices go through `chat.postMessage`. Clips use the external upload flow:
//! `files.getUploadURLExternal`, a multipart POST of the bytes to the returned
//! URL, then `files.completeUploadExternal` to share the file into the channel.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::error::NotifyError;
use super::traits::Notifier;
use crate::capture::Artifact;
use crate::config::SlackConfig;

const POST_MESSAGE: &str = "chat.postMessage";
const GET_UPLOAD_URL: &str = "files.getUploadURLExternal";
const COMPLETE_UPLOAD: &str = "files.completeUploadExternal";
const UPLOAD: &str = "file upload";

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    upload_url: String,
    file_id: String,
}

/// Notifier posting to one Slack channel.
pub struct SlackNotifier {
    client: Client,
    config: SlackConfig,
}

impl SlackNotifier {
    /// Create a new Slack notifier.
    pub fn new(config: SlackConfig) -> Result<Self, NotifyError> {
        if config.token.trim().is_empty() {
            return Err(NotifyError::NotConfigured(
                "Slack token is required".to_string(),
            ));
        }
        if config.channel_id.trim().is_empty() {
            return Err(NotifyError::NotConfigured(
                "Slack channel id is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn channel_id(&self) -> &str {
        &self.config.channel_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), method)
    }

    async fn request_upload_url(&self, length: usize) -> Result<UploadUrlResponse, NotifyError> {
        let response = self
            .client
            .post(self.method_url(GET_UPLOAD_URL))
            .bearer_auth(&self.config.token)
            .form(&[
                ("filename", self.config.upload_filename.clone()),
                ("length", length.to_string()),
            ])
            .send()
            .await?;

        parse_api_response(GET_UPLOAD_URL, response).await
    }

    async fn upload_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), NotifyError> {
        let part = Part::bytes(bytes)
            .file_name(self.config.upload_filename.clone())
            .mime_str("video/mp4")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(upload_url)
            .bearer_auth(&self.config.token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                method: UPLOAD.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    async fn complete_upload(&self, file_id: &str, title: &str) -> Result<(), NotifyError> {
        let files = json!([{ "id": file_id, "title": title }]).to_string();

        let response = self
            .client
            .post(self.method_url(COMPLETE_UPLOAD))
            .bearer_auth(&self.config.token)
            .form(&[
                ("files", files.as_str()),
                ("channel_id", self.config.channel_id.as_str()),
            ])
            .send()
            .await?;

        parse_api_response::<Value>(COMPLETE_UPLOAD, response).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "slack"
    }

    async fn deliver_artifact(&self, artifact: &Artifact) -> Result<(), NotifyError> {
        let start = Instant::now();

        let bytes = tokio::fs::read(&artifact.path)
            .await
            .map_err(|source| NotifyError::ReadArtifact {
                path: artifact.path.clone(),
                source,
            })?;
        let length = bytes.len();

        let upload = self.request_upload_url(length).await?;
        self.upload_bytes(&upload.upload_url, bytes).await?;
        self.complete_upload(&upload.file_id, &self.config.upload_filename)
            .await?;

        debug!(
            clip = %artifact.id,
            file_id = %upload.file_id,
            bytes = length,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Uploaded clip to Slack"
        );

        Ok(())
    }

    async fn deliver_notice(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.method_url(POST_MESSAGE))
            .bearer_auth(&self.config.token)
            .json(&json!({
                "channel": self.config.channel_id,
                "text": text,
            }))
            .send()
            .await?;

        parse_api_response::<Value>(POST_MESSAGE, response).await?;
        debug!(channel = %self.config.channel_id, "Posted Slack notice");
        Ok(())
    }
}

/// Checks the HTTP status and Slack's `ok` flag, then decodes the payload.
async fn parse_api_response<T: DeserializeOwned>(
    method: &str,
    response: Response,
) -> Result<T, NotifyError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NotifyError::Status {
            method: method.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| NotifyError::invalid_response(method, e.to_string()))?;

    if body.get("ok").and_then(Value::as_bool) != Some(true) {
        let error = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        return Err(NotifyError::api(method, error));
    }

    serde_json::from_value(body).map_err(|e| NotifyError::invalid_response(method, e.to_string()))
}
