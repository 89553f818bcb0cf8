//! Client for a Cloudflare-Stream-style video API.
//!
//! Account-scoped JSON calls are wrapped in an envelope:
//!
//! ```json
//! {"success": true, "errors": [], "result": { ... }}
//! ```
//!
//! The upload itself goes to the one-time `uploadURL` as multipart form data
//! and needs no credentials.

use crate::error::{MediaError, Result};
use crate::platform::{DirectUpload, VideoAsset, VideoFile, VideoPlatform};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Connection settings for [`StreamClient`].
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// API root, e.g. `https://api.cloudflare.com/client/v4`
    pub api_base: String,
    /// Account identifier
    pub account_id: String,
    /// API token with stream edit rights
    pub api_token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct DirectUploadResult {
    uid: String,
    #[serde(rename = "uploadURL")]
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct VideoResult {
    uid: String,
    #[serde(default)]
    status: Option<VideoStatus>,
    #[serde(rename = "readyToStream", default)]
    ready_to_stream: bool,
}

#[derive(Debug, Deserialize)]
struct VideoStatus {
    state: String,
}

/// HTTP implementation of [`VideoPlatform`].
#[derive(Clone)]
pub struct StreamClient {
    client: Client,
    config: StreamConfig,
}

impl StreamClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Platform` if the HTTP client cannot be built.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MediaError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn stream_url(&self, path: &str) -> String {
        format!(
            "{}/accounts/{}/stream{path}",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_id
        )
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MediaError::transport(e.to_string()))?;

        let envelope = serde_json::from_str::<Envelope<T>>(&body);

        match envelope {
            Ok(Envelope {
                success: true,
                result: Some(result),
                ..
            }) if status.is_success() => Ok(result),
            Ok(envelope) => Err(MediaError::Platform {
                status: Some(status.as_u16()),
                message: describe(&envelope.errors)
                    .unwrap_or_else(|| format!("request failed with status {status}")),
            }),
            Err(_) if !status.is_success() => Err(MediaError::Platform {
                status: Some(status.as_u16()),
                message: body,
            }),
            Err(e) => Err(MediaError::transport(format!("Malformed response: {e}"))),
        }
    }
}

fn describe(errors: &[ApiMessage]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| match e.code {
                Some(code) => format!("{code}: {}", e.message),
                None => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[async_trait]
impl VideoPlatform for StreamClient {
    async fn create_direct_upload(
        &self,
        title: &str,
        max_duration: Duration,
    ) -> Result<DirectUpload> {
        let response = self
            .client
            .post(self.stream_url("/direct_upload"))
            .bearer_auth(&self.config.api_token)
            .json(&json!({
                "maxDurationSeconds": max_duration.as_secs(),
                "meta": { "name": title },
            }))
            .send()
            .await
            .map_err(|e| MediaError::transport(e.to_string()))?;

        let result: DirectUploadResult = Self::decode(response).await?;
        tracing::debug!(video_id = %result.uid, "Direct upload created");

        Ok(DirectUpload {
            video_id: result.uid,
            upload_url: result.upload_url,
        })
    }

    async fn upload(&self, upload_url: &str, file: VideoFile) -> Result<()> {
        let VideoFile {
            file_name,
            content_type,
            size_hint,
            body,
        } = file;

        let body = Body::wrap_stream(body);
        let part = match size_hint {
            Some(length) => Part::stream_with_length(body, length),
            None => Part::stream(body),
        }
        .file_name(file_name)
        .mime_str(&content_type)
        .map_err(|e| MediaError::Validation(format!("invalid content type: {e}")))?;

        let response = self
            .client
            .post(upload_url)
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(|e| MediaError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Platform {
                status: Some(status.as_u16()),
                message: if body.is_empty() {
                    format!("upload failed with status {status}")
                } else {
                    body
                },
            });
        }

        tracing::debug!(bytes = ?size_hint, "Video bytes uploaded");
        Ok(())
    }

    async fn require_signed_urls(&self, video_id: &str) -> Result<VideoAsset> {
        let response = self
            .client
            .post(self.stream_url(&format!("/{video_id}")))
            .bearer_auth(&self.config.api_token)
            .json(&json!({ "uid": video_id, "requireSignedURLs": true }))
            .send()
            .await
            .map_err(|e| MediaError::transport(e.to_string()))?;

        let result: VideoResult = Self::decode(response).await?;

        Ok(VideoAsset {
            video_id: result.uid,
            status: result
                .status
                .map_or_else(|| "unknown".to_string(), |s| s.state),
            ready_to_stream: result.ready_to_stream,
        })
    }
}
