//! Video platform provider trait and its value types.

use crate::body::{ByteStream, byte_stream};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use futures::stream;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A video file received from the client.
pub struct VideoFile {
    /// Original file name
    pub file_name: String,
    /// MIME type reported by the client
    pub content_type: String,
    /// Exact size, when known before the body is read
    pub size_hint: Option<u64>,
    /// File contents
    pub body: ByteStream,
}

impl VideoFile {
    /// A file whose contents arrive as a stream of chunks.
    #[must_use]
    pub fn from_stream<S>(file_name: impl Into<String>, content_type: impl Into<String>, body: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size_hint: None,
            body: byte_stream(body),
        }
    }

    /// A file already in memory.
    #[must_use]
    pub fn from_bytes(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size_hint: Some(crate::body::chunk_len(&bytes)),
            body: byte_stream(stream::once(async move { Ok(bytes) })),
        }
    }
}

impl fmt::Debug for VideoFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size_hint", &self.size_hint)
            .finish_non_exhaustive()
    }
}

/// One-time upload destination handed out by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectUpload {
    /// Platform identifier of the new video
    pub video_id: String,
    /// URL accepting exactly one upload
    pub upload_url: String,
}

/// Video as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoAsset {
    /// Platform identifier
    pub video_id: String,
    /// Processing state, e.g. `queued`, `inprogress`, `ready`
    pub status: String,
    /// Whether the video can be played yet
    pub ready_to_stream: bool,
}

/// Third-party video hosting.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Reserve an upload destination for a video called `title`.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Platform` on failure.
    async fn create_direct_upload(&self, title: &str, max_duration: Duration)
    -> Result<DirectUpload>;

    /// Stream the file to `upload_url`.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Platform` on failure, or the body's own error if
    /// reading the file failed.
    async fn upload(&self, upload_url: &str, file: VideoFile) -> Result<()>;

    /// Require signed playback URLs for the video and return its state.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Platform` on failure.
    async fn require_signed_urls(&self, video_id: &str) -> Result<VideoAsset>;
}
