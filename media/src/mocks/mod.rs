//! Mock provider implementations for testing.

use crate::error::{MediaError, Result};
use crate::platform::{DirectUpload, VideoAsset, VideoFile, VideoPlatform};
use crate::body::chunk_len;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Platform step that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformStep {
    /// `create_direct_upload`
    CreateDirectUpload,
    /// `upload`
    Upload,
    /// `require_signed_urls`
    RequireSignedUrls,
}

/// A call received by [`MockVideoPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    /// `create_direct_upload`
    CreateDirectUpload {
        /// Title passed
        title: String,
        /// Duration cap passed
        max_duration: Duration,
    },
    /// `upload`
    Upload {
        /// Destination
        upload_url: String,
        /// Bytes read from the body
        bytes: u64,
    },
    /// `require_signed_urls`
    RequireSignedUrls {
        /// Video id
        video_id: String,
    },
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<PlatformCall>,
    failures: HashSet<PlatformStep>,
    next_id: u64,
}

/// In-memory [`VideoPlatform`] that records every call.
#[derive(Debug, Clone, Default)]
pub struct MockVideoPlatform {
    state: Arc<Mutex<State>>,
}

impl MockVideoPlatform {
    /// Create a platform where every step succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `step` fail with a 500 platform error.
    pub fn fail_at(&self, step: PlatformStep) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert(step);
        }
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state
            .lock()
            .map_or_else(|_| Vec::new(), |state| state.calls.clone())
    }

    fn record(&self, step: PlatformStep, call: PlatformCall) -> Result<u64> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| MediaError::transport("Lock poisoned"))?;
        state.calls.push(call);

        if state.failures.contains(&step) {
            return Err(MediaError::Platform {
                status: Some(500),
                message: format!("injected failure at {step:?}"),
            });
        }

        state.next_id += 1;
        Ok(state.next_id)
    }
}

#[async_trait]
impl VideoPlatform for MockVideoPlatform {
    async fn create_direct_upload(
        &self,
        title: &str,
        max_duration: Duration,
    ) -> Result<DirectUpload> {
        let id = self.record(
            PlatformStep::CreateDirectUpload,
            PlatformCall::CreateDirectUpload {
                title: title.to_string(),
                max_duration,
            },
        )?;

        Ok(DirectUpload {
            video_id: format!("mock-video-{id}"),
            upload_url: format!("https://upload.mock.test/mock-video-{id}"),
        })
    }

    async fn upload(&self, upload_url: &str, file: VideoFile) -> Result<()> {
        let mut body = file.body;
        let mut bytes = 0u64;
        let mut failure = None;
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(chunk) => bytes = bytes.saturating_add(chunk_len(&chunk)),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        self.record(
            PlatformStep::Upload,
            PlatformCall::Upload {
                upload_url: upload_url.to_string(),
                bytes,
            },
        )?;
        failure.map_or(Ok(()), Err)
    }

    async fn require_signed_urls(&self, video_id: &str) -> Result<VideoAsset> {
        self.record(
            PlatformStep::RequireSignedUrls,
            PlatformCall::RequireSignedUrls {
                video_id: video_id.to_string(),
            },
        )?;

        Ok(VideoAsset {
            video_id: video_id.to_string(),
            status: "queued".into(),
            ready_to_stream: false,
        })
    }
}
