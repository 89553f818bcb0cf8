//! Upload broker: checks the caller and file, then walks the platform
//! through create, upload and lock-down.

use crate::body::{self, Meter, PREFETCH_BYTES};
use crate::error::{MediaError, Result};
use crate::platform::{VideoAsset, VideoFile, VideoPlatform};
use campus_auth::Caller;
use campus_core::Role;
use std::sync::Arc;
use std::time::Duration;

/// Roles allowed to upload course videos.
pub const UPLOAD_ROLES: &[Role] = &[Role::Professor, Role::Admin];

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Upload limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Largest accepted file
    pub max_bytes: u64,
    /// Longest accepted video
    pub max_duration: Duration,
}

/// Brokers uploads from professors to the video platform.
#[derive(Clone)]
pub struct UploadBroker {
    platform: Arc<dyn VideoPlatform>,
    limits: UploadLimits,
}

impl UploadBroker {
    /// Create a broker.
    #[must_use]
    pub fn new(platform: Arc<dyn VideoPlatform>, limits: UploadLimits) -> Self {
        Self { platform, limits }
    }

    /// Configured limits.
    #[must_use]
    pub const fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Upload `file` as a new video called `title`.
    ///
    /// The file is streamed through: at most [`PREFETCH_BYTES`] are held at a
    /// time. Steps run in order with no retry; the first failure aborts.
    ///
    /// # Errors
    ///
    /// - `MediaError::Forbidden` - caller is not a professor or admin
    /// - `MediaError::Validation` / `MediaError::TooLarge` - bad title or file
    /// - `MediaError::Platform` - a platform call failed
    pub async fn upload(&self, caller: &Caller, title: &str, file: VideoFile) -> Result<VideoAsset> {
        let meter = Arc::new(Meter::default());
        let result = self.try_upload(caller, title, file, &meter).await;

        let outcome = result.as_ref().map_or_else(MediaError::outcome, |_| "uploaded");
        metrics::counter!("campus_video_uploads_total", "outcome" => outcome).increment(1);

        match &result {
            Ok(asset) => {
                #[allow(clippy::cast_precision_loss)]
                metrics::histogram!("campus_video_upload_bytes").record(meter.sent() as f64);
                tracing::info!(
                    user_id = %caller.user_id,
                    video_id = %asset.video_id,
                    bytes = meter.sent(),
                    "Video uploaded"
                );
            }
            Err(err @ MediaError::Platform { .. }) => tracing::error!(
                user_id = %caller.user_id,
                error = %err,
                "Video upload failed"
            ),
            Err(err) => tracing::info!(
                user_id = %caller.user_id,
                error = %err,
                "Video upload rejected"
            ),
        }

        result
    }

    async fn try_upload(
        &self,
        caller: &Caller,
        title: &str,
        file: VideoFile,
        meter: &Arc<Meter>,
    ) -> Result<VideoAsset> {
        caller.require_any_role(UPLOAD_ROLES)?;

        let title = validate_title(title)?;
        validate_content_type(&file.content_type)?;
        if let Some(size) = file.size_hint {
            self.validate_size(size)?;
        }

        let VideoFile {
            file_name,
            content_type,
            body,
            ..
        } = file;

        let max = self.limits.max_bytes;
        let prefetched = body::prefetch(body, PREFETCH_BYTES.min(max.saturating_add(1))).await?;
        match prefetched.complete_size() {
            Some(size) => self.validate_size(size)?,
            None if prefetched.size() > max => {
                return Err(MediaError::TooLarge {
                    size: prefetched.size(),
                    max,
                });
            }
            None => {}
        }

        let outgoing = VideoFile {
            file_name,
            content_type,
            size_hint: prefetched.complete_size(),
            body: body::metered(prefetched, max, Arc::clone(meter)),
        };

        let upload = self
            .platform
            .create_direct_upload(title, self.limits.max_duration)
            .await?;
        tracing::debug!(video_id = %upload.video_id, "Upload destination reserved");

        let sent = self.platform.upload(&upload.upload_url, outgoing).await;
        if let Some(failure) = meter.take_failure() {
            return Err(failure);
        }
        sent?;

        self.platform.require_signed_urls(&upload.video_id).await
    }

    fn validate_size(&self, size: u64) -> Result<()> {
        if size == 0 {
            return Err(MediaError::Validation("file is empty".into()));
        }
        if size > self.limits.max_bytes {
            return Err(MediaError::TooLarge {
                size,
                max: self.limits.max_bytes,
            });
        }
        Ok(())
    }
}

fn validate_content_type(content_type: &str) -> Result<()> {
    let normalized = content_type.to_ascii_lowercase();
    if normalized.starts_with("video/") || normalized == "application/octet-stream" {
        Ok(())
    } else {
        Err(MediaError::Validation(format!(
            "unsupported content type {content_type}"
        )))
    }
}

fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(MediaError::Validation("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(MediaError::Validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{MockVideoPlatform, PlatformCall, PlatformStep};
    use bytes::Bytes;
    use campus_core::UserId;
    use futures::stream;

    fn broker(platform: &MockVideoPlatform) -> UploadBroker {
        UploadBroker::new(
            Arc::new(platform.clone()),
            UploadLimits {
                max_bytes: 1_024,
                max_duration: Duration::from_secs(7_200),
            },
        )
    }

    fn professor() -> Caller {
        Caller::new(UserId::new(), Some("prof@campus.test".into()), Role::Professor)
    }

    fn video(size: usize) -> VideoFile {
        VideoFile::from_bytes("intro.mp4", "video/mp4", Bytes::from(vec![0u8; size]))
    }

    /// A file of `chunks` chunks of `chunk_size` bytes with no declared size.
    fn streamed(chunks: usize, chunk_size: usize) -> VideoFile {
        let body = stream::iter((0..chunks).map(move |_| Ok(Bytes::from(vec![0u8; chunk_size]))));
        VideoFile::from_stream("intro.mp4", "video/mp4", body)
    }

    #[tokio::test]
    async fn test_professor_upload_runs_all_steps_in_order() {
        let platform = MockVideoPlatform::new();
        let asset = broker(&platform)
            .upload(&professor(), "  Week 1: Intro  ", video(512))
            .await
            .unwrap();

        assert!(!asset.ready_to_stream);
        let calls = platform.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0],
            PlatformCall::CreateDirectUpload {
                title: "Week 1: Intro".into(),
                max_duration: Duration::from_secs(7_200)
            }
        );
        assert!(matches!(calls[1], PlatformCall::Upload { bytes: 512, .. }));
        assert_eq!(
            calls[2],
            PlatformCall::RequireSignedUrls {
                video_id: asset.video_id.clone()
            }
        );
    }

    #[tokio::test]
    async fn test_student_is_forbidden() {
        let platform = MockVideoPlatform::new();
        let student = Caller::new(UserId::new(), None, Role::Student);

        let err = broker(&platform)
            .upload(&student, "Lecture", video(10))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Forbidden(_)));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_admin_allowed() {
        let platform = MockVideoPlatform::new();
        let admin = Caller::new(UserId::new(), None, Role::Admin);
        assert!(broker(&platform).upload(&admin, "Lecture", video(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_title_and_file_validation() {
        let platform = MockVideoPlatform::new();
        let broker = broker(&platform);

        assert!(matches!(
            broker.upload(&professor(), "   ", video(10)).await,
            Err(MediaError::Validation(_))
        ));
        assert!(matches!(
            broker.upload(&professor(), &"x".repeat(201), video(10)).await,
            Err(MediaError::Validation(_))
        ));
        assert!(matches!(
            broker.upload(&professor(), "Lecture", video(0)).await,
            Err(MediaError::Validation(_))
        ));
        assert_eq!(
            broker.upload(&professor(), "Lecture", video(2_048)).await,
            Err(MediaError::TooLarge {
                size: 2_048,
                max: 1_024
            })
        );

        let pdf = VideoFile::from_bytes("notes.pdf", "application/pdf", Bytes::from_static(b"%PDF"));
        assert!(matches!(
            broker.upload(&professor(), "Lecture", pdf).await,
            Err(MediaError::Validation(_))
        ));

        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_octet_stream_accepted() {
        let platform = MockVideoPlatform::new();
        let file =
            VideoFile::from_bytes("intro.bin", "application/octet-stream", Bytes::from(vec![0u8; 10]));
        assert!(broker(&platform).upload(&professor(), "Lecture", file).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_upload_stops_before_signing() {
        let platform = MockVideoPlatform::new();
        platform.fail_at(PlatformStep::Upload);

        let err = broker(&platform)
            .upload(&professor(), "Lecture", video(10))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Platform { .. }));
        assert_eq!(platform.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_streamed_file_is_forwarded_whole() {
        let platform = MockVideoPlatform::new();

        broker(&platform)
            .upload(&professor(), "Lecture", streamed(4, 200))
            .await
            .unwrap();

        assert!(matches!(platform.calls()[1], PlatformCall::Upload { bytes: 800, .. }));
    }

    #[tokio::test]
    async fn test_small_streamed_oversize_rejected_before_platform() {
        let platform = MockVideoPlatform::new();

        let err = broker(&platform)
            .upload(&professor(), "Lecture", streamed(3, 500))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::TooLarge { max: 1_024, .. }));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_stream_is_invalid() {
        let platform = MockVideoPlatform::new();

        let err = broker(&platform)
            .upload(&professor(), "Lecture", streamed(0, 0))
            .await
            .unwrap_err();

        assert_eq!(err, MediaError::Validation("file is empty".into()));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_oversize_past_prefetch_is_cut_off_while_streaming() {
        let platform = MockVideoPlatform::new();
        let broker = UploadBroker::new(
            Arc::new(platform.clone()),
            UploadLimits {
                max_bytes: PREFETCH_BYTES + 1_024,
                max_duration: Duration::from_secs(60),
            },
        );
        // 9 chunks of 1 MiB: the prefetch holds 8, the meter trips on the 9th.
        let err = broker
            .upload(&professor(), "Lecture", streamed(9, 1024 * 1024))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            MediaError::TooLarge {
                size: 9 * 1024 * 1024,
                max: PREFETCH_BYTES + 1_024
            }
        );
        assert_eq!(platform.calls().len(), 2);
    }
}
