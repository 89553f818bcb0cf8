//! # Campus Media
//!
//! Brokers course video uploads from professors to a hosted video
//! platform. The browser never sees platform credentials: it sends the file
//! here, and [`UploadBroker`] reserves a destination, streams the bytes
//! through and switches the video to signed playback.
//!
//! ## Example
//!
//! ```rust
//! use campus_media::mocks::MockVideoPlatform;
//! use campus_media::{UploadBroker, UploadLimits, VideoFile};
//! use campus_auth::Caller;
//! use campus_core::{Role, UserId};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> campus_media::Result<()> {
//! let broker = UploadBroker::new(
//!     Arc::new(MockVideoPlatform::new()),
//!     UploadLimits { max_bytes: 1 << 30, max_duration: Duration::from_secs(3 * 3600) },
//! );
//! let professor = Caller::new(UserId::new(), None, Role::Professor);
//! let file = VideoFile::from_bytes("week1.mp4", "video/mp4", bytes::Bytes::from_static(b"..."));
//! let asset = broker.upload(&professor, "Week 1", file).await?;
//! println!("{} is {}", asset.video_id, asset.status);
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod broker;
pub mod error;
pub mod platform;
pub mod stream;

/// Mock implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use body::ByteStream;
pub use broker::{UploadBroker, UploadLimits};
pub use error::{MediaError, Result};
pub use platform::{DirectUpload, VideoAsset, VideoFile, VideoPlatform};
pub use stream::{StreamClient, StreamConfig};
