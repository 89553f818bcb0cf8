//! Streaming file bodies.
//!
//! Uploads are never held in memory whole. The broker reads a bounded
//! prefix to reject empty and small oversized files before the platform is
//! contacted, then forwards the prefix and the rest of the stream through a
//! meter that stops the transfer once the configured maximum is passed.

use crate::error::{MediaError, Result};
use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Chunks of an upload, in order.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Bytes read ahead before the platform is contacted.
pub const PREFETCH_BYTES: u64 = 8 * 1024 * 1024;

/// Box a chunk stream.
pub fn byte_stream<S>(body: S) -> ByteStream
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    body.boxed()
}

pub(crate) fn chunk_len(chunk: &Bytes) -> u64 {
    u64::try_from(chunk.len()).unwrap_or(u64::MAX)
}

/// Start of a body, read ahead.
pub(crate) struct Prefetched {
    chunks: Vec<Bytes>,
    size: u64,
    rest: Option<ByteStream>,
}

impl Prefetched {
    /// Bytes read so far.
    pub(crate) const fn size(&self) -> u64 {
        self.size
    }

    /// Total size, when the whole body fit in the prefix.
    pub(crate) fn complete_size(&self) -> Option<u64> {
        self.rest.is_none().then_some(self.size)
    }
}

/// Read chunks until the body ends or at least `limit` bytes are held.
pub(crate) async fn prefetch(mut body: ByteStream, limit: u64) -> Result<Prefetched> {
    let mut chunks = Vec::new();
    let mut size = 0u64;

    while size < limit {
        match body.next().await {
            Some(chunk) => {
                let chunk = chunk?;
                if chunk.is_empty() {
                    continue;
                }
                size = size.saturating_add(chunk_len(&chunk));
                chunks.push(chunk);
            }
            None => {
                return Ok(Prefetched {
                    chunks,
                    size,
                    rest: None,
                });
            }
        }
    }

    Ok(Prefetched {
        chunks,
        size,
        rest: Some(body),
    })
}

/// Bytes forwarded and the first failure seen by a metered body.
#[derive(Debug, Default)]
pub(crate) struct Meter {
    sent: AtomicU64,
    failure: Mutex<Option<MediaError>>,
}

impl Meter {
    pub(crate) fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// First error the body produced, if any.
    ///
    /// HTTP clients wrap body errors in their own transport error; this keeps
    /// the original.
    pub(crate) fn take_failure(&self) -> Option<MediaError> {
        self.failure.lock().ok().and_then(|mut failure| failure.take())
    }

    fn record(&self, chunk: &Bytes) -> u64 {
        self.sent
            .fetch_add(chunk_len(chunk), Ordering::Relaxed)
            .saturating_add(chunk_len(chunk))
    }

    fn fail(&self, err: &MediaError) {
        if let Ok(mut failure) = self.failure.lock() {
            failure.get_or_insert_with(|| err.clone());
        }
    }
}

/// Replay `prefetched`, then the rest of the body, ending with
/// `MediaError::TooLarge` once more than `max_bytes` have passed.
pub(crate) fn metered(prefetched: Prefetched, max_bytes: u64, meter: Arc<Meter>) -> ByteStream {
    let Prefetched { chunks, rest, .. } = prefetched;
    let head = stream::iter(chunks.into_iter().map(Ok));
    let body: ByteStream = match rest {
        Some(rest) => head.chain(rest).boxed(),
        None => head.boxed(),
    };

    stream::unfold(Some(body), move |body| {
        let meter = Arc::clone(&meter);
        async move {
            let mut body = body?;
            let item = match body.next().await? {
                Ok(chunk) => {
                    let sent = meter.record(&chunk);
                    if sent > max_bytes {
                        Err(MediaError::TooLarge {
                            size: sent,
                            max: max_bytes,
                        })
                    } else {
                        Ok(chunk)
                    }
                }
                Err(err) => Err(err),
            };

            match item {
                Ok(chunk) => Some((Ok(chunk), Some(body))),
                Err(err) => {
                    meter.fail(&err);
                    Some((Err(err), None))
                }
            }
        }
    })
    .boxed()
}
