//! Close handles for open streams.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use super::FrameStream;

/// Closes the stream it was created with.
///
/// Cloning shares the same underlying signal. `close()` is idempotent and
/// harmless after the stream already ended on its own.
#[derive(Clone, Debug)]
pub struct StreamHandle {
    token: CancellationToken,
}

impl StreamHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once `close()` has been called.
    pub fn closed(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

/// Wrap a frame stream so that closing the returned handle ends it.
///
/// A pending `next()` wakes immediately with `None`. The inner stream is
/// dropped once the wrapper finishes, which releases the HTTP connection.
pub fn make_closable_stream(stream: FrameStream) -> (FrameStream, StreamHandle) {
    let handle = StreamHandle::new();
    let token = handle.token.clone();
    let mut inner = stream;
    let s = async_stream::stream! {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                item = inner.next() => {
                    let Some(item) = item else { break };
                    yield item;
                }
            }
        }
    };
    (Box::pin(s), handle)
}
