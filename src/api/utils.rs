use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio_util::sync::CancellationToken;

/// Wraps a response body stream and cancels `token` when the body is
/// dropped. Axum drops the body when the client goes away, so anything
/// watching the token (the relay task, the upstream read) stops too.
pub struct DetectDisconnect<S> {
    inner: S,
    token: CancellationToken,
    finished: bool,
}

impl<S> DetectDisconnect<S> {
    pub fn new(inner: S, token: CancellationToken) -> Self {
        Self {
            inner,
            token,
            finished: false,
        }
    }
}

impl<S: Stream + Unpin> Stream for DetectDisconnect<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(None) = poll {
            self.finished = true;
        }
        poll
    }
}

impl<S> Drop for DetectDisconnect<S> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!("Client disconnected before the stream finished");
        }
        self.token.cancel();
    }
}
