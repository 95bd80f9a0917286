//! Best-effort broadcast of one-off events.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::mvi::SideEffect;

/// Events buffered per subscriber before the oldest ones are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Fan-out of events to the subscribers that are live at emission time.
///
/// Emission never blocks. A subscriber that falls more than `capacity` events
/// behind loses the oldest ones.
pub(crate) struct EventBus<E: SideEffect> {
    sender: broadcast::Sender<E>,
}

impl<E: SideEffect> EventBus<E> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn emit(&self, event: E) {
        // No subscriber: the event is gone, there is no replay.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> EventStream<E> {
        EventStream {
            inner: BroadcastStream::new(self.sender.subscribe()),
        }
    }
}

/// Events emitted after the stream was created, in emission order.
pub struct EventStream<E> {
    inner: BroadcastStream<E>,
}

impl<E> Unpin for EventStream<E> {}

impl<E: SideEffect> EventStream<E> {
    pub async fn next(&mut self) -> Option<E> {
        futures::StreamExt::next(self).await
    }
}

impl<E: SideEffect> Stream for EventStream<E> {
    type Item = E;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        let this = self.get_mut();
        loop {
            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(event)) => return Poll::Ready(Some(event)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::debug!(skipped, "Event subscriber lagged, oldest events dropped");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
