//! Atomic holder of the current state and its observable stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use futures_core::Stream;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::observer::StateObserver;
use crate::mvi::ViewState;

/// Holds exactly one current state value.
///
/// Updates are serialized through `update_lock`: the next value is computed
/// from the latest one and published in a single step, so concurrent updates
/// are never lost and a half-applied value is never visible. The lock does
/// not poison, and a reducer that panics unwinds before anything is published.
/// The observer runs under the same lock, so its records arrive in the order
/// the transitions were applied.
pub(crate) struct StateContainer<S: ViewState> {
    sender: watch::Sender<S>,
    update_lock: Mutex<()>,
    observer: Option<Arc<dyn StateObserver<S>>>,
}

impl<S: ViewState> StateContainer<S> {
    pub fn new(initial: S, observer: Option<Arc<dyn StateObserver<S>>>) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender,
            update_lock: Mutex::new(()),
            observer,
        }
    }

    pub fn current(&self) -> S {
        self.sender.borrow().clone()
    }

    /// Apply `reducer` to the current value and return the new one. Always
    /// publishes, even when the result equals the previous value.
    pub fn update<F>(&self, reducer: F) -> S
    where
        F: FnOnce(S) -> S,
    {
        let _guard = self.update_lock.lock();
        let old = self.current();
        let new = reducer(old.clone());
        self.publish(old, new)
    }

    /// Like [`update`](Self::update), but an `Err` leaves the state untouched.
    pub fn try_update<F, Err>(&self, reducer: F) -> Result<S, Err>
    where
        F: FnOnce(S) -> Result<S, Err>,
    {
        let _guard = self.update_lock.lock();
        let old = self.current();
        let new = reducer(old.clone())?;
        Ok(self.publish(old, new))
    }

    /// Caller holds `update_lock`.
    fn publish(&self, old: S, new: S) -> S {
        self.sender.send_replace(new.clone());
        if let Some(observer) = &self.observer {
            observer.on_transition(&old, &new);
        }
        new
    }

    pub fn observe(&self) -> StateStream<S> {
        StateStream {
            inner: WatchStream::new(self.sender.subscribe()),
            last: None,
        }
    }
}

/// Stream of distinct state values.
///
/// The first item is the value current at subscription time. After that only
/// changes are delivered: consecutive equal values are collapsed, and a slow
/// subscriber may skip intermediate values but always ends on the latest one.
pub struct StateStream<S> {
    inner: WatchStream<S>,
    last: Option<S>,
}

impl<S> Unpin for StateStream<S> {}

impl<S: ViewState> StateStream<S> {
    /// Next distinct value, or `None` once the container is gone.
    pub async fn next(&mut self) -> Option<S> {
        futures::StreamExt::next(self).await
    }
}

impl<S: ViewState> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        let this = self.get_mut();
        loop {
            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(value) => {
                    if this.last.as_ref() == Some(&value) {
                        continue;
                    }
                    this.last = Some(value.clone());
                    return Poll::Ready(Some(value));
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Count(u32);

    impl ViewState for Count {}

    fn boom(_: Count) -> Count {
        panic!("reducer failed")
    }

    #[test]
    fn test_update_returns_new_value() {
        let container = StateContainer::new(Count(1), None);
        assert_eq!(container.update(|Count(n)| Count(n + 1)), Count(2));
        assert_eq!(container.current(), Count(2));
    }

    #[test]
    fn test_observer_records_follow_update_order() {
        let records = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&records);
        let observer: Arc<dyn StateObserver<Count>> =
            Arc::new(move |old: &Count, new: &Count| sink.lock().push((old.0, new.0)));
        let container = Arc::new(StateContainer::new(Count(0), Some(observer)));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let container = Arc::clone(&container);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        container.update(|Count(n)| Count(n + 1));
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let records = records.lock();
        assert_eq!(records.len(), 2000);
        for (position, (old, new)) in records.iter().enumerate() {
            assert_eq!(*old as usize, position);
            assert_eq!(*new, old + 1);
        }
    }

    #[test]
    fn test_failed_try_update_keeps_state() {
        let container = StateContainer::new(Count(5), None);
        let result = container.try_update(|_| Err::<Count, _>("rejected"));
        assert_eq!(result.unwrap_err(), "rejected");
        assert_eq!(container.current(), Count(5));
    }

    #[test]
    fn test_panicking_reducer_keeps_state() {
        let container = StateContainer::new(Count(7), None);
        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| container.update(boom)));
        assert!(result.is_err());
        assert_eq!(container.current(), Count(7));

        container.update(|Count(n)| Count(n + 1));
        assert_eq!(container.current(), Count(8));
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let container = Arc::new(StateContainer::new(Count(0), None));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let container = Arc::clone(&container);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        container.update(|Count(n)| Count(n + 1));
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        assert_eq!(container.current(), Count(2000));
    }

    #[tokio::test]
    async fn test_observe_replays_current_and_skips_duplicates() {
        let container = StateContainer::new(Count(0), None);
        container.update(|_| Count(3));

        let mut stream = container.observe();
        assert_eq!(stream.next().await, Some(Count(3)));

        container.update(|c| c);
        container.update(|_| Count(4));
        assert_eq!(stream.next().await, Some(Count(4)));
    }
}
