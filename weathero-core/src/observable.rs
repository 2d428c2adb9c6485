//! A value holder that calls its subscribers synchronously on every update.

use parking_lot::Mutex;
use std::{fmt, sync::Arc};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Observable::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Observable<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    value: T,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                value,
                next_id: 0,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.inner.lock().value.clone()
    }

    /// Registers `callback` for future updates. The current value is not replayed.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        inner.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Stores `value` and notifies every subscriber in registration order.
    ///
    /// Callbacks run after the internal lock is released, so they may read
    /// this observable or subscribe to it.
    pub(crate) fn set(&self, value: T) {
        let subscribers: Vec<Callback<T>> = {
            let mut inner = self.inner.lock();
            inner.value = value.clone();
            inner.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };

        for callback in subscribers {
            callback(&value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_every_update_in_order() {
        let observable = Observable::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        observable.subscribe(move |v| sink.lock().push(*v));

        observable.set(1);
        observable.set(1);
        observable.set(2);

        assert_eq!(*seen.lock(), vec![1, 1, 2]);
        assert_eq!(observable.get(), 2);
    }

    #[test]
    fn subscribing_does_not_replay_current_value() {
        let observable = Observable::new("initial".to_string());
        let calls = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&calls);
        observable.subscribe(move |_| *counter.lock() += 1);

        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn unsubscribed_callbacks_are_not_called() {
        let observable = Observable::new(0);
        let calls = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&calls);
        let id = observable.subscribe(move |_| *counter.lock() += 1);
        observable.set(1);

        assert!(observable.unsubscribe(id));
        assert!(!observable.unsubscribe(id));
        observable.set(2);

        assert_eq!(*calls.lock(), 1);
        assert_eq!(observable.subscriber_count(), 0);
    }

    #[test]
    fn callback_can_read_the_observable() {
        let observable = Arc::new(Observable::new(0));
        let read_back = Arc::new(Mutex::new(None));

        let source = Arc::clone(&observable);
        let sink = Arc::clone(&read_back);
        observable.subscribe(move |_| *sink.lock() = Some(source.get()));

        observable.set(7);

        assert_eq!(*read_back.lock(), Some(7));
    }
}
