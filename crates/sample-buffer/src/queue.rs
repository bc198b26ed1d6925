//! Drop-Oldest Queue Implementation

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::trace;

struct Inner<T> {
    queue: Mutex<State<T>>,
    notify: Notify,
}

struct State<T> {
    items: VecDeque<T>,
    capacity: usize,
    /// Samples evicted due to overflow (for diagnostics)
    dropped: u64,
    /// Live sender handles
    senders: usize,
}

/// Producer half of a sample queue
pub struct SampleSender<T> {
    inner: Arc<Inner<T>>,
}

/// Consumer half of a sample queue
pub struct SampleReceiver<T> {
    inner: Arc<Inner<T>>,
}

/// Create a bounded drop-oldest queue with the given capacity.
pub fn channel<T>(capacity: usize) -> (SampleSender<T>, SampleReceiver<T>) {
    assert!(capacity > 0, "sample queue capacity must be nonzero");
    let inner = Arc::new(Inner {
        queue: Mutex::new(State {
            items: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
            senders: 1,
        }),
        notify: Notify::new(),
    });
    (
        SampleSender {
            inner: inner.clone(),
        },
        SampleReceiver { inner },
    )
}

impl<T> SampleSender<T> {
    /// Push a sample. Never blocks: if the queue is full, the oldest
    /// queued sample is evicted to make room.
    pub fn push(&self, item: T) {
        let mut state = match self.inner.queue.lock() {
            Ok(state) => state,
            // A poisoned lock means the consumer panicked; drop the sample.
            Err(_) => return,
        };
        if state.items.len() >= state.capacity {
            state.items.pop_front();
            state.dropped += 1;
            trace!(dropped = state.dropped, "sample queue overflow, evicting oldest");
        }
        state.items.push_back(item);
        drop(state);
        self.inner.notify.notify_one();
    }

    /// Total samples evicted due to overflow.
    pub fn dropped(&self) -> u64 {
        self.inner.queue.lock().map(|s| s.dropped).unwrap_or(0)
    }
}

impl<T> Clone for SampleSender<T> {
    fn clone(&self) -> Self {
        if let Ok(mut state) = self.inner.queue.lock() {
            state.senders += 1;
        }
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Drop for SampleSender<T> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.queue.lock() {
            state.senders -= 1;
            if state.senders > 0 {
                return;
            }
        }
        // Last sender gone: wake the consumer so it can observe termination.
        self.inner.notify.notify_one();
    }
}

impl<T> SampleReceiver<T> {
    /// Receive the next sample, waiting if the queue is empty. Returns
    /// `None` once every sender has been dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let notified = self.inner.notify.notified();
            {
                let mut state = self.inner.queue.lock().ok()?;
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.senders == 0 {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Samples currently queued.
    pub fn len(&self) -> usize {
        self.inner.queue.lock().map(|s| s.items.len()).unwrap_or(0)
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
