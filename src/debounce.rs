use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Quiet period before a typed value is allowed to reach the query.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

struct Slot<T> {
    generation: u64,
    tx: watch::Sender<T>,
}

/// A value that only settles after `delay` without further input.
///
/// Each [`set`](Debounced::set) restarts the timer. Once
/// [`cancel`](Debounced::cancel) returns, or the value is dropped, no pending
/// update will ever be published.
pub struct Debounced<T> {
    delay: Duration,
    slot: Arc<Mutex<Slot<T>>>,
    rx: watch::Receiver<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self {
            delay,
            slot: Arc::new(Mutex::new(Slot { generation: 0, tx })),
            rx,
            pending: None,
        }
    }

    /// Record a raw input and (re)start the quiet-period timer.
    /// Must be called inside a tokio runtime.
    pub fn set(&mut self, value: T) {
        let generation = self.bump();
        let slot = Arc::clone(&self.slot);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.generation == generation {
                publish(&slot.tx, value);
            }
        }));
    }

    /// Drop any pending update without publishing it.
    pub fn cancel(&mut self) {
        self.bump();
    }

    /// Cancel pending input and settle on `value` immediately.
    pub fn reset(&mut self, value: T) {
        {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.generation += 1;
            publish(&slot.tx, value);
        }
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// The settled value.
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Resolves when the settled value changes.
    pub async fn changed(&mut self) {
        // The sender lives in `self.slot`, so the channel never closes here.
        let _ = self.rx.changed().await;
    }

    fn bump(&mut self) -> u64 {
        let generation = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.generation += 1;
            slot.generation
        };
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        generation
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.generation += 1;
        }
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

fn publish<T: PartialEq>(tx: &watch::Sender<T>, value: T) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}
