use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
    time::sleep,
};

/// Holds back rapidly changing values until they have been stable for a
/// quiet period.
///
/// Every [`push`](Debouncer::push) restarts the timer. Only the latest value
/// is emitted once the timer runs out, and any value (including an empty
/// string) counts as settleable. [`cancel`](Debouncer::cancel) discards
/// everything pushed so far, whether still waiting or already emitted. Must
/// be created inside a tokio runtime.
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<(u64, T)>,
    settled: Mutex<mpsc::UnboundedReceiver<(u64, T)>>,
    generation: AtomicU64,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        let (input, mut pending) = mpsc::unbounded_channel::<(u64, T)>();
        let (emit, settled) = mpsc::unbounded_channel::<(u64, T)>();

        let task = tokio::spawn(async move {
            while let Some(mut latest) = pending.recv().await {
                loop {
                    tokio::select! {
                        next = pending.recv() => match next {
                            Some(value) => latest = value,
                            None => {
                                let _ = emit.send(latest);
                                return;
                            }
                        },
                        _ = sleep(quiet) => break,
                    }
                }

                if emit.send(latest).is_err() {
                    return;
                }
            }
        });

        Self {
            input,
            settled: Mutex::new(settled),
            generation: AtomicU64::new(0),
            task,
        }
    }

    pub fn push(&self, value: T) {
        let generation = self.generation.load(Ordering::SeqCst);
        // the receiving task only stops when `self` is dropped
        let _ = self.input.send((generation, value));
    }

    /// Drops every value pushed before this call. They are never emitted.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Waits for the next settled value. Returns `None` once the debouncer
    /// has shut down.
    pub async fn next_settled(&self) -> Option<T> {
        let mut settled = self.settled.lock().await;
        loop {
            let (generation, value) = settled.recv().await?;
            if self.is_current(generation) {
                return Some(value);
            }
        }
    }

    /// Returns a settled value if one is already waiting.
    pub fn try_settled(&self) -> Option<T> {
        let mut settled = self.settled.try_lock().ok()?;
        loop {
            let (generation, value) = settled.try_recv().ok()?;
            if self.is_current(generation) {
                return Some(value);
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation.load(Ordering::SeqCst)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
