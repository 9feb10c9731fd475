//! Designated-thread work queue
//!
//! Background build jobs finish on worker threads, but completion callbacks
//! must run on one designated thread (typically the engine's main thread).
//! The queue accepts tasks from any thread; the designated thread drains it
//! by calling [`WorkQueue::pump`].

use std::sync::Mutex;
use std::sync::mpsc;

type Task = Box<dyn FnOnce() + Send>;

/// Multi-producer, single-consumer callback queue
pub struct WorkQueue {
    tx: mpsc::Sender<Task>,
    rx: Mutex<mpsc::Receiver<Task>>,
}

/// Cloneable producer handle for posting tasks from any thread
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::Sender<Task>,
}

impl WorkQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx: Mutex::new(rx) }
    }

    /// Producer handle for this queue
    pub fn handle(&self) -> QueueHandle {
        QueueHandle { tx: self.tx.clone() }
    }

    /// Run every queued task on the calling thread. Returns how many ran.
    ///
    /// Call this from exactly one thread; tasks must not pump the queue
    /// they run on.
    pub fn pump(&self) -> usize {
        let rx = self.rx.lock().unwrap();
        let mut count = 0;
        while let Ok(task) = rx.try_recv() {
            task();
            count += 1;
        }
        count
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueHandle {
    /// Queue a task for the consuming thread. Dropped silently if the
    /// queue no longer exists.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(Box::new(task));
    }
}
