//! Per-product serialization of remote cart calls.
//!
//! Every product id gets its own worker task fed by an unbounded channel.
//! A worker handles one command at a time, so for a single product an upsert
//! that is already on the wire always settles before a later delete is sent.
//! Different products never wait on each other.
//!
//! ## Debounce
//!
//! An `Upsert` opens a quiet window. Another `Upsert` inside the window
//! replaces the quantity and restarts it; any other command drops the
//! pending upsert. When the window elapses (or the queue is closed for
//! shutdown) the latest quantity is sent.
//!
//! ## Cart-wide calls
//!
//! A remote clear goes through [`SyncQueue::after_settled`]: every worker
//! first drops its pending upsert and finishes the call it has in flight,
//! then holds further commands until the clear is done. A line changed
//! before the clear can therefore never land on the server after it.
//!
//! ## Idle workers
//!
//! A worker with nothing to do for [`WORKER_IDLE`] removes itself from the
//! map and exits; the next command for that product starts a fresh one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use super::remote::CartRemote;

/// How long a worker waits for a command before retiring.
pub(crate) const WORKER_IDLE: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub(crate) enum SyncCommand {
    Upsert(u32),
    Delete,
    /// Report once nothing is in flight, then wait for `resume` to turn true.
    Barrier {
        settled: oneshot::Sender<()>,
        resume: watch::Receiver<bool>,
    },
}

struct Worker {
    tx: UnboundedSender<SyncCommand>,
    handle: JoinHandle<()>,
}

type Workers = Arc<Mutex<HashMap<String, Worker>>>;

fn lock(workers: &Mutex<HashMap<String, Worker>>) -> MutexGuard<'_, HashMap<String, Worker>> {
    workers.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct SyncQueue<R> {
    remote: Arc<R>,
    debounce: Duration,
    workers: Workers,
    /// Cart-wide calls not tied to one product (cart clear).
    detached: Mutex<Vec<JoinHandle<()>>>,
}

impl<R: CartRemote> SyncQueue<R> {
    pub(crate) fn new(remote: Arc<R>, debounce: Duration) -> Self {
        Self {
            remote,
            debounce,
            workers: Arc::new(Mutex::new(HashMap::new())),
            detached: Mutex::new(Vec::new()),
        }
    }

    /// Queue a command for `product_id`, starting its worker if needed.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn send(&self, product_id: &str, command: SyncCommand) {
        let mut workers = lock(&self.workers);
        let worker = workers
            .entry(product_id.to_string())
            .or_insert_with(|| self.spawn_worker(product_id));

        if let Err(mpsc::error::SendError(command)) = worker.tx.send(command) {
            // The worker died (a panicking remote); start over with a fresh one.
            tracing::warn!(product_id, "cart sync worker gone, restarting");
            *worker = self.spawn_worker(product_id);
            let _ = worker.tx.send(command);
        }
    }

    /// Run a cart-wide remote call once every product's in-flight call has
    /// settled. Pending upserts are dropped; commands queued after this call
    /// wait until it is done.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn after_settled<F>(&self, make: impl FnOnce(Arc<R>) -> F + Send + 'static)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (resume_tx, resume_rx) = watch::channel(false);
        let settled: Vec<oneshot::Receiver<()>> = lock(&self.workers)
            .values()
            .filter_map(|worker| {
                let (tx, rx) = oneshot::channel();
                let barrier = SyncCommand::Barrier {
                    settled: tx,
                    resume: resume_rx.clone(),
                };
                worker.tx.send(barrier).ok().map(|()| rx)
            })
            .collect();

        let remote = Arc::clone(&self.remote);
        let handle = tokio::spawn(async move {
            // A dropped sender means the worker is gone, so nothing is in flight.
            for rx in settled {
                let _ = rx.await;
            }
            make(remote).await;
            let _ = resume_tx.send(true);
        });

        let mut detached = self.detached.lock().unwrap_or_else(PoisonError::into_inner);
        detached.retain(|h| !h.is_finished());
        detached.push(handle);
    }

    /// Flush pending upserts and wait for every queued call to settle.
    pub(crate) async fn shutdown(&self) {
        let workers: Vec<(String, Worker)> = lock(&self.workers).drain().collect();
        let detached: Vec<JoinHandle<()>> = self
            .detached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for (product_id, Worker { tx, handle }) in workers {
            // Closing the channel makes the worker flush and exit.
            drop(tx);
            if let Err(err) = handle.await {
                tracing::warn!(product_id = %product_id, error = %err, "cart sync worker failed");
            }
        }
        for handle in detached {
            let _ = handle.await;
        }
    }

    #[cfg(test)]
    pub(crate) fn worker_count(&self) -> usize {
        lock(&self.workers).len()
    }

    fn spawn_worker(&self, product_id: &str) -> Worker {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(
            product_id.to_string(),
            Arc::clone(&self.remote),
            self.debounce,
            Arc::clone(&self.workers),
            rx,
        ));
        Worker { tx, handle }
    }
}

/// How a debounce window ended.
enum Window {
    Elapsed(u32),
    Interrupted(SyncCommand),
    Closed(u32),
}

async fn debounce(mut quantity: u32, delay: Duration, rx: &mut UnboundedReceiver<SyncCommand>) -> Window {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => return Window::Elapsed(quantity),
            next = rx.recv() => match next {
                Some(SyncCommand::Upsert(latest)) => quantity = latest,
                Some(other) => return Window::Interrupted(other),
                None => return Window::Closed(quantity),
            },
        }
    }
}

/// What an idle worker found when it went to retire.
enum Retire {
    Exit,
    Resume(SyncCommand),
}

/// Remove this worker's map entry, unless a command slipped in first.
///
/// Senders hold the map lock while sending, so checking the channel under
/// the same lock leaves no gap for a command to be lost.
fn retire(workers: &Mutex<HashMap<String, Worker>>, product_id: &str, rx: &mut UnboundedReceiver<SyncCommand>) -> Retire {
    let mut workers = lock(workers);
    match rx.try_recv() {
        Ok(command) => Retire::Resume(command),
        Err(TryRecvError::Empty) => {
            workers.remove(product_id);
            Retire::Exit
        }
        Err(TryRecvError::Disconnected) => Retire::Exit,
    }
}

async fn run_worker<R: CartRemote>(
    product_id: String,
    remote: Arc<R>,
    delay: Duration,
    workers: Workers,
    mut rx: UnboundedReceiver<SyncCommand>,
) {
    let mut next: Option<SyncCommand> = None;

    loop {
        let command = match next.take() {
            Some(command) => command,
            None => {
                tokio::select! {
                    received = rx.recv() => match received {
                        Some(command) => command,
                        None => return,
                    },
                    _ = tokio::time::sleep(WORKER_IDLE) => match retire(&workers, &product_id, &mut rx) {
                        Retire::Resume(command) => command,
                        Retire::Exit => {
                            tracing::trace!(product_id = %product_id, "idle cart sync worker retired");
                            return;
                        }
                    },
                }
            }
        };

        match command {
            SyncCommand::Upsert(quantity) => match debounce(quantity, delay, &mut rx).await {
                Window::Elapsed(quantity) => push_upsert(&*remote, &product_id, quantity).await,
                Window::Closed(quantity) => {
                    push_upsert(&*remote, &product_id, quantity).await;
                    return;
                }
                Window::Interrupted(other) => {
                    tracing::trace!(product_id = %product_id, ?other, "pending upsert dropped");
                    next = Some(other);
                }
            },
            SyncCommand::Delete => push_delete(&*remote, &product_id).await,
            SyncCommand::Barrier { settled, mut resume } => {
                let _ = settled.send(());
                // Err: the cart-wide task is gone, nothing left to wait for.
                let _ = resume.wait_for(|done| *done).await;
            }
        }
    }
}

// Remote failures never reach the UI: the local cart stays as the user left it.
async fn push_upsert<R: CartRemote>(remote: &R, product_id: &str, quantity: u32) {
    match remote.upsert(product_id, quantity).await {
        Ok(()) => tracing::debug!(product_id, quantity, "cart line synced"),
        Err(err) => tracing::warn!(product_id, quantity, error = %err, "cart upsert failed"),
    }
}

async fn push_delete<R: CartRemote>(remote: &R, product_id: &str) {
    match remote.remove(product_id).await {
        Ok(()) => tracing::debug!(product_id, "cart line removed remotely"),
        Err(err) => tracing::warn!(product_id, error = %err, "cart delete failed"),
    }
}
