//! Single-flight request queue.
//!
//! One worker task owns the receiving end of the channel, so at most one
//! generation is ever in flight and requests run in arrival order. Before
//! each dispatch the worker waits until `min_interval` has passed since the
//! previous dispatch started.

use async_trait::async_trait;
use shared::result::StructuredResult;
use shared::settings::QueueSettings;
use shared::Mode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StudioError;
use crate::request::GenerationRequest;

type Reply = Result<StructuredResult, StudioError>;

/// Runs one dequeued request to completion.
#[async_trait]
pub trait RequestExecutor: Send + Sync + 'static {
    async fn execute(&self, request: GenerationRequest) -> Result<StructuredResult, StudioError>;
}

struct Job {
    request: GenerationRequest,
    reply: oneshot::Sender<Reply>,
}

/// Handle to a queued request; resolves when the worker has run it.
#[derive(Debug)]
pub struct PendingGeneration {
    id: Uuid,
    mode: Mode,
    reply: oneshot::Receiver<Reply>,
}

impl PendingGeneration {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Mode the request was submitted under; the result belongs in that buffer.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub async fn wait(self) -> Result<StructuredResult, StudioError> {
        self.reply.await.map_err(|_| StudioError::QueueClosed)?
    }
}

pub struct RequestQueue {
    tx: mpsc::UnboundedSender<Job>,
    depth: Arc<AtomicUsize>,
    max_depth: Option<usize>,
    worker: JoinHandle<()>,
}

impl RequestQueue {
    /// Start the worker. Must be called from inside a tokio runtime.
    pub fn spawn(executor: Arc<dyn RequestExecutor>, settings: QueueSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        let max_depth = settings.max_depth;
        let worker = tokio::spawn(run_worker(executor, settings, rx, depth.clone()));
        Self {
            tx,
            depth,
            max_depth,
            worker,
        }
    }

    /// Append a request. Fails only when a depth cap is configured and
    /// reached, or the worker is gone.
    pub fn enqueue(&self, request: GenerationRequest) -> Result<PendingGeneration, StudioError> {
        let reserved = self.depth.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| {
            match self.max_depth {
                Some(max) if depth >= max => None,
                _ => Some(depth + 1),
            }
        });
        if let Err(depth) = reserved {
            return Err(StudioError::QueueFull { depth });
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        let pending = PendingGeneration {
            id: request.id,
            mode: request.mode,
            reply: reply_rx,
        };
        let job = Job {
            request,
            reply: reply_tx,
        };
        if self.tx.send(job).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(StudioError::QueueClosed);
        }
        debug!("Queued request {} ({} pending)", pending.id, self.pending());
        Ok(pending)
    }

    /// Requests waiting for dispatch (excluding the one in flight).
    pub fn pending(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Stop accepting work and wait for queued requests to drain.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

async fn run_worker(
    executor: Arc<dyn RequestExecutor>,
    settings: QueueSettings,
    mut rx: mpsc::UnboundedReceiver<Job>,
    depth: Arc<AtomicUsize>,
) {
    let min_interval = settings.min_interval();
    let yield_delay = settings.yield_delay();
    let mut last_dispatch: Option<Instant> = None;

    while let Some(job) = rx.recv().await {
        if let Some(last) = last_dispatch {
            let ready = last + min_interval;
            if ready > Instant::now() {
                debug!("Rate limit: waiting {:?}", ready - Instant::now());
                time::sleep_until(ready).await;
            }
        }

        depth.fetch_sub(1, Ordering::SeqCst);
        last_dispatch = Some(Instant::now());

        let Job { request, reply } = job;
        let id = request.id;
        info!(
            "Dispatching request {} (queued {:?}, {} still pending)",
            id,
            request.enqueued_at.elapsed(),
            depth.load(Ordering::SeqCst)
        );
        let result = executor.execute(request).await;
        if reply.send(result).is_err() {
            debug!("Caller for request {} went away before completion", id);
        }

        if depth.load(Ordering::SeqCst) > 0 && !yield_delay.is_zero() {
            time::sleep(yield_delay).await;
        }
    }
    debug!("Request queue worker stopped");
}
