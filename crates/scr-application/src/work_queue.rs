//! Ordered work dispatch
//!
//! A strict FIFO of jobs drained by one dedicated worker thread. Graph
//! recomputation enqueues work here so user lifecycle code never runs on the
//! thread that delivered the registry event. Consumers re-validate each
//! payload on dequeue; the queue itself only guarantees FIFO order.

use crate::configuration::ComponentConfiguration;
use crate::reference::Reference;
use parking_lot::{Condvar, Mutex};
use scr_domain::error::{Error, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Work item action with its payload
#[derive(Debug, Clone)]
pub enum WorkAction {
    /// Build configurations presumed satisfied at enqueue time
    Build(Vec<Arc<ComponentConfiguration>>),
    /// Rebind references presumed still relevant
    DynamicBind(Vec<Arc<Reference>>),
}

impl WorkAction {
    /// Action tag used in logs
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Build(_) => "BUILD",
            Self::DynamicBind(_) => "DYNAMICBIND",
        }
    }

    /// Number of payload items
    pub fn len(&self) -> usize {
        match self {
            Self::Build(items) => items.len(),
            Self::DynamicBind(items) => items.len(),
        }
    }

    /// True if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer of dequeued work
pub trait WorkDispatcher: Send + Sync {
    /// Execute one action on the worker thread
    fn dispatch(&self, action: WorkAction);
}

struct WorkItem {
    target: Arc<dyn WorkDispatcher>,
    action: WorkAction,
}

struct QueueShared {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<WorkItem>>>,
    pending: Mutex<usize>,
    idle: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: Mutex<Option<ThreadId>>,
}

impl QueueShared {
    fn finish_one(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

/// FIFO work queue with a single worker thread
#[derive(Clone)]
pub struct WorkQueue {
    shared: Arc<QueueShared>,
}

impl WorkQueue {
    /// Spawn the worker thread
    pub fn start(name: &str) -> Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<WorkItem>();
        let shared = Arc::new(QueueShared {
            name: name.to_string(),
            sender: Mutex::new(Some(sender)),
            pending: Mutex::new(0),
            idle: Condvar::new(),
            worker: Mutex::new(None),
            worker_id: Mutex::new(None),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(worker = %worker_shared.name, "work queue started");
                while let Some(item) = receiver.blocking_recv() {
                    let tag = item.action.tag();
                    let outcome = catch_unwind(AssertUnwindSafe(|| item.target.dispatch(item.action)));
                    if let Err(panic) = outcome {
                        error!(
                            worker = %worker_shared.name,
                            action = tag,
                            panic = %panic_message(panic.as_ref()),
                            "work item panicked"
                        );
                    }
                    worker_shared.finish_one();
                }
                debug!(worker = %worker_shared.name, "work queue drained and closed");
            })
            .map_err(|e| Error::infrastructure_with_source(format!("Failed to spawn worker {name}"), e))?;

        *shared.worker_id.lock() = Some(handle.thread().id());
        *shared.worker.lock() = Some(handle);
        info!(worker = name, "work queue running");
        Ok(Self { shared })
    }

    /// Worker thread name
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Append a job; fails once the queue has been shut down
    pub fn enqueue(&self, target: Arc<dyn WorkDispatcher>, action: WorkAction) -> Result<()> {
        if action.is_empty() {
            return Ok(());
        }
        let sender = self.shared.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(Error::disposed(format!("work queue {}", self.shared.name)));
        };
        debug!(action = action.tag(), items = action.len(), "enqueue work");
        *self.shared.pending.lock() += 1;
        if sender.send(WorkItem { target, action }).is_err() {
            self.shared.finish_one();
            return Err(Error::disposed(format!("work queue {}", self.shared.name)));
        }
        Ok(())
    }

    /// True when called from the worker thread
    pub fn is_worker_thread(&self) -> bool {
        *self.shared.worker_id.lock() == Some(thread::current().id())
    }

    /// Jobs enqueued but not yet finished
    pub fn pending(&self) -> usize {
        *self.shared.pending.lock()
    }

    /// Block until every enqueued job has been drained; false on timeout
    ///
    /// Returns false immediately on the worker thread, which can never
    /// observe its own queue as idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        if self.is_worker_thread() {
            return false;
        }
        let deadline = Instant::now() + timeout;
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            if self.shared.idle.wait_until(&mut pending, deadline).timed_out() {
                return *pending == 0;
            }
        }
        true
    }

    /// Close the queue and join the worker once it drains
    pub fn shutdown(&self) {
        let sender = self.shared.sender.lock().take();
        if sender.is_none() {
            return;
        }
        drop(sender);
        if self.is_worker_thread() {
            return;
        }
        if let Some(handle) = self.shared.worker.lock().take()
            && handle.join().is_err()
        {
            error!(worker = %self.shared.name, "worker thread terminated abnormally");
        }
        info!(worker = %self.shared.name, "work queue stopped");
    }

    /// True once shutdown was requested
    pub fn is_closed(&self) -> bool {
        self.shared.sender.lock().is_none()
    }
}

impl std::fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("name", &self.shared.name)
            .field("pending", &self.pending())
            .finish()
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
