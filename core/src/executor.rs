//! Background execution context shared by every call of one client.
//!
//! # Design
//! A Tokio current-thread runtime is driven by a single named worker thread
//! for the executor's whole lifetime. Calls are spawned onto it and handed
//! back as `Deferred` values, which can be awaited from any async context or
//! waited on from a plain thread. The worker thread is the only thread that
//! drives the runtime, so blocking on it would deadlock; `Deferred::wait`
//! refuses instead.
//!
//! Dropping the `Executor` signals the worker to leave its run loop, drops
//! the runtime on that thread (cancelling whatever is still pending) and
//! joins it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle, ThreadId};

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task::JoinError;
use tracing::{debug, error};

use crate::error::ApiError;

const WORKER_NAME: &str = "outline-io";

pub struct Executor {
    handle: Handle,
    worker_id: ThreadId,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Executor {
    pub fn new() -> Result<Self, ApiError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::Executor(format!("failed to build runtime: {e}")))?;
        let handle = runtime.handle().clone();
        let (shutdown, stopped) = oneshot::channel::<()>();

        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                // A dropped sender also ends the loop.
                runtime.block_on(async {
                    let _ = stopped.await;
                });
                debug!("executor worker stopped");
            })
            .map_err(|e| ApiError::Executor(format!("failed to start worker thread: {e}")))?;

        Ok(Self {
            handle,
            worker_id: worker.thread().id(),
            shutdown: Some(shutdown),
            worker: Some(worker),
        })
    }

    /// Schedule `future` on the worker thread.
    pub fn spawn<T, F>(&self, future: F) -> Deferred<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Deferred {
            task: self.handle.spawn(future),
            worker_id: self.worker_id,
        }
    }

    pub fn worker_id(&self) -> ThreadId {
        self.worker_id
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let Some(worker) = self.worker.take() else {
            return;
        };
        // Joining from the worker itself would never return.
        if thread::current().id() == self.worker_id {
            return;
        }
        if worker.join().is_err() {
            error!("executor worker thread panicked");
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("worker_id", &self.worker_id)
            .finish_non_exhaustive()
    }
}

/// Handle to a call scheduled on an `Executor`.
///
/// Resolves to the call's result when awaited; `wait` blocks the current
/// thread instead.
#[must_use = "a Deferred does nothing unless awaited or waited on"]
#[derive(Debug)]
pub struct Deferred<T> {
    task: tokio::task::JoinHandle<Result<T, ApiError>>,
    worker_id: ThreadId,
}

impl<T> Deferred<T> {
    /// Block the current thread until the call completes.
    ///
    /// Returns `ApiError::Executor` without blocking when called on the
    /// executor's own worker thread.
    pub fn wait(self) -> Result<T, ApiError> {
        if thread::current().id() == self.worker_id {
            return Err(ApiError::Executor(
                "blocking wait issued from the executor worker thread".to_string(),
            ));
        }
        futures::executor::block_on(self)
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, ApiError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.task).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(err) => Err(join_error(err)),
        })
    }
}

fn join_error(err: JoinError) -> ApiError {
    if err.is_cancelled() {
        ApiError::Executor("executor shut down before the call completed".to_string())
    } else {
        ApiError::Executor(format!("call panicked: {err}"))
    }
}
