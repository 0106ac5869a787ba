//! Background worker with a one-shot result channel.

use actian_odbc_core::{Error, Result};
use std::any::Any;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread::JoinHandle;
use tracing::warn;

/// Handle to a worker started by [`crate::Database::spawn_worker`].
pub struct WorkerHandle<T> {
    rx: Receiver<Result<T>>,
    thread: Option<JoinHandle<()>>,
}

impl<T> WorkerHandle<T> {
    pub(crate) fn new(rx: Receiver<Result<T>>, thread: JoinHandle<()>) -> Self {
        Self {
            rx,
            thread: Some(thread),
        }
    }

    /// Check whether the worker has finished running.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Take the result if the worker has already reported one.
    ///
    /// A worker that panicked reports `Error::Internal`.
    pub fn try_wait(&mut self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.join())),
        }
    }

    /// Block until the worker reports its result.
    ///
    /// A worker that panicked reports `Error::Internal` carrying the panic
    /// message.
    pub fn wait(mut self) -> Result<T> {
        match self.rx.recv() {
            Ok(result) => {
                let _ = self.join();
                result
            }
            Err(_) => Err(self.join()),
        }
    }

    /// Join the thread, turning a panic into an error
    fn join(&mut self) -> Error {
        let Some(thread) = self.thread.take() else {
            return Error::Internal("worker already joined".into());
        };
        match thread.join() {
            Ok(()) => Error::Internal("worker exited without reporting a result".into()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(panic = %message, "Worker panicked");
                Error::Internal(format!("worker panicked: {}", message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
