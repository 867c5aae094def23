//! The single background thread that runs a batch.
//!
//! Progress flows back to the UI thread through an mpsc channel; the UI
//! drains it on its own schedule. Cancellation is a shared flag the runner
//! checks between files.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::error;

use crate::convert::ConversionChain;
use crate::library::SourceFile;

use super::report::{BatchReport, Progress};
use super::runner::run_batch;

#[derive(Debug)]
pub enum WorkerEvent {
    Progress(Progress),
    /// The batch ran to the end or stopped on request.
    Finished(BatchReport),
    /// The batch stopped on a batch-level error.
    Aborted(String),
}

pub struct BatchWorker {
    rx: Receiver<WorkerEvent>,
    cancel: Arc<AtomicBool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl BatchWorker {
    pub fn spawn(files: Vec<SourceFile>, chain: ConversionChain, destination: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel::<WorkerEvent>();
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_for_thread = cancel.clone();

        let handle = thread::spawn(move || {
            let progress_tx = tx.clone();
            let result = run_batch(&files, &chain, &destination, &cancel_for_thread, |p| {
                // The receiver may be gone if the UI quit; keep converting regardless.
                let _ = progress_tx.send(WorkerEvent::Progress(p.clone()));
            });

            let event = match result {
                Ok(report) => WorkerEvent::Finished(report),
                Err(e) => {
                    error!(error = %e, "batch aborted");
                    WorkerEvent::Aborted(e.to_string())
                }
            };
            let _ = tx.send(event);
        });

        Self {
            rx,
            cancel,
            join: Mutex::new(Some(handle)),
        }
    }

    /// Ask the worker to stop before the next file.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Drain every event currently queued, without blocking.
    pub fn drain(&self) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(ev) => events.push(ev),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Block for the next event; `None` once the worker is done and the channel is empty.
    pub fn recv(&self) -> Option<WorkerEvent> {
        self.rx.recv().ok()
    }

    /// Wait for the worker thread to exit.
    pub fn join(&self) {
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                if h.join().is_err() {
                    error!("batch worker panicked");
                }
            }
        }
    }
}
