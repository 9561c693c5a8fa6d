use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::classify_batch_use_case::{BatchError, BatchEvent, ClassifyBatchUseCase};
use crate::shared::error::BoxError;
use crate::storage::domain::batch::Batch;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

pub type EventResult = Result<BatchEvent, BatchError>;

/// Runs a batch on a dedicated thread and forwards its events over a
/// channel, so GUI or web hosts can consume progress without blocking.
///
/// The worker stops before the next file once the handle is cancelled or the
/// receiver is dropped. With a buffered channel it may already be up to
/// `channel_capacity` files ahead of the consumer.
pub struct ThreadedBatchRunner {
    channel_capacity: usize,
}

impl ThreadedBatchRunner {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// A capacity of 0 makes every event a rendezvous with the consumer.
    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self { channel_capacity }
    }

    pub fn spawn(
        &self,
        use_case: ClassifyBatchUseCase,
        batch: Batch,
        files: Vec<PathBuf>,
    ) -> BatchHandle {
        let (tx, rx) = crossbeam_channel::bounded::<EventResult>(self.channel_capacity);
        let cancelled = Arc::new(AtomicBool::new(false));
        let join = spawn_worker(use_case, batch, files, tx, cancelled.clone());
        BatchHandle {
            events: rx,
            cancelled,
            join,
        }
    }
}

impl Default for ThreadedBatchRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_worker(
    mut use_case: ClassifyBatchUseCase,
    batch: Batch,
    files: Vec<PathBuf>,
    tx: Sender<EventResult>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<ClassifyBatchUseCase> {
    std::thread::spawn(move || {
        let mut run = use_case.run(&batch, files);
        loop {
            if cancelled.load(Ordering::Relaxed) {
                log::info!("Batch {} cancelled", batch.id());
                break;
            }
            let Some(event) = run.next() else {
                break;
            };
            if tx.send(event).is_err() {
                log::info!("Batch {} abandoned by consumer", batch.id());
                break;
            }
        }
        drop(run);
        use_case
    })
}

/// Consumer side of a running batch.
pub struct BatchHandle {
    events: Receiver<EventResult>,
    cancelled: Arc<AtomicBool>,
    join: JoinHandle<ClassifyBatchUseCase>,
}

impl BatchHandle {
    pub fn events(&self) -> &Receiver<EventResult> {
        &self.events
    }

    /// Asks the worker to stop before its next file.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Drops the receiver and waits for the worker, handing back the use
    /// case for reuse.
    pub fn join(self) -> Result<ClassifyBatchUseCase, BoxError> {
        drop(self.events);
        self.join
            .join()
            .map_err(|_| -> BoxError { "Batch worker thread panicked".into() })
    }
}
