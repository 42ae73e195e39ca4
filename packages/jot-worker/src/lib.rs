pub mod queue;
pub mod worker;

mod error;

pub use error::{Error, Result};
pub use queue::{QueuedTask, Reservation, TaskReceiver, TranslationQueue, TranslationTask};
pub use worker::{TaskOutcome, TranslationWorker, WorkerEvent};
