use std::{
	collections::HashSet,
	sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, Notify, mpsc};

use crate::{Error, Result};

/// Snapshot of a note taken when its translation was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTask {
	pub note_id: i64,
	pub title: String,
	pub content: String,
	pub target_language: String,
}

#[derive(Default)]
struct Shared {
	in_flight: Mutex<HashSet<i64>>,
	idle: Notify,
}
impl Shared {
	fn ids(&self) -> std::sync::MutexGuard<'_, HashSet<i64>> {
		self.in_flight.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn release(&self, note_id: i64) {
		let now_idle = {
			let mut ids = self.ids();

			ids.remove(&note_id);

			ids.is_empty()
		};

		if now_idle {
			self.idle.notify_waiters();
		}
	}
}

/// Holds one note id in the in-flight set until dropped.
struct Slot {
	note_id: i64,
	shared: Arc<Shared>,
}
impl Drop for Slot {
	fn drop(&mut self) {
		self.shared.release(self.note_id);
	}
}

/// Producer side of the unbounded FIFO. Cheap to clone.
#[derive(Clone)]
pub struct TranslationQueue {
	tx: mpsc::UnboundedSender<QueuedTask>,
	shared: Arc<Shared>,
}
impl TranslationQueue {
	pub fn new() -> (Self, TaskReceiver) {
		let (tx, rx) = mpsc::unbounded_channel();
		let queue = Self { tx, shared: Arc::new(Shared::default()) };

		(queue, TaskReceiver { rx: Arc::new(AsyncMutex::new(rx)) })
	}

	/// Claims the in-flight slot for `note_id`. Fails while another task for the note is
	/// reserved, queued or running.
	pub fn reserve(&self, note_id: i64) -> Result<Reservation> {
		if !self.shared.ids().insert(note_id) {
			return Err(Error::AlreadyInFlight { note_id });
		}

		Ok(Reservation {
			slot: Slot { note_id, shared: self.shared.clone() },
			tx: self.tx.clone(),
		})
	}

	pub fn in_flight(&self) -> usize {
		self.shared.ids().len()
	}

	pub fn is_in_flight(&self, note_id: i64) -> bool {
		self.shared.ids().contains(&note_id)
	}

	/// Resolves once nothing is reserved, queued or being processed.
	pub async fn wait_idle(&self) {
		loop {
			let notified = self.shared.idle.notified();

			if self.in_flight() == 0 {
				return;
			}

			notified.await;
		}
	}
}

/// Exclusive right to enqueue one task for a note. Dropping it releases the slot.
pub struct Reservation {
	slot: Slot,
	tx: mpsc::UnboundedSender<QueuedTask>,
}
impl Reservation {
	pub fn note_id(&self) -> i64 {
		self.slot.note_id
	}

	/// Enqueues without blocking. The slot travels with the task until the worker is done.
	pub fn submit(self, task: TranslationTask) -> Result<()> {
		if task.note_id != self.slot.note_id {
			return Err(Error::ReservationMismatch { reserved: self.slot.note_id, task: task.note_id });
		}

		let Self { slot, tx } = self;

		tx.send(QueuedTask { task, _slot: slot }).map_err(|_| Error::QueueClosed)
	}
}

/// A dequeued task. The note stays in flight until this value is dropped.
pub struct QueuedTask {
	task: TranslationTask,
	_slot: Slot,
}
impl QueuedTask {
	pub fn task(&self) -> &TranslationTask {
		&self.task
	}
}

/// Consumer side. Clones share the same underlying receiver.
#[derive(Clone)]
pub struct TaskReceiver {
	rx: Arc<AsyncMutex<mpsc::UnboundedReceiver<QueuedTask>>>,
}
impl TaskReceiver {
	/// Waits for the next task. `None` once every producer is gone.
	pub async fn recv(&self) -> Option<QueuedTask> {
		self.rx.lock().await.recv().await
	}
}
