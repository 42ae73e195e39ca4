use std::{
	sync::{Arc, Mutex},
	time::Duration,
};

use time::OffsetDateTime;
use tokio::{
	sync::{broadcast, watch},
	task::JoinHandle,
};

use jot_providers::LlmAdapter;
use jot_storage::{db::Db, queries};

use crate::{Error, Result, TaskReceiver, TranslationTask};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
	/// The loop is running and waiting on the queue.
	Started,
	TaskCompleted { note_id: i64 },
	TaskFailed { note_id: i64, error: String },
	/// The note was deleted or moved on before the task could finish.
	TaskDropped { note_id: i64 },
	/// The loop panicked and was respawned.
	Restarted { restarts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
	Completed,
	Failed { error: String },
	Dropped,
}

struct WorkerContext {
	db: Db,
	adapter: Option<Arc<LlmAdapter>>,
	events: broadcast::Sender<WorkerEvent>,
	error_pause: Duration,
}

/// The single background consumer of the translation queue.
pub struct TranslationWorker {
	ctx: Arc<WorkerContext>,
	receiver: TaskReceiver,
	shutdown: watch::Sender<bool>,
	supervisor: Mutex<Option<JoinHandle<()>>>,
}
impl TranslationWorker {
	/// Without an adapter every task ends as `failed`.
	pub fn new(
		db: Db,
		adapter: Option<Arc<LlmAdapter>>,
		receiver: TaskReceiver,
		cfg: &jot_config::Translation,
	) -> Self {
		let (events, _) = broadcast::channel(EVENT_CAPACITY);
		let (shutdown, _) = watch::channel(false);
		let ctx = WorkerContext {
			db,
			adapter,
			events,
			error_pause: Duration::from_millis(cfg.error_pause_ms),
		};

		Self { ctx: Arc::new(ctx), receiver, shutdown, supervisor: Mutex::new(None) }
	}

	/// Spawns the supervised loop on the current runtime. Returns `false` if it already runs.
	pub fn start(&self) -> bool {
		let mut supervisor = self.supervisor.lock().unwrap_or_else(|err| err.into_inner());

		if supervisor.as_ref().is_some_and(|handle| !handle.is_finished()) {
			return false;
		}

		self.shutdown.send_replace(false);

		*supervisor = Some(tokio::spawn(supervise(
			self.ctx.clone(),
			self.receiver.clone(),
			self.shutdown.subscribe(),
		)));

		true
	}

	pub fn is_running(&self) -> bool {
		self.supervisor
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.as_ref()
			.is_some_and(|handle| !handle.is_finished())
	}

	pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
		self.ctx.events.subscribe()
	}

	/// Stops taking new tasks and waits for the task in progress to finish.
	pub async fn shutdown(&self) {
		self.shutdown.send_replace(true);

		let handle = self.supervisor.lock().unwrap_or_else(|err| err.into_inner()).take();

		if let Some(handle) = handle
			&& let Err(err) = handle.await
		{
			tracing::error!(error = %err, "Translation worker supervisor failed.");
		}
	}
}

async fn supervise(
	ctx: Arc<WorkerContext>,
	receiver: TaskReceiver,
	shutdown: watch::Receiver<bool>,
) {
	let mut restarts = 0_u32;

	loop {
		let handle = tokio::spawn(run_loop(ctx.clone(), receiver.clone(), shutdown.clone()));

		match handle.await {
			Ok(()) => {
				tracing::info!("Translation worker stopped.");

				return;
			},
			Err(err) if err.is_panic() => {
				restarts += 1;

				tracing::error!(restarts, "Translation worker panicked. Restarting.");
				tokio::time::sleep(ctx.error_pause).await;

				let _ = ctx.events.send(WorkerEvent::Restarted { restarts });
			},
			Err(err) => {
				tracing::warn!(error = %err, "Translation worker was cancelled.");

				return;
			},
		}
	}
}

async fn run_loop(
	ctx: Arc<WorkerContext>,
	receiver: TaskReceiver,
	mut shutdown: watch::Receiver<bool>,
) {
	tracing::info!("Translation worker started.");

	let _ = ctx.events.send(WorkerEvent::Started);

	loop {
		let queued = tokio::select! {
			biased;
			_ = shutdown.wait_for(|stop| *stop) => break,
			queued = receiver.recv() => queued,
		};
		let Some(queued) = queued else {
			tracing::info!("Translation queue closed.");

			break;
		};
		let note_id = queued.task().note_id;
		let task = tokio::spawn(process_task(ctx.clone(), queued.task().clone()));
		let event = match task.await {
			Ok(Ok(TaskOutcome::Completed)) => WorkerEvent::TaskCompleted { note_id },
			Ok(Ok(TaskOutcome::Failed { error })) => WorkerEvent::TaskFailed { note_id, error },
			Ok(Ok(TaskOutcome::Dropped)) => WorkerEvent::TaskDropped { note_id },
			Ok(Err(err)) => {
				tracing::error!(error = %err, note_id, "Translation task failed.");
				tokio::time::sleep(ctx.error_pause).await;

				WorkerEvent::TaskFailed { note_id, error: err.to_string() }
			},
			Err(err) => {
				tracing::error!(error = %err, note_id, "Translation task aborted.");

				let event = settle_aborted(&ctx, note_id, err.to_string()).await;

				tokio::time::sleep(ctx.error_pause).await;

				event
			},
		};

		let _ = ctx.events.send(event);

		// The in-flight slot is released only after the event is sent.
		drop(queued);
	}
}

/// Runs one task to completion. Errors returned here are store failures that even the
/// best-effort `failed` write could not absorb.
async fn process_task(ctx: Arc<WorkerContext>, task: TranslationTask) -> Result<TaskOutcome> {
	let ctx = ctx.as_ref();
	let note_id = task.note_id;
	let claimed = match queries::claim_translation(&ctx.db, note_id, OffsetDateTime::now_utc()).await
	{
		Ok(claimed) => claimed,
		Err(err) => {
			tracing::error!(error = %err, note_id, "Failed to claim translation task.");
			queries::abandon_translation(&ctx.db, note_id, OffsetDateTime::now_utc()).await?;

			return Ok(TaskOutcome::Failed { error: err.to_string() });
		},
	};

	if claimed.is_none() {
		tracing::debug!(note_id, "Translation task dropped. Note is gone or no longer pending.");

		return Ok(TaskOutcome::Dropped);
	}

	match translate(ctx, &task).await {
		Ok(translated) => {
			let stored = queries::complete_translation(
				&ctx.db,
				note_id,
				&translated.title,
				&translated.content,
				OffsetDateTime::now_utc(),
			)
			.await;

			match stored {
				Ok(true) => {
					tracing::info!(note_id, "Translation completed.");

					Ok(TaskOutcome::Completed)
				},
				Ok(false) => Ok(TaskOutcome::Dropped),
				Err(err) => {
					tracing::error!(error = %err, note_id, "Failed to store translation.");

					record_failure(ctx, note_id, err.into()).await
				},
			}
		},
		Err(err) => {
			tracing::warn!(error = %err, note_id, "Translation failed.");

			record_failure(ctx, note_id, err).await
		},
	}
}

async fn translate(
	ctx: &WorkerContext,
	task: &TranslationTask,
) -> Result<jot_providers::TranslatedText> {
	let adapter = ctx.adapter.as_ref().ok_or(Error::AdapterUnavailable)?;
	let translated =
		adapter.translate_text(&task.title, &task.content, &task.target_language).await?;

	Ok(translated)
}

async fn record_failure(ctx: &WorkerContext, note_id: i64, cause: Error) -> Result<TaskOutcome> {
	if queries::fail_translation(&ctx.db, note_id, OffsetDateTime::now_utc()).await? {
		Ok(TaskOutcome::Failed { error: cause.to_string() })
	} else {
		Ok(TaskOutcome::Dropped)
	}
}

/// Fails the note of a task that panicked or was cancelled, whether it was claimed or not.
async fn settle_aborted(ctx: &WorkerContext, note_id: i64, error: String) -> WorkerEvent {
	let now = OffsetDateTime::now_utc();
	let settled = match queries::fail_translation(&ctx.db, note_id, now).await {
		Ok(false) => queries::abandon_translation(&ctx.db, note_id, now).await,
		other => other,
	};

	match settled {
		Ok(true) => WorkerEvent::TaskFailed { note_id, error },
		Ok(false) => WorkerEvent::TaskDropped { note_id },
		Err(err) => {
			tracing::error!(error = %err, note_id, "Failed to mark aborted translation failed.");

			WorkerEvent::TaskFailed { note_id, error }
		},
	}
}
