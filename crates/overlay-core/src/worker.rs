//! Background query execution
//!
//! A query runs as its own tokio task and reports back only through an
//! [`UpdateSink`]. The lifecycle it emits is fixed: the processing
//! placeholder is swapped for a streaming AI message on the first output,
//! then exactly one of `FinalizeAiMessage` / `HandleError`, then
//! `QueryFinished`.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;

use crate::event::{StatusKind, UiUpdate, UpdateSink};

/// Something that can answer a request by streaming text into a [`StreamSink`]
pub trait QueryBackend: Send + Sync + 'static {
    fn stream(
        &self,
        request: &str,
        sink: &mut StreamSink,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Starts queries for the overlay
pub trait QueryService {
    fn start(&self, request: String, sink: UpdateSink) -> WorkerHandle;
}

/// Where a backend writes its output
pub struct StreamSink {
    updates: UpdateSink,
    started: bool,
}

impl StreamSink {
    pub fn new(updates: UpdateSink) -> Self {
        Self {
            updates,
            started: false,
        }
    }

    pub fn chunk(&mut self, text: &str) {
        self.begin();
        if !text.is_empty() {
            self.updates.send(UiUpdate::UpdateAiMessage(text.to_string()));
        }
    }

    pub fn status(&mut self, kind: StatusKind, detail: impl Into<String>) {
        self.begin();
        self.updates.send(UiUpdate::Status {
            kind,
            detail: detail.into(),
        });
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    fn begin(&mut self) {
        if !self.started {
            self.started = true;
            self.updates.send(UiUpdate::RemoveProcessing);
            self.updates.send(UiUpdate::AddAiMessage);
        }
    }
}

/// Reference to a running query. Dropping it detaches the task.
#[derive(Debug)]
pub struct WorkerHandle {
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl From<JoinHandle<()>> for WorkerHandle {
    fn from(task: JoinHandle<()>) -> Self {
        Self { task }
    }
}

/// Runs each request against a shared backend on the tokio runtime
pub struct QueryWorker<B> {
    backend: Arc<B>,
}

impl<B: QueryBackend> QueryWorker<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn spawn(&self, request: String, updates: UpdateSink) -> WorkerHandle {
        let backend = Arc::clone(&self.backend);
        let task = tokio::spawn(async move {
            run_query(backend.as_ref(), &request, updates).await;
        });
        WorkerHandle::from(task)
    }
}

impl<B: QueryBackend> QueryService for QueryWorker<B> {
    fn start(&self, request: String, sink: UpdateSink) -> WorkerHandle {
        self.spawn(request, sink)
    }
}

async fn run_query<B: QueryBackend>(backend: &B, request: &str, updates: UpdateSink) {
    tracing::info!(len = request.len(), "query started");
    let mut sink = StreamSink::new(updates.clone());

    match backend.stream(request, &mut sink).await {
        Ok(()) => {
            // Make sure a message exists to finalize even if nothing streamed
            sink.begin();
            updates.send(UiUpdate::FinalizeAiMessage);
            tracing::info!("query completed");
        }
        Err(e) => {
            tracing::error!("query failed: {e:#}");
            updates.send(UiUpdate::HandleError(format!("{e:#}")));
        }
    }

    updates.send(UiUpdate::QueryFinished);
}
