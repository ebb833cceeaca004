use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use stamper_core::{JobHandle, JobId, JobRequest};
use stamper_logging::{stamper_error, stamper_info, stamper_warn};
use tokio_util::sync::CancellationToken;

use crate::render::{ChannelRenderer, ErrorHandler, Renderer};
use crate::settings::ClientSettings;
use crate::stream::{render_stream, HttpStreamConsumer, StreamConsumer};
use crate::submit::{HttpRequestSubmitter, RequestSubmitter};
use crate::{EngineEvent, JobFailure, JobOutcome, StreamOutcome, StreamSummary, TransportError};

/// Submits `request`, then streams the result into `renderer` until a terminal state.
///
/// The stream is opened only after submission has produced a handle.
/// `on_accepted` runs once, between the two. Every failure is reported
/// through an [`ErrorHandler`] exactly once before it is returned.
pub async fn run_job<F>(
    submitter: &dyn RequestSubmitter,
    consumer: &dyn StreamConsumer,
    request: &JobRequest,
    renderer: &dyn Renderer,
    cancel: &CancellationToken,
    on_accepted: F,
) -> Result<JobOutcome, JobFailure>
where
    F: FnOnce(&JobHandle) + Send,
{
    let errors = ErrorHandler::new(renderer);

    let submitted = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = submitter.submit(request) => Some(result),
    };
    let handle = match submitted {
        None => {
            stamper_info!("Job cancelled before the backend accepted it");
            return Ok(JobOutcome::CancelledBeforeAccept);
        }
        Some(Ok(handle)) => handle,
        Some(Err(err)) => {
            errors.report(&err.to_string());
            return Err(err.into());
        }
    };
    on_accepted(&handle);

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = consumer.open(&handle) => Some(result),
    };
    let stream = match opened {
        None => {
            stamper_info!("Stream {} cancelled before it opened", handle);
            return Ok(JobOutcome::Streamed(StreamSummary {
                handle,
                chunks: 0,
                bytes: 0,
                chars: 0,
                outcome: StreamOutcome::Cancelled,
            }));
        }
        Some(Ok(stream)) => stream.with_cancellation(cancel.clone()),
        Some(Err(err)) => {
            errors.report(&err.to_string());
            return Err(err.into());
        }
    };

    match render_stream(stream, renderer).await {
        Ok(summary) => {
            stamper_info!(
                "Stream {} ended ({:?}) chunks={} bytes={}",
                summary.handle,
                summary.outcome,
                summary.chunks,
                summary.bytes
            );
            Ok(JobOutcome::Streamed(summary))
        }
        Err(err) => {
            errors.report(&err.to_string());
            Err(err.into())
        }
    }
}

enum EngineCommand {
    Submit { job_id: JobId, request: JobRequest },
    Cancel { job_id: JobId },
}

type CancelMap = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

/// Background engine: a tokio runtime on its own thread, driven by commands.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let client = settings.build_client()?;
        let submitter = HttpRequestSubmitter::with_client(client.clone(), settings.clone());
        let consumer = HttpStreamConsumer::with_client(client, settings);
        Ok(Self::with_parts(Arc::new(submitter), Arc::new(consumer)))
    }

    pub fn with_parts(
        submitter: Arc<dyn RequestSubmitter>,
        consumer: Arc<dyn StreamConsumer>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    stamper_error!("Failed to start tokio runtime: {}", err);
                    return;
                }
            };
            let jobs: CancelMap = Arc::default();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit { job_id, request } => {
                        let cancel = CancellationToken::new();
                        if let Ok(mut jobs) = jobs.lock() {
                            jobs.insert(job_id, cancel.clone());
                        }
                        let submitter = submitter.clone();
                        let consumer = consumer.clone();
                        let event_tx = event_tx.clone();
                        let jobs = jobs.clone();
                        runtime.spawn(async move {
                            handle_submit(
                                submitter.as_ref(),
                                consumer.as_ref(),
                                job_id,
                                request,
                                cancel,
                                event_tx,
                            )
                            .await;
                            if let Ok(mut jobs) = jobs.lock() {
                                jobs.remove(&job_id);
                            }
                        });
                    }
                    EngineCommand::Cancel { job_id } => {
                        let token = jobs.lock().ok().and_then(|jobs| jobs.get(&job_id).cloned());
                        match token {
                            Some(token) => token.cancel(),
                            None => stamper_warn!("Cancel for unknown job {}", job_id),
                        }
                    }
                }
            }
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn submit(&self, job_id: JobId, request: JobRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { job_id, request });
    }

    pub fn cancel(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { job_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }
}

async fn handle_submit(
    submitter: &dyn RequestSubmitter,
    consumer: &dyn StreamConsumer,
    job_id: JobId,
    request: JobRequest,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let renderer = ChannelRenderer::new(job_id, event_tx.clone());
    let accepted_tx = event_tx.clone();
    let result = run_job(submitter, consumer, &request, &renderer, &cancel, move |handle| {
        let _ = accepted_tx.send(EngineEvent::JobAccepted {
            job_id,
            handle: handle.clone(),
        });
    })
    .await;
    let _ = event_tx.send(EngineEvent::JobCompleted {
        job_id,
        result: result.map_err(|failure| failure.kind()),
    });
}
