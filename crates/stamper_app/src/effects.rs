use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use stamper_core::{Effect, Msg};
use stamper_engine::{ClientSettings, EngineEvent, EngineHandle, TransportError};
use stamper_logging::{stamper_info, stamper_warn};

/// Turns core effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings, msg_tx: mpsc::Sender<Msg>) -> Result<Self, TransportError> {
        let engine = EngineHandle::new(settings)?;
        let runner = Self { engine };
        runner.spawn_event_loop(msg_tx);
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitJob { job_id, request } => {
                    stamper_info!(
                        "SubmitJob job_id={} url={} minute_increment={}",
                        job_id,
                        request.target_url(),
                        request.minute_increment()
                    );
                    self.engine.submit(job_id, request);
                }
                Effect::CancelJob { job_id } => {
                    stamper_info!("CancelJob job_id={}", job_id);
                    self.engine.cancel(job_id);
                }
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.try_recv() {
                let Some(msg) = map_event(event) else {
                    continue;
                };
                if msg_tx.send(msg).is_err() {
                    break;
                }
            } else {
                thread::sleep(Duration::from_millis(20));
            }
        });
    }
}

/// Failures are already reported through `Error`, so a failed completion maps to nothing.
fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::JobAccepted { job_id, handle } => Some(Msg::JobAccepted {
            job_id,
            request_id: handle.request_id().to_string(),
        }),
        EngineEvent::Text { job_id, full } => Some(Msg::StreamText { job_id, full }),
        EngineEvent::ScrollToBottom { job_id } => Some(Msg::ScrollRequested { job_id }),
        EngineEvent::Error { job_id, message } => Some(Msg::JobFailed { job_id, message }),
        EngineEvent::JobCompleted { job_id, result } => match result {
            Ok(outcome) => Some(Msg::JobFinished {
                job_id,
                cancelled: outcome.was_cancelled(),
            }),
            Err(kind) => {
                stamper_warn!("Job {} failed: {}", job_id, kind);
                None
            }
        },
    }
}
