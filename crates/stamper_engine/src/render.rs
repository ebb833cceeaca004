use std::sync::mpsc;

use stamper_core::JobId;
use stamper_logging::stamper_error;

use crate::EngineEvent;

/// Display surface for a running job.
pub trait Renderer: Send + Sync {
    /// Replace the displayed content with `full`, the whole accumulated text.
    fn show_text(&self, full: &str);
    fn scroll_to_bottom(&self);
    fn show_error(&self, message: &str);
}

/// Single sink for human readable failures of either stage.
pub struct ErrorHandler<'a> {
    renderer: &'a dyn Renderer,
}

impl<'a> ErrorHandler<'a> {
    pub fn new(renderer: &'a dyn Renderer) -> Self {
        Self { renderer }
    }

    pub fn report(&self, message: &str) {
        stamper_error!("{}", message);
        self.renderer.show_error(message);
    }
}

/// Forwards render calls as [`EngineEvent`]s tagged with the job they belong to.
pub struct ChannelRenderer {
    job_id: JobId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelRenderer {
    pub fn new(job_id: JobId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { job_id, tx }
    }
}

impl Renderer for ChannelRenderer {
    fn show_text(&self, full: &str) {
        let _ = self.tx.send(EngineEvent::Text {
            job_id: self.job_id,
            full: full.to_string(),
        });
    }

    fn scroll_to_bottom(&self) {
        let _ = self.tx.send(EngineEvent::ScrollToBottom {
            job_id: self.job_id,
        });
    }

    fn show_error(&self, message: &str) {
        let _ = self.tx.send(EngineEvent::Error {
            job_id: self.job_id,
            message: message.to_string(),
        });
    }
}
