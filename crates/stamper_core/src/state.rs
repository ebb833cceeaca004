use crate::request::{JobRequest, DEFAULT_MINUTE_INCREMENT};
use crate::view_model::AppViewModel;

/// Client-side id of one submission; distinct from the backend's request id.
pub type JobId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Submitting {
        job_id: JobId,
    },
    Streaming {
        job_id: JobId,
        request_id: String,
    },
    Finished,
    Cancelled,
    Failed,
}

impl SessionPhase {
    /// Job id of the submission currently in flight, if any.
    pub fn active_job(&self) -> Option<JobId> {
        match self {
            SessionPhase::Submitting { job_id } | SessionPhase::Streaming { job_id, .. } => {
                Some(*job_id)
            }
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_job().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    url_input: String,
    minute_increment_input: String,
    phase: SessionPhase,
    output: String,
    error: Option<String>,
    next_job_id: JobId,
    scroll_pending: bool,
    exit_requested: bool,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            url_input: String::new(),
            minute_increment_input: DEFAULT_MINUTE_INCREMENT.to_string(),
            phase: SessionPhase::Idle,
            output: String::new(),
            error: None,
            next_job_id: 1,
            scroll_pending: false,
            exit_requested: false,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase.clone(),
            url_input: self.url_input.clone(),
            minute_increment_input: self.minute_increment_input.clone(),
            output: self.output.clone(),
            error: self.error.clone(),
            scroll_to_bottom: self.scroll_pending,
            exit_requested: self.exit_requested,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Returns whether a scroll was requested since the last call, and resets the flag.
    pub fn consume_scroll(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_url_input(&mut self, text: String) {
        if self.url_input != text {
            self.url_input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_minute_increment_input(&mut self, text: String) {
        if self.minute_increment_input != text {
            self.minute_increment_input = text;
            self.mark_dirty();
        }
    }

    /// Both inputs go out exactly as typed.
    pub(crate) fn build_request(&self) -> JobRequest {
        JobRequest::new(
            self.url_input.clone(),
            self.minute_increment_input.clone(),
        )
    }

    pub(crate) fn reject_input(&mut self, guidance: String) {
        self.url_input.clear();
        self.error = Some(guidance);
        self.mark_dirty();
    }

    pub(crate) fn begin_submission(&mut self) -> JobId {
        let job_id = self.next_job_id;
        self.next_job_id += 1;
        self.phase = SessionPhase::Submitting { job_id };
        self.output.clear();
        self.error = None;
        self.scroll_pending = false;
        self.mark_dirty();
        job_id
    }

    pub(crate) fn accept(&mut self, job_id: JobId, request_id: String) {
        self.phase = SessionPhase::Streaming { job_id, request_id };
        self.mark_dirty();
    }

    pub(crate) fn show_text(&mut self, full: String) {
        if self.output != full {
            self.output = full;
            self.mark_dirty();
        }
    }

    pub(crate) fn request_scroll(&mut self) {
        self.scroll_pending = true;
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.phase = SessionPhase::Failed;
        self.error = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn finish(&mut self, cancelled: bool) {
        self.phase = if cancelled {
            SessionPhase::Cancelled
        } else {
            SessionPhase::Finished
        };
        self.mark_dirty();
    }

    pub(crate) fn request_exit(&mut self) {
        self.exit_requested = true;
        self.mark_dirty();
    }
}
