use crate::SessionPhase;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: SessionPhase,
    pub url_input: String,
    pub minute_increment_input: String,
    /// Full accumulated text of the current job, never a diff.
    pub output: String,
    pub error: Option<String>,
    pub scroll_to_bottom: bool,
    pub exit_requested: bool,
}

impl AppViewModel {
    /// True when the user can type a new URL.
    pub fn awaiting_input(&self) -> bool {
        !self.phase.is_active() && !self.exit_requested
    }
}
