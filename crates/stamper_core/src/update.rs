use crate::{AppState, Effect, JobId, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::UrlInputChanged(text) => {
            state.set_url_input(text);
            Vec::new()
        }
        Msg::MinuteIncrementChanged(text) => {
            state.set_minute_increment_input(text);
            Vec::new()
        }
        Msg::SubmitClicked => {
            // One job at a time; a second submit waits for the first to end.
            if state.phase().is_active() {
                return (state, Vec::new());
            }
            let request = state.build_request();
            match request.validate() {
                Err(err) => {
                    state.reject_input(err.to_string());
                    Vec::new()
                }
                Ok(()) => {
                    let job_id = state.begin_submission();
                    vec![Effect::SubmitJob { job_id, request }]
                }
            }
        }
        Msg::CancelClicked => match state.phase().active_job() {
            Some(job_id) => vec![Effect::CancelJob { job_id }],
            None => Vec::new(),
        },
        Msg::QuitRequested => {
            let effects = match state.phase().active_job() {
                Some(job_id) => vec![Effect::CancelJob { job_id }],
                None => Vec::new(),
            };
            state.request_exit();
            effects
        }
        Msg::JobAccepted { job_id, request_id } => {
            if is_submitting(&state, job_id) {
                state.accept(job_id, request_id);
            }
            Vec::new()
        }
        Msg::StreamText { job_id, full } => {
            if is_current(&state, job_id) {
                state.show_text(full);
            }
            Vec::new()
        }
        Msg::ScrollRequested { job_id } => {
            if is_current(&state, job_id) {
                state.request_scroll();
            }
            Vec::new()
        }
        Msg::JobFailed { job_id, message } => {
            if is_current(&state, job_id) {
                state.fail(message);
            }
            Vec::new()
        }
        Msg::JobFinished { job_id, cancelled } => {
            if is_current(&state, job_id) {
                state.finish(cancelled);
            }
            Vec::new()
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn is_current(state: &AppState, job_id: JobId) -> bool {
    state.phase().active_job() == Some(job_id)
}

fn is_submitting(state: &AppState, job_id: JobId) -> bool {
    matches!(state.phase(), crate::SessionPhase::Submitting { job_id: id } if *id == job_id)
}
