#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input.
    UrlInputChanged(String),
    /// User edited the minute increment input.
    MinuteIncrementChanged(String),
    /// User submitted the current inputs.
    SubmitClicked,
    /// User asked to stop the running job.
    CancelClicked,
    /// User asked to leave the application.
    QuitRequested,
    /// Backend accepted the job and handed out a correlation id.
    JobAccepted {
        job_id: crate::JobId,
        request_id: String,
    },
    /// Full accumulated text of the stream so far.
    StreamText { job_id: crate::JobId, full: String },
    /// Renderer should bring the end of the output into view.
    ScrollRequested { job_id: crate::JobId },
    /// Submission or stream failed; `message` is already human readable.
    JobFailed {
        job_id: crate::JobId,
        message: String,
    },
    /// Stream ended without error.
    JobFinished {
        job_id: crate::JobId,
        cancelled: bool,
    },
    /// Render tick to coalesce terminal output.
    Tick,
}
