use crate::{JobId, JobRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob { job_id: JobId, request: JobRequest },
    CancelJob { job_id: JobId },
}
