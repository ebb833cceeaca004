//! Stamper core: job request types and the pure input/session state machine.
mod effect;
mod msg;
mod request;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use request::{
    validate_target_url, JobHandle, JobRequest, MinuteIncrement, ValidationError,
    DEFAULT_MINUTE_INCREMENT, URL_GUIDANCE,
};
pub use state::{AppState, JobId, SessionPhase};
pub use update::update;
pub use view_model::AppViewModel;
