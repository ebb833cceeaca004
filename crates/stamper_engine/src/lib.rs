//! Stamper engine: job submission, chunked result streaming and rendering hooks.
mod decode;
mod engine;
mod render;
mod session;
mod settings;
mod stream;
mod submit;
mod types;

pub use decode::{DecodeError, DecodeMode, Utf8StreamDecoder};
pub use engine::{run_job, EngineHandle};
pub use render::{ChannelRenderer, ErrorHandler, Renderer};
pub use session::StreamSession;
pub use settings::{ClientSettings, SettingsError, DEFAULT_BASE_URL};
pub use stream::{
    render_stream, ByteStreamSource, ChunkSource, HttpStreamConsumer, StreamConsumer, TextStream,
};
pub use submit::{HttpRequestSubmitter, RequestSubmitter};
pub use types::{
    EngineEvent, FailureKind, JobFailure, JobOutcome, StreamError, StreamOutcome, StreamSummary,
    SubmitError, TransportError,
};
