use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use stamper_core::JobHandle;
use stamper_logging::{stamper_debug, stamper_info};
use tokio_util::sync::CancellationToken;

use crate::render::Renderer;
use crate::session::StreamSession;
use crate::settings::ClientSettings;
use crate::{FailureKind, StreamError, StreamOutcome, StreamSummary, TransportError};

/// Raw byte chunks of one open connection.
#[async_trait::async_trait]
pub trait ChunkSource: Send {
    /// Reads the next chunk; `Ok(None)` once the transport signals end of stream.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError>;
}

/// Adapts any byte stream (such as `reqwest::Response::bytes_stream`) to [`ChunkSource`].
pub struct ByteStreamSource<S> {
    inner: S,
}

impl<S> ByteStreamSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl<S, E> ChunkSource for ByteStreamSource<S>
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: Into<StreamError> + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        match self.inner.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(err)) => Err(err.into()),
            None => Ok(None),
        }
    }
}

/// Lazy, finite sequence of "full accumulated text so far" for one job.
///
/// Every call to [`TextStream::next`] issues exactly one read. The sequence
/// cannot be restarted; open a new stream for a new session.
pub struct TextStream {
    session: StreamSession,
    source: Option<Box<dyn ChunkSource>>,
    cancel: CancellationToken,
    cancelled: bool,
}

impl TextStream {
    pub fn new(session: StreamSession, source: Box<dyn ChunkSource>) -> Self {
        Self {
            session,
            source: Some(source),
            cancel: CancellationToken::new(),
            cancelled: false,
        }
    }

    /// Replaces the stream's cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the stream: the connection is dropped and no further text is produced.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn handle(&self) -> &JobHandle {
        self.session.handle()
    }

    pub fn text(&self) -> &str {
        self.session.text()
    }

    pub fn is_terminal(&self) -> bool {
        self.session.is_terminal()
    }

    /// Reads one chunk and returns the full accumulated text.
    ///
    /// Returns `None` after end of stream or cancellation, and after an error
    /// has been returned once.
    pub async fn next(&mut self) -> Option<Result<&str, StreamError>> {
        if self.session.is_terminal() {
            return None;
        }
        let source = self.source.as_mut()?;
        let read = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            read = source.next_chunk() => Some(read),
        };

        match read {
            None => {
                stamper_info!("Stream {} cancelled", self.session.handle());
                self.cancelled = true;
                self.release();
                None
            }
            Some(Ok(Some(chunk))) => match self.session.absorb(&chunk) {
                Ok(()) => Some(Ok(self.session.text())),
                Err(err) => {
                    self.release();
                    Some(Err(err))
                }
            },
            Some(Ok(None)) => {
                let result = self.session.complete();
                self.release();
                stamper_debug!(
                    "Stream {} completed after {} chunks",
                    self.session.handle(),
                    self.session.chunks()
                );
                result.err().map(Err)
            }
            Some(Err(err)) => {
                self.release();
                Some(Err(err))
            }
        }
    }

    pub fn summary(&self) -> StreamSummary {
        let outcome = if self.cancelled {
            StreamOutcome::Cancelled
        } else {
            StreamOutcome::Completed
        };
        self.session.summary(outcome)
    }

    /// Closes the connection and makes the session terminal.
    fn release(&mut self) {
        self.session.close();
        self.source = None;
    }
}

/// Pull loop: every resolved read is rendered before the next read is issued.
pub async fn render_stream(
    mut stream: TextStream,
    renderer: &dyn Renderer,
) -> Result<StreamSummary, StreamError> {
    while let Some(update) = stream.next().await {
        let full = update?;
        renderer.show_text(full);
        renderer.scroll_to_bottom();
    }
    Ok(stream.summary())
}

#[async_trait::async_trait]
pub trait StreamConsumer: Send + Sync {
    /// Opens the stream for `handle` with a fresh session.
    async fn open(&self, handle: &JobHandle) -> Result<TextStream, StreamError>;
}

#[derive(Debug, Clone)]
pub struct HttpStreamConsumer {
    client: reqwest::Client,
    settings: ClientSettings,
}

impl HttpStreamConsumer {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let client = settings.build_client()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: reqwest::Client, settings: ClientSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait::async_trait]
impl StreamConsumer for HttpStreamConsumer {
    async fn open(&self, handle: &JobHandle) -> Result<TextStream, StreamError> {
        let endpoint = self.settings.stream_endpoint(handle);
        stamper_info!("Opening stream {}", endpoint);

        let response = self.client.get(endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let source = ByteStreamSource::new(Box::pin(response.bytes_stream()));
        let session = StreamSession::new(handle.clone(), self.settings.decode_mode);
        Ok(TextStream::new(session, Box::new(source)))
    }
}
