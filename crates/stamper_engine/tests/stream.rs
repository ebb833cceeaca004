use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use pretty_assertions::assert_eq;
use stamper_core::JobHandle;
use stamper_engine::{
    render_stream, ByteStreamSource, ChunkSource, ClientSettings, DecodeMode, FailureKind,
    HttpStreamConsumer, Renderer, StreamConsumer, StreamError, StreamOutcome, StreamSession,
    TextStream,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Text(String),
    Scroll,
    Error(String),
}

#[derive(Default)]
struct RecordingRenderer {
    calls: Mutex<Vec<Call>>,
}

impl RecordingRenderer {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn show_text(&self, full: &str) {
        self.calls.lock().unwrap().push(Call::Text(full.to_string()));
    }

    fn scroll_to_bottom(&self) {
        self.calls.lock().unwrap().push(Call::Scroll);
    }

    fn show_error(&self, message: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Error(message.to_string()));
    }
}

/// Serves fixed chunks and counts every read, including reads past the end.
struct CountingSource {
    chunks: Vec<Bytes>,
    reads: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ChunkSource for CountingSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.chunks.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.chunks.remove(0)))
        }
    }
}

fn handle() -> JobHandle {
    JobHandle::new("abc123")
}

fn chunk(bytes: &'static [u8]) -> Result<Bytes, StreamError> {
    Ok(Bytes::from_static(bytes))
}

fn text_stream(items: Vec<Result<Bytes, StreamError>>) -> TextStream {
    let source = ByteStreamSource::new(stream::iter(items));
    TextStream::new(
        StreamSession::new(handle(), DecodeMode::Replace),
        Box::new(source),
    )
}

#[tokio::test]
async fn renders_full_text_after_every_chunk_in_order() {
    let renderer = RecordingRenderer::default();
    let stream = text_stream(vec![chunk(b"Hel"), chunk(b"lo wor"), chunk(b"ld")]);

    let summary = render_stream(stream, &renderer).await.unwrap();

    assert_eq!(
        renderer.calls(),
        vec![
            Call::Text("Hel".into()),
            Call::Scroll,
            Call::Text("Hello wor".into()),
            Call::Scroll,
            Call::Text("Hello world".into()),
            Call::Scroll,
        ]
    );
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.bytes, 11);
    assert_eq!(summary.chars, 11);
    assert_eq!(summary.outcome, StreamOutcome::Completed);
}

#[tokio::test]
async fn multibyte_character_split_across_chunks_is_reassembled() {
    let renderer = RecordingRenderer::default();
    // "é" is 0xC3 0xA9
    let stream = text_stream(vec![chunk(b"caf\xC3"), chunk(b"\xA9!")]);

    render_stream(stream, &renderer).await.unwrap();

    assert_eq!(renderer.texts(), vec!["caf".to_string(), "café!".to_string()]);
    assert!(renderer.texts().iter().all(|text| !text.contains('\u{FFFD}')));
}

#[tokio::test]
async fn empty_stream_renders_nothing() {
    let renderer = RecordingRenderer::default();
    let stream = text_stream(vec![]);

    let summary = render_stream(stream, &renderer).await.unwrap();

    assert!(renderer.calls().is_empty());
    assert_eq!(summary.chunks, 0);
    assert_eq!(summary.outcome, StreamOutcome::Completed);
}

#[tokio::test]
async fn no_reads_are_issued_after_end_of_stream() {
    let reads = Arc::new(AtomicUsize::new(0));
    let source = CountingSource {
        chunks: vec![Bytes::from_static(b"one "), Bytes::from_static(b"two")],
        reads: reads.clone(),
    };
    let mut stream = TextStream::new(
        StreamSession::new(handle(), DecodeMode::Replace),
        Box::new(source),
    );

    assert_eq!(stream.next().await.unwrap().unwrap(), "one ");
    assert_eq!(stream.next().await.unwrap().unwrap(), "one two");
    assert!(stream.next().await.is_none());
    assert!(stream.next().await.is_none());
    assert!(stream.is_terminal());

    assert_eq!(reads.load(Ordering::SeqCst), 3);
    assert_eq!(stream.text(), "one two");
}

#[tokio::test]
async fn read_error_ends_the_stream() {
    let mut stream = text_stream(vec![
        chunk(b"partial"),
        Err(StreamError::new(FailureKind::Network, "connection reset")),
        chunk(b" never seen"),
    ]);

    assert_eq!(stream.next().await.unwrap().unwrap(), "partial");
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
    assert_eq!(err.to_string(), "connection reset");
    assert!(stream.next().await.is_none());
    assert_eq!(stream.text(), "partial");
}

#[tokio::test]
async fn render_stream_propagates_read_error_after_partial_output() {
    let renderer = RecordingRenderer::default();
    let stream = text_stream(vec![
        chunk(b"par"),
        Err(StreamError::new(FailureKind::Network, "connection reset")),
    ]);

    let err = render_stream(stream, &renderer).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Network);
    assert_eq!(
        renderer.calls(),
        vec![Call::Text("par".into()), Call::Scroll]
    );
}

#[tokio::test]
async fn strict_mode_turns_malformed_bytes_into_an_error() {
    let items = vec![chunk(b"ok"), chunk(b"\xFF")];
    let mut stream = TextStream::new(
        StreamSession::new(handle(), DecodeMode::Strict),
        Box::new(ByteStreamSource::new(stream::iter(items))),
    );

    assert_eq!(stream.next().await.unwrap().unwrap(), "ok");
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn cancellation_stops_a_pending_read() {
    let items = vec![chunk(b"Hel")];
    let source = ByteStreamSource::new(stream::iter(items).chain(stream::pending()));
    let mut stream = TextStream::new(
        StreamSession::new(handle(), DecodeMode::Replace),
        Box::new(source),
    );
    let token = stream.cancellation_token();

    assert_eq!(stream.next().await.unwrap().unwrap(), "Hel");

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });
    let next = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("cancellation should resolve the pending read");
    assert!(next.is_none());
    canceller.await.unwrap();

    assert!(stream.is_terminal());
    assert!(stream.next().await.is_none());
    let summary = stream.summary();
    assert_eq!(summary.outcome, StreamOutcome::Cancelled);
    assert_eq!(summary.chunks, 1);
}

#[tokio::test]
async fn http_consumer_streams_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("00:00 héllo\n00:05 wörld\n"))
        .expect(1)
        .mount(&server)
        .await;

    let settings = ClientSettings::new(&server.uri()).unwrap();
    let consumer = HttpStreamConsumer::new(settings).unwrap();
    let renderer = RecordingRenderer::default();

    let stream = consumer.open(&handle()).await.unwrap();
    let summary = render_stream(stream, &renderer).await.unwrap();

    let texts = renderer.texts();
    assert_eq!(
        texts.last().map(String::as_str),
        Some("00:00 héllo\n00:05 wörld\n")
    );
    assert_eq!(summary.handle, handle());
    assert_eq!(summary.outcome, StreamOutcome::Completed);
}

#[tokio::test]
async fn http_consumer_reports_status_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let settings = ClientSettings::new(&server.uri()).unwrap();
    let consumer = HttpStreamConsumer::new(settings).unwrap();

    let err = match consumer.open(&JobHandle::new("missing")).await {
        Ok(_) => panic!("expected the open to fail"),
        Err(err) => err,
    };

    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.to_string(), "404 Not Found");
}
