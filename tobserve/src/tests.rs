use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream;
use tprovider::{
    ByteStream, ChatRequest, ChatTransport, Citation, ErrorBody, FallbackOrchestrator, Message,
    ProviderError, ProviderFuture, ProviderId, SearchQuery, StreamHooks, StreamObserver,
    StreamSession, WebSearchResult,
};

use crate::{
    MetricsObservabilityHooks, SafeStreamHooks, SafeStreamObserver, TracingObservabilityHooks,
    TracingStreamObserver,
};

fn sample_query() -> SearchQuery {
    SearchQuery::new("weather", vec![WebSearchResult::new("https://x.com", "X")])
}

fn sample_citation() -> Citation {
    Citation::web_search_result_location("https://x.com", "X", "sunny all day")
}

fn exercise_hooks(hooks: &dyn StreamHooks) {
    let rate_limited = ProviderError::from_response(
        429,
        ErrorBody::new("gemini_error_429", "quota exhausted"),
    );

    hooks.on_attempt_start(ProviderId::Gemini, 1);
    hooks.on_fallback(ProviderId::Gemini, ProviderId::Groq, 1, &rate_limited);
    hooks.on_attempt_start(ProviderId::Groq, 2);
    hooks.on_success(ProviderId::Groq, 2);
    hooks.on_failure(ProviderId::Claude, 3, &rate_limited);
    hooks.on_aborted(ProviderId::Claude, 1);
}

fn exercise_observer(observer: &dyn StreamObserver) {
    observer.on_text("Sunny");
    observer.on_search_query(&sample_query());
    observer.on_citation(&sample_citation());
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    exercise_hooks(&TracingObservabilityHooks);
    exercise_observer(&TracingStreamObserver);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    exercise_hooks(&MetricsObservabilityHooks);
}

#[derive(Default, Clone)]
struct RecordingStreamHooks {
    events: Arc<Mutex<Vec<String>>>,
}

impl StreamHooks for RecordingStreamHooks {
    fn on_attempt_start(&self, provider: ProviderId, attempt: u32) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("attempt:{provider}:{attempt}"));
    }

    fn on_fallback(&self, from: ProviderId, to: ProviderId, _attempt: u32, _error: &ProviderError) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("fallback:{from}->{to}"));
    }

    fn on_success(&self, provider: ProviderId, attempts: u32) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("success:{provider}:{attempts}"));
    }

    fn on_failure(&self, provider: ProviderId, _attempts: u32, _error: &ProviderError) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("failure:{provider}"));
    }

    fn on_aborted(&self, provider: ProviderId, _attempts: u32) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("aborted:{provider}"));
    }
}

#[test]
fn safe_hooks_forward_to_inner_hooks() {
    let recording = RecordingStreamHooks::default();
    let events = recording.events.clone();

    exercise_hooks(&SafeStreamHooks::new(recording));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec![
            "attempt:gemini:1",
            "fallback:gemini->groq",
            "attempt:groq:2",
            "success:groq:2",
            "failure:claude",
            "aborted:claude",
        ]
    );
}

struct PanicStreamHooks;

impl StreamHooks for PanicStreamHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _attempt: u32) {
        panic!("attempt_start panic");
    }

    fn on_fallback(&self, _from: ProviderId, _to: ProviderId, _attempt: u32, _error: &ProviderError) {
        panic!("fallback panic");
    }

    fn on_success(&self, _provider: ProviderId, _attempts: u32) {
        panic!("success panic");
    }

    fn on_failure(&self, _provider: ProviderId, _attempts: u32, _error: &ProviderError) {
        panic!("failure panic");
    }

    fn on_aborted(&self, _provider: ProviderId, _attempts: u32) {
        panic!("aborted panic");
    }
}

struct PanicStreamObserver;

impl StreamObserver for PanicStreamObserver {
    fn on_text(&self, _accumulated: &str) {
        panic!("text panic");
    }

    fn on_search_query(&self, _query: &SearchQuery) {
        panic!("search_query panic");
    }

    fn on_citation(&self, _citation: &Citation) {
        panic!("citation panic");
    }
}

#[test]
fn safe_hooks_swallow_panics() {
    exercise_hooks(&SafeStreamHooks::new(PanicStreamHooks));
    exercise_observer(&SafeStreamObserver::new(PanicStreamObserver));
}

#[derive(Debug)]
struct OneShotTransport;

impl ChatTransport for OneShotTransport {
    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ByteStream<'a>, ProviderError>> {
        Box::pin(async move {
            if request.provider == ProviderId::Gemini {
                return Err(ProviderError::from_response(
                    429,
                    ErrorBody::new("gemini_error_429", "quota exhausted"),
                ));
            }

            let frame = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n";
            Ok(Box::pin(stream::iter(vec![Ok(Bytes::from_static(frame.as_bytes()))]))
                as ByteStream<'a>)
        })
    }
}

#[tokio::test]
async fn panicking_hooks_do_not_break_a_fallback_run() {
    let session = StreamSession::new(Arc::new(OneShotTransport));
    let orchestrator =
        FallbackOrchestrator::default().with_hooks(Arc::new(SafeStreamHooks::new(PanicStreamHooks)));
    let request = ChatRequest::builder(ProviderId::Gemini, ProviderId::Gemini.default_model())
        .message(Message::user("hello"))
        .api_key("AIzaSy-test")
        .fallback_api_key(ProviderId::Gemini, "AIzaSy-test")
        .fallback_api_key(ProviderId::Groq, "gsk_test")
        .allow_fallback(true)
        .build();

    let result = orchestrator
        .run(
            &session,
            request,
            &SafeStreamObserver::new(PanicStreamObserver),
        )
        .await
        .expect("fallback run");

    assert_eq!(result.text, "Hi");
    let info = result.fallback_info.expect("fallback info");
    assert_eq!(info.to_provider, ProviderId::Groq);
}
