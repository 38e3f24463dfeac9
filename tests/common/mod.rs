#![allow(dead_code)]

pub mod harness {
    use routeloom::server::{DecodedRequest, HttpResponse, MemorySink};
    use routeloom::{DispatchOutcome, Router};
    use http::Method;

    pub fn get(target: &str) -> DecodedRequest {
        DecodedRequest::new(Method::GET, target)
    }

    pub fn post_json(target: &str, body: &str) -> DecodedRequest {
        DecodedRequest::new(Method::POST, target)
            .with_header("content-type", "application/json")
            .with_body(body.as_bytes().to_vec())
    }

    /// Dispatch one request and collect everything written to the sink.
    pub async fn dispatch(
        router: &Router,
        request: DecodedRequest,
    ) -> (DispatchOutcome, Vec<HttpResponse>) {
        let sink = MemorySink::new();
        let outcome = router.dispatch(request, sink.clone()).await;
        (outcome, sink.take())
    }

    /// Dispatch one request that must produce exactly one response.
    pub async fn dispatch_one(
        router: &Router,
        request: DecodedRequest,
    ) -> (DispatchOutcome, HttpResponse) {
        let (outcome, mut responses) = dispatch(router, request).await;
        assert_eq!(responses.len(), 1, "expected exactly one response");
        (outcome, responses.remove(0))
    }
}

pub mod temp_files {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Creates a temporary file with a unique name
    pub fn create_temp_file(content: &str, ext: &str) -> PathBuf {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        let path = std::env::temp_dir().join(format!(
            "routeloom_test_{}_{}_{}.{}",
            std::process::id(),
            counter,
            nanos,
            ext
        ));

        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn create_temp_toml(content: &str) -> PathBuf {
        create_temp_file(content, "toml")
    }

    /// Cleanup temporary files (best effort)
    pub fn cleanup_temp_files(paths: &[PathBuf]) {
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub mod test_tracing {
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::EnvFilter;

    /// Routes this thread's log output through the test writer for the
    /// lifetime of the guard.
    pub struct TestTracing {
        _guard: DefaultGuard,
    }

    impl TestTracing {
        pub fn init() -> Self {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("routeloom=trace"))
                .with_test_writer()
                .finish();
            Self {
                _guard: tracing::subscriber::set_default(subscriber),
            }
        }
    }
}
