use http::Method;
use parking_lot::Mutex;
use routeloom::group;
use routeloom::middleware::NotFound;
use routeloom::record::{FieldKind, Record, Schema};
use routeloom::route::{bind, get, get_at, post_at, put_at, RouteError, RouteExt};
use routeloom::server::{RequestContext, ResponseContext};
use routeloom::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod common;
use common::harness::{dispatch, dispatch_one, get as get_req};
use common::test_tracing::TestTracing;

/// What an endpoint saw when it ran.
#[derive(Debug, Clone)]
struct Seen {
    params: Record,
    remaining: String,
}

type SeenLog = Arc<Mutex<Vec<Seen>>>;

fn recording(log: &SeenLog, label: &'static str) -> impl Fn(RequestContext, ResponseContext) -> futures::future::BoxFuture<'static, anyhow::Result<()>> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |req: RequestContext, resp: ResponseContext| {
        log.lock().push(Seen {
            params: req.params().clone(),
            remaining: req.remaining().to_string(),
        });
        Box::pin(async move {
            resp.text(label).await?;
            Ok(())
        })
    }
}

#[tokio::test]
async fn test_user_name_binds_id_and_consumes_path() {
    let _tracing = TestTracing::init();
    let log = SeenLog::default();
    let tree = bind(
        "/user/:id",
        group![get(recording(&log, "name")).at("/name")],
    );
    let router = Router::build(tree).unwrap();

    let (outcome, resp) = dispatch_one(&router, get_req("/user/42/name")).await;
    assert!(outcome.handled);
    assert_eq!(outcome.status, Some(200));
    assert_eq!(resp.body_str(), "name");

    let seen = log.lock().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].params, Record::from_pairs([("id", "42")]).unwrap());
    assert_eq!(seen[0].remaining, "");
}

#[tokio::test]
async fn test_specific_route_shadows_general() {
    let specific = SeenLog::default();
    let general = SeenLog::default();
    let tree = group![
        get(recording(&specific, "me")).at("/user/me"),
        get(recording(&general, "other")).at("/user/:id"),
    ];
    let router = Router::build(tree).unwrap();

    let (_, resp) = dispatch_one(&router, get_req("/user/me")).await;
    assert_eq!(resp.body_str(), "me");
    assert_eq!(specific.lock().len(), 1);
    assert!(general.lock().is_empty());

    let (_, resp) = dispatch_one(&router, get_req("/user/7")).await;
    assert_eq!(resp.body_str(), "other");
    assert_eq!(general.lock()[0].params.get_str("id"), Some("7"));
}

#[tokio::test]
async fn test_unregistered_path_gets_404_without_invoking_endpoints() {
    let log = SeenLog::default();
    let tree = group![
        get(recording(&log, "a")).at("/a"),
        get(recording(&log, "b")).at("/b/:id"),
    ]
    .wrap(NotFound);
    let router = Router::build(tree).unwrap();

    let (outcome, resp) = dispatch_one(&router, get_req("/c/1")).await;
    assert!(outcome.handled);
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body_str(), "Not found: /c/1");
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_wrong_method_is_not_found() {
    let log = SeenLog::default();
    let tree = group![get(recording(&log, "a")).at("/a")].wrap(NotFound);
    let router = Router::build(tree).unwrap();

    let (_, resp) = dispatch_one(
        &router,
        routeloom::server::DecodedRequest::new(Method::DELETE, "/a"),
    )
    .await;
    assert_eq!(resp.status, 404);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_nested_not_found_leaves_sibling_routes_reachable() {
    let log = SeenLog::default();
    let tree = group![
        get(recording(&log, "a")).at("/a").wrap(NotFound),
        get(recording(&log, "b")).at("/b"),
    ];
    let router = Router::build(tree).unwrap();

    let (outcome, resp) = dispatch_one(&router, get_req("/b")).await;
    assert!(outcome.handled);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_str(), "b");

    // Only a root that answers unmatched requests turns them into 404s.
    let (outcome, responses) = dispatch(&router, get_req("/c")).await;
    assert!(!outcome.handled);
    assert!(responses.is_empty());
}

#[tokio::test]
async fn test_unmatched_without_not_found_sends_nothing() {
    let tree = get_at("/a", |_req, resp: ResponseContext| async move { resp.text("a").await });
    let router = Router::build(tree).unwrap();

    let (outcome, responses) = dispatch(&router, get_req("/zzz")).await;
    assert!(!outcome.handled);
    assert_eq!(outcome.status, None);
    assert!(responses.is_empty());
}

#[tokio::test]
async fn test_query_string_is_not_part_of_the_path() {
    let tree = get_at("/search", |req: RequestContext, resp: ResponseContext| async move {
        let q = req.query().get_str("q").unwrap_or_default().to_string();
        resp.text(format!("{}|{}", req.path(), q)).await
    });
    let router = Router::build(tree).unwrap();

    let (_, resp) = dispatch_one(&router, get_req("/search?q=rust%20router&q=last")).await;
    assert_eq!(resp.body_str(), "/search|last");
}

#[tokio::test]
async fn test_catch_all_captures_rest_of_path() {
    let tree = get_at("/static/*file", |req: RequestContext, resp: ResponseContext| async move {
        let file = req.params().get_str("file").unwrap_or_default().to_string();
        resp.text(file).await
    });
    let router = Router::build(tree).unwrap();

    let (_, resp) = dispatch_one(&router, get_req("/static/css/site.css")).await;
    assert_eq!(resp.body_str(), "css/site.css");
}

#[tokio::test]
async fn test_typed_params_view() {
    #[derive(serde::Deserialize)]
    struct Params {
        org: String,
        id: i64,
    }

    let schema = Schema::new([("org", FieldKind::String), ("id", FieldKind::Integer)]).unwrap();
    let tree = bind(
        "/org/:org",
        get(|req: RequestContext, resp: ResponseContext| async move {
            let params: Params = req.params_as()?;
            resp.text(format!("{}#{}", params.org, params.id + 1)).await?;
            Ok::<_, anyhow::Error>(())
        })
        .requires_params(schema)
        .at("/item/:id"),
    );
    let router = Router::build(tree).unwrap();

    let (_, resp) = dispatch_one(&router, get_req("/org/acme/item/41")).await;
    assert_eq!(resp.body_str(), "acme#42");
}

#[test]
fn test_build_rejects_unbound_params() {
    let tree = bind(
        "/user/:id",
        get(|_req, resp: ResponseContext| async move { resp.text("x").await })
            .requires_params(Schema::strings(["userId"]).unwrap())
            .at("/name"),
    );
    let err = Router::build(tree).unwrap_err();
    assert!(err.is_construction_error());
    assert!(matches!(err, RouteError::MissingParams { .. }));
    assert!(err.to_string().contains("userId"));
}

#[test]
fn test_build_rejects_invalid_pattern() {
    let tree = get_at("/files/*rest/more", |_req, resp: ResponseContext| async move {
        resp.text("x").await
    });
    let err = Router::build(tree).unwrap_err();
    assert!(matches!(err, RouteError::Pattern(_)));
}

#[test]
fn test_routes_are_described_in_order() {
    let noop = |_req: RequestContext, resp: ResponseContext| async move { resp.text("").await };
    let tree = group![
        bind(
            "/user/:userId",
            group![get_at("/name", noop), put_at("/name", noop)],
        ),
        post_at("/login", noop),
    ];
    let router = Router::build(tree).unwrap();
    let routes: Vec<(Method, String)> = router
        .routes()
        .iter()
        .map(|r| (r.method.clone(), r.path.clone()))
        .collect();
    assert_eq!(
        routes,
        vec![
            (Method::GET, "/user/:userId/name".to_string()),
            (Method::PUT, "/user/:userId/name".to_string()),
            (Method::POST, "/login".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_router_is_shared_across_tasks() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let tree = get_at("/n/:n", move |req: RequestContext, resp: ResponseContext| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            let n = req.params().get_str("n").unwrap_or_default().to_string();
            resp.text(n).await
        }
    });
    let router = Router::build(tree).unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let router = router.clone();
            tokio::spawn(async move {
                let (_, resp) = dispatch_one(&router, get_req(&format!("/n/{i}"))).await;
                assert_eq!(resp.body_str(), i.to_string());
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 16);
}
