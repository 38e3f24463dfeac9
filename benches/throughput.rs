use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use routeloom::group;
use routeloom::middleware::{NotFound, ServerFault};
use routeloom::pattern::PathPattern;
use routeloom::route::{
    bind, delete_at, get_at, head_at, options_at, patch_at, post_at, put_at, Route, RouteExt,
};
use routeloom::server::{DecodedRequest, MemorySink, RequestContext, ResponseContext};
use routeloom::Router;
use std::hint::black_box;
use std::sync::Arc;

async fn ok(_req: RequestContext, resp: ResponseContext) -> Result<(), routeloom::server::ResponseError> {
    resp.send("OK").await
}

fn zoo() -> impl Route {
    group![
        get_at("/zoo/health", ok),
        head_at("/zoo/health", ok),
        options_at("/zoo/health", ok),
        bind(
            "/zoo/animals",
            group![
                get_at("/:id/toys/:toy_id", ok),
                get_at("/:id", ok),
                put_at("/:id", ok),
                patch_at("/:id", ok),
                delete_at("/:id", ok),
                get_at("", ok),
                post_at("", ok),
            ],
        ),
        get_at(
            "/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id",
            ok
        ),
        post_at(
            "/inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/:batch_id",
            ok
        ),
        get_at("/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i", ok),
        get_at("/", ok),
    ]
}

fn test_paths() -> [(Method, &'static str); 6] {
    [
        (Method::GET, "/zoo/animals/123"),
        (Method::GET, "/zoo/animals/123/toys/456"),
        (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
        (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
        (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
        (Method::GET, "/zoo/missing"),
    ]
}

fn bench_pattern(c: &mut Criterion) {
    let pattern =
        PathPattern::compile("/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id")
            .unwrap();
    c.bench_function("pattern_compile", |b| {
        b.iter(|| PathPattern::compile(black_box("/zoo/animals/:id/toys/:toy_id")))
    });
    c.bench_function("pattern_match_prefix", |b| {
        b.iter(|| pattern.match_prefix(black_box("/zoo/cats/animals/123/habitats/88/sections/5")))
    });
}

fn bench_route_match(c: &mut Criterion) {
    let tree = zoo();
    let paths = test_paths();
    c.bench_function("route_match", |b| {
        b.iter(|| {
            for (method, path) in &paths {
                black_box(tree.matches(method, path));
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let router = Router::build(zoo().wrap(NotFound).wrap(ServerFault)).unwrap();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let sink = MemorySink::new();
    let paths = test_paths();
    c.bench_function("dispatch", |b| {
        b.iter(|| {
            runtime.block_on(async {
                for (method, path) in &paths {
                    let request = DecodedRequest::new(method.clone(), *path);
                    let outcome = router.dispatch(request, Arc::<MemorySink>::clone(&sink));
                    black_box(outcome.await);
                }
            });
            black_box(sink.take());
        })
    });
}

criterion_group!(benches, bench_pattern, bench_route_match, bench_dispatch);
criterion_main!(benches);
