mod common;

use std::sync::Arc;

use brrtmux::config::RouterConfig;
use brrtmux::writer::{Data, DataWriter};
use brrtmux::{handler, Context, Handler, Mux, Response, Result, SharedRouter};
use common::{pass_handler, request, tag_handler, with_captured_logs, Recorder};
use http::{Method, StatusCode};

fn labelled(label: &'static str) -> Handler {
    handler(move |ctx: &mut Context| ctx.write(label))
}

fn echo_param(name: &'static str) -> Handler {
    handler(move |ctx: &mut Context| {
        let value = ctx.param(name).unwrap_or("<none>").to_string();
        ctx.write(value)
    })
}

fn body_of(router: &brrtmux::Router, method: &str, path: &str) -> String {
    let (res, result) = router.handle(request(method, path));
    result.unwrap();
    res.body_string()
}

#[test]
fn test_matching_precedence() {
    let mut mux = Mux::new();
    mux.get("/users/new", [labelled("static")]).unwrap();
    mux.get("/users/<id:\\d+>", [labelled("numeric")]).unwrap();
    mux.get("/users/<name>", [labelled("plain")]).unwrap();
    mux.get("/users/*", [labelled("wildcard")]).unwrap();
    let router = mux.into_router();

    assert_eq!(body_of(&router, "GET", "/users/new"), "static");
    assert_eq!(body_of(&router, "GET", "/users/42"), "numeric");
    assert_eq!(body_of(&router, "GET", "/users/alice"), "plain");
    assert_eq!(body_of(&router, "GET", "/users/alice/avatar"), "wildcard");
}

#[test]
fn test_params_are_bound_to_context() {
    let mut mux = Mux::new();
    mux.get("/files/<name>.<ext>", [handler(|ctx: &mut Context| {
        let out = format!("{}|{}", ctx.param("name").unwrap_or(""), ctx.param("ext").unwrap_or(""));
        ctx.write(out)
    })])
    .unwrap();
    mux.get("/tags/<tag>", [echo_param("tag")]).unwrap();
    let router = mux.into_router();

    assert_eq!(body_of(&router, "GET", "/files/report.pdf"), "report|pdf");
    assert_eq!(body_of(&router, "GET", "/tags/rust%20lang"), "rust lang");
    assert_eq!(body_of(&router, "GET", "/tags/a?b=c"), "a");
}

#[test]
fn test_non_ascii_literal_and_bare_wildcard_prefix() {
    let mut mux = Mux::new();
    mux.get("/caf\u{e9}/menu", [labelled("menu")]).unwrap();
    mux.get("/static/*", [labelled("asset")]).unwrap();
    let router = mux.into_router();

    assert_eq!(body_of(&router, "GET", "/caf%C3%A9/menu"), "menu");
    assert_eq!(body_of(&router, "GET", "/static/"), "asset");
    assert_eq!(body_of(&router, "GET", "/static/css/app.css"), "asset");
    assert!(router.find(&Method::GET, "/static").is_none());
}

#[test]
fn test_unescape_can_be_disabled() {
    let config = RouterConfig {
        unescape_params: false,
        ..RouterConfig::default()
    };
    let mut mux = Mux::new().with_config(config);
    mux.get("/tags/<tag>", [echo_param("tag")]).unwrap();
    let router = mux.into_router();
    assert_eq!(body_of(&router, "GET", "/tags/rust%20lang"), "rust%20lang");
}

#[test]
fn test_not_found_returns_http_error() {
    let mut mux = Mux::new();
    mux.get("/users", [labelled("users")]).unwrap();
    let router = mux.into_router();

    let (res, result) = router.handle(request("GET", "/missing"));
    let err = result.unwrap_err();
    assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
    assert!(res.body().is_empty());
}

#[test]
fn test_method_not_allowed_sets_allow() {
    let mut mux = Mux::new();
    mux.to("POST,GET", "/users", [labelled("users")]).unwrap();
    mux.put("/users/<id>", [labelled("user")]).unwrap();
    let router = mux.into_router();

    let (res, result) = router.handle(request("DELETE", "/users"));
    assert!(result.is_ok());
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.header("allow"), Some("GET, POST, OPTIONS"));

    let (res, result) = router.handle(request("OPTIONS", "/users/9"));
    assert!(result.is_ok());
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.header("allow"), Some("PUT, OPTIONS"));
}

#[test]
fn test_allowed_methods_lookup() {
    let mut mux = Mux::new();
    mux.to("GET,PATCH", "/items/<id>", []).unwrap();
    let router = mux.into_router();
    assert_eq!(
        router.allowed_methods(&Method::DELETE, "/items/3"),
        vec![Method::GET, Method::PATCH]
    );
    assert!(router.allowed_methods(&Method::GET, "/other").is_empty());
    assert!(router.find(&Method::GET, "/items/3").is_some());
    assert!(router.find(&Method::POST, "/items/3").is_none());
}

#[test]
fn test_global_middleware_runs_for_unmatched_requests() {
    let buf = Recorder::new();
    let mut mux = Mux::new();
    mux.use_middleware([pass_handler("g.", &buf)]);
    mux.get("/users", [tag_handler("h.", &buf)]).unwrap();
    let router = mux.into_router();

    let (_, result) = router.handle(request("GET", "/users"));
    assert!(result.is_ok());
    assert_eq!(buf.take(), "g.h.");

    let (_, result) = router.handle(request("GET", "/missing"));
    assert!(result.is_err());
    assert_eq!(buf.take(), "g.");
}

#[test]
fn test_custom_not_found_chain() {
    let mut mux = Mux::new();
    mux.not_found([handler(|ctx: &mut Context| {
        ctx.response_mut().set_status(StatusCode::NOT_FOUND);
        ctx.write("nothing here")
    })]);
    let router = mux.into_router();

    let (res, result) = router.handle(request("GET", "/anything"));
    assert!(result.is_ok());
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.body_string(), "nothing here");
}

#[test]
fn test_named_routes_after_freeze() {
    let mut mux = Mux::new();
    let mut api = mux.group("/api/v1", []);
    api.get("/users/<id:\\d+>/posts/<post>", []).unwrap().name("post");
    let router = mux.into_router();

    let route = router.route("post").unwrap();
    assert_eq!(route.method(), Some(&Method::GET));
    assert_eq!(brrtmux::url!(route, "id", 1, "post", "hello world"), "/api/v1/users/1/posts/hello%20world");
    assert!(router.route("missing").is_none());
}

#[test]
fn test_serve_reuses_context() {
    let mut mux = Mux::new();
    mux.get("/a/<x>", [echo_param("x")]).unwrap();
    let router = mux.into_router();

    let mut ctx = router.new_context(request("GET", "/a/1"), Vec::<Handler>::new());
    router.serve(&mut ctx).unwrap();
    assert_eq!(ctx.response().body_string(), "1");

    ctx.reset(request("GET", "/a/2"));
    router.serve(&mut ctx).unwrap();
    assert_eq!(ctx.response().body_string(), "2");
    assert_eq!(ctx.param("x"), Some("2"));
}

struct JsonWriter;

impl DataWriter for JsonWriter {
    fn write(&self, res: &mut Response, data: Data) -> Result<()> {
        let value = match data {
            Data::Empty => serde_json::Value::Null,
            Data::Text(text) => serde_json::Value::String(text),
            Data::Bytes(bytes) => serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            Data::Value(value) => value,
        };
        res.write_str(&serde_json::to_string(&value).map_err(anyhow::Error::from)?);
        Ok(())
    }
}

#[test]
fn test_custom_data_writer() {
    let mut mux = Mux::new();
    mux.set_data_writer(Arc::new(JsonWriter));
    mux.get("/hello", [labelled("hi")]).unwrap();
    let router = mux.into_router();
    assert_eq!(body_of(&router, "GET", "/hello"), "\"hi\"");
}

#[test]
fn test_shared_router_publish() {
    let mut first = Mux::new();
    first.get("/version", [labelled("v1")]).unwrap();
    let shared = SharedRouter::from(first.into_router());

    let snapshot = shared.load();
    assert_eq!(body_of(&snapshot, "GET", "/version"), "v1");

    let mut second = Mux::new();
    second.get("/version", [labelled("v2")]).unwrap();
    let previous = shared.publish(second.into_router());

    let (res, _) = shared.handle(request("GET", "/version"));
    assert_eq!(res.body_string(), "v2");
    assert_eq!(body_of(&previous, "GET", "/version"), "v1");
    assert_eq!(body_of(&snapshot, "GET", "/version"), "v1");
}

#[test]
fn test_shared_router_across_threads() {
    let mut mux = Mux::new();
    mux.get("/n/<n>", [echo_param("n")]).unwrap();
    let shared = Arc::new(SharedRouter::new(mux.into_router()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                let (res, result) = shared.handle(request("GET", &format!("/n/{i}")));
                result.map(|()| res.body_string())
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap().unwrap(), i.to_string());
    }
}

#[test]
fn test_registration_and_dispatch_are_logged() {
    let ((), logs) = with_captured_logs(|| {
        let mut mux = Mux::new().with_config(RouterConfig {
            log_routes: true,
            ..RouterConfig::default()
        });
        mux.get("/users/<id>", [labelled("u")]).unwrap().name("user");
        mux.get("/other", []).unwrap().name("user");
        let router = mux.into_router();
        let _ = router.handle(request("GET", "/users/1"));
    });
    assert!(logs.contains("Route registered"), "{logs}");
    assert!(logs.contains("Duplicate route name"), "{logs}");
    assert!(logs.contains("Routing table frozen"), "{logs}");
    assert!(logs.contains("Route matched"), "{logs}");
}
