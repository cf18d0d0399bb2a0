//! Integration tests for isoroute
//!
//! These tests drive complete server and browser flows through the public
//! API: registration, matching, handler chains, events and history.

use isoroute::*;
use parking_lot::Mutex;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn log() -> Log {
    Arc::default()
}

/// Handler that records `label` and hands over to the next handler
fn middleware(log: &Log, label: &'static str) -> BoxedHandler {
    let log = Arc::clone(log);
    handler_fn(move |cxt| {
        log.lock().push(label.to_string());
        cxt.next();
        Ok(())
    })
}

/// Handler that records `label` and ends the chain
fn endpoint(log: &Log, label: &'static str) -> BoxedHandler {
    let log = Arc::clone(log);
    handler_fn(move |_cxt| {
        log.lock().push(label.to_string());
        Ok(())
    })
}

/// Record every event the router emits as `"<event> <method> <path>"`
fn record_events(router: &Router) -> Log {
    let events = log();
    for kind in EventKind::ALL {
        let sink = Arc::clone(&events);
        router.bind(kind, move |event| {
            sink.lock()
                .push(format!("{} {} {}", event.kind, event.method, event.path));
        });
    }
    events
}

fn get(uri: &str) -> http::Request<Body> {
    http::Request::get(uri).body(Body::new()).unwrap()
}

fn browser() -> (Router, MemoryHistory) {
    let history = MemoryHistory::new("http://localhost/").unwrap();
    (Router::browser(history.clone()), history)
}

// ============================================================================
// Route Table Tests
// ============================================================================

#[test]
fn test_first_registered_match_wins() {
    init_logging();
    let calls = log();
    let mut router = Router::server();
    router
        .get("/users/{id}", [endpoint(&calls, "by-id")])
        .unwrap()
        .get("/users/new", [endpoint(&calls, "new")])
        .unwrap();

    let found = router.routes().find_by_path("/users/new", &http::Method::GET).unwrap();
    assert_eq!(found.route.path(), "/users/{id}");
    assert_eq!(found.params.get("id"), Some(&"new".to_string()));

    router.dispatcher().serve(get("/users/new"));
    assert_eq!(*calls.lock(), vec!["by-id"]);
}

#[test]
fn test_name_conflict_per_method() {
    let mut router = Router::server();
    router
        .get_named("home", "/", [handler_fn(|_cxt| Ok(()))])
        .unwrap();

    let err = router
        .get_named("home", "/index", [handler_fn(|_cxt| Ok(()))])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "route name 'home' is already registered for GET"
    );

    assert!(router
        .post_named("home", "/", [handler_fn(|_cxt| Ok(()))])
        .is_ok());
    assert_eq!(router.routes().len(), 2);
}

#[test]
fn test_matching_ignores_case_and_trailing_slash() {
    let calls = log();
    let mut router = Router::server();
    router.get("/about", [endpoint(&calls, "about")]).unwrap();

    for path in ["/about", "/ABOUT", "/about/"] {
        assert!(matches!(
            router.dispatcher().serve(get(path)),
            Outcome::Handled(_)
        ));
    }
    assert_eq!(calls.lock().len(), 3);
}

// ============================================================================
// Server Dispatch Tests
// ============================================================================

#[test]
fn test_server_chain_runs_in_order() {
    init_logging();
    let calls = log();
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);

    let mut router = Router::server();
    router
        .get(
            "/",
            [
                middleware(&calls, "mw"),
                handler_fn(move |cxt| {
                    *sink.lock() = Some((cxt.params().clone(), cxt.query().clone(), cxt.cause()));
                    Ok(())
                }),
            ],
        )
        .unwrap();
    let server = router.start(StartOptions::default()).unwrap();

    let mut request = get("/");
    let mut response = http::Response::new(Body::new());
    let mut next_called = false;
    server.dispatch(&mut request, &mut response, |_| next_called = true);

    assert!(!next_called);
    assert_eq!(*calls.lock(), vec!["mw"]);
    let (params, query, cause) = seen.lock().take().unwrap();
    assert!(params.is_empty());
    assert!(query.is_empty());
    assert_eq!(cause, Cause::HttpRequest);
}

#[test]
fn test_server_params_extracted() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);

    let mut router = Router::server();
    router
        .get(
            "/{name}",
            [handler_fn(move |cxt| {
                *sink.lock() = cxt.request().and_then(|r| r.route_params().cloned());
                Ok(())
            })],
        )
        .unwrap();

    router.dispatcher().serve(get("/Goober"));

    let params = seen.lock().take().unwrap();
    assert_eq!(params, RouteParams::new().with("name", "Goober"));
}

#[test]
fn test_server_query_extracted() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);

    let mut router = Router::server();
    router
        .get(
            "/",
            [handler_fn(move |cxt| {
                *sink.lock() = cxt.request().and_then(|r| r.query_params().cloned());
                Ok(())
            })],
        )
        .unwrap();

    router.dispatcher().serve(get("/?st=1&lt=10"));

    let query = seen.lock().take().unwrap();
    assert_eq!(query, QueryParams::new().with("st", "1").with("lt", "10"));
}

#[test]
fn test_server_handler_failure() {
    init_logging();
    let calls = log();
    let mut router = Router::server();
    router
        .get(
            "/fail",
            [
                middleware(&calls, "mw"),
                handler_fn(|_cxt| Err(anyhow::anyhow!("handler exploded"))),
                endpoint(&calls, "unreachable"),
            ],
        )
        .unwrap();

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    router.bind(EventKind::Error, move |event| {
        sink.lock().push((event.path.clone(), event.error.clone()));
    });

    let mut request = get("/fail?retry=1");
    let mut response = http::Response::new(Body::new());
    let mut forwarded = Vec::new();
    router.dispatch_request(&mut request, &mut response, |failure| {
        forwarded.push(failure);
    });

    assert_eq!(*calls.lock(), vec!["mw"]);
    assert_eq!(forwarded.len(), 1);
    let forwarded = forwarded.pop().flatten().unwrap();
    assert_eq!(forwarded.to_string(), "handler exploded");

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    let (path, error) = &errors[0];
    assert_eq!(path, "/fail?retry=1");
    assert!(error.as_ref().unwrap().same_as(&forwarded));
}

#[test]
fn test_server_explicit_fail() {
    let mut router = Router::server();
    router
        .get(
            "/fail",
            [handler_fn(|cxt| {
                cxt.fail(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
                Ok(())
            })],
        )
        .unwrap();

    match router.dispatcher().serve(get("/fail")) {
        Outcome::Next(Some(failure)) => {
            assert!(failure.downcast_ref::<std::io::Error>().is_some());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_server_not_found() {
    let mut router = Router::server();
    router.get("/", [handler_fn(|_cxt| Ok(()))]).unwrap();
    let events = record_events(&router);

    let mut request = get("/missing?q=1");
    let mut response = http::Response::new(Body::new());
    let mut forwarded = Vec::new();
    router.dispatch_request(&mut request, &mut response, |failure| {
        forwarded.push(failure.is_none());
    });

    assert_eq!(forwarded, vec![true]);
    assert_eq!(*events.lock(), vec!["notFound GET /missing?q=1"]);
}

#[test]
fn test_server_event_order() {
    let calls = log();
    let mut router = Router::server();
    let events = record_events(&router);
    let sink = Arc::clone(&events);
    router
        .get(
            "/done",
            [
                handler_fn(move |cxt| {
                    sink.lock().push("handler".to_string());
                    cxt.next();
                    Ok(())
                }),
                middleware(&calls, "last"),
            ],
        )
        .unwrap();

    let outcome = router.dispatcher().serve(get("/done"));

    assert!(matches!(outcome, Outcome::Handled(_)));
    assert_eq!(
        *events.lock(),
        vec![
            "navigating GET /done",
            "handler",
            "navigationComplete GET /done"
        ]
    );
}

#[test]
fn test_router_shared_across_threads() {
    let mut router = Router::server();
    router
        .get(
            "/echo/{word}",
            [handler_fn(|cxt| {
                let word = cxt.params().get("word").cloned().unwrap_or_default();
                if let Some(response) = cxt.response_mut() {
                    *response.body_mut() = word.into_bytes();
                }
                Ok(())
            })],
        )
        .unwrap();
    let router = Arc::new(router);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                match router.dispatcher().serve(get(&format!("/echo/w{}", i))) {
                    Outcome::Handled(response) => response.into_body(),
                    Outcome::Next(_) => Vec::new(),
                }
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("w{}", i).into_bytes());
    }
}

// ============================================================================
// Browser Dispatch Tests
// ============================================================================

#[test]
fn test_browser_replace_vs_push() {
    init_logging();
    let (mut router, history) = browser();
    router
        .get("/", [handler_fn(|_cxt| Ok(()))])
        .unwrap()
        .get("/about", [handler_fn(|_cxt| Ok(()))])
        .unwrap();

    router.navigate_to("/");
    router.navigate_to("/about");
    router.navigate_to("/about?tab=team");

    assert_eq!(
        history.calls(),
        vec![
            HistoryCall::Replace("/".to_string()),
            HistoryCall::Push("/about".to_string()),
            HistoryCall::Replace("/about?tab=team".to_string()),
        ]
    );
    assert_eq!(history.len(), 2);
}

#[test]
fn test_browser_ignores_non_get_routes() {
    let (mut router, _history) = browser();
    let handler = || [handler_fn(|_cxt| Ok(()))];

    router.post("/", handler()).unwrap();
    router.put("/", handler()).unwrap();
    router.patch("/", handler()).unwrap();
    router.del("/", handler()).unwrap();
    router.head("/", handler()).unwrap();
    router.options("/", handler()).unwrap();
    router.trace("/", handler()).unwrap();

    assert!(router.routes().is_empty());
}

#[test]
fn test_browser_context() {
    let (mut router, history) = browser();
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    router
        .get(
            "/hello/{name}",
            [handler_fn(move |cxt| {
                *sink.lock() = Some((
                    cxt.path().to_string(),
                    cxt.full_path().to_string(),
                    cxt.params().clone(),
                    cxt.query().get_all("tag").cloned(),
                    cxt.can_use_dom(),
                    cxt.request().is_none(),
                ));
                Ok(())
            })],
        )
        .unwrap();

    assert!(router.navigate_to("/hello/Goober?tag=a&tag=b"));

    let (path, full_path, params, tags, can_use_dom, no_request) = seen.lock().take().unwrap();
    assert_eq!(path, "/hello/Goober");
    assert_eq!(full_path, "/hello/Goober?tag=a&tag=b");
    assert_eq!(params.get("name"), Some(&"Goober".to_string()));
    assert_eq!(tags, Some(vec!["a".to_string(), "b".to_string()]));
    assert!(can_use_dom);
    assert!(no_request);

    let state = history.state().unwrap();
    assert_eq!(state.full_path, "/hello/Goober?tag=a&tag=b");
    assert_eq!(state.params, params);
}

#[test]
fn test_browser_event_order() {
    let (mut router, _history) = browser();
    let events = record_events(&router);
    let sink = Arc::clone(&events);
    router
        .get(
            "/",
            [handler_fn(move |cxt| {
                sink.lock().push("handler".to_string());
                cxt.next();
                Ok(())
            })],
        )
        .unwrap();

    router.navigate_to("/");
    router.navigate_to("/nowhere");

    assert_eq!(
        *events.lock(),
        vec![
            "handler",
            "navigationComplete GET /",
            "navigating GET /",
            "notFound GET /nowhere"
        ]
    );
}

#[test]
fn test_browser_failure_only_emits_error() {
    let (mut router, history) = browser();
    router
        .get("/oops", [handler_fn(|_cxt| Err(anyhow::anyhow!("oops")))])
        .unwrap();
    let events = record_events(&router);

    assert!(router.navigate_to("/oops"));
    assert_eq!(
        *events.lock(),
        vec!["error GET /oops", "navigating GET /oops"]
    );
    assert_eq!(history.pathname(), "/oops");
}

#[test]
fn test_browser_named_navigation() {
    let (mut router, history) = browser();
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    router
        .get_named(
            "article",
            "/articles/{slug}",
            [handler_fn(move |cxt| {
                *sink.lock() = Some((
                    cxt.params().get("slug").cloned(),
                    cxt.query().get("page").cloned(),
                ));
                Ok(())
            })],
        )
        .unwrap();

    assert_eq!(
        router.url_for("article", &RouteParams::new().with("slug", "hello")),
        Some("/articles/hello".to_string())
    );

    router.navigate(
        "article",
        NavigateOptions::new()
            .params(RouteParams::new().with("slug", "hello"))
            .query(QueryParams::new().with("page", "2")),
    );

    assert_eq!(history.href(), "http://localhost/articles/hello?page=2");
    assert_eq!(
        seen.lock().take(),
        Some((Some("hello".to_string()), Some("2".to_string())))
    );
}

#[test]
fn test_browser_back_and_forward() {
    init_logging();
    let (mut router, history) = browser();
    let visits = log();
    router
        .get("/", [endpoint(&visits, "home")])
        .unwrap()
        .get("/a", [endpoint(&visits, "a")])
        .unwrap()
        .get("/b", [endpoint(&visits, "b")])
        .unwrap();

    router.start(StartOptions::new().auto_start(true));
    router.navigate_to("/a");
    router.navigate_to("/b");

    let popped = history.back().unwrap();
    assert!(router.handle_pop_state(&popped));
    let popped = history.back().unwrap();
    assert!(router.handle_pop_state(&popped));
    let popped = history.forward().unwrap();
    assert!(router.handle_pop_state(&popped));

    assert_eq!(*visits.lock(), vec!["home", "a", "b", "a", "home", "a"]);
    assert_eq!(history.pathname(), "/a");
    assert_eq!(history.len(), 3);

    // The entry created by startup keeps its cause
    history.back();
    assert_eq!(history.state().unwrap().cause, Cause::Startup);
}

#[test]
fn test_browser_link_interception() {
    let (mut router, history) = browser();
    let visits = log();
    router.get("/docs", [endpoint(&visits, "docs")]).unwrap();

    let mut click = ClickEvent::on(Anchor::new("/docs#install"));
    assert!(!router.handle_click(&mut click), "not started");

    router.start(StartOptions::default());
    assert!(router.handle_click(&mut click));
    assert!(click.default_prevented);
    assert_eq!(history.href(), "http://localhost/docs#install");

    let mut external = ClickEvent::on(Anchor::new("https://crates.io/"));
    assert!(!router.handle_click(&mut external));
    assert!(!external.default_prevented);

    router.stop();
    let mut click = ClickEvent::on(Anchor::new("/docs"));
    assert!(!router.handle_click(&mut click));

    assert_eq!(*visits.lock(), vec!["docs"]);
}
