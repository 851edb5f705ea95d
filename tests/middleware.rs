use std::sync::{Arc, Mutex};

use perch::middleware::Trace;
use perch::{Error, HandlerError, Hooks, Method, Middleware, Request, Response, Router, StatusCode};

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
}

impl Middleware for Recorder {
    fn before(&self, _req: &mut Request) -> Result<(), HandlerError> {
        self.log.lock().unwrap().push(format!("{}.before", self.name));
        Ok(())
    }

    fn after(&self, _req: &mut Request, _res: &mut Response) -> Result<(), HandlerError> {
        self.log.lock().unwrap().push(format!("{}.after", self.name));
        Ok(())
    }
}

fn app_with(log: &Log) -> Router {
    let handler_log = Arc::clone(log);
    let mut app = Router::new();
    app.middleware(Recorder { name: "A", log: Arc::clone(log) })
        .middleware(Recorder { name: "B", log: Arc::clone(log) })
        .route("/", move |_: &Request, res: &mut Response| {
            handler_log.lock().unwrap().push("handler".to_owned());
            res.text("Yolo");
        })
        .unwrap();
    app
}

#[test]
fn middleware_methods_are_called_in_onion_order() {
    let log: Log = Arc::default();
    let app = app_with(&log);

    let res = app.handle(Request::new(Method::Get, "/")).unwrap();

    assert_eq!(res.body_text(), Some("Yolo"));
    assert_eq!(
        *log.lock().unwrap(),
        ["A.before", "B.before", "handler", "B.after", "A.after"]
    );
}

#[test]
fn middleware_wraps_the_404_response_too() {
    let log: Log = Arc::default();
    let app = app_with(&log);

    let res = app.handle(Request::new(Method::Get, "/missing")).unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        *log.lock().unwrap(),
        ["A.before", "B.before", "B.after", "A.after"]
    );
}

#[test]
fn after_hook_can_rewrite_the_response() {
    let mut app = Router::new();
    app.middleware(Hooks::after(|_: &mut Request, res: &mut Response| {
        res.headers_mut()
            .insert("x-powered-by", http::HeaderValue::from_static("perch"));
    }))
    .route("/", |_: &Request, res: &mut Response| res.text("ok"))
    .unwrap();

    let res = app.handle(Request::new(Method::Get, "/")).unwrap();
    assert_eq!(res.headers()["x-powered-by"], "perch");
}

#[test]
fn failing_before_hook_is_not_caught_by_the_exception_handler() {
    let mut app = Router::new();
    app.exception_handler(|_, res, _| res.text("hooked"))
        .middleware(Hooks::before(|req: &mut Request| -> Result<(), HandlerError> {
            match req.header("authorization") {
                Some(_) => Ok(()),
                None => Err("missing authorization".into()),
            }
        }))
        .route("/", |_: &Request, res: &mut Response| res.text("secret"))
        .unwrap();

    let err = app.handle(Request::new(Method::Get, "/")).unwrap_err();
    assert!(matches!(err, Error::Middleware(_)), "{err}");
    assert_eq!(err.to_string(), "middleware failed: missing authorization");

    let authorized = Request::new(Method::Get, "/").with_header(
        http::header::AUTHORIZATION,
        http::HeaderValue::from_static("Bearer t"),
    );
    assert_eq!(app.handle(authorized).unwrap().body_text(), Some("secret"));
}

#[test]
fn method_mismatch_skips_after_hooks() {
    let log: Log = Arc::default();
    let mut app = Router::new();
    app.middleware(Recorder { name: "A", log: Arc::clone(&log) })
        .route_methods("/", [Method::Get], |_: &Request, _: &mut Response| {})
        .unwrap();

    assert!(app.handle(Request::new(Method::Delete, "/")).is_err());
    assert_eq!(*log.lock().unwrap(), ["A.before"]);
}

#[test]
fn handled_failure_still_runs_after_hooks() {
    let log: Log = Arc::default();
    let mut app = Router::new();
    app.middleware(Recorder { name: "A", log: Arc::clone(&log) })
        .exception_handler(|_, res, err| res.text(err.to_string()))
        .route("/", |_: &Request, _: &mut Response| -> Result<(), HandlerError> {
            Err("broken".into())
        })
        .unwrap();

    let res = app.handle(Request::new(Method::Get, "/")).unwrap();
    assert_eq!(res.body_text(), Some("broken"));
    assert_eq!(*log.lock().unwrap(), ["A.before", "A.after"]);
}

#[test]
fn trace_middleware_is_transparent() {
    let mut app = Router::new();
    app.middleware(Trace)
        .route("/", |_: &Request, res: &mut Response| res.text("traced"))
        .unwrap();

    let res = app.handle(Request::new(Method::Get, "/")).unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_text(), Some("traced"));
}
