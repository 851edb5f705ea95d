use perch::{Error, Method, Request, Resource, Response, Router, StatusCode};

fn hello(req: &Request, res: &mut Response) {
    let name = req.param("name").map(ToString::to_string).unwrap_or_default();
    res.text(format!("hey {name}"));
}

fn get(app: &Router, path: &str) -> Response {
    app.handle(Request::new(Method::Get, path)).unwrap()
}

#[test]
fn basic_route_adding() {
    let mut app = Router::new();
    app.route("/home", |_: &Request, res: &mut Response| res.text("test"))
        .unwrap();
    assert_eq!(get(&app, "/home").body_text(), Some("test"));
}

#[test]
fn route_overlap_is_rejected() {
    let mut app = Router::new();
    app.route("/home", |_: &Request, res: &mut Response| res.text("first"))
        .unwrap();

    let err = app
        .route("/home", |_: &Request, res: &mut Response| res.text("second"))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateRoute { .. }), "{err}");

    // The rejected registration changed nothing.
    assert_eq!(get(&app, "/home").body_text(), Some("first"));
}

#[test]
fn structurally_identical_patterns_are_duplicates() {
    let pairs = [
        ("/hello/{name}", "/hello/{who}"),
        ("/sum/{a:int}/{b:int}", "/sum/{x:d}/{y:int}"),
        ("/{a}/{b:float}", "/{c:str}/{d:f}"),
    ];
    for (first, second) in pairs {
        let mut alone = Router::new();
        alone.route(second, hello).unwrap();

        let mut app = Router::new();
        app.route(first, hello).unwrap();
        let err = app.route(second, hello).unwrap_err();
        assert!(
            matches!(err, Error::DuplicateRoute { ref existing, .. } if existing == first),
            "{first} vs {second}: {err}"
        );
    }
}

#[test]
fn different_literals_or_converters_are_not_duplicates() {
    let mut app = Router::new();
    app.route("/hello/{name}", hello)
        .unwrap()
        .route("/bye/{name}", hello)
        .unwrap()
        .route("/hello/{id:int}", hello)
        .unwrap();
}

#[test]
fn resource_and_function_on_the_same_pattern_collide() {
    let mut app = Router::new();
    app.route("/book", hello).unwrap();
    let err = app
        .resource("/book", Resource::new().get(hello))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateRoute { .. }));
}

#[test]
fn malformed_pattern_is_a_syntax_error() {
    let mut app = Router::new();
    let err = app.route("/sum/{a:integer}", hello).unwrap_err();
    assert!(matches!(err, Error::PatternSyntax { .. }), "{err}");
    assert!(err.to_string().contains("unknown converter `integer`"));
}

#[test]
fn parameterized_route() {
    let mut app = Router::new();
    app.route("/{name}", hello).unwrap();

    assert_eq!(get(&app, "/fred").body_text(), Some("hey fred"));
    assert_eq!(get(&app, "/boss").body_text(), Some("hey boss"));
}

#[test]
fn parameter_needs_its_segment() {
    let mut app = Router::new();
    app.route("/hello/{name}", hello).unwrap();

    assert_eq!(get(&app, "/hello/fred").body_text(), Some("hey fred"));
    assert_eq!(get(&app, "/hello").status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/hello/").status(), StatusCode::NOT_FOUND);
}

#[test]
fn typed_parameters_convert_or_do_not_match() {
    let mut app = Router::new();
    app.route("/sum/{a:int}/{b:int}", |req: &Request, res: &mut Response| {
        let a = req.param("a").and_then(|v| v.as_int()).unwrap();
        let b = req.param("b").and_then(|v| v.as_int()).unwrap();
        res.text((a + b).to_string());
    })
    .unwrap();

    assert_eq!(get(&app, "/sum/3/4").body_text(), Some("7"));

    let res = get(&app, "/sum/x/4");
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.body_text(), Some("Not found."));
}

#[test]
fn default_404_response() {
    let app = Router::new();
    let res = get(&app, "/doesnotexist");

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.body(), b"Not found.");
}

#[test]
fn earlier_parameter_route_shadows_later_literal() {
    let mut app = Router::new();
    app.route("/{name}", hello)
        .unwrap()
        .route("/about", |_: &Request, res: &mut Response| res.text("about"))
        .unwrap();

    assert_eq!(get(&app, "/about").body_text(), Some("hey about"));
}
