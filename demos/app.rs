//! Demo perch application.
//!
//! Run with:
//!   cargo run --example app
//!
//! Try:
//!   curl http://localhost:3000/hello/fred
//!   curl http://localhost:3000/sum/3/4
//!   curl http://localhost:3000/book
//!   curl -X POST http://localhost:3000/book
//!   curl -X DELETE http://localhost:3000/book        # 405
//!   curl http://localhost:3000/exception             # rendered by the exception handler
//!   curl http://localhost:3000/json

use perch::{HandlerError, Hooks, Request, Resource, Response, Router, Server, middleware};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct Data {
    name: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[tokio::main]
async fn main() -> Result<(), perch::Error> {
    tracing_subscriber::fmt::init();

    let mut app = Router::new();
    app.exception_handler(|_req, res, err| res.text(err.to_string()))
        .middleware(middleware::Trace)
        .middleware(Hooks::new(
            |req: &mut Request| info!(path = req.path(), "processing request"),
            |req: &mut Request, _: &mut Response| info!(path = req.path(), "processing response"),
        ));

    app.route("/home", home)?
        .route("/about", |_: &Request, res: &mut Response| res.text("Hello from the About page"))?
        .route("/hello/{name}", greeting)?
        .route("/sum/{num_1:int}/{num_2:int}", sum)?
        .resource(
            "/book",
            Resource::new()
                .get(|_: &Request, res: &mut Response| res.text("Books page"))
                .post(|_: &Request, res: &mut Response| res.text("Endpoint to create a book")),
        )?
        .route("/sample", |_: &Request, res: &mut Response| res.text("sample"))?
        .route("/exception", exception_throwing_handler)?
        .route("/json", json_handler)?
        .route("/text", |_: &Request, res: &mut Response| res.text("This is a simple text"))?;

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

fn home(_req: &Request, res: &mut Response) {
    res.html("<h1>Awesome Framework</h1><p>Hello, Webby</p>");
}

fn greeting(req: &Request, res: &mut Response) {
    let name = req.param("name").map(ToString::to_string).unwrap_or_default();
    res.text(format!("Hello, {name}!!"));
}

fn sum(req: &Request, res: &mut Response) -> Result<(), HandlerError> {
    let a = req.param("num_1").and_then(|v| v.as_int()).ok_or("num_1 missing")?;
    let b = req.param("num_2").and_then(|v| v.as_int()).ok_or("num_2 missing")?;
    let total = a.checked_add(b).ok_or("sum overflows")?;
    res.text(format!("{a} + {b} = {total}"));
    Ok(())
}

fn exception_throwing_handler(_req: &Request, _res: &mut Response) -> Result<(), HandlerError> {
    Err("This handler should not be used.".into())
}

fn json_handler(_req: &Request, res: &mut Response) -> Result<(), HandlerError> {
    res.json(&Data { name: "data", kind: "JSON" })?;
    Ok(())
}
