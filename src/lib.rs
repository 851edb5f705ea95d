//! # perch
//!
//! A small, synchronous routing and dispatch core for experimental web apps.
//!
//! ## The contract
//!
//! One request is fully processed before the next one starts. Handlers are
//! plain functions that fill in a mutable [`Response`]; there is no async, no
//! streaming, and no route-ambiguity resolution beyond rejecting exact
//! duplicates.
//!
//! What perch does:
//!
//! - **Pattern routing**: `/hello/{name}`, `/sum/{a:int}/{b:int}`, tried in
//!   registration order, first match wins
//! - **Function and resource handlers**: one callable for every allowed verb,
//!   or one callable per verb via [`Resource`]
//! - **Middleware**: before/after hook pairs wrapped around every dispatch
//! - **Exception handler**: one hook that renders handler failures
//!
//! What it leaves to you: templates, static files, TLS, handler timeouts.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use perch::{HandlerError, Request, Resource, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), perch::Error> {
//!     let mut app = Router::new();
//!     app.route("/hello/{name}", greet)?
//!         .resource("/book", Resource::new().get(list_books).post(create_book))?
//!         .exception_handler(|_req, res, err| res.text(err.to_string()));
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! fn greet(req: &Request, res: &mut Response) {
//!     let name = req.param("name").map(ToString::to_string).unwrap_or_default();
//!     res.text(format!("Hello, {name}!!"));
//! }
//!
//! fn list_books(_req: &Request, res: &mut Response) -> Result<(), HandlerError> {
//!     res.json(&["Dune", "Solaris"])?;
//!     Ok(())
//! }
//!
//! fn create_book(req: &Request, res: &mut Response) -> Result<(), HandlerError> {
//!     if req.body().is_empty() {
//!         return Err("empty body".into());
//!     }
//!     res.set_status(perch::StatusCode::CREATED);
//!     Ok(())
//! }
//! ```

mod error;
mod exception;
mod handler;
mod method;
mod pattern;
mod registry;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::Error;
pub use handler::{HandlerError, IntoOutcome, Resource};
pub use http::StatusCode;
pub use method::{AllowedMethods, Method, UnknownMethod};
pub use middleware::{Hooks, Middleware};
pub use pattern::{Converter, Params, Pattern, PatternKey, Segment, UnknownConverter, Value};
pub use request::Request;
pub use response::{ContentType, Response};
pub use router::Router;
pub use server::Server;
