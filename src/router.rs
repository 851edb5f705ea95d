//! The application router: registration and dispatch.
//!
//! Build it once at startup, then pass it to [`Server::serve`](crate::Server::serve)
//! or call [`Router::handle`] directly. Registration calls return
//! `Result<&mut Router, Error>` so they chain with `?`. A failed
//! registration leaves the router exactly as it was.
//!
//! One request goes through:
//!
//! ```text
//! middleware before hooks
//!   → route lookup          (no match: 404 "Not found.")
//!   → method check          (not allowed: Error::MethodNotAllowed)
//!   → handler               (Err: exception handler, or Error::Handler)
//! middleware after hooks, in reverse
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Error;
use crate::exception::ExceptionSlot;
use crate::handler::{Endpoint, HandlerError, IntoOutcome, Resource, boxed};
use crate::method::{AllowedMethods, Method};
use crate::middleware::{Middleware, Pipeline};
use crate::registry::Registry;
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Routes are tried in registration order and the first match wins.
#[derive(Clone, Default)]
pub struct Router {
    routes: Registry,
    middleware: Pipeline,
    exception: ExceptionSlot,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function handler for GET, POST, PUT, DELETE, PATCH and OPTIONS.
    ///
    /// Path parameters use `{name}` or `{name:kind}` syntax; `req.param("name")`
    /// retrieves them:
    ///
    /// ```rust
    /// # use perch::{Error, Request, Response, Router};
    /// # fn main() -> Result<(), Error> {
    /// let mut app = Router::new();
    /// app.route("/hello/{name}", |req: &Request, res: &mut Response| {
    ///     let name = req.param("name").map(ToString::to_string).unwrap_or_default();
    ///     res.text(format!("Hello, {name}!!"));
    /// })?
    /// .route("/about", |_: &Request, res: &mut Response| res.text("Hello from the About page"))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn route<F, R>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, Error>
    where
        F: Fn(&Request, &mut Response) -> R + Send + Sync + 'static,
        R: IntoOutcome + 'static,
    {
        self.route_methods(pattern, Method::STANDARD, handler)
    }

    /// Register a function handler for an explicit set of methods.
    pub fn route_methods<F, R>(
        &mut self,
        pattern: &str,
        methods: impl IntoIterator<Item = Method>,
        handler: F,
    ) -> Result<&mut Self, Error>
    where
        F: Fn(&Request, &mut Response) -> R + Send + Sync + 'static,
        R: IntoOutcome + 'static,
    {
        let endpoint = Endpoint::Function {
            handler: boxed(handler),
            methods: AllowedMethods::new(methods),
        };
        self.routes.insert(pattern, endpoint)?;
        Ok(self)
    }

    /// Register a multi-verb [`Resource`]. It serves exactly the methods it
    /// has callables for.
    pub fn resource(&mut self, pattern: &str, resource: Resource) -> Result<&mut Self, Error> {
        self.routes.insert(pattern, Endpoint::Resource(resource))?;
        Ok(self)
    }

    /// Append `middleware` to the pipeline. Registration order is hook order.
    pub fn middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.add(middleware);
        self
    }

    /// Set the exception handler, replacing any previous one.
    ///
    /// It receives every error a handler returns and renders it into the
    /// response; [`Router::handle`] then succeeds. Method mismatches and
    /// middleware failures never reach it.
    pub fn exception_handler<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response, &HandlerError) + Send + Sync + 'static,
    {
        self.exception.set(Arc::new(hook));
        self
    }

    pub(crate) fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub(crate) fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    /// Run one request through the middleware pipeline and dispatcher.
    ///
    /// An unmatched path is not an error: it yields `404` with body
    /// `Not found.`.
    ///
    /// # Errors
    ///
    /// - [`Error::MethodNotAllowed`] if a route matched but does not serve
    ///   the request method.
    /// - [`Error::Handler`] if the handler failed and no exception handler is
    ///   registered.
    /// - [`Error::Middleware`] if a middleware hook failed.
    pub fn handle(&self, mut req: Request) -> Result<Response, Error> {
        let mut res = Response::new();
        self.middleware
            .wrap(&mut req, &mut res, |req, res| self.dispatch(req, res))?;
        Ok(res)
    }

    fn dispatch(&self, req: &mut Request, res: &mut Response) -> Result<(), Error> {
        let Some((route, params)) = self.routes.lookup(req.path()) else {
            debug!(method = %req.method(), path = req.path(), "no route matched");
            res.not_found();
            return Ok(());
        };

        let Some(handler) = route.endpoint.resolve(req.method()) else {
            return Err(Error::MethodNotAllowed {
                method: req.method(),
                path: req.path().to_owned(),
                allowed: route.endpoint.allowed(),
            });
        };

        req.params = params;
        let req = &*req;
        let Err(err) = handler.call(req, res) else {
            return Ok(());
        };

        warn!(
            method = %req.method(),
            path = req.path(),
            route = route.pattern.as_str(),
            error = %err,
            "handler failed"
        );
        self.exception
            .invoke(req, res, err)
            .map_err(|source| Error::Handler {
                method: req.method(),
                path: req.path().to_owned(),
                source,
            })
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("middleware", &self.middleware.len())
            .field("exception_handler", &self.exception.is_set())
            .finish()
    }
}
