//! Handlers and type erasure.
//!
//! # How handlers are stored
//!
//! A route holds either one callable for every allowed verb, or a
//! [`Resource`] with one callable per verb. Callables are closures or `fn`
//! items of many concrete types, so they are hidden behind a trait object and
//! stored uniformly:
//!
//! ```text
//! fn hello(req: &Request, res: &mut Response) { … }   ← user writes this
//!        ↓ router.route("/", hello)
//! Arc::new(FnHandler(hello))                          ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req, res)  at dispatch time            ← one vtable dispatch
//! ```
//!
//! A handler signals completion only by mutating the response. It may return
//! `()` or a `Result<(), E>`; an `Err` is a handler failure and is routed to
//! the exception handler.

use std::collections::HashMap;
use std::sync::Arc;

use crate::method::{AllowedMethods, Method};
use crate::request::Request;
use crate::response::Response;

/// A failure raised by a handler or middleware hook.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ── Outcome conversion ────────────────────────────────────────────────────────

/// Conversion of a handler's return value into success or failure.
///
/// Implemented for `()` and for `Result<(), E>` where `E` converts into
/// [`HandlerError`], which covers `&str`, `String` and any
/// `std::error::Error + Send + Sync`.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<(), HandlerError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl<E> IntoOutcome for Result<(), E>
where
    E: Into<HandlerError>,
{
    fn into_outcome(self) -> Result<(), HandlerError> {
        self.map_err(Into::into)
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
pub(crate) trait ErasedHandler {
    fn call(&self, req: &Request, res: &mut Response) -> Result<(), HandlerError>;
}

/// A heap-allocated, type-erased handler.
///
/// `Send + Sync` so a built router can be moved into the server and shared
/// with its connection service.
pub(crate) type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(&Request, &mut Response) -> R,
    R: IntoOutcome,
{
    fn call(&self, req: &Request, res: &mut Response) -> Result<(), HandlerError> {
        (self.0)(req, res).into_outcome()
    }
}

pub(crate) fn boxed<F, R>(handler: F) -> BoxedHandler
where
    F: Fn(&Request, &mut Response) -> R + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    Arc::new(FnHandler(handler))
}

// ── Resource ──────────────────────────────────────────────────────────────────

/// A multi-verb handler: one callable per HTTP method.
///
/// The methods a resource serves are exactly the ones given a callable; any
/// other method on its route fails with
/// [`Error::MethodNotAllowed`](crate::Error::MethodNotAllowed).
///
/// ```rust
/// use perch::{Request, Resource, Response};
///
/// let books = Resource::new()
///     .get(|_req: &Request, res: &mut Response| res.text("Books page"))
///     .post(|_req: &Request, res: &mut Response| res.text("Endpoint to create a book"));
/// ```
#[derive(Clone, Default)]
pub struct Resource {
    verbs: HashMap<Method, BoxedHandler>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `method` with `handler`, replacing any callable already set for it.
    pub fn on<F, R>(mut self, method: Method, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> R + Send + Sync + 'static,
        R: IntoOutcome + 'static,
    {
        self.verbs.insert(method, boxed(handler));
        self
    }

    pub fn get<F, R>(self, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> R + Send + Sync + 'static,
        R: IntoOutcome + 'static,
    {
        self.on(Method::Get, handler)
    }

    pub fn post<F, R>(self, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> R + Send + Sync + 'static,
        R: IntoOutcome + 'static,
    {
        self.on(Method::Post, handler)
    }

    pub fn put<F, R>(self, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> R + Send + Sync + 'static,
        R: IntoOutcome + 'static,
    {
        self.on(Method::Put, handler)
    }

    pub fn patch<F, R>(self, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> R + Send + Sync + 'static,
        R: IntoOutcome + 'static,
    {
        self.on(Method::Patch, handler)
    }

    pub fn delete<F, R>(self, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> R + Send + Sync + 'static,
        R: IntoOutcome + 'static,
    {
        self.on(Method::Delete, handler)
    }

    /// The methods this resource has a callable for.
    pub fn allowed(&self) -> AllowedMethods {
        self.verbs.keys().copied().collect()
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// What a route dispatches to.
#[derive(Clone)]
pub(crate) enum Endpoint {
    Function {
        handler: BoxedHandler,
        methods: AllowedMethods,
    },
    Resource(Resource),
}

impl Endpoint {
    pub(crate) fn allowed(&self) -> AllowedMethods {
        match self {
            Self::Function { methods, .. } => methods.clone(),
            Self::Resource(resource) => resource.allowed(),
        }
    }

    /// The callable serving `method`, or `None` if the method is not allowed.
    pub(crate) fn resolve(&self, method: Method) -> Option<&BoxedHandler> {
        match self {
            Self::Function { handler, methods } => methods.contains(method).then_some(handler),
            Self::Resource(resource) => resource.verbs.get(&method),
        }
    }
}
