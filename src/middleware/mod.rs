//! Middleware layer.
//!
//! Middleware wraps every dispatch and is the right place for cross-cutting
//! concerns such as request logging or header checks.
//!
//! Each middleware is a pair of hooks. With middleware `[A, B]` registered in
//! that order, one request runs:
//!
//! ```text
//! A.before → B.before → dispatch → B.after → A.after
//! ```
//!
//! A hook that fails stops the chain: the error propagates out of
//! [`Router::handle`](crate::Router::handle) and the exception handler is not
//! consulted. A failed dispatch likewise skips the after hooks.
//!
//! Built-in middleware:
//! - [`Trace`]: per-request log line with method, path, status and latency

mod trace;

pub use trace::Trace;

use std::sync::Arc;

use crate::error::Error;
use crate::handler::{HandlerError, IntoOutcome};
use crate::request::Request;
use crate::response::Response;

/// A before/after hook pair wrapped around every dispatch.
///
/// Both hooks default to no-ops; implement only the ones you need.
///
/// ```rust
/// use perch::{Middleware, Request, Response};
/// use perch::HandlerError;
///
/// struct RequireToken;
///
/// impl Middleware for RequireToken {
///     fn before(&self, req: &mut Request) -> Result<(), HandlerError> {
///         match req.header("authorization") {
///             Some(_) => Ok(()),
///             None => Err("missing authorization header".into()),
///         }
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Runs before dispatch. May inspect or modify the request.
    fn before(&self, _req: &mut Request) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Runs after a successful dispatch. May inspect or modify both.
    fn after(&self, _req: &mut Request, _res: &mut Response) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn before(&self, req: &mut Request) -> Result<(), HandlerError> {
        (**self).before(req)
    }

    fn after(&self, req: &mut Request, res: &mut Response) -> Result<(), HandlerError> {
        (**self).after(req, res)
    }
}

// ── Closure hooks ─────────────────────────────────────────────────────────────

type BeforeFn = Box<dyn Fn(&mut Request) -> Result<(), HandlerError> + Send + Sync>;
type AfterFn = Box<dyn Fn(&mut Request, &mut Response) -> Result<(), HandlerError> + Send + Sync>;

/// Middleware built from closures. A missing hook is a no-op.
///
/// ```rust
/// use perch::{Hooks, Request, Response};
///
/// let log = Hooks::new(
///     |req: &mut Request| println!("Processing request {}", req.path()),
///     |req: &mut Request, _res: &mut Response| println!("Processing response {}", req.path()),
/// );
/// ```
#[derive(Default)]
pub struct Hooks {
    before: Option<BeforeFn>,
    after: Option<AfterFn>,
}

impl Hooks {
    pub fn new<B, BR, A, AR>(before: B, after: A) -> Self
    where
        B: Fn(&mut Request) -> BR + Send + Sync + 'static,
        BR: IntoOutcome + 'static,
        A: Fn(&mut Request, &mut Response) -> AR + Send + Sync + 'static,
        AR: IntoOutcome + 'static,
    {
        Self::default().with_before(before).with_after(after)
    }

    /// Only a before hook.
    pub fn before<B, BR>(hook: B) -> Self
    where
        B: Fn(&mut Request) -> BR + Send + Sync + 'static,
        BR: IntoOutcome + 'static,
    {
        Self::default().with_before(hook)
    }

    /// Only an after hook.
    pub fn after<A, AR>(hook: A) -> Self
    where
        A: Fn(&mut Request, &mut Response) -> AR + Send + Sync + 'static,
        AR: IntoOutcome + 'static,
    {
        Self::default().with_after(hook)
    }

    fn with_before<B, BR>(mut self, hook: B) -> Self
    where
        B: Fn(&mut Request) -> BR + Send + Sync + 'static,
        BR: IntoOutcome + 'static,
    {
        self.before = Some(Box::new(move |req: &mut Request| hook(req).into_outcome()));
        self
    }

    fn with_after<A, AR>(mut self, hook: A) -> Self
    where
        A: Fn(&mut Request, &mut Response) -> AR + Send + Sync + 'static,
        AR: IntoOutcome + 'static,
    {
        self.after = Some(Box::new(move |req: &mut Request, res: &mut Response| {
            hook(req, res).into_outcome()
        }));
        self
    }
}

impl Middleware for Hooks {
    fn before(&self, req: &mut Request) -> Result<(), HandlerError> {
        self.before.as_ref().map_or(Ok(()), |hook| hook(req))
    }

    fn after(&self, req: &mut Request, res: &mut Response) -> Result<(), HandlerError> {
        self.after.as_ref().map_or(Ok(()), |hook| hook(req, res))
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// The ordered middleware list, in registration order.
#[derive(Clone, Default)]
pub(crate) struct Pipeline {
    links: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub(crate) fn add(&mut self, middleware: impl Middleware) {
        self.links.push(Arc::new(middleware));
    }

    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }

    /// Run every before hook in order, then `inner`, then every after hook in
    /// reverse order. The first failure stops the chain.
    pub(crate) fn wrap<F>(&self, req: &mut Request, res: &mut Response, inner: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Request, &mut Response) -> Result<(), Error>,
    {
        for link in &self.links {
            link.before(req).map_err(Error::Middleware)?;
        }

        inner(req, res)?;

        for link in self.links.iter().rev() {
            link.after(req, res).map_err(Error::Middleware)?;
        }
        Ok(())
    }
}
