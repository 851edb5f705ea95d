//! The single exception-handler slot.
//!
//! When a handler fails, the router hands the error to the registered
//! exception handler, which renders it into the response. With no handler
//! registered the error propagates out of [`Router::handle`](crate::Router::handle).
//!
//! Only handler execution is covered. Method mismatches and middleware
//! failures always propagate.

use std::sync::Arc;

use crate::handler::HandlerError;
use crate::request::Request;
use crate::response::Response;

pub(crate) type BoxedExceptionHook =
    Arc<dyn Fn(&Request, &mut Response, &HandlerError) + Send + Sync + 'static>;

/// Holds at most one exception handler. Empty until set.
#[derive(Clone, Default)]
pub(crate) struct ExceptionSlot {
    hook: Option<BoxedExceptionHook>,
}

impl ExceptionSlot {
    /// Install `hook`, replacing any previous one.
    pub(crate) fn set(&mut self, hook: BoxedExceptionHook) {
        self.hook = Some(hook);
    }

    pub(crate) fn is_set(&self) -> bool {
        self.hook.is_some()
    }

    /// Let the hook render `err` into `res`. Hands `err` back when no hook
    /// is set.
    pub(crate) fn invoke(
        &self,
        req: &Request,
        res: &mut Response,
        err: HandlerError,
    ) -> Result<(), HandlerError> {
        match &self.hook {
            Some(hook) => {
                hook(req, res, &err);
                Ok(())
            }
            None => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    #[test]
    fn empty_slot_hands_the_error_back() {
        let slot = ExceptionSlot::default();
        let req = Request::new(Method::Get, "/");
        let mut res = Response::new();

        let err = slot.invoke(&req, &mut res, "boom".into()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(res.body().is_empty());
    }

    #[test]
    fn last_hook_set_wins() {
        let mut slot = ExceptionSlot::default();
        slot.set(Arc::new(|_: &Request, res: &mut Response, _: &HandlerError| {
            res.text("first")
        }));
        slot.set(Arc::new(|_: &Request, res: &mut Response, err: &HandlerError| {
            res.text(format!("second: {err}"))
        }));
        assert!(slot.is_set());

        let req = Request::new(Method::Get, "/");
        let mut res = Response::new();
        slot.invoke(&req, &mut res, "boom".into()).unwrap();
        assert_eq!(res.body(), b"second: boom");
    }
}
