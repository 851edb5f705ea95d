//! Route registry.
//!
//! A flat list of compiled patterns in registration order. Lookup walks it
//! front to back and the first pattern that matches wins, so an earlier
//! `/{name}` shadows a later `/about`. Structurally identical patterns are
//! rejected at registration.

use tracing::debug;

use crate::error::Error;
use crate::handler::Endpoint;
use crate::pattern::{Params, Pattern};

/// A registered pattern and what it dispatches to.
#[derive(Clone)]
pub(crate) struct Route {
    pub(crate) pattern: Pattern,
    pub(crate) endpoint: Endpoint,
}

#[derive(Clone, Default)]
pub(crate) struct Registry {
    routes: Vec<Route>,
}

impl Registry {
    /// Compile and append `pattern`. On any error the registry is unchanged.
    pub(crate) fn insert(&mut self, pattern: &str, endpoint: Endpoint) -> Result<(), Error> {
        let pattern = Pattern::compile(pattern)?;
        let key = pattern.key();

        if let Some(existing) = self.routes.iter().find(|r| r.pattern.key() == key) {
            return Err(Error::DuplicateRoute {
                pattern: pattern.as_str().to_owned(),
                existing: existing.pattern.as_str().to_owned(),
            });
        }

        debug!(
            pattern = pattern.as_str(),
            allowed = %endpoint.allowed().header_value(),
            "route registered"
        );
        self.routes.push(Route { pattern, endpoint });
        Ok(())
    }

    /// The first route matching `path`, with its extracted parameters.
    pub(crate) fn lookup(&self, path: &str) -> Option<(&Route, Params)> {
        self.routes
            .iter()
            .find_map(|route| route.pattern.extract(path).map(|params| (route, params)))
    }

    pub(crate) fn len(&self) -> usize {
        self.routes.len()
    }
}
