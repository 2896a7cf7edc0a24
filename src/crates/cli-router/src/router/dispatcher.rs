//! Ordered route table and dispatch
//!
//! Routes are evaluated in registration order and the first one whose
//! pattern fully matches is invoked. Evaluation of a route stops at its first
//! failing requirement.
//!
//! # Example
//!
//! ```rust
//! use cli_router::call::Call;
//! use cli_router::router::{Handler, Pattern, Router};
//!
//! let mut router = Router::new();
//! router
//!     .route([("a", "^delete$"), ("id", "^[0-9]+$")], Handler::function(|call: &Call| {
//!         format!("delete {}", call.opt("id").unwrap().as_match_str())
//!     }))
//!     .unwrap()
//!     .route(Pattern::any(), Handler::function(|_: &Call| "usage".to_string()))
//!     .unwrap();
//!
//! let call = Call::builder("app").option("a", "delete").option("id", "7").build();
//! assert_eq!(router.run(&call).unwrap(), "delete 7");
//! ```

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::handler::{Handler, HandlerRegistry};
use super::pattern::{Check, Pattern, Requirement};
use crate::call::Call;
use crate::config::{RouteTable, RouterSettings};
use crate::{Result, RoutingError};

struct Route<T> {
    name: Option<String>,
    requirements: Vec<Requirement>,
    handler: Arc<Handler<T>>,
}

impl<T> Route<T> {
    fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{}", index),
        }
    }

    fn matches(&self, index: usize, call: &Call) -> Result<bool> {
        for requirement in &self.requirements {
            let outcome = requirement.check(call)?;
            if outcome != Check::Matched {
                debug!(
                    route = %self.label(index),
                    option = %requirement.key(),
                    outcome = ?outcome,
                    "Route rejected"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// First-match router over an ordered route table
pub struct Router<T> {
    routes: Vec<Route<T>>,
    settings: RouterSettings,
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self::with_settings(RouterSettings::default())
    }

    pub fn with_settings(settings: RouterSettings) -> Self {
        Self {
            routes: Vec::new(),
            settings,
        }
    }

    /// Build a router from a route table, resolving handler names in `registry`.
    pub fn from_table(table: &RouteTable, registry: &HandlerRegistry<T>) -> Result<Self> {
        let mut router = Self::new();
        router.load_table(table, registry)?;
        Ok(router)
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Append a route. Every expression is compiled now; a malformed one
    /// fails registration and leaves the table unchanged.
    pub fn route(&mut self, pattern: impl Into<Pattern>, handler: Handler<T>) -> Result<&mut Self> {
        self.push(None, pattern.into(), Arc::new(handler))
    }

    /// Append a route with a name used in logs.
    pub fn route_named(
        &mut self,
        name: impl Into<String>,
        pattern: impl Into<Pattern>,
        handler: Handler<T>,
    ) -> Result<&mut Self> {
        self.push(Some(name.into()), pattern.into(), Arc::new(handler))
    }

    /// Append a route whose expressions are compiled only when first
    /// evaluated by [`Router::run`].
    pub fn route_deferred(&mut self, pattern: impl Into<Pattern>, handler: Handler<T>) -> &mut Self {
        let requirements = self.requirements(pattern.into());
        self.routes.push(Route {
            name: None,
            requirements,
            handler: Arc::new(handler),
        });
        self
    }

    /// Append every route of a table in order.
    pub fn load_table(&mut self, table: &RouteTable, registry: &HandlerRegistry<T>) -> Result<&mut Self> {
        for entry in &table.routes {
            let handler = registry
                .get(&entry.handler)
                .ok_or_else(|| RoutingError::UnknownHandler(entry.handler.clone()))?;
            self.push(entry.name.clone(), entry.pattern()?, handler)?;
        }
        Ok(self)
    }

    fn requirements(&self, pattern: Pattern) -> Vec<Requirement> {
        pattern
            .entries()
            .iter()
            .map(|(key, expr)| {
                Requirement::new(key.clone(), expr.clone(), self.settings.case_insensitive)
            })
            .collect()
    }

    fn push(
        &mut self,
        name: Option<String>,
        pattern: Pattern,
        handler: Arc<Handler<T>>,
    ) -> Result<&mut Self> {
        let requirements = self.requirements(pattern);
        for requirement in &requirements {
            requirement.compile()?;
        }

        self.routes.push(Route {
            name,
            requirements,
            handler,
        });
        Ok(self)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch `call` to the first matching route and return its handler's result.
    ///
    /// # Errors
    ///
    /// * `RoutingError::NoMatch` if no route matches
    /// * `RoutingError::InvalidPattern` if a deferred expression reached
    ///   during evaluation does not compile
    pub fn run(&self, call: &Call) -> Result<T> {
        for (index, route) in self.routes.iter().enumerate() {
            if route.matches(index, call)? {
                info!(
                    route = %route.label(index),
                    binder = %route.handler.kind(),
                    "Dispatching call"
                );
                return Ok(route.handler.call(call));
            }
        }

        warn!(
            command = %call.name(),
            routes = self.routes.len(),
            "No route matches call"
        );
        Err(RoutingError::NoMatch {
            routes: self.routes.len(),
        })
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: Vec<String> = self
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| route.label(index))
            .collect();
        f.debug_struct("Router")
            .field("routes", &routes)
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::OptionTemplate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_call() -> Call {
        let template = OptionTemplate::new("a:s", &["action:"]).unwrap();
        Call::parsed(["/usr/bin/tool", "-adelete", "--action=delete", "-s"], &template).unwrap()
    }

    fn tag(name: &'static str) -> Handler<&'static str> {
        Handler::function(move |_: &Call| name)
    }

    #[test]
    fn test_run_invokes_matching_handler_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        router
            .route(
                [("a", "/^delete$/"), ("s", "/^1$/")],
                Handler::shared(hits.clone(), |hits: &AtomicUsize, call: &Call| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    call.name().to_string()
                }),
            )
            .unwrap();

        assert_eq!(router.run(&test_call()).unwrap(), "/usr/bin/tool");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_fails_without_match() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        router
            .route(
                [("a", "/^test$/")],
                Handler::shared(hits.clone(), |hits: &AtomicUsize, _: &Call| {
                    hits.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let result = router.run(&test_call());
        assert!(matches!(result, Err(RoutingError::NoMatch { routes: 1 })));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_absent_option_rejects_route() {
        let mut router = Router::new();
        router.route([("n", "^$")], tag("absent")).unwrap();

        assert!(matches!(
            router.run(&test_call()),
            Err(RoutingError::NoMatch { .. })
        ));
    }

    #[test]
    fn test_empty_router_fails() {
        let router: Router<()> = Router::new();
        assert!(router.is_empty());
        assert!(matches!(
            router.run(&test_call()),
            Err(RoutingError::NoMatch { routes: 0 })
        ));
    }

    #[test]
    fn test_first_match_wins() {
        let mut router = Router::new();
        router
            .route([("a", "^delete$")], tag("first"))
            .unwrap()
            .route([("action", "^delete$")], tag("second"))
            .unwrap();

        assert_eq!(router.len(), 2);
        assert_eq!(router.run(&test_call()).unwrap(), "first");
    }

    #[test]
    fn test_catch_all() {
        let mut router = Router::new();
        router
            .route([("a", "^x$")], tag("specific"))
            .unwrap()
            .route(Pattern::any(), tag("fallback"))
            .unwrap();

        assert_eq!(router.run(&test_call()).unwrap(), "fallback");
        assert_eq!(router.run(&Call::raw(["/usr/bin/tool"])).unwrap(), "fallback");
    }

    #[test]
    fn test_eager_compile_rejects_invalid_pattern() {
        let mut router = Router::new();
        let result = router.route([("a", "(")], tag("broken"));

        assert!(matches!(result, Err(RoutingError::InvalidPattern { .. })));
        assert!(router.is_empty());
    }

    #[test]
    fn test_deferred_invalid_pattern_after_failing_entry() {
        let mut router = Router::new();
        router
            .route_deferred([("a", "^create$"), ("s", "(")], tag("never"))
            .route_deferred(Pattern::any(), tag("fallback"));

        assert_eq!(router.run(&test_call()).unwrap(), "fallback");
    }

    #[test]
    fn test_deferred_invalid_pattern_reached() {
        let mut router = Router::new();
        router.route_deferred([("a", "^delete$"), ("s", "(")], tag("broken"));

        assert!(matches!(
            router.run(&test_call()),
            Err(RoutingError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_case_insensitive_settings() {
        let mut router = Router::with_settings(RouterSettings::new().with_case_insensitive(true));
        router.route([("a", "^DELETE$")], tag("delete")).unwrap();

        assert!(router.settings().case_insensitive);
        assert_eq!(router.run(&test_call()).unwrap(), "delete");
    }

    #[test]
    fn test_handler_error_passes_through() {
        #[derive(Debug, PartialEq)]
        struct Denied;

        let mut router: Router<std::result::Result<(), Denied>> = Router::new();
        router
            .route(Pattern::any(), Handler::function(|_: &Call| Err(Denied)))
            .unwrap();

        assert_eq!(router.run(&test_call()).unwrap(), Err(Denied));
    }

    #[test]
    fn test_from_table() {
        let table = RouteTable::from_yaml_str(
            r#"
routes:
  - name: delete
    handler: remove
    when:
      a: "^delete$"
  - handler: usage
"#,
        )
        .unwrap();

        let mut registry = HandlerRegistry::new();
        registry.register("remove", tag("remove")).register("usage", tag("usage"));

        let router = Router::from_table(&table, &registry).unwrap();
        assert_eq!(router.len(), 2);
        assert_eq!(router.run(&test_call()).unwrap(), "remove");
        assert_eq!(router.run(&Call::raw(["/usr/bin/tool"])).unwrap(), "usage");
    }

    #[test]
    fn test_from_table_unknown_handler() {
        let table = RouteTable::from_yaml_str("routes:\n  - handler: missing\n").unwrap();
        let registry: HandlerRegistry<()> = HandlerRegistry::new();

        match Router::from_table(&table, &registry) {
            Err(RoutingError::UnknownHandler(name)) => assert_eq!(name, "missing"),
            other => panic!("expected UnknownHandler, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_lists_route_labels() {
        let mut router = Router::new();
        router
            .route_named("delete", [("a", "^delete$")], tag("delete"))
            .unwrap()
            .route(Pattern::any(), tag("fallback"))
            .unwrap();

        let debug = format!("{:?}", router);
        assert!(debug.contains("delete"));
        assert!(debug.contains("#1"));
    }
}
