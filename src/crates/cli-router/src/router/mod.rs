//! Routing of calls to handlers
//!
//! # Data Flow
//! ```text
//! Call (parsed options)
//!     → dispatcher.rs (scan routes in registration order)
//!     → pattern.rs (test each requirement, stop at the first failure)
//!     → handler.rs (invoke the first fully matching route's handler)
//!     → Return: handler result or RoutingError::NoMatch
//! ```

pub mod dispatcher;
pub mod handler;
pub mod pattern;

pub use dispatcher::Router;
pub use handler::{BinderKind, Handler, HandlerRegistry};
pub use pattern::{compile_expression, Check, Pattern};
