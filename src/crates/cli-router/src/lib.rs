//! Pattern-based routing of command-line invocations
//!
//! This crate turns one process invocation into a [`Call`] and dispatches it
//! to the first registered handler whose option patterns all match.
//!
//! # Modules
//!
//! - `call` - Invocation snapshot: command name, options, environment, input
//! - `router` - Ordered route table, pattern evaluation and handler binding
//! - `config` - YAML route tables and environment settings
//! - `error` - Error type shared by all of the above
//!
//! # Example
//!
//! ```rust
//! use cli_router::{Call, Handler, OptionTemplate, Pattern, Router, RoutingError};
//!
//! let mut router = Router::new();
//! router
//!     .route([("a", "^delete$")], Handler::function(|_: &Call| "deleted"))?
//!     .route(Pattern::any(), Handler::function(|_: &Call| "usage"))?;
//!
//! let template = OptionTemplate::short("a:")?;
//! let call = Call::parsed(["app", "-a", "delete"], &template)?;
//! assert_eq!(router.run(&call)?, "deleted");
//! # Ok::<(), RoutingError>(())
//! ```

pub mod call;
pub mod config;
pub mod error;
pub mod router;

pub use call::{Call, CallBuilder, OptionKey, OptionTemplate, OptionValue, Options};
pub use config::{RouteTable, RouterSettings};
pub use error::{Result, RoutingError};
pub use router::{BinderKind, Handler, HandlerRegistry, Pattern, Router};
