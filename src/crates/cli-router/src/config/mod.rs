//! Configuration
//!
//! - [`RouteTable`] - YAML route tables with `${VAR:default}` expansion
//! - [`RouterSettings`] - settings read from `CLI_ROUTER_*` environment variables

mod settings;
mod table;

pub use settings::{RouterSettings, ENV_PREFIX};
pub use table::{RouteConfig, RouteTable, TemplateConfig};
