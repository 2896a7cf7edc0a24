//! Route-table driven command dispatcher
//!
//! Builds a call from the running process and dispatches it through a route
//! table. The table is read from `CLI_ROUTER_TABLE`, or a built-in table is
//! used:
//!
//! ```text
//! cli-route -a options [-n NAME]   print parsed options as JSON
//! cli-route -a env -n NAME         print an environment variable
//! cli-route -a input               echo standard input
//! ```
//!
//! Exit status is 2 when no route matches.

use std::process::ExitCode;

use anyhow::Context;
use cli_router::{Call, Handler, HandlerRegistry, RouteTable, Router, RouterSettings, RoutingError};

type Outcome = anyhow::Result<ExitCode>;

const DEFAULT_TABLE: &str = r#"
template:
  short: "a:n:"
routes:
  - name: options
    handler: options
    when:
      a: "^(options|show)$"
  - name: env
    handler: env
    when:
      a: "^env$"
      n: "^[A-Za-z_][A-Za-z0-9_]*$"
  - name: input
    handler: input
    when:
      a: "^(input|cat)$"
  - name: usage
    handler: usage
"#;

const USAGE: &str = "usage: cli-route -a options|env|input [-n NAME]";

fn builtin_handlers() -> HandlerRegistry<Outcome> {
    let mut registry = HandlerRegistry::new();
    registry
        .register("options", Handler::function(print_options))
        .register("env", Handler::function(print_env))
        .register("input", Handler::function(print_input))
        .register("usage", Handler::function(print_usage));
    registry
}

fn print_options(call: &Call) -> Outcome {
    let json = serde_json::to_string_pretty(call.options())?;
    println!("{}", json);
    Ok(ExitCode::SUCCESS)
}

fn print_env(call: &Call) -> Outcome {
    let name = call
        .opt("n")
        .and_then(|value| value.as_str())
        .context("missing variable name")?;

    match call.env(name) {
        Some(value) => {
            println!("{}", value);
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::FAILURE),
    }
}

fn print_input(call: &Call) -> Outcome {
    print!("{}", call.input()?);
    Ok(ExitCode::SUCCESS)
}

fn print_usage(_call: &Call) -> Outcome {
    eprintln!("{}", USAGE);
    Ok(ExitCode::FAILURE)
}

fn main() -> anyhow::Result<ExitCode> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(rust_log)
        .with_writer(std::io::stderr)
        .init();

    let settings = RouterSettings::from_env()?;
    let table = match &settings.table_path {
        Some(path) => RouteTable::load(path)?,
        None => RouteTable::from_yaml_str(DEFAULT_TABLE)?,
    };

    let template = table.option_template()?;
    let call = Call::from_env(template.as_ref())?;

    let mut router = Router::with_settings(settings);
    router.load_table(&table, &builtin_handlers())?;
    tracing::debug!(routes = router.len(), "Route table ready");

    match router.run(&call) {
        Ok(outcome) => outcome,
        Err(RoutingError::NoMatch { .. }) => {
            eprintln!("{}: no route matches this invocation", call.name());
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e.into()),
    }
}
