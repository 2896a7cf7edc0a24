//! Snapshot of one process invocation
//!
//! A [`Call`] holds the invoked command name, its options, access to the
//! environment and lazily read standard input. It is built once and is
//! read-only afterwards.
//!
//! Two construction variants exist:
//!
//! - [`Call::raw`] keeps every argument after the command name as a
//!   positional option keyed `0..n`
//! - [`Call::parsed`] parses the arguments against an [`OptionTemplate`]
//!
//! # Example
//!
//! ```rust
//! use cli_router::call::{Call, OptionTemplate, OptionValue};
//!
//! let template = OptionTemplate::new("a:s", &["action:"]).unwrap();
//! let call = Call::parsed(["/test", "-adelete", "-s"], &template).unwrap();
//!
//! assert_eq!(call.name(), "/test");
//! assert_eq!(call.opt("a"), Some(&OptionValue::from("delete")));
//! assert_eq!(call.opt("s"), Some(&OptionValue::Flag));
//! assert_eq!(call.opt("action"), None);
//! ```

mod input;
mod template;
mod value;

pub use input::LazyInput;
pub use template::{OptionForm, OptionSpec, OptionTemplate, ValueArity};
pub use value::{OptionKey, OptionValue, Options, FLAG_MATCH_STR};

use std::collections::HashMap;
use std::io::Read;

use crate::Result;

/// Environment lookup used by [`Call::env`]
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// One command-line invocation
pub struct Call {
    command: String,
    options: Options,
    env: EnvLookup,
    input: LazyInput,
}

impl Call {
    /// Build from raw arguments without parsing; the first argument is the command.
    pub fn raw<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CallBuilder::raw(args).build()
    }

    /// Build by parsing arguments against a template; the first argument is the command.
    pub fn parsed<I, S>(args: I, template: &OptionTemplate) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(CallBuilder::parsed(args, template)?.build())
    }

    /// Build from the running process: its arguments, environment and stdin.
    ///
    /// Without a template the arguments are kept raw.
    pub fn from_env(template: Option<&OptionTemplate>) -> Result<Self> {
        let args = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
        let builder = match template {
            Some(template) => CallBuilder::parsed(args, template)?,
            None => CallBuilder::raw(args),
        };
        Ok(builder.input(LazyInput::stdin()).build())
    }

    pub fn builder(command: impl Into<String>) -> CallBuilder {
        CallBuilder::new(command)
    }

    /// Invoked command name.
    pub fn name(&self) -> &str {
        &self.command
    }

    /// Value of an option by name or positional index, `None` when not given.
    pub fn opt(&self, key: impl Into<OptionKey>) -> Option<&OptionValue> {
        self.options.get(&key.into())
    }

    /// Positional option by index.
    pub fn arg(&self, index: usize) -> Option<&OptionValue> {
        self.opt(index)
    }

    /// All options in parse order.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Environment variable value, `None` when unset.
    pub fn env(&self, name: &str) -> Option<String> {
        (self.env)(name)
    }

    /// Whole standard input, read on first call and cached afterwards.
    pub fn input(&self) -> Result<&str> {
        Ok(self.input.get()?)
    }
}

impl std::fmt::Debug for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call")
            .field("command", &self.command)
            .field("options", &self.options)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Call`] with injectable environment and input
///
/// Defaults to the process environment and empty input.
pub struct CallBuilder {
    command: String,
    options: Options,
    env: EnvLookup,
    input: LazyInput,
}

impl CallBuilder {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            options: Options::new(),
            env: Box::new(process_env),
            input: LazyInput::from_string(""),
        }
    }

    pub fn raw<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let command = args.next().unwrap_or_default();
        Self::new(command).options(Options::positional(args))
    }

    pub fn parsed<I, S>(args: I, template: &OptionTemplate) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let (command, rest) = match args.split_first() {
            Some((command, rest)) => (command.clone(), rest),
            None => (String::new(), &[][..]),
        };
        let options = template.parse(rest)?;
        Ok(Self::new(command).options(options))
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Add a single option.
    pub fn option(mut self, key: impl Into<OptionKey>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key, value.into());
        self
    }

    /// Add a flag option given without a value.
    pub fn flag(mut self, key: impl Into<OptionKey>) -> Self {
        self.options.insert(key, OptionValue::Flag);
        self
    }

    /// Replace environment lookup with a custom function.
    pub fn env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    /// Replace environment lookup with a fixed set of variables.
    pub fn env_vars<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.env_lookup(move |name| vars.get(name).cloned())
    }

    pub fn input(mut self, input: LazyInput) -> Self {
        self.input = input;
        self
    }

    /// Read input from the given stream on first access.
    pub fn input_reader(self, reader: impl Read + Send + 'static) -> Self {
        self.input(LazyInput::new(reader))
    }

    pub fn build(self) -> Call {
        Call {
            command: self.command,
            options: self.options,
            env: self.env,
            input: self.input,
        }
    }
}
