//! getopt-style option templates
//!
//! A template declares which short and long options an invocation accepts and
//! whether each takes a value:
//!
//! - `a` - option `-a` without a value
//! - `a:` - option `-a` with a required value
//! - `a::` - option `-a` with an optional value
//!
//! Long options use the same suffixes: `["action:", "all::", "help"]`.
//!
//! A required value is either attached (`-adelete`, `--action=delete`) or
//! taken from the next argument, even one starting with `-`. An optional
//! value is only ever attached (`-afoo`, `--all=foo`). Options missing from
//! the template are skipped, letter by letter inside short clusters.
//!
//! Arguments are first rewritten into one canonical `--<id>` token per
//! declared option, then collected with clap's builder API. The resulting
//! options are ordered by where each appeared on the command line.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use super::value::{OptionValue, Options};
use crate::{Result, RoutingError};

/// Stand-in value for an optional-value option given bare. NUL cannot occur
/// in process arguments.
const MISSING_VALUE: &str = "\0";

/// Whether an option takes a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueArity {
    /// Flag only (`a`)
    None,
    /// Value may be attached (`a::`)
    Optional,
    /// Value must follow (`a:`)
    Required,
}

impl ValueArity {
    fn from_colons(colons: usize, option: &str) -> Result<Self> {
        match colons {
            0 => Ok(ValueArity::None),
            1 => Ok(ValueArity::Required),
            2 => Ok(ValueArity::Optional),
            _ => Err(RoutingError::InvalidTemplate(format!(
                "option '{}' has more than two ':' suffixes",
                option
            ))),
        }
    }
}

/// Short (`-a`) or long (`--action`) form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionForm {
    Short,
    Long,
}

/// One declared option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: String,
    pub form: OptionForm,
    pub arity: ValueArity,
}

impl OptionSpec {
    /// Clap id, also used as the long name of the canonical token.
    fn id(&self) -> String {
        match self.form {
            OptionForm::Short => format!("short:{}", self.name),
            OptionForm::Long => format!("long:{}", self.name),
        }
    }

    fn to_arg(&self) -> Arg {
        let id = self.id();
        let arg = Arg::new(id.clone()).long(id);
        match self.arity {
            ValueArity::None => arg.action(ArgAction::Count),
            ValueArity::Required => arg
                .action(ArgAction::Append)
                .num_args(1)
                .allow_hyphen_values(true),
            ValueArity::Optional => arg
                .action(ArgAction::Append)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value(MISSING_VALUE),
        }
    }

    /// Append the canonical tokens for one occurrence.
    ///
    /// Required values always go in a separate token so empty and
    /// hyphen-led values survive; optional values are always attached.
    fn emit(&self, value: Option<&str>, argv: &mut Vec<String>) {
        let flag = format!("--{}", self.id());
        match (self.arity, value) {
            (ValueArity::Required, Some(value)) => {
                argv.push(flag);
                argv.push(value.to_string());
            }
            (ValueArity::Optional, Some(value)) => argv.push(format!("{}={}", flag, value)),
            (_, _) => argv.push(flag),
        }
    }
}

/// Declared set of legal options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionTemplate {
    specs: Vec<OptionSpec>,
}

impl OptionTemplate {
    /// Parse a template from a short option string and a list of long options.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cli_router::call::OptionTemplate;
    ///
    /// let template = OptionTemplate::new("a:s", &["action:", "id::"]).unwrap();
    /// assert_eq!(template.specs().len(), 4);
    /// ```
    pub fn new<S: AsRef<str>>(short: &str, long: &[S]) -> Result<Self> {
        let mut template = Self::default();
        for spec in parse_short(short)? {
            template.push(spec)?;
        }
        for option in long {
            template.push(parse_long(option.as_ref())?)?;
        }
        Ok(template)
    }

    /// Template with short options only.
    pub fn short(short: &str) -> Result<Self> {
        Self::new::<&str>(short, &[])
    }

    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }

    fn push(&mut self, spec: OptionSpec) -> Result<()> {
        if self.find(spec.form, &spec.name).is_some() {
            return Err(RoutingError::InvalidTemplate(format!(
                "option '{}' declared twice",
                spec.name
            )));
        }
        self.specs.push(spec);
        Ok(())
    }

    fn find(&self, form: OptionForm, name: &str) -> Option<&OptionSpec> {
        self.specs.iter().find(|s| s.form == form && s.name == name)
    }

    /// Parse invocation arguments (excluding the command name) into options.
    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> Result<Options> {
        let argv = self.canonicalize(args);
        let matches = self
            .command()
            .try_get_matches_from(argv)
            .map_err(|e| RoutingError::InvalidArguments(e.to_string()))?;

        let mut found: Vec<(usize, &OptionSpec, OptionValue)> = self
            .specs
            .iter()
            .filter_map(|spec| {
                let value = extract(&matches, spec)?;
                let position = matches.index_of(&spec.id()).unwrap_or(usize::MAX);
                Some((position, spec, value))
            })
            .collect();
        found.sort_by_key(|(position, _, _)| *position);

        let mut options = Options::new();
        for (_, spec, value) in found {
            options.insert(spec.name.as_str(), value);
        }
        Ok(options)
    }

    fn command(&self) -> Command {
        self.specs.iter().fold(
            Command::new("call")
                .disable_help_flag(true)
                .disable_version_flag(true)
                .disable_help_subcommand(true)
                .ignore_errors(true),
            |cmd, spec| cmd.arg(spec.to_arg()),
        )
    }

    /// Rewrite arguments into canonical tokens for declared options only.
    ///
    /// Operands and everything after `--` are dropped. The returned vector
    /// starts with a placeholder binary name.
    fn canonicalize<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        let mut argv = vec!["call".to_string()];
        let mut tokens = args.iter().map(AsRef::<str>::as_ref);

        while let Some(token) = tokens.next() {
            if token == "--" {
                break;
            }

            if let Some(long) = token.strip_prefix("--") {
                let (name, attached) = match long.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (long, None),
                };
                let Some(spec) = self.find(OptionForm::Long, name) else {
                    debug!(token = %token, "Ignoring undeclared option");
                    continue;
                };

                match spec.arity {
                    ValueArity::None if attached.is_some() => {
                        debug!(token = %token, "Ignoring value given to a flag");
                    }
                    ValueArity::Required => {
                        match attached.or_else(|| tokens.next()) {
                            Some(value) => spec.emit(Some(value), &mut argv),
                            None => debug!(token = %token, "Option requires a value"),
                        }
                    }
                    _ => spec.emit(attached, &mut argv),
                }
                continue;
            }

            let Some(cluster) = token.strip_prefix('-').filter(|c| !c.is_empty()) else {
                continue;
            };

            for (offset, c) in cluster.char_indices() {
                let mut buf = [0u8; 4];
                let Some(spec) = self.find(OptionForm::Short, c.encode_utf8(&mut buf)) else {
                    debug!(option = %c, "Ignoring undeclared option");
                    continue;
                };

                let rest = &cluster[offset + c.len_utf8()..];
                let attached = Some(rest).filter(|rest| !rest.is_empty());
                match spec.arity {
                    ValueArity::None => spec.emit(None, &mut argv),
                    ValueArity::Optional => {
                        spec.emit(attached, &mut argv);
                        break;
                    }
                    ValueArity::Required => {
                        match attached.or_else(|| tokens.next()) {
                            Some(value) => spec.emit(Some(value), &mut argv),
                            None => debug!(option = %c, "Option requires a value"),
                        }
                        break;
                    }
                }
            }
        }

        argv
    }
}

fn extract(matches: &ArgMatches, spec: &OptionSpec) -> Option<OptionValue> {
    let id = spec.id();
    if matches.value_source(&id) != Some(ValueSource::CommandLine) {
        return None;
    }

    let values = matches.try_get_many::<String>(&id).ok().flatten().and_then(|values| {
        values
            .map(|value| match value.as_str() {
                MISSING_VALUE => OptionValue::Flag,
                text => OptionValue::Text(text.to_string()),
            })
            .reduce(OptionValue::append)
    });

    match spec.arity {
        ValueArity::None => Some(OptionValue::Flag),
        ValueArity::Required => values,
        ValueArity::Optional => Some(values.unwrap_or(OptionValue::Flag)),
    }
}

fn parse_short(short: &str) -> Result<Vec<OptionSpec>> {
    let mut specs = Vec::new();
    let mut chars = short.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' || c == '-' || !c.is_ascii_graphic() {
            return Err(RoutingError::InvalidTemplate(format!(
                "unexpected '{}' in short options \"{}\"",
                c, short
            )));
        }

        let mut colons = 0;
        while chars.next_if_eq(&':').is_some() {
            colons += 1;
        }

        specs.push(OptionSpec {
            name: c.to_string(),
            form: OptionForm::Short,
            arity: ValueArity::from_colons(colons, &c.to_string())?,
        });
    }

    Ok(specs)
}

fn parse_long(option: &str) -> Result<OptionSpec> {
    let name = option.trim_end_matches(':');
    let colons = option.len() - name.len();

    if name.is_empty() || name.starts_with('-') || name.contains(['=', ':', ' ']) {
        return Err(RoutingError::InvalidTemplate(format!(
            "invalid long option \"{}\"",
            option
        )));
    }

    Ok(OptionSpec {
        name: name.to_string(),
        form: OptionForm::Long,
        arity: ValueArity::from_colons(colons, name)?,
    })
}
