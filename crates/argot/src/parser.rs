//! The built parser and its parse outcome.

use crate::error::ParseError;
use crate::option::{OptionInfo, OptionSpec};
use crate::rules::Settings;
use crate::tokenizer::{tokenize, MatchTable};
use crate::validate;
use serde::Serialize;
use tracing::debug;

/// An immutable, built option model plus matching tables.
///
/// Safe to reuse across repeated `parse` calls and to share between
/// threads: every call allocates its transient state locally.
pub struct Parser<T> {
    settings: Settings,
    specs: Vec<OptionSpec<T>>,
    table: MatchTable,
}

impl<T> std::fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Parser<T> {
    pub(crate) fn from_parts(
        settings: Settings,
        specs: Vec<OptionSpec<T>>,
        table: MatchTable,
    ) -> Self {
        Self {
            settings,
            specs,
            table,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read-only descriptions of every built option (the auto-registered
    /// help option included), in registration order. Presentation layers
    /// build usage and help text from these.
    pub fn options(&self) -> impl Iterator<Item = OptionInfo> + '_ {
        self.specs.iter().map(|spec| OptionInfo {
            field: spec.field.clone(),
            kind: spec.kind,
            aliases: spec.aliases.clone(),
            command_tokens: spec.command_tokens.clone(),
            occurrence_arity: spec.occurrence_arity,
            value_arity: spec.value_arity,
            description: spec.description.clone(),
            usage: spec.usage.clone(),
        })
    }
}

impl<T: Default + 'static> Parser<T> {
    /// Interpret one argument vector.
    ///
    /// Never fails: input faults accumulate into the outcome's error list.
    /// The typed result is entirely bound on success and entirely at its
    /// pre-parse defaults otherwise.
    pub fn parse<I, S>(&self, args: I) -> Parsed<T>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        debug!(tokens = args.len(), "parsing argument vector");

        let mut state = tokenize(&self.table, &args);
        let help_requested = validate::run(&self.table, &self.specs, &mut state);

        if help_requested {
            // Help wins: discard everything else and report the request.
            debug!("help requested; discarding accumulated errors");
            return Parsed {
                value: T::default(),
                valid: true,
                errors: Vec::new(),
                help_requested: true,
            };
        }

        if !state.errors.is_empty() {
            debug!(errors = state.errors.len(), "parse failed");
            return Parsed {
                value: T::default(),
                valid: false,
                errors: state.errors,
                help_requested: false,
            };
        }

        // Zero errors: commit the whole result in one pass.
        let mut value = T::default();
        for (idx, spec) in self.specs.iter().enumerate() {
            let tokens = &state.per_option[idx];
            spec.handler.bind(&mut value, &tokens.values, tokens.occurrences);
        }
        Parsed {
            value,
            valid: true,
            errors: Vec::new(),
            help_requested: false,
        }
    }
}

/// Outcome of one `parse` call.
#[derive(Debug)]
pub struct Parsed<T> {
    /// The typed result: fully bound when `valid`, defaults otherwise.
    pub value: T,
    pub valid: bool,
    /// Ordered input faults; empty when `valid`.
    pub errors: Vec<ParseError>,
    /// Whether the reserved help option was invoked.
    pub help_requested: bool,
}

impl<T> Parsed<T> {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Structured diagnostics for a presentation layer.
    pub fn report(&self) -> ParseReport {
        ParseReport {
            valid: self.valid,
            help_requested: self.help_requested,
            errors: self.errors.clone(),
        }
    }
}

/// Serializable view of a parse outcome, without the typed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub valid: bool,
    pub help_requested: bool,
    pub errors: Vec<ParseError>,
}
