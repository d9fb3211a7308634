//! Build-time declaration surface.
//!
//! Options are declared with typed setter closures, collected by
//! [`ParserBuilder`], and validated for internal consistency when
//! [`build`](ParserBuilder::build) runs. A configuration fault fails the
//! build immediately; the parser is never constructed.

use crate::convert::ParseValue;
use crate::error::{BuilderError, ErrorCode};
use crate::option::{
    Arity, Convert, CountSetter, CounterBinding, FreeBinding, ListPredicate, MultiBinding,
    NoBinding, OptionKind, OptionSpec, Predicate, ScalarBinding, Setter, SwitchBinding,
};
use crate::parser::Parser;
use crate::rules::{
    is_identifier, is_well_formed_name, prefixed_forms, suggest_aliases, suggest_command_tokens,
    validate_alias, Settings,
};
use crate::tokenizer::{MatchTable, OptionMeta};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

pub(crate) const HELP_FIELD: &str = "help";
const HELP_ALIASES: [&str; 2] = ["h", "help"];

macro_rules! decl_common {
    () => {
        /// Add one bare (unprefixed) alias name.
        pub fn alias(mut self, alias: impl Into<String>) -> Self {
            self.aliases.push(alias.into());
            self
        }

        pub fn aliases<I, S>(mut self, aliases: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.aliases.extend(aliases.into_iter().map(Into::into));
            self
        }

        pub fn description(mut self, text: impl Into<String>) -> Self {
            self.description = Some(text.into());
            self
        }

        pub fn usage(mut self, text: impl Into<String>) -> Self {
            self.usage = Some(text.into());
            self
        }

        /// The option must appear alone on the command line.
        pub fn exclusive(mut self) -> Self {
            self.exclusive = true;
            self
        }

        /// Occurrence arity: how many times the alias may appear.
        pub fn occurrences(mut self, arity: Arity) -> Self {
            self.occurrence_arity = Some(arity);
            self
        }

        /// Shorthand for a minimum occurrence count of one.
        pub fn required(mut self) -> Self {
            self.required = true;
            self
        }
    };
}

/// Declaration of a presence flag bound to a boolean field.
pub struct Switch<T> {
    field: String,
    set: Setter<T, bool>,
    default: Option<bool>,
    aliases: Vec<String>,
    description: Option<String>,
    usage: Option<String>,
    exclusive: bool,
    occurrence_arity: Option<Arity>,
    required: bool,
}

impl<T: 'static> Switch<T> {
    pub fn new(field: impl Into<String>, set: impl Fn(&mut T, bool) + Send + Sync + 'static) -> Self {
        Self {
            field: field.into(),
            set: Box::new(set),
            default: None,
            aliases: Vec::new(),
            description: None,
            usage: None,
            exclusive: false,
            occurrence_arity: None,
            required: false,
        }
    }

    decl_common!();

    /// Value bound when the switch never occurs.
    pub fn default_value(mut self, default: bool) -> Self {
        self.default = Some(default);
        self
    }

    fn into_spec(self) -> OptionSpec<T> {
        let occurrence_arity = self.occurrence_arity.unwrap_or(if self.required {
            Arity::exactly_one()
        } else {
            Arity::zero_or_one()
        });
        OptionSpec {
            field: self.field,
            kind: OptionKind::Switch,
            aliases: self.aliases,
            command_tokens: Vec::new(),
            occurrence_arity,
            value_arity: Arity::zero(),
            allow_sequential_values: false,
            split_values: false,
            exclusive: self.exclusive,
            description: self.description,
            usage: self.usage,
            count_field: None,
            handler: Box::new(SwitchBinding {
                set: self.set,
                default: self.default,
            }),
        }
    }
}

/// Declaration of an occurrence counter bound to a numeric field.
pub struct Counter<T> {
    field: String,
    set: CountSetter<T>,
    aliases: Vec<String>,
    description: Option<String>,
    usage: Option<String>,
    exclusive: bool,
    occurrence_arity: Option<Arity>,
    required: bool,
}

impl<T: 'static> Counter<T> {
    pub fn new(
        field: impl Into<String>,
        set: impl Fn(&mut T, usize) + Send + Sync + 'static,
    ) -> Self {
        Self {
            field: field.into(),
            set: Box::new(set),
            aliases: Vec::new(),
            description: None,
            usage: None,
            exclusive: false,
            occurrence_arity: None,
            required: false,
        }
    }

    decl_common!();

    fn into_spec(self) -> OptionSpec<T> {
        let occurrence_arity = self.occurrence_arity.unwrap_or(if self.required {
            Arity::one_or_more()
        } else {
            Arity::zero_or_more()
        });
        OptionSpec {
            field: self.field,
            kind: OptionKind::Counter,
            aliases: self.aliases,
            command_tokens: Vec::new(),
            occurrence_arity,
            value_arity: Arity::zero(),
            allow_sequential_values: false,
            split_values: false,
            exclusive: self.exclusive,
            description: self.description,
            usage: self.usage,
            count_field: None,
            handler: Box::new(CounterBinding { set: self.set }),
        }
    }
}

/// Declaration of a single-value option bound to a typed field.
pub struct Scalar<T, V> {
    field: String,
    set: Setter<T, V>,
    convert: Option<Convert<V>>,
    type_label: &'static str,
    default: Option<V>,
    allowed: Vec<V>,
    allowed_display: Vec<String>,
    allowed_given: bool,
    predicates: Vec<Predicate<V>>,
    count: Option<(String, CountSetter<T>)>,
    aliases: Vec<String>,
    description: Option<String>,
    usage: Option<String>,
    exclusive: bool,
    occurrence_arity: Option<Arity>,
    value_arity: Option<Arity>,
    allow_sequential_values: bool,
    split_values: bool,
    required: bool,
}

impl<T, V> Scalar<T, V>
where
    T: 'static,
    V: PartialEq + Clone + Send + Sync + 'static,
{
    /// Declare with the destination type's default converter.
    pub fn new(field: impl Into<String>, set: impl Fn(&mut T, V) + Send + Sync + 'static) -> Self
    where
        V: ParseValue,
    {
        let mut decl = Self::custom(field, set);
        decl.convert = Some(Box::new(V::parse_value));
        decl.type_label = V::type_label();
        decl
    }

    /// Declare for a type without a default converter; a
    /// [`converter`](Self::converter) callback must be supplied before the
    /// build, else the build fails with `MissingCallback`.
    pub fn custom(field: impl Into<String>, set: impl Fn(&mut T, V) + Send + Sync + 'static) -> Self {
        Self {
            field: field.into(),
            set: Box::new(set),
            convert: None,
            type_label: "value",
            default: None,
            allowed: Vec::new(),
            allowed_display: Vec::new(),
            allowed_given: false,
            predicates: Vec::new(),
            count: None,
            aliases: Vec::new(),
            description: None,
            usage: None,
            exclusive: false,
            occurrence_arity: None,
            value_arity: None,
            allow_sequential_values: false,
            split_values: false,
            required: false,
        }
    }

    decl_common!();

    /// Override the string-to-value conversion callback.
    pub fn converter(
        mut self,
        convert: impl Fn(&str) -> Result<V, String> + Send + Sync + 'static,
    ) -> Self {
        self.convert = Some(Box::new(convert));
        self
    }

    /// Value bound when the option never occurs.
    pub fn default_value(mut self, default: V) -> Self {
        self.default = Some(default);
        self
    }

    /// Closed-world set of acceptable values.
    pub fn allowed<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Debug,
    {
        for value in values {
            self.allowed_display.push(format!("{value:?}"));
            self.allowed.push(value);
        }
        self.allowed_given = true;
        self
    }

    pub fn predicate(mut self, check: impl Fn(&V) -> bool + Send + Sync + 'static) -> Self {
        self.predicates.push(Box::new(check));
        self
    }

    /// Also bind the occurrence count to a second field.
    pub fn count(
        mut self,
        field: impl Into<String>,
        set: impl Fn(&mut T, usize) + Send + Sync + 'static,
    ) -> Self {
        self.count = Some((field.into(), Box::new(set)));
        self
    }

    /// Value arity: how many value tokens may attach across occurrences.
    pub fn values(mut self, arity: Arity) -> Self {
        self.value_arity = Some(arity);
        self
    }

    /// Keep absorbing following unprefixed tokens as values.
    pub fn allow_sequential_values(mut self) -> Self {
        self.allow_sequential_values = true;
        self
    }

    /// Explode value tokens on the configured value delimiters.
    pub fn split_values(mut self) -> Self {
        self.split_values = true;
        self
    }

    fn into_spec(self) -> OptionSpec<T> {
        let occurrence_arity = self.occurrence_arity.unwrap_or(if self.required {
            Arity::exactly_one()
        } else {
            Arity::zero_or_one()
        });
        let (count_field, count_set) = match self.count {
            Some((field, set)) => (Some(field), Some(set)),
            None => (None, None),
        };
        OptionSpec {
            field: self.field,
            kind: OptionKind::Scalar,
            aliases: self.aliases,
            command_tokens: Vec::new(),
            occurrence_arity,
            value_arity: self.value_arity.unwrap_or(Arity::exactly_one()),
            allow_sequential_values: self.allow_sequential_values,
            split_values: self.split_values,
            exclusive: self.exclusive,
            description: self.description,
            usage: self.usage,
            count_field,
            handler: Box::new(ScalarBinding {
                type_label: self.type_label,
                convert: self.convert,
                default: self.default,
                allowed: self.allowed,
                allowed_display: self.allowed_display,
                allowed_given: self.allowed_given,
                predicates: self.predicates,
                set: self.set,
                count_set,
            }),
        }
    }
}

/// Declaration of a multi-value option bound to a collection field.
pub struct Multi<T, V> {
    field: String,
    set_all: Setter<T, Vec<V>>,
    convert: Option<Convert<V>>,
    type_label: &'static str,
    default: Option<V>,
    allowed: Vec<V>,
    allowed_display: Vec<String>,
    allowed_given: bool,
    predicates: Vec<Predicate<V>>,
    list_predicates: Vec<ListPredicate<V>>,
    count: Option<(String, CountSetter<T>)>,
    aliases: Vec<String>,
    description: Option<String>,
    usage: Option<String>,
    exclusive: bool,
    occurrence_arity: Option<Arity>,
    value_arity: Option<Arity>,
    allow_sequential_values: bool,
    split_values: bool,
    required: bool,
}

impl<T, V> Multi<T, V>
where
    T: 'static,
    V: PartialEq + Clone + Send + Sync + 'static,
{
    pub fn new(
        field: impl Into<String>,
        set_all: impl Fn(&mut T, Vec<V>) + Send + Sync + 'static,
    ) -> Self
    where
        V: ParseValue,
    {
        let mut decl = Self::custom(field, set_all);
        decl.convert = Some(Box::new(V::parse_value));
        decl.type_label = V::type_label();
        decl
    }

    pub fn custom(
        field: impl Into<String>,
        set_all: impl Fn(&mut T, Vec<V>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            field: field.into(),
            set_all: Box::new(set_all),
            convert: None,
            type_label: "value",
            default: None,
            allowed: Vec::new(),
            allowed_display: Vec::new(),
            allowed_given: false,
            predicates: Vec::new(),
            list_predicates: Vec::new(),
            count: None,
            aliases: Vec::new(),
            description: None,
            usage: None,
            exclusive: false,
            occurrence_arity: None,
            value_arity: None,
            allow_sequential_values: true,
            split_values: false,
            required: false,
        }
    }

    decl_common!();

    pub fn converter(
        mut self,
        convert: impl Fn(&str) -> Result<V, String> + Send + Sync + 'static,
    ) -> Self {
        self.convert = Some(Box::new(convert));
        self
    }

    pub fn allowed<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Debug,
    {
        for value in values {
            self.allowed_display.push(format!("{value:?}"));
            self.allowed.push(value);
        }
        self.allowed_given = true;
        self
    }

    pub fn predicate(mut self, check: impl Fn(&V) -> bool + Send + Sync + 'static) -> Self {
        self.predicates.push(Box::new(check));
        self
    }

    /// Predicate over the whole ordered value list.
    pub fn list_predicate(mut self, check: impl Fn(&[V]) -> bool + Send + Sync + 'static) -> Self {
        self.list_predicates.push(Box::new(check));
        self
    }

    pub fn count(
        mut self,
        field: impl Into<String>,
        set: impl Fn(&mut T, usize) + Send + Sync + 'static,
    ) -> Self {
        self.count = Some((field.into(), Box::new(set)));
        self
    }

    pub fn values(mut self, arity: Arity) -> Self {
        self.value_arity = Some(arity);
        self
    }

    /// Stop absorbing after the first following token per occurrence.
    pub fn single_value_per_token(mut self) -> Self {
        self.allow_sequential_values = false;
        self
    }

    pub fn split_values(mut self) -> Self {
        self.split_values = true;
        self
    }

    fn into_spec(self) -> OptionSpec<T> {
        let occurrence_arity = self.occurrence_arity.unwrap_or(if self.required {
            Arity::one_or_more()
        } else {
            Arity::zero_or_more()
        });
        let (count_field, count_set) = match self.count {
            Some((field, set)) => (Some(field), Some(set)),
            None => (None, None),
        };
        OptionSpec {
            field: self.field,
            kind: OptionKind::MultiValue,
            aliases: self.aliases,
            command_tokens: Vec::new(),
            occurrence_arity,
            value_arity: self.value_arity.unwrap_or(Arity::one_or_more()),
            allow_sequential_values: self.allow_sequential_values,
            split_values: self.split_values,
            exclusive: self.exclusive,
            description: self.description,
            usage: self.usage,
            count_field,
            handler: Box::new(MultiBinding {
                inner: ScalarBinding {
                    type_label: self.type_label,
                    convert: self.convert,
                    default: self.default,
                    allowed: self.allowed,
                    allowed_display: self.allowed_display,
                    allowed_given: self.allowed_given,
                    predicates: self.predicates,
                    // The scalar setter is never used by a multi binding.
                    set: Box::new(|_: &mut T, _: V| {}),
                    count_set,
                },
                list_predicates: self.list_predicates,
                set_all: self.set_all,
            }),
        }
    }
}

/// Declaration of a command option identified by bare verb tokens.
pub struct Command<T> {
    field: String,
    set: Setter<T, bool>,
    tokens: Vec<String>,
    description: Option<String>,
    usage: Option<String>,
    exclusive: bool,
    occurrence_arity: Option<Arity>,
    required: bool,
}

impl<T: 'static> Command<T> {
    pub fn new(field: impl Into<String>, set: impl Fn(&mut T, bool) + Send + Sync + 'static) -> Self {
        Self {
            field: field.into(),
            set: Box::new(set),
            tokens: Vec::new(),
            description: None,
            usage: None,
            exclusive: false,
            occurrence_arity: None,
            required: false,
        }
    }

    /// Add a command token (a bare verb such as `add`). When none is
    /// declared, tokens are derived from the field name at build time.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(token.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn usage(mut self, text: impl Into<String>) -> Self {
        self.usage = Some(text.into());
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn occurrences(mut self, arity: Arity) -> Self {
        self.occurrence_arity = Some(arity);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn into_spec(self) -> OptionSpec<T> {
        let occurrence_arity = self.occurrence_arity.unwrap_or(if self.required {
            Arity::exactly_one()
        } else {
            Arity::zero_or_one()
        });
        OptionSpec {
            field: self.field,
            kind: OptionKind::Command,
            aliases: Vec::new(),
            command_tokens: self.tokens,
            occurrence_arity,
            value_arity: Arity::zero(),
            allow_sequential_values: false,
            split_values: false,
            exclusive: self.exclusive,
            description: self.description,
            usage: self.usage,
            count_field: None,
            handler: Box::new(SwitchBinding {
                set: self.set,
                default: None,
            }),
        }
    }
}

/// Declaration of the positional catch-all bound to a string collection.
pub struct FreeValues<T> {
    field: String,
    set_all: Setter<T, Vec<String>>,
    description: Option<String>,
    usage: Option<String>,
    value_arity: Option<Arity>,
}

impl<T: 'static> FreeValues<T> {
    pub fn new(
        field: impl Into<String>,
        set_all: impl Fn(&mut T, Vec<String>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            field: field.into(),
            set_all: Box::new(set_all),
            description: None,
            usage: None,
            value_arity: None,
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn usage(mut self, text: impl Into<String>) -> Self {
        self.usage = Some(text.into());
        self
    }

    pub fn values(mut self, arity: Arity) -> Self {
        self.value_arity = Some(arity);
        self
    }

    fn into_spec(self) -> OptionSpec<T> {
        OptionSpec {
            field: self.field,
            kind: OptionKind::FreeValue,
            aliases: Vec::new(),
            command_tokens: Vec::new(),
            occurrence_arity: Arity::zero_or_more(),
            value_arity: self.value_arity.unwrap_or(Arity::zero_or_more()),
            allow_sequential_values: false,
            split_values: false,
            exclusive: false,
            description: self.description,
            usage: self.usage,
            count_field: None,
            handler: Box::new(FreeBinding { set_all: self.set_all }),
        }
    }
}

/// Collects option declarations and validates them into a [`Parser`].
pub struct ParserBuilder<T> {
    settings: Settings,
    specs: Vec<OptionSpec<T>>,
}

impl<T: 'static> Default for ParserBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ParserBuilder<T> {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            specs: Vec::new(),
        }
    }

    pub fn switch(mut self, decl: Switch<T>) -> Self {
        self.specs.push(decl.into_spec());
        self
    }

    pub fn counter(mut self, decl: Counter<T>) -> Self {
        self.specs.push(decl.into_spec());
        self
    }

    pub fn scalar<V>(mut self, decl: Scalar<T, V>) -> Self
    where
        V: PartialEq + Clone + Send + Sync + 'static,
    {
        self.specs.push(decl.into_spec());
        self
    }

    pub fn multi<V>(mut self, decl: Multi<T, V>) -> Self
    where
        V: PartialEq + Clone + Send + Sync + 'static,
    {
        self.specs.push(decl.into_spec());
        self
    }

    pub fn command(mut self, decl: Command<T>) -> Self {
        self.specs.push(decl.into_spec());
        self
    }

    pub fn free_values(mut self, decl: FreeValues<T>) -> Self {
        self.specs.push(decl.into_spec());
        self
    }

    /// Validate every declaration and freeze the option model.
    pub fn build(self) -> Result<Parser<T>, BuilderError> {
        let Self { settings, mut specs } = self;
        settings.validate()?;

        // The help destination is reserved for the auto-registered option.
        for spec in &specs {
            let clash = spec.field.eq_ignore_ascii_case(HELP_FIELD)
                || spec
                    .count_field
                    .as_deref()
                    .is_some_and(|f| f.eq_ignore_ascii_case(HELP_FIELD));
            if clash {
                return Err(BuilderError::for_field(
                    ErrorCode::ReservedProperty,
                    &spec.field,
                    format!("'{HELP_FIELD}' is reserved for the auto-registered help option"),
                ));
            }
        }

        let help_index = specs.len();
        specs.push(help_spec(&settings));

        check_fields(&specs)?;

        let reserved: HashSet<String> = specs[help_index]
            .aliases
            .iter()
            .flat_map(|a| prefixed_forms(a, settings.prefix_rules))
            .map(|form| settings.normalize(&form))
            .collect();

        // Alias processing runs in registration order with the reserved help
        // aliases claimed up front, so suggestions can never collide with
        // them and explicit collisions report ReservedAlias. Uniqueness is
        // over the normalized prefixed forms, the strings actually matched
        // on the command line: bare names like "a" and "-a" are distinct yet
        // can produce the same "--a".
        let mut alias_owner: IndexMap<String, usize> = IndexMap::new();
        let order: Vec<usize> = std::iter::once(help_index)
            .chain((0..specs.len()).filter(|&i| i != help_index))
            .collect();
        for &idx in &order {
            let spec = &mut specs[idx];
            match spec.kind {
                OptionKind::Command | OptionKind::FreeValue => continue,
                _ => {}
            }
            if spec.aliases.is_empty() {
                let taken: HashSet<String> = alias_owner.keys().cloned().collect();
                spec.aliases = suggest_aliases(&spec.field, &taken, &settings)?;
            }
            let mut within: HashSet<String> = HashSet::new();
            for alias in &spec.aliases {
                validate_alias(&spec.field, alias, &settings)?;
                for form in prefixed_forms(alias, settings.prefix_rules) {
                    let norm = settings.normalize(&form);
                    if !within.insert(norm.clone()) {
                        return Err(BuilderError::for_field(
                            ErrorCode::NameAlreadyInUse,
                            &spec.field,
                            format!("alias form '{form}' declared twice on the same option"),
                        ));
                    }
                    if idx != help_index && reserved.contains(&norm) {
                        return Err(BuilderError::for_field(
                            ErrorCode::ReservedAlias,
                            &spec.field,
                            format!("alias '{alias}' is reserved for the help option"),
                        ));
                    }
                    if let Some(&owner) = alias_owner.get(&norm) {
                        if owner != idx {
                            return Err(BuilderError::for_field(
                                ErrorCode::AliasAlreadyInUse,
                                &spec.field,
                                format!("alias form '{form}' already belongs to another option"),
                            ));
                        }
                    }
                    alias_owner.insert(norm, idx);
                }
            }
        }

        // Command tokens share one bare-verb namespace.
        let mut token_owner: IndexMap<String, usize> = IndexMap::new();
        for idx in 0..specs.len() {
            if specs[idx].kind != OptionKind::Command {
                continue;
            }
            if specs[idx].command_tokens.is_empty() {
                let taken: HashSet<String> = token_owner.keys().cloned().collect();
                specs[idx].command_tokens =
                    suggest_command_tokens(&specs[idx].field, &taken, &settings)?;
            }
            let spec = &specs[idx];
            let mut within: HashSet<String> = HashSet::new();
            for token in &spec.command_tokens {
                if !is_well_formed_name(token) {
                    return Err(BuilderError::for_field(
                        ErrorCode::InvalidName,
                        &spec.field,
                        format!("command token '{token}' is not a well-formed name"),
                    ));
                }
                let norm = settings.normalize(token);
                if !within.insert(norm.clone()) {
                    return Err(BuilderError::for_field(
                        ErrorCode::NameAlreadyInUse,
                        &spec.field,
                        format!("command token '{token}' declared twice on the same option"),
                    ));
                }
                if token_owner.insert(norm, idx).is_some() {
                    return Err(BuilderError::for_field(
                        ErrorCode::AliasAlreadyInUse,
                        &spec.field,
                        format!("command token '{token}' already belongs to another option"),
                    ));
                }
            }
        }

        for spec in &specs {
            spec.handler.validate_config(&spec.field)?;
        }

        let table = build_table(&settings, &specs, help_index);
        debug!(options = specs.len(), "built parser");
        Ok(Parser::from_parts(settings, specs, table))
    }
}

fn help_spec<T>(settings: &Settings) -> OptionSpec<T> {
    let aliases: Vec<String> = HELP_ALIASES
        .iter()
        .filter(|alias| !prefixed_forms(alias, settings.prefix_rules).is_empty())
        .map(|alias| (*alias).to_string())
        .collect();
    OptionSpec {
        field: HELP_FIELD.to_string(),
        kind: OptionKind::Switch,
        aliases,
        command_tokens: Vec::new(),
        occurrence_arity: Arity::zero_or_more(),
        value_arity: Arity::zero(),
        allow_sequential_values: false,
        split_values: false,
        exclusive: true,
        description: Some("Show help information".to_string()),
        usage: None,
        count_field: None,
        handler: Box::new(NoBinding),
    }
}

// Field-name comparison is case-insensitive throughout, matching the
// reserved-help check.
fn check_fields<T>(specs: &[OptionSpec<T>]) -> Result<(), BuilderError> {
    let mut seen: HashSet<String> = HashSet::new();
    for spec in specs {
        check_field_name(&spec.field, &spec.field)?;
        if let Some(count_field) = &spec.count_field {
            check_field_name(&spec.field, count_field)?;
            if count_field.eq_ignore_ascii_case(&spec.field) {
                return Err(BuilderError::for_field(
                    ErrorCode::SamePropertyUsage,
                    &spec.field,
                    "value and count bindings target the same field",
                ));
            }
        }
        for name in std::iter::once(spec.field.as_str())
            .chain(spec.count_field.as_deref())
        {
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(BuilderError::for_field(
                    ErrorCode::PropertyAlreadyInUse,
                    name,
                    format!("field '{name}' is already bound by another option"),
                ));
            }
        }
    }
    Ok(())
}

fn check_field_name(field: &str, name: &str) -> Result<(), BuilderError> {
    if name.trim().is_empty() {
        return Err(BuilderError::for_field(
            ErrorCode::EmptyValue,
            field,
            "destination field name must not be empty",
        ));
    }
    if !is_identifier(name) {
        return Err(BuilderError::for_field(
            ErrorCode::InvalidPropertyExpression,
            field,
            format!("'{name}' is not a valid destination field identifier"),
        ));
    }
    Ok(())
}

fn build_table<T>(settings: &Settings, specs: &[OptionSpec<T>], help_index: usize) -> MatchTable {
    let metas: Vec<OptionMeta> = specs
        .iter()
        .map(|spec| OptionMeta {
            field: spec.field.clone(),
            kind: spec.kind,
            occurrence_arity: spec.occurrence_arity,
            value_arity: spec.value_arity,
            allow_sequential_values: spec.allow_sequential_values,
            split_values: spec.split_values,
            exclusive: spec.exclusive,
        })
        .collect();

    let mut alias_map: IndexMap<String, usize> = IndexMap::new();
    for (idx, spec) in specs.iter().enumerate() {
        for alias in &spec.aliases {
            for form in prefixed_forms(alias, settings.prefix_rules) {
                alias_map.insert(settings.normalize(&form), idx);
            }
        }
    }

    let mut command_map: IndexMap<String, usize> = IndexMap::new();
    for (idx, spec) in specs.iter().enumerate() {
        for token in &spec.command_tokens {
            command_map.insert(settings.normalize(token), idx);
        }
    }

    let free_options: Vec<usize> = specs
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.kind == OptionKind::FreeValue)
        .map(|(idx, _)| idx)
        .collect();

    MatchTable {
        settings: settings.clone(),
        metas,
        alias_map,
        command_map,
        free_options,
        help_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::PrefixRules;

    #[derive(Debug, Default, PartialEq)]
    struct Cfg {
        verbose: bool,
        level: i32,
        uses: usize,
        name: String,
    }

    #[test]
    fn alias_collision_fails_the_build() {
        let err = ParserBuilder::<Cfg>::new()
            .switch(Switch::new("verbose", |c: &mut Cfg, v| c.verbose = v).alias("v"))
            .scalar(Scalar::new("level", |c: &mut Cfg, v| c.level = v).alias("v"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AliasAlreadyInUse);
    }

    #[test]
    fn case_insensitive_aliases_collide() {
        let settings = Settings {
            case_sensitive: false,
            ..Settings::default()
        };
        let err = ParserBuilder::<Cfg>::with_settings(settings)
            .switch(Switch::new("verbose", |c: &mut Cfg, v| c.verbose = v).alias("quiet"))
            .scalar(Scalar::new("level", |c: &mut Cfg, v| c.level = v).alias("QUIET"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AliasAlreadyInUse);
    }

    #[test]
    fn colliding_prefixed_forms_fail_the_build() {
        // "a" and "-a" are distinct bare names, but under rules allowing
        // both dash prefixes for any length they both produce "--a".
        let settings = Settings {
            prefix_rules: PrefixRules::SINGLE_DASH | PrefixRules::DOUBLE_DASH,
            ..Settings::default()
        };
        let err = ParserBuilder::<Cfg>::with_settings(settings)
            .switch(Switch::new("verbose", |c: &mut Cfg, v| c.verbose = v).alias("a"))
            .switch(Switch::new("name", |c: &mut Cfg, v| c.verbose = v).alias("-a"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AliasAlreadyInUse);
    }

    #[test]
    fn help_destination_is_reserved() {
        let err = ParserBuilder::<Cfg>::new()
            .switch(Switch::new("help", |c: &mut Cfg, v| c.verbose = v))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservedProperty);
    }

    #[test]
    fn help_aliases_are_reserved() {
        let err = ParserBuilder::<Cfg>::new()
            .switch(Switch::new("verbose", |c: &mut Cfg, v| c.verbose = v).alias("help"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservedAlias);
    }

    #[test]
    fn duplicate_destination_field_fails() {
        let err = ParserBuilder::<Cfg>::new()
            .switch(Switch::new("verbose", |c: &mut Cfg, v| c.verbose = v))
            .counter(Counter::new("verbose", |c: &mut Cfg, n| c.uses = n))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertyAlreadyInUse);
    }

    #[test]
    fn destination_fields_collide_case_insensitively() {
        let err = ParserBuilder::<Cfg>::new()
            .switch(Switch::new("Name", |c: &mut Cfg, v| c.verbose = v))
            .counter(Counter::new("name", |c: &mut Cfg, n| c.uses = n))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertyAlreadyInUse);
    }

    #[test]
    fn value_and_count_must_use_distinct_fields() {
        let err = ParserBuilder::<Cfg>::new()
            .scalar(
                Scalar::new("level", |c: &mut Cfg, v| c.level = v)
                    .count("level", |c: &mut Cfg, n| c.uses = n),
            )
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SamePropertyUsage);
    }

    #[test]
    fn duplicate_alias_within_one_option_fails() {
        let err = ParserBuilder::<Cfg>::new()
            .switch(Switch::new("verbose", |c: &mut Cfg, v| c.verbose = v).alias("v").alias("v"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NameAlreadyInUse);
    }

    #[test]
    fn custom_scalar_without_callback_fails() {
        #[derive(Clone, PartialEq)]
        struct Opaque;
        let err = ParserBuilder::<Cfg>::new()
            .scalar(Scalar::custom("name", |_c: &mut Cfg, _v: Opaque| {}))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingCallback);
    }

    #[test]
    fn default_outside_allowed_set_fails() {
        let err = ParserBuilder::<Cfg>::new()
            .scalar(
                Scalar::new("name", |c: &mut Cfg, v| c.name = v)
                    .allowed(["add".to_string(), "sub".to_string()])
                    .default_value("mul".to_string()),
            )
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAllowedValue);
    }

    #[test]
    fn empty_allowed_set_fails() {
        let err = ParserBuilder::<Cfg>::new()
            .scalar(Scalar::new("name", |c: &mut Cfg, v| c.name = v).allowed(Vec::<String>::new()))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NullValue);
    }

    #[test]
    fn malformed_field_name_fails() {
        let err = ParserBuilder::<Cfg>::new()
            .switch(Switch::new("2fast", |c: &mut Cfg, v| c.verbose = v))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPropertyExpression);
    }

    #[test]
    fn aliases_are_derived_when_absent() {
        let parser = ParserBuilder::<Cfg>::new()
            .switch(Switch::new("verbose", |c: &mut Cfg, v| c.verbose = v))
            .build()
            .unwrap();
        let info = parser
            .options()
            .find(|info| info.field == "verbose")
            .unwrap();
        assert_eq!(info.aliases, vec!["v".to_string(), "verbose".to_string()]);
    }

    #[test]
    fn command_tokens_are_derived_when_absent() {
        let parser = ParserBuilder::<Cfg>::new()
            .command(Command::new("verbose", |c: &mut Cfg, v| c.verbose = v))
            .build()
            .unwrap();
        let info = parser
            .options()
            .find(|info| info.field == "verbose")
            .unwrap();
        assert_eq!(
            info.command_tokens,
            vec!["v".to_string(), "verbose".to_string()]
        );
    }
}
