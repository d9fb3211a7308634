//! Prefix and delimiter rule tables.
//!
//! Pure data: which prefix forms (`-x`, `--long`, `/x`) and which
//! name/value delimiters are legal for a given configuration, plus alias
//! well-formedness and auto-suggestion. All rules are fixed at build time.

use crate::error::{BuilderError, ErrorCode};
use std::collections::HashSet;
use std::ops::BitOr;

/// Bitmask of allowed alias prefix forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixRules(u8);

impl PrefixRules {
    /// `-name` for aliases of any length.
    pub const SINGLE_DASH: Self = Self(1);
    /// `-n` for single-character aliases only.
    pub const SINGLE_DASH_SHORT_ONLY: Self = Self(1 << 1);
    /// `--name` for aliases of any length.
    pub const DOUBLE_DASH: Self = Self(1 << 2);
    /// `--name` for aliases of two or more characters only.
    pub const DOUBLE_DASH_LONG_ONLY: Self = Self(1 << 3);
    /// `/name` for aliases of any length.
    pub const FORWARD_SLASH: Self = Self(1 << 4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1_1111)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether a single-dash form exists for an alias of `len` characters.
    pub(crate) fn single_dash_for(self, len: usize) -> bool {
        self.contains(Self::SINGLE_DASH)
            || (len == 1 && self.contains(Self::SINGLE_DASH_SHORT_ONLY))
    }

    /// Whether any single-dash form is enabled at all.
    pub(crate) fn single_dash_enabled(self) -> bool {
        self.contains(Self::SINGLE_DASH) || self.contains(Self::SINGLE_DASH_SHORT_ONLY)
    }

    /// Whether any double-dash form is enabled at all.
    pub(crate) fn double_dash_enabled(self) -> bool {
        self.contains(Self::DOUBLE_DASH) || self.contains(Self::DOUBLE_DASH_LONG_ONLY)
    }

    /// Whether a double-dash form exists for an alias of `len` characters.
    pub(crate) fn double_dash_for(self, len: usize) -> bool {
        self.contains(Self::DOUBLE_DASH)
            || (len >= 2 && self.contains(Self::DOUBLE_DASH_LONG_ONLY))
    }

    pub(crate) fn forward_slash(self) -> bool {
        self.contains(Self::FORWARD_SLASH)
    }
}

impl BitOr for PrefixRules {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for PrefixRules {
    /// GNU-style: short aliases after `-`, long aliases after `--`.
    fn default() -> Self {
        Self::SINGLE_DASH_SHORT_ONLY | Self::DOUBLE_DASH_LONG_ONLY
    }
}

/// Bitmask of legal delimiters between an alias and its inline value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasDelimiterRules(u8);

impl AliasDelimiterRules {
    /// `--name=value`
    pub const EQUALS: Self = Self(1);
    /// `--name:value`
    pub const COLON: Self = Self(1 << 1);
    /// `-nvalue` (short aliases only).
    pub const OMIT: Self = Self(1 << 2);
    /// `"--name value"`: one shell token with embedded whitespace.
    pub const WHITESPACE: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Inline delimiter characters enabled by this rule set.
    pub(crate) fn inline_chars(self) -> impl Iterator<Item = char> {
        [
            (Self::EQUALS, '='),
            (Self::COLON, ':'),
        ]
        .into_iter()
        .filter(move |(rule, _)| self.contains(*rule))
        .map(|(_, ch)| ch)
    }
}

impl BitOr for AliasDelimiterRules {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for AliasDelimiterRules {
    fn default() -> Self {
        Self::EQUALS | Self::COLON | Self::OMIT
    }
}

/// Bitmask of symbols that separate multiple logical values in one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueDelimiterRules(u8);

impl ValueDelimiterRules {
    pub const SEMICOLON: Self = Self(1);
    pub const COMMA: Self = Self(1 << 1);
    pub const PIPE: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b111)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub(crate) fn is_delimiter(self, ch: char) -> bool {
        (ch == ';' && self.contains(Self::SEMICOLON))
            || (ch == ',' && self.contains(Self::COMMA))
            || (ch == '|' && self.contains(Self::PIPE))
    }

    /// Explode one value token into its logical values.
    pub(crate) fn split<'a>(self, raw: &'a str) -> Vec<&'a str> {
        raw.split(|ch| self.is_delimiter(ch)).collect()
    }
}

impl BitOr for ValueDelimiterRules {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for ValueDelimiterRules {
    fn default() -> Self {
        Self::all()
    }
}

pub const HELP_WIDTH_RANGE: (usize, usize) = (40, 320);
pub const MAX_ALIAS_LENGTH_RANGE: (usize, usize) = (8, 64);

/// Parser-wide configuration, evaluated once at build time.
#[derive(Debug, Clone)]
pub struct Settings {
    pub prefix_rules: PrefixRules,
    pub alias_delimiters: AliasDelimiterRules,
    pub value_delimiters: ValueDelimiterRules,
    /// Whether alias and command-token matching is case sensitive.
    pub case_sensitive: bool,
    /// Display width bound a presentation layer should honor.
    pub help_width: usize,
    pub max_alias_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix_rules: PrefixRules::default(),
            alias_delimiters: AliasDelimiterRules::default(),
            value_delimiters: ValueDelimiterRules::default(),
            case_sensitive: true,
            help_width: 120,
            max_alias_length: 32,
        }
    }
}

impl Settings {
    pub(crate) fn validate(&self) -> Result<(), BuilderError> {
        if self.prefix_rules.is_empty() {
            return Err(BuilderError::new(
                ErrorCode::InvalidEnum,
                "prefix rule set must enable at least one prefix form",
            ));
        }
        let (lo, hi) = HELP_WIDTH_RANGE;
        if self.help_width < lo || self.help_width > hi {
            return Err(BuilderError::new(
                ErrorCode::OutOfRange,
                format!("help width {} outside [{lo}, {hi}]", self.help_width),
            ));
        }
        let (lo, hi) = MAX_ALIAS_LENGTH_RANGE;
        if self.max_alias_length < lo || self.max_alias_length > hi {
            return Err(BuilderError::new(
                ErrorCode::OutOfRange,
                format!("max alias length {} outside [{lo}, {hi}]", self.max_alias_length),
            ));
        }
        Ok(())
    }

    /// Case-normalized form used for alias and command-token lookup keys.
    pub(crate) fn normalize(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        }
    }
}

/// Whether `name` is usable as an alias or command token: ASCII letters,
/// digits, `_` and `-`; must not start with a digit; must contain at least
/// one non-digit.
pub(crate) fn is_well_formed_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(ch) => ch,
        None => return false,
    };
    if first.is_ascii_digit() {
        return false;
    }
    if !name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return false;
    }
    name.chars().any(|ch| !ch.is_ascii_digit())
}

/// Whether `field` is shaped like a destination field identifier.
pub(crate) fn is_identifier(field: &str) -> bool {
    let mut chars = field.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Validate one declared alias name against the rule tables.
pub(crate) fn validate_alias(
    field: &str,
    alias: &str,
    settings: &Settings,
) -> Result<(), BuilderError> {
    if alias.is_empty() {
        return Err(BuilderError::for_field(
            ErrorCode::EmptyValue,
            field,
            "alias must not be empty",
        ));
    }
    if alias.chars().count() > settings.max_alias_length {
        return Err(BuilderError::for_field(
            ErrorCode::TooLongAlias,
            field,
            format!(
                "alias '{alias}' exceeds the configured length bound {}",
                settings.max_alias_length
            ),
        ));
    }
    if !is_well_formed_name(alias) {
        return Err(BuilderError::for_field(
            ErrorCode::InvalidAlias,
            field,
            format!("alias '{alias}' is not a well-formed name"),
        ));
    }
    if prefixed_forms(alias, settings.prefix_rules).is_empty() {
        return Err(BuilderError::for_field(
            ErrorCode::NotAllowedAlias,
            field,
            format!("alias '{alias}' has no legal form under the active prefix rules"),
        ));
    }
    Ok(())
}

/// All prefixed forms of `alias` that the rule set makes legal.
pub(crate) fn prefixed_forms(alias: &str, rules: PrefixRules) -> Vec<String> {
    let len = alias.chars().count();
    let mut forms = Vec::new();
    if rules.double_dash_for(len) {
        forms.push(format!("--{alias}"));
    }
    if rules.single_dash_for(len) {
        forms.push(format!("-{alias}"));
    }
    if rules.forward_slash() {
        forms.push(format!("/{alias}"));
    }
    forms
}

/// Whether any prefixed form of `alias` is already claimed. `taken` holds
/// normalized prefixed forms, the namespace aliases are unique over.
fn any_form_taken(alias: &str, taken: &HashSet<String>, settings: &Settings) -> bool {
    prefixed_forms(alias, settings.prefix_rules)
        .iter()
        .any(|form| taken.contains(&settings.normalize(form)))
}

/// Suggest aliases for `field`: the shortest unused abbreviation compatible
/// with the prefix rules, plus the full word when a long form is legal.
/// `taken` holds normalized prefixed forms already owned by other options.
pub(crate) fn suggest_aliases(
    field: &str,
    taken: &HashSet<String>,
    settings: &Settings,
) -> Result<Vec<String>, BuilderError> {
    let name: String = field
        .chars()
        .map(|ch| if ch == '_' { '-' } else { ch.to_ascii_lowercase() })
        .collect();
    let mut suggested = Vec::new();

    let chars: Vec<char> = name.chars().collect();
    for end in 1..=chars.len() {
        let candidate: String = chars[..end].iter().collect();
        if !is_well_formed_name(&candidate) {
            continue;
        }
        if prefixed_forms(&candidate, settings.prefix_rules).is_empty() {
            continue;
        }
        if any_form_taken(&candidate, taken, settings) {
            continue;
        }
        suggested.push(candidate);
        break;
    }

    if suggested.first().map(String::as_str) != Some(name.as_str())
        && is_well_formed_name(&name)
        && !prefixed_forms(&name, settings.prefix_rules).is_empty()
        && !any_form_taken(&name, taken, settings)
    {
        suggested.push(name);
    }

    if suggested.is_empty() {
        return Err(BuilderError::for_field(
            ErrorCode::UnableToSuggestAlias,
            field,
            format!("no unused alias could be derived from '{field}'"),
        ));
    }
    Ok(suggested)
}

/// Derive command tokens for a Command-kind option: shortest unambiguous
/// abbreviation of the field name plus the full word.
pub(crate) fn suggest_command_tokens(
    field: &str,
    taken: &HashSet<String>,
    settings: &Settings,
) -> Result<Vec<String>, BuilderError> {
    let name: String = field
        .chars()
        .map(|ch| if ch == '_' { '-' } else { ch.to_ascii_lowercase() })
        .collect();
    if !is_well_formed_name(&name) || taken.contains(&settings.normalize(&name)) {
        return Err(BuilderError::for_field(
            ErrorCode::UnableToSuggestAlias,
            field,
            format!("no unused command token could be derived from '{field}'"),
        ));
    }

    let mut tokens = Vec::new();
    let chars: Vec<char> = name.chars().collect();
    for end in 1..chars.len() {
        let candidate: String = chars[..end].iter().collect();
        if is_well_formed_name(&candidate) && !taken.contains(&settings.normalize(&candidate)) {
            tokens.push(candidate);
            break;
        }
    }
    tokens.push(name);
    Ok(tokens)
}
