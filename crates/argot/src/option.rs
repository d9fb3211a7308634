//! The option model: arities, the closed kind set, and the typed value
//! handlers that carry conversion, validation and binding for one option.
//!
//! Handlers are declared with typed setter closures into the destination
//! struct and erased behind [`ValueHandler`]; no runtime type inspection is
//! involved anywhere.

use crate::error::{BuilderError, ErrorCode, ParseError};
use std::fmt;

/// Inclusive `(min, max)` bound for occurrences or values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    min: usize,
    max: usize,
}

impl Arity {
    pub const fn zero() -> Self {
        Self { min: 0, max: 0 }
    }

    pub const fn zero_or_one() -> Self {
        Self { min: 0, max: 1 }
    }

    pub const fn exactly_one() -> Self {
        Self { min: 1, max: 1 }
    }

    pub const fn zero_or_more() -> Self {
        Self { min: 0, max: usize::MAX }
    }

    pub const fn one_or_more() -> Self {
        Self { min: 1, max: usize::MAX }
    }

    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    /// Custom bound; `min > max` is an [`InvalidArity`](ErrorCode::InvalidArity)
    /// configuration error.
    pub fn between(min: usize, max: usize) -> Result<Self, BuilderError> {
        if min > max {
            return Err(BuilderError::new(
                ErrorCode::InvalidArity,
                format!("arity ({min}, {max}) has min above max"),
            ));
        }
        Ok(Self { min, max })
    }

    pub const fn min(self) -> usize {
        self.min
    }

    pub const fn max(self) -> usize {
        self.max
    }

    pub(crate) fn contains(self, n: usize) -> bool {
        n >= self.min && n <= self.max
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max == usize::MAX {
            write!(f, "{}..", self.min)
        } else {
            write!(f, "{}..={}", self.min, self.max)
        }
    }
}

/// The closed set of option kinds, matched exhaustively wherever
/// kind-specific behavior is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Presence flag; destination derives from occurrence count.
    Switch,
    /// Occurrence count bound as a number.
    Counter,
    /// Single typed value (or declared default).
    Scalar,
    /// Ordered sequence of typed values.
    MultiValue,
    /// Identified by a bare verb token rather than a prefixed alias.
    Command,
    /// Collects unprefixed tokens not attached to any alias.
    FreeValue,
}

impl OptionKind {
    /// Whether alias occurrences of this kind absorb following tokens.
    pub(crate) fn takes_values(self) -> bool {
        matches!(self, Self::Scalar | Self::MultiValue)
    }
}

pub(crate) type Setter<T, V> = Box<dyn Fn(&mut T, V) + Send + Sync>;
pub(crate) type CountSetter<T> = Box<dyn Fn(&mut T, usize) + Send + Sync>;
pub(crate) type Convert<V> = Box<dyn Fn(&str) -> Result<V, String> + Send + Sync>;
pub(crate) type Predicate<V> = Box<dyn Fn(&V) -> bool + Send + Sync>;
pub(crate) type ListPredicate<V> = Box<dyn Fn(&[V]) -> bool + Send + Sync>;

/// Erased per-option behavior: build-time coherence, value checking, and
/// binding into the destination struct.
pub(crate) trait ValueHandler<T>: Send + Sync {
    /// Build-time checks that need the typed declaration (converter
    /// presence, default membership in the allowed set).
    fn validate_config(&self, field: &str) -> Result<(), BuilderError>;

    /// Conversion, allowed-set and predicate checks over the tokenized
    /// value strings. Errors accumulate; nothing is thrown.
    fn check_values(&self, field: &str, values: &[String]) -> Vec<ParseError>;

    /// Write converted values (or the default) into the destination. Runs
    /// only after `check_values` reported nothing, so conversion cannot
    /// fail here.
    fn bind(&self, target: &mut T, values: &[String], occurrences: usize);
}

/// Handler for the reserved help option: validates and binds nothing.
pub(crate) struct NoBinding;

impl<T> ValueHandler<T> for NoBinding {
    fn validate_config(&self, _field: &str) -> Result<(), BuilderError> {
        Ok(())
    }

    fn check_values(&self, _field: &str, _values: &[String]) -> Vec<ParseError> {
        Vec::new()
    }

    fn bind(&self, _target: &mut T, _values: &[String], _occurrences: usize) {}
}

pub(crate) struct SwitchBinding<T> {
    pub set: Setter<T, bool>,
    pub default: Option<bool>,
}

impl<T> ValueHandler<T> for SwitchBinding<T> {
    fn validate_config(&self, _field: &str) -> Result<(), BuilderError> {
        Ok(())
    }

    fn check_values(&self, _field: &str, _values: &[String]) -> Vec<ParseError> {
        // Stray value tokens are caught by the zero value arity.
        Vec::new()
    }

    fn bind(&self, target: &mut T, _values: &[String], occurrences: usize) {
        if occurrences > 0 {
            (self.set)(target, true);
        } else if let Some(default) = self.default {
            (self.set)(target, default);
        }
    }
}

pub(crate) struct CounterBinding<T> {
    pub set: CountSetter<T>,
}

impl<T> ValueHandler<T> for CounterBinding<T> {
    fn validate_config(&self, _field: &str) -> Result<(), BuilderError> {
        Ok(())
    }

    fn check_values(&self, _field: &str, _values: &[String]) -> Vec<ParseError> {
        Vec::new()
    }

    fn bind(&self, target: &mut T, _values: &[String], occurrences: usize) {
        if occurrences > 0 {
            (self.set)(target, occurrences);
        }
    }
}

pub(crate) struct ScalarBinding<T, V> {
    pub type_label: &'static str,
    pub convert: Option<Convert<V>>,
    pub default: Option<V>,
    pub allowed: Vec<V>,
    /// Display forms of `allowed`, captured at declaration.
    pub allowed_display: Vec<String>,
    pub allowed_given: bool,
    pub predicates: Vec<Predicate<V>>,
    pub set: Setter<T, V>,
    pub count_set: Option<CountSetter<T>>,
}

impl<T, V> ScalarBinding<T, V>
where
    V: PartialEq,
{
    fn convert_checked(&self, field: &str, raw: &str) -> Result<V, ParseError> {
        // Converter presence is enforced at build time.
        let Some(convert) = self.convert.as_ref() else {
            return Err(ParseError::for_option(
                ErrorCode::InvalidOptionValue,
                field,
                format!("no converter available for value '{raw}'"),
            ));
        };
        convert(raw).map_err(|reason| {
            ParseError::for_option(
                ErrorCode::InvalidOptionValue,
                field,
                format!("value '{raw}' is not a valid {}: {reason}", self.type_label),
            )
        })
    }

    fn check_one(&self, field: &str, raw: &str, errors: &mut Vec<ParseError>) -> Option<V> {
        let value = match self.convert_checked(field, raw) {
            Ok(value) => value,
            Err(err) => {
                errors.push(err);
                return None;
            }
        };
        if !self.allowed.is_empty() && !self.allowed.contains(&value) {
            errors.push(ParseError::for_option(
                ErrorCode::ValueMustBeOneOf,
                field,
                format!(
                    "value '{raw}' must be one of: {}",
                    self.allowed_display.join(", ")
                ),
            ));
            return None;
        }
        if !self.predicates.iter().all(|p| p(&value)) {
            errors.push(ParseError::for_option(
                ErrorCode::PredicateFailure,
                field,
                format!("value '{raw}' was rejected by a predicate"),
            ));
            return None;
        }
        Some(value)
    }

    fn validate_common(&self, field: &str) -> Result<(), BuilderError> {
        if self.convert.is_none() {
            return Err(BuilderError::for_field(
                ErrorCode::MissingCallback,
                field,
                "destination type has no default converter and no callback was supplied",
            ));
        }
        if self.allowed_given && self.allowed.is_empty() {
            return Err(BuilderError::for_field(
                ErrorCode::NullValue,
                field,
                "allowed-value set must not be empty when given",
            ));
        }
        if let Some(default) = &self.default {
            if !self.allowed.is_empty() && !self.allowed.contains(default) {
                return Err(BuilderError::for_field(
                    ErrorCode::InvalidAllowedValue,
                    field,
                    "default value does not belong to the allowed-value set",
                ));
            }
        }
        Ok(())
    }
}

impl<T, V> ValueHandler<T> for ScalarBinding<T, V>
where
    V: PartialEq + Clone + Send + Sync + 'static,
    T: 'static,
{
    fn validate_config(&self, field: &str) -> Result<(), BuilderError> {
        self.validate_common(field)
    }

    fn check_values(&self, field: &str, values: &[String]) -> Vec<ParseError> {
        let mut errors = Vec::new();
        for raw in values {
            self.check_one(field, raw, &mut errors);
        }
        errors
    }

    fn bind(&self, target: &mut T, values: &[String], occurrences: usize) {
        if let Some(raw) = values.first() {
            if let Ok(value) = self.convert_checked("", raw) {
                (self.set)(target, value);
            }
        } else if let Some(default) = &self.default {
            (self.set)(target, default.clone());
        }
        if let Some(count_set) = &self.count_set {
            if occurrences > 0 {
                count_set(target, occurrences);
            }
        }
    }
}

pub(crate) struct MultiBinding<T, V> {
    pub inner: ScalarBinding<T, V>,
    pub list_predicates: Vec<ListPredicate<V>>,
    pub set_all: Setter<T, Vec<V>>,
}

impl<T, V> ValueHandler<T> for MultiBinding<T, V>
where
    V: PartialEq + Clone + Send + Sync + 'static,
    T: 'static,
{
    fn validate_config(&self, field: &str) -> Result<(), BuilderError> {
        self.inner.validate_common(field)
    }

    fn check_values(&self, field: &str, values: &[String]) -> Vec<ParseError> {
        let mut errors = Vec::new();
        let mut converted = Vec::with_capacity(values.len());
        for raw in values {
            if let Some(value) = self.inner.check_one(field, raw, &mut errors) {
                converted.push(value);
            }
        }
        if errors.is_empty()
            && !converted.is_empty()
            && !self.list_predicates.iter().all(|p| p(&converted))
        {
            errors.push(ParseError::for_option(
                ErrorCode::ListPredicateFailure,
                field,
                "parsed value list was rejected by a predicate",
            ));
        }
        errors
    }

    fn bind(&self, target: &mut T, values: &[String], occurrences: usize) {
        if values.is_empty() {
            return;
        }
        let converted: Vec<V> = values
            .iter()
            .filter_map(|raw| self.inner.convert_checked("", raw).ok())
            .collect();
        (self.set_all)(target, converted);
        if let Some(count_set) = &self.inner.count_set {
            if occurrences > 0 {
                count_set(target, occurrences);
            }
        }
    }
}

pub(crate) struct FreeBinding<T> {
    pub set_all: Setter<T, Vec<String>>,
}

impl<T> ValueHandler<T> for FreeBinding<T> {
    fn validate_config(&self, _field: &str) -> Result<(), BuilderError> {
        Ok(())
    }

    fn check_values(&self, _field: &str, _values: &[String]) -> Vec<ParseError> {
        Vec::new()
    }

    fn bind(&self, target: &mut T, values: &[String], _occurrences: usize) {
        if !values.is_empty() {
            (self.set_all)(target, values.to_vec());
        }
    }
}

/// One declared option after the build phase: immutable identity, arities,
/// tokenizing flags and the erased handler.
pub(crate) struct OptionSpec<T> {
    pub field: String,
    pub kind: OptionKind,
    /// Bare (unprefixed) alias names in declaration order.
    pub aliases: Vec<String>,
    /// Bare verb tokens; Command kind only.
    pub command_tokens: Vec<String>,
    pub occurrence_arity: Arity,
    pub value_arity: Arity,
    pub allow_sequential_values: bool,
    pub split_values: bool,
    pub exclusive: bool,
    pub description: Option<String>,
    pub usage: Option<String>,
    /// Secondary count-binding field, for overlap checks only.
    pub count_field: Option<String>,
    pub handler: Box<dyn ValueHandler<T>>,
}

/// Read-only description of a built option, for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionInfo {
    pub field: String,
    pub kind: OptionKind,
    pub aliases: Vec<String>,
    pub command_tokens: Vec<String>,
    pub occurrence_arity: Arity,
    pub value_arity: Arity,
    pub description: Option<String>,
    pub usage: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_presets_hold_their_bounds() {
        assert_eq!(Arity::zero_or_one().min(), 0);
        assert_eq!(Arity::zero_or_one().max(), 1);
        assert!(Arity::zero_or_more().contains(7));
        assert!(!Arity::exactly(2).contains(3));
        assert_eq!(Arity::between(2, 4).unwrap(), Arity { min: 2, max: 4 });
    }

    #[test]
    fn inverted_arity_is_a_configuration_error() {
        let err = Arity::between(3, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArity);
    }

    #[test]
    fn arity_displays_compactly() {
        assert_eq!(Arity::between(2, 4).unwrap().to_string(), "2..=4");
        assert_eq!(Arity::one_or_more().to_string(), "1..");
    }

    #[test]
    fn only_value_kinds_absorb_tokens() {
        assert!(OptionKind::Scalar.takes_values());
        assert!(OptionKind::MultiValue.takes_values());
        assert!(!OptionKind::Switch.takes_values());
        assert!(!OptionKind::Counter.takes_values());
        assert!(!OptionKind::Command.takes_values());
        assert!(!OptionKind::FreeValue.takes_values());
    }
}
