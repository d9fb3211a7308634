//! The closed error catalog.
//!
//! Two disjoint families: [`BuilderError`] is returned from the build phase
//! and represents a programmer mistake (the parser is never constructed);
//! [`ParseError`] values are accumulated during a `parse` call and reported
//! through the outcome rather than returned as `Err`.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Coded identity of every fault the engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    // Parse-time codes.
    InvalidToken,
    UnknownToken,
    InvalidDoubleDashToken,
    UnknownDoubleDashToken,
    InvalidSingleDashToken,
    UnknownSingleDashToken,
    UnknownForwardSlashToken,
    InvalidSingleOptionUsage,
    TooManyOption,
    VeryFewOption,
    TooManyValue,
    VeryFewValue,
    InvalidOptionValue,
    ValueMustBeOneOf,
    PredicateFailure,
    ListPredicateFailure,

    // Build-time codes.
    NullValue,
    EmptyValue,
    InvalidEnum,
    OutOfRange,
    InvalidPropertyExpression,
    SamePropertyUsage,
    PropertyAlreadyInUse,
    ReservedProperty,
    InvalidName,
    NameAlreadyInUse,
    InvalidArity,
    MissingCallback,
    InvalidAllowedValue,
    InvalidAlias,
    ReservedAlias,
    TooLongAlias,
    NotAllowedAlias,
    AliasAlreadyInUse,
    UnableToSuggestAlias,
}

impl ErrorCode {
    /// Whether the code belongs to the configuration (builder) family.
    pub fn is_builder_code(self) -> bool {
        use ErrorCode::*;
        matches!(
            self,
            NullValue
                | EmptyValue
                | InvalidEnum
                | OutOfRange
                | InvalidPropertyExpression
                | SamePropertyUsage
                | PropertyAlreadyInUse
                | ReservedProperty
                | InvalidName
                | NameAlreadyInUse
                | InvalidArity
                | MissingCallback
                | InvalidAllowedValue
                | InvalidAlias
                | ReservedAlias
                | TooLongAlias
                | NotAllowedAlias
                | AliasAlreadyInUse
                | UnableToSuggestAlias
        )
    }

    pub fn as_str(self) -> &'static str {
        use ErrorCode::*;
        match self {
            InvalidToken => "InvalidToken",
            UnknownToken => "UnknownToken",
            InvalidDoubleDashToken => "InvalidDoubleDashToken",
            UnknownDoubleDashToken => "UnknownDoubleDashToken",
            InvalidSingleDashToken => "InvalidSingleDashToken",
            UnknownSingleDashToken => "UnknownSingleDashToken",
            UnknownForwardSlashToken => "UnknownForwardSlashToken",
            InvalidSingleOptionUsage => "InvalidSingleOptionUsage",
            TooManyOption => "TooManyOption",
            VeryFewOption => "VeryFewOption",
            TooManyValue => "TooManyValue",
            VeryFewValue => "VeryFewValue",
            InvalidOptionValue => "InvalidOptionValue",
            ValueMustBeOneOf => "ValueMustBeOneOf",
            PredicateFailure => "PredicateFailure",
            ListPredicateFailure => "ListPredicateFailure",
            NullValue => "NullValue",
            EmptyValue => "EmptyValue",
            InvalidEnum => "InvalidEnum",
            OutOfRange => "OutOfRange",
            InvalidPropertyExpression => "InvalidPropertyExpression",
            SamePropertyUsage => "SamePropertyUsage",
            PropertyAlreadyInUse => "PropertyAlreadyInUse",
            ReservedProperty => "ReservedProperty",
            InvalidName => "InvalidName",
            NameAlreadyInUse => "NameAlreadyInUse",
            InvalidArity => "InvalidArity",
            MissingCallback => "MissingCallback",
            InvalidAllowedValue => "InvalidAllowedValue",
            InvalidAlias => "InvalidAlias",
            ReservedAlias => "ReservedAlias",
            TooLongAlias => "TooLongAlias",
            NotAllowedAlias => "NotAllowedAlias",
            AliasAlreadyInUse => "AliasAlreadyInUse",
            UnableToSuggestAlias => "UnableToSuggestAlias",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration-time fault in how options were declared.
///
/// Raised immediately by [`ParserBuilder::build`](crate::ParserBuilder::build)
/// (or by arity construction); never recoverable at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct BuilderError {
    pub code: ErrorCode,
    pub message: String,
    /// Destination field of the offending declaration, when known.
    pub field: Option<String>,
}

impl BuilderError {
    pub(crate) fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub(crate) fn for_field(
        code: ErrorCode,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

/// An input-time fault found while interpreting the actual argument vector.
///
/// Accumulated into the parse outcome; one malformed option does not
/// suppress diagnostics for the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    /// Destination field of the owning option, when one could be attributed.
    pub option: Option<String>,
}

impl ParseError {
    pub(crate) fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            option: None,
        }
    }

    pub(crate) fn for_option(
        code: ErrorCode,
        option: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            option: Some(option.into()),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.option {
            Some(option) => write!(f, "{}: {} (option '{}')", self.code, self.message, option),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}
