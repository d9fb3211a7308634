//! Declarative command-line option parsing with typed binding.
//!
//! Options are declared once with typed setter closures into a
//! caller-supplied result struct, validated for internal consistency at
//! build time, then matched against raw argument vectors:
//!
//! ```
//! use argot::{Parser, ParserBuilder, Scalar};
//!
//! #[derive(Debug, Default)]
//! struct Calc {
//!     left: i32,
//!     right: i32,
//!     operator: String,
//! }
//!
//! let parser: Parser<Calc> = ParserBuilder::new()
//!     .scalar(Scalar::new("left", |c: &mut Calc, v| c.left = v).aliases(["l", "left"]))
//!     .scalar(Scalar::new("right", |c: &mut Calc, v| c.right = v).aliases(["r", "right"]))
//!     .scalar(
//!         Scalar::new("operator", |c: &mut Calc, v| c.operator = v)
//!             .aliases(["c", "calculate"])
//!             .default_value("add".to_string()),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let outcome = parser.parse(["--left", "5", "--right", "3"]);
//! assert!(outcome.is_valid());
//! assert_eq!(outcome.value.left, 5);
//! assert_eq!(outcome.value.operator, "add");
//! ```
//!
//! Configuration faults (duplicate aliases, inverted arities, reserved
//! destinations) fail [`ParserBuilder::build`] immediately with a coded
//! [`BuilderError`]; input faults accumulate into the [`Parsed`] outcome
//! and never panic. The engine renders nothing itself: help text, colors
//! and exit codes belong to the calling presentation layer, which consumes
//! [`Parsed::report`] and [`Parser::options`].

mod builder;
mod convert;
mod error;
mod option;
mod parser;
mod rules;
mod tokenizer;
mod validate;

pub use builder::{Command, Counter, FreeValues, Multi, ParserBuilder, Scalar, Switch};
pub use convert::ParseValue;
pub use error::{BuilderError, ErrorCode, ParseError};
pub use option::{Arity, OptionInfo, OptionKind};
pub use parser::{ParseReport, Parsed, Parser};
pub use rules::{
    AliasDelimiterRules, PrefixRules, Settings, ValueDelimiterRules, HELP_WIDTH_RANGE,
    MAX_ALIAS_LENGTH_RANGE,
};
