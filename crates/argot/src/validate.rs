//! The validation pipeline: arity, empty-value, conversion, predicate and
//! allowed-set checks per option, then the cross-option rules. Errors
//! accumulate; every option is evaluated independently so one malformed
//! option does not suppress diagnostics for the others.

use crate::error::{ErrorCode, ParseError};
use crate::option::{OptionKind, OptionSpec};
use crate::tokenizer::{MatchTable, ParseState};

/// Run every check over the tokenized state. Returns whether the reserved
/// help option was invoked; the caller then discards all accumulated
/// errors and honors the help request instead of failing.
pub(crate) fn run<T>(
    table: &MatchTable,
    specs: &[OptionSpec<T>],
    state: &mut ParseState,
) -> bool {
    for (idx, meta) in table.metas.iter().enumerate() {
        let tokens = &state.per_option[idx];
        let occurrences = tokens.occurrences;
        let values = tokens.values.clone();

        if !meta.occurrence_arity.contains(occurrences) {
            let (code, bound, word) = if occurrences < meta.occurrence_arity.min() {
                (ErrorCode::VeryFewOption, meta.occurrence_arity.min(), "least")
            } else {
                (ErrorCode::TooManyOption, meta.occurrence_arity.max(), "most")
            };
            state.errors.push(ParseError::for_option(
                code,
                &meta.field,
                format!("expected at {word} {bound} occurrence(s), found {occurrences}"),
            ));
        }

        // Value-arity minimums only bind once the option actually occurred;
        // an absent optional option owes no values. FreeValue options never
        // record occurrences, so their minimum always applies.
        let count = values.len();
        let check_min = occurrences > 0 || meta.kind == OptionKind::FreeValue;
        if check_min && count < meta.value_arity.min() {
            state.errors.push(ParseError::for_option(
                ErrorCode::VeryFewValue,
                &meta.field,
                format!(
                    "expected at least {} value(s), found {count}",
                    meta.value_arity.min()
                ),
            ));
        }
        if count > meta.value_arity.max() {
            state.errors.push(ParseError::for_option(
                ErrorCode::TooManyValue,
                &meta.field,
                format!(
                    "expected at most {} value(s), found {count}",
                    meta.value_arity.max()
                ),
            ));
        }

        let mut had_empty = false;
        for raw in &values {
            if raw.trim().is_empty() {
                had_empty = true;
                state.errors.push(ParseError::for_option(
                    ErrorCode::InvalidOptionValue,
                    &meta.field,
                    "empty value token",
                ));
            }
        }
        if !had_empty {
            state
                .errors
                .extend(specs[idx].handler.check_values(&meta.field, &values));
        }
    }

    // Cross-option rule: an exclusive option must appear alone.
    let occupied: Vec<usize> = table
        .metas
        .iter()
        .enumerate()
        .filter(|(idx, _)| state.per_option[*idx].occurrences > 0)
        .map(|(idx, _)| idx)
        .collect();
    if occupied.len() > 1 {
        for &idx in &occupied {
            if table.metas[idx].exclusive {
                state.errors.push(ParseError::for_option(
                    ErrorCode::InvalidSingleOptionUsage,
                    &table.metas[idx].field,
                    "option cannot be combined with other options",
                ));
            }
        }
    }

    // Tokens that never matched an alias and were never absorbed as values.
    for token in &state.unclaimed {
        state.errors.push(ParseError::new(
            ErrorCode::UnknownToken,
            format!("token '{token}' does not belong to any option"),
        ));
    }

    state.per_option[table.help_index].occurrences > 0
}
