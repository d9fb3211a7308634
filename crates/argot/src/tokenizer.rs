//! The tokenizer/matcher: one left-to-right pass over the raw argument
//! array, no backtracking. Classifies every token as an alias occurrence,
//! an attached value, a free value, or an unknown token, honoring the
//! configured prefix and delimiter rules.

use crate::error::{ErrorCode, ParseError};
use crate::option::{Arity, OptionKind};
use crate::rules::{AliasDelimiterRules, PrefixRules, Settings};
use indexmap::IndexMap;
use tracing::trace;

/// Kind-erased snapshot of one built option, shared by the tokenizer and
/// the validation pipeline.
pub(crate) struct OptionMeta {
    pub field: String,
    pub kind: OptionKind,
    pub occurrence_arity: Arity,
    pub value_arity: Arity,
    pub allow_sequential_values: bool,
    pub split_values: bool,
    pub exclusive: bool,
}

/// Immutable matching tables derived from the option model at build time.
pub(crate) struct MatchTable {
    pub settings: Settings,
    pub metas: Vec<OptionMeta>,
    /// Normalized prefixed alias form (`--left`, `-l`, `/l`) to option index.
    pub alias_map: IndexMap<String, usize>,
    /// Normalized bare command verb to option index.
    pub command_map: IndexMap<String, usize>,
    /// FreeValue-kind options in registration order.
    pub free_options: Vec<usize>,
    pub help_index: usize,
}

impl MatchTable {
    fn lookup(&self, form: &str) -> Option<usize> {
        self.alias_map.get(&self.settings.normalize(form)).copied()
    }
}

/// Accumulated tokens for one option within a single parse call.
#[derive(Debug, Clone, Default)]
pub(crate) struct OptionTokens {
    pub occurrences: usize,
    /// Final ordered parsed-values list, after delimiter explosion.
    pub values: Vec<String>,
}

/// Transient per-call state; created fresh inside every `parse` invocation
/// and discarded with it, so nothing leaks across calls.
pub(crate) struct ParseState {
    pub per_option: Vec<OptionTokens>,
    pub unclaimed: Vec<String>,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    DoubleDash,
    SingleDash,
    ForwardSlash,
}

impl Prefix {
    fn unknown_code(self) -> ErrorCode {
        match self {
            Self::DoubleDash => ErrorCode::UnknownDoubleDashToken,
            Self::SingleDash => ErrorCode::UnknownSingleDashToken,
            Self::ForwardSlash => ErrorCode::UnknownForwardSlashToken,
        }
    }

    fn invalid_code(self) -> ErrorCode {
        match self {
            Self::DoubleDash => ErrorCode::InvalidDoubleDashToken,
            Self::SingleDash => ErrorCode::InvalidSingleDashToken,
            // The catalog has no slash-specific invalid code.
            Self::ForwardSlash => ErrorCode::InvalidToken,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::DoubleDash => "--",
            Self::SingleDash => "-",
            Self::ForwardSlash => "/",
        }
    }
}

/// Split a candidate token into prefix and body. Only prefixes enabled by
/// the active rule set count; under GNU-style rules `/etc/hosts` is a plain
/// value. A body starting with a digit cannot be an alias (aliases must not
/// start with a digit), so such tokens stay values too (`-5`, `/24`).
fn split_prefix(token: &str, rules: PrefixRules) -> Option<(Prefix, &str)> {
    let (prefix, body) = if let Some(body) = token.strip_prefix("--").filter(|_| rules.double_dash_enabled()) {
        (Prefix::DoubleDash, body)
    } else if let Some(body) = token.strip_prefix('-').filter(|_| rules.single_dash_enabled()) {
        (Prefix::SingleDash, body)
    } else if let Some(body) = token.strip_prefix('/').filter(|_| rules.forward_slash()) {
        (Prefix::ForwardSlash, body)
    } else {
        return None;
    };
    match body.chars().next() {
        Some(first) if !first.is_ascii_digit() => Some((prefix, body)),
        _ => None,
    }
}

/// Walk the raw argument array once against the match table.
pub(crate) fn tokenize(table: &MatchTable, args: &[String]) -> ParseState {
    let mut state = ParseState {
        per_option: vec![OptionTokens::default(); table.metas.len()],
        unclaimed: Vec::new(),
        errors: Vec::new(),
    };
    // Option currently absorbing following tokens as sequential values.
    let mut open: Option<usize> = None;
    let mut after_separator = false;

    for raw in args {
        let token = raw.as_str();

        if !after_separator && token == "--" {
            after_separator = true;
            open = None;
            continue;
        }

        if !after_separator && whitespace_pair(table, &mut state, &mut open, token) {
            continue;
        }

        if !after_separator {
            if let Some((prefix, body)) = split_prefix(token, table.settings.prefix_rules) {
                open = None;
                match_prefixed(table, &mut state, &mut open, prefix, body, token);
                continue;
            }
        }

        // Unprefixed token: sequential value, command verb, or free value.
        if let Some(idx) = open {
            push_value(table, &mut state, idx, token);
            if !table.metas[idx].allow_sequential_values {
                open = None;
            }
            continue;
        }

        if !after_separator {
            if let Some(&idx) = table.command_map.get(&table.settings.normalize(token)) {
                trace!(token, option = %table.metas[idx].field, "matched command token");
                state.per_option[idx].occurrences += 1;
                continue;
            }
        }

        claim_free_value(table, &mut state, token);
    }

    state
}

/// Rule 5: a single token carrying an embedded whitespace-delimited
/// alias/value pair (the shell kept it quoted). Only active under the
/// Whitespace delimiter rule.
fn whitespace_pair(
    table: &MatchTable,
    state: &mut ParseState,
    open: &mut Option<usize>,
    token: &str,
) -> bool {
    if !table
        .settings
        .alias_delimiters
        .contains(AliasDelimiterRules::WHITESPACE)
    {
        return false;
    }
    let stripped = token.trim_matches('"');
    let Some(pos) = stripped.find(char::is_whitespace) else {
        return false;
    };
    let head = &stripped[..pos];
    let tail = stripped[pos..].trim_start();
    let Some((prefix, _)) = split_prefix(head, table.settings.prefix_rules) else {
        return false;
    };

    *open = None;
    match table.lookup(head) {
        Some(idx) => {
            trace!(token = head, option = %table.metas[idx].field, "matched alias");
            state.per_option[idx].occurrences += 1;
            if !tail.is_empty() {
                push_value(table, state, idx, tail);
            }
        }
        None => state.errors.push(ParseError::new(
            prefix.unknown_code(),
            format!("unknown token '{head}'"),
        )),
    }
    true
}

fn match_prefixed(
    table: &MatchTable,
    state: &mut ParseState,
    open: &mut Option<usize>,
    prefix: Prefix,
    body: &str,
    token: &str,
) {
    // Rule 2: exact alias match opens the occurrence.
    if let Some(idx) = table.lookup(token) {
        trace!(token, option = %table.metas[idx].field, "matched alias");
        state.per_option[idx].occurrences += 1;
        if table.metas[idx].kind.takes_values() {
            *open = Some(idx);
        }
        return;
    }

    // Rule 3: inline form `alias<delim>value`, first legal delimiter only.
    let inline: Vec<char> = table.settings.alias_delimiters.inline_chars().collect();
    if let Some(pos) = body.find(|ch| inline.contains(&ch)) {
        let delimiter = match body[pos..].chars().next() {
            Some(ch) => ch,
            None => return,
        };
        if body.matches(delimiter).count() > 1 {
            state.errors.push(ParseError::new(
                prefix.invalid_code(),
                format!("multiple token separator usage in '{token}'"),
            ));
            return;
        }
        let name = &body[..pos];
        let value = &body[pos + delimiter.len_utf8()..];
        let form = format!("{}{}", prefix.as_str(), name);
        match table.lookup(&form) {
            Some(idx) => {
                trace!(token, option = %table.metas[idx].field, "matched inline alias");
                state.per_option[idx].occurrences += 1;
                if !value.is_empty() {
                    push_value(table, state, idx, value);
                }
            }
            None => state.errors.push(ParseError::new(
                prefix.unknown_code(),
                format!("unknown token '{token}'"),
            )),
        }
        return;
    }

    // Rule 4: short alias with the delimiter omitted (`-n5`).
    if prefix != Prefix::DoubleDash
        && body.chars().count() > 1
        && table
            .settings
            .alias_delimiters
            .contains(AliasDelimiterRules::OMIT)
    {
        let mut chars = body.chars();
        let short = match chars.next() {
            Some(ch) => ch,
            None => return,
        };
        let form = format!("{}{}", prefix.as_str(), short);
        if let Some(idx) = table.lookup(&form) {
            if table.metas[idx].kind.takes_values() {
                trace!(token, option = %table.metas[idx].field, "matched short alias with omitted delimiter");
                state.per_option[idx].occurrences += 1;
                push_value(table, state, idx, chars.as_str());
                return;
            }
        }
    }

    state.errors.push(ParseError::new(
        prefix.unknown_code(),
        format!("unknown token '{token}'"),
    ));
}

/// Rule 6: explode the value token on the configured delimiters when the
/// option asks for it, then record the logical values in order.
fn push_value(table: &MatchTable, state: &mut ParseState, idx: usize, raw: &str) {
    if table.metas[idx].split_values {
        for part in table.settings.value_delimiters.split(raw) {
            state.per_option[idx].values.push(part.to_string());
        }
    } else {
        state.per_option[idx].values.push(raw.to_string());
    }
}

/// Rule 1: bind a free value to the first FreeValue option with remaining
/// capacity, else leave it unclaimed for the validation pipeline.
fn claim_free_value(table: &MatchTable, state: &mut ParseState, token: &str) {
    for &idx in &table.free_options {
        if state.per_option[idx].values.len() < table.metas[idx].value_arity.max() {
            push_value(table, state, idx, token);
            return;
        }
    }
    state.unclaimed.push(token.to_string());
}
