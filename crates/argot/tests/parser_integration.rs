//! End-to-end parsing scenarios against a built option model.

use argot::{
    Arity, Command, Counter, ErrorCode, FreeValues, Multi, Parser, ParserBuilder, Scalar, Switch,
};
use rstest::rstest;

#[derive(Debug, Default, PartialEq)]
struct Calc {
    left: i32,
    right: i32,
    operator: String,
}

fn calc_parser() -> Parser<Calc> {
    ParserBuilder::new()
        .scalar(Scalar::new("left", |c: &mut Calc, v| c.left = v).aliases(["l", "left"]))
        .scalar(Scalar::new("right", |c: &mut Calc, v| c.right = v).aliases(["r", "right"]))
        .scalar(
            Scalar::new("operator", |c: &mut Calc, v| c.operator = v)
                .aliases(["c", "calculate"])
                .default_value("add".to_string()),
        )
        .build()
        .unwrap()
}

#[test]
fn long_aliases_bind_all_fields() {
    let outcome = calc_parser().parse(["--left", "5", "--right", "3", "--calculate", "add"]);
    assert!(outcome.is_valid());
    assert!(outcome.errors.is_empty());
    assert_eq!(
        outcome.value,
        Calc {
            left: 5,
            right: 3,
            operator: "add".to_string(),
        }
    );
}

#[test]
fn absent_option_binds_its_default() {
    let outcome = calc_parser().parse(["--left", "5", "--right", "3"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.operator, "add");
}

#[test]
fn short_aliases_parse_and_zero_is_not_a_parser_concern() {
    // Division by zero belongs to the caller; the parser only binds values.
    let outcome = calc_parser().parse(["-l", "5", "-r", "0", "-c", "div"]);
    assert!(outcome.is_valid());
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.value.right, 0);
    assert_eq!(outcome.value.operator, "div");
}

#[test]
fn inline_delimiters_bind_like_separate_tokens() {
    let outcome = calc_parser().parse(["--left=5", "--right:3"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.left, 5);
    assert_eq!(outcome.value.right, 3);
}

#[test]
fn unmatched_options_stay_default() {
    let outcome = calc_parser().parse(["--left", "7"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.right, 0);
    assert_eq!(outcome.value.left, 7);
}

#[test]
fn repeated_parse_calls_are_independent() {
    let parser = calc_parser();
    let first = parser.parse(["--left", "5", "--right", "3"]);
    let second = parser.parse(["--left", "5", "--right", "3"]);
    assert_eq!(first.value, second.value);
    assert_eq!(first.errors, second.errors);

    // A failing call in between must not leak state either.
    let failing = parser.parse(["--left", "not-a-number"]);
    assert!(!failing.is_valid());
    assert_eq!(failing.value, Calc::default());
    let third = parser.parse(["--left", "5", "--right", "3"]);
    assert_eq!(third.value, first.value);
}

#[test]
fn scalar_string_round_trips() {
    let outcome = calc_parser().parse(["--calculate", "power"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.operator, "power");
}

#[test]
fn conversion_failure_names_option_and_value() {
    let outcome = calc_parser().parse(["--left", "five"]);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.value, Calc::default());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].code, ErrorCode::InvalidOptionValue);
    assert_eq!(outcome.errors[0].option.as_deref(), Some("left"));
    assert!(outcome.errors[0].message.contains("five"));
}

#[test]
fn one_malformed_option_does_not_suppress_the_others() {
    let outcome = calc_parser().parse(["--left", "five", "--right", "three"]);
    assert!(!outcome.is_valid());
    let owners: Vec<_> = outcome
        .errors
        .iter()
        .filter_map(|e| e.option.as_deref())
        .collect();
    assert_eq!(owners, vec!["left", "right"]);
}

#[test]
fn help_wins_even_next_to_malformed_options() {
    let outcome = calc_parser().parse(["--help", "--left", "five"]);
    assert!(outcome.is_valid());
    assert!(outcome.help_requested);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.value, Calc::default());
}

#[test]
fn help_alone_is_a_plain_help_request() {
    let outcome = calc_parser().parse(["--help"]);
    assert!(outcome.is_valid());
    assert!(outcome.help_requested);
    assert!(outcome.errors.is_empty());
}

#[derive(Debug, Default)]
struct Samples {
    numbers: Vec<i32>,
}

fn samples_parser(arity: Arity) -> Parser<Samples> {
    ParserBuilder::new()
        .multi(
            Multi::new("numbers", |s: &mut Samples, v| s.numbers = v)
                .alias("n")
                .values(arity)
                .split_values(),
        )
        .build()
        .unwrap()
}

#[test]
fn value_delimiters_explode_into_logical_values() {
    let outcome = samples_parser(Arity::one_or_more()).parse(["-n", "28;7;3|6"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.numbers, vec![28, 7, 3, 6]);
}

#[rstest]
#[case(&["-n", "1", "2"], true)]
#[case(&["-n", "1", "2", "3"], true)]
#[case(&["-n", "1", "2", "3", "4"], true)]
fn bounded_value_arity_accepts_counts_in_range(#[case] args: &[&str], #[case] valid: bool) {
    let outcome = samples_parser(Arity::between(2, 4).unwrap()).parse(args.iter().copied());
    assert_eq!(outcome.is_valid(), valid);
}

#[test]
fn too_few_values_is_very_few_value() {
    let outcome = samples_parser(Arity::between(2, 4).unwrap()).parse(["-n", "1"]);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.errors[0].code, ErrorCode::VeryFewValue);
}

#[test]
fn too_many_values_is_too_many_value() {
    let outcome = samples_parser(Arity::between(2, 4).unwrap()).parse(["-n", "1", "2", "3", "4", "5"]);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.errors[0].code, ErrorCode::TooManyValue);
}

#[test]
fn absent_bounded_option_owes_no_values() {
    let outcome = samples_parser(Arity::between(2, 4).unwrap()).parse(Vec::<String>::new());
    assert!(outcome.is_valid());
    assert!(outcome.value.numbers.is_empty());
}

#[derive(Debug, Default)]
struct Tool {
    verbose: usize,
    dry_run: bool,
    output: String,
    inputs: Vec<String>,
    install: bool,
}

fn tool_parser() -> Parser<Tool> {
    ParserBuilder::new()
        .counter(Counter::new("verbose", |t: &mut Tool, n| t.verbose = n).alias("v"))
        .switch(Switch::new("dry_run", |t: &mut Tool, v| t.dry_run = v).alias("dry-run"))
        .scalar(
            Scalar::new("output", |t: &mut Tool, v| t.output = v)
                .aliases(["o", "output"])
                .allowed(["text".to_string(), "json".to_string()])
                .default_value("text".to_string()),
        )
        .command(Command::new("install", |t: &mut Tool, v| t.install = v).token("install").token("i"))
        .free_values(FreeValues::new("inputs", |t: &mut Tool, v| t.inputs = v))
        .build()
        .unwrap()
}

#[test]
fn counter_binds_the_occurrence_count() {
    let outcome = tool_parser().parse(["-v", "-v", "-v"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.verbose, 3);
}

#[test]
fn command_tokens_match_bare_verbs() {
    let outcome = tool_parser().parse(["install", "a.txt", "b.txt"]);
    assert!(outcome.is_valid());
    assert!(outcome.value.install);
    assert_eq!(outcome.value.inputs, vec!["a.txt", "b.txt"]);
}

#[test]
fn command_abbreviation_matches_too() {
    let outcome = tool_parser().parse(["i"]);
    assert!(outcome.is_valid());
    assert!(outcome.value.install);
}

#[test]
fn value_outside_allowed_set_is_rejected() {
    let outcome = tool_parser().parse(["--output", "yaml"]);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.errors[0].code, ErrorCode::ValueMustBeOneOf);
    assert!(outcome.errors[0].message.contains("json"));
}

#[test]
fn free_values_collect_after_the_separator() {
    let outcome = tool_parser().parse(["--", "-v", "--output"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.inputs, vec!["-v", "--output"]);
    assert_eq!(outcome.value.verbose, 0);
}

#[test]
fn slash_paths_are_free_values_under_default_rules() {
    let outcome = tool_parser().parse(["install", "/etc/hosts"]);
    assert!(outcome.is_valid());
    assert!(outcome.value.install);
    assert_eq!(outcome.value.inputs, vec!["/etc/hosts"]);
}

#[test]
fn dash_tokens_are_free_values_under_slash_only_rules() {
    #[derive(Debug, Default)]
    struct Cfg {
        inputs: Vec<String>,
    }
    let settings = argot::Settings {
        prefix_rules: argot::PrefixRules::FORWARD_SLASH,
        ..argot::Settings::default()
    };
    let parser: Parser<Cfg> = ParserBuilder::with_settings(settings)
        .free_values(FreeValues::new("inputs", |c: &mut Cfg, v| c.inputs = v))
        .build()
        .unwrap();
    let outcome = parser.parse(["-x"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.inputs, vec!["-x"]);
}

#[test]
fn unknown_prefixed_token_reports_its_prefix_family() {
    let outcome = tool_parser().parse(["--nope"]);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.errors[0].code, ErrorCode::UnknownDoubleDashToken);
}

#[test]
fn predicate_failures_are_coded() {
    #[derive(Debug, Default)]
    struct Cfg {
        port: u16,
    }
    let parser: Parser<Cfg> = ParserBuilder::new()
        .scalar(
            Scalar::new("port", |c: &mut Cfg, v| c.port = v)
                .alias("p")
                .predicate(|port: &u16| *port >= 1024),
        )
        .build()
        .unwrap();
    let outcome = parser.parse(["-p", "80"]);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.errors[0].code, ErrorCode::PredicateFailure);

    let outcome = parser.parse(["-p", "8080"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.port, 8080);
}

#[test]
fn exclusive_option_must_appear_alone() {
    #[derive(Debug, Default)]
    struct Cfg {
        version: bool,
        verbose: bool,
    }
    let parser: Parser<Cfg> = ParserBuilder::new()
        .switch(Switch::new("version", |c: &mut Cfg, v| c.version = v).exclusive())
        .switch(Switch::new("verbose", |c: &mut Cfg, v| c.verbose = v))
        .build()
        .unwrap();

    let outcome = parser.parse(["--version", "--verbose"]);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.errors[0].code, ErrorCode::InvalidSingleOptionUsage);

    let outcome = parser.parse(["--version"]);
    assert!(outcome.is_valid());
    assert!(outcome.value.version);
}

#[test]
fn required_option_missing_is_very_few_option() {
    #[derive(Debug, Default)]
    struct Cfg {
        input: String,
    }
    let parser: Parser<Cfg> = ParserBuilder::new()
        .scalar(Scalar::new("input", |c: &mut Cfg, v| c.input = v).alias("i").required())
        .build()
        .unwrap();
    let outcome = parser.parse(Vec::<String>::new());
    assert!(!outcome.is_valid());
    assert_eq!(outcome.errors[0].code, ErrorCode::VeryFewOption);
}

#[test]
fn custom_converter_overrides_the_default() {
    #[derive(Debug, Default)]
    struct Cfg {
        percent: f64,
    }
    let parser: Parser<Cfg> = ParserBuilder::new()
        .scalar(
            Scalar::custom("percent", |c: &mut Cfg, v| c.percent = v)
                .alias("p")
                .converter(|raw| {
                    raw.trim_end_matches('%')
                        .parse::<f64>()
                        .map(|v| v / 100.0)
                        .map_err(|e| e.to_string())
                }),
        )
        .build()
        .unwrap();
    let outcome = parser.parse(["-p", "75%"]);
    assert!(outcome.is_valid());
    assert_eq!(outcome.value.percent, 0.75);
}

#[test]
fn oversized_duration_value_is_a_parse_error() {
    #[derive(Debug, Default)]
    struct Cfg {
        timeout: std::time::Duration,
    }
    let parser: Parser<Cfg> = ParserBuilder::new()
        .scalar(Scalar::new("timeout", |c: &mut Cfg, v| c.timeout = v).alias("t"))
        .build()
        .unwrap();
    let outcome = parser.parse(["-t", "1e300"]);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.errors[0].code, ErrorCode::InvalidOptionValue);
}

#[test]
fn report_serializes_for_presentation_layers() {
    let outcome = calc_parser().parse(["--left", "five"]);
    let report = serde_json::to_value(outcome.report()).unwrap();
    assert_eq!(report["valid"], serde_json::json!(false));
    assert_eq!(report["help_requested"], serde_json::json!(false));
    assert_eq!(report["errors"][0]["code"], serde_json::json!("InvalidOptionValue"));
    assert_eq!(report["errors"][0]["option"], serde_json::json!("left"));
}

#[test]
fn built_parser_is_shareable_across_threads() {
    fn assert_sync<S: Send + Sync>(_: &S) {}
    let parser = calc_parser();
    assert_sync(&parser);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let outcome = parser.parse(["--left", "5", "--right", "3"]);
                assert!(outcome.is_valid());
            });
        }
    });
}
