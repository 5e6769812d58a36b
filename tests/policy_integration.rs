//! Integration tests for the missing-field policies
//!
//! Covers the documented behaviour of each named formatter:
//! - partial: missing fields are re-emitted as written
//! - glob: missing fields become `*`
//! - default: `key._[default]` fallbacks
//! - regex: `/pattern/` validation
//! - combined formatters and multi-pass filling

use partial_format::{
    combine, dformat, gformat, pformat, reformat, Args, FormatError, Formatter, LookupErrorKind,
    DEFAULT, GLOB, PARTIAL, REGEX,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("partial_format=trace")
        .with_test_writer()
        .try_init();
}

// =========================================================================
// PARTIAL
// =========================================================================

#[test]
fn partial_keeps_missing_keyword_fields() {
    init_tracing();
    let args = Args::new().kwarg("e", "eee");
    assert_eq!(pformat("{a}/b/{c}/d/{e}", &args).unwrap(), "{a}/b/{c}/d/eee");
}

#[test]
fn partial_preserves_conversion_and_spec() {
    let args = Args::new().kwarg("e", "eee");
    assert_eq!(
        pformat("{a:s}/b/{c!s:s}/d/{e}", &args).unwrap(),
        "{a:s}/b/{c!s:s}/d/eee"
    );
}

#[test]
fn partial_drops_positional_index() {
    let args = Args::new().arg("aaa").arg("ccc");
    assert_eq!(pformat("{}/b/{}/d/{}", &args).unwrap(), "aaa/b/ccc/d/{}");
    assert_eq!(pformat("{:s}/b/{}/d/{:s}", &args).unwrap(), "aaa/b/ccc/d/{:s}");
    assert_eq!(pformat("{0}/{2}", &args).unwrap(), "aaa/{}");
}

#[test]
fn partial_keeps_dotted_keys_and_nested_specs() {
    let args = Args::new()
        .kwarg("user", json!({"name": "Ada"}))
        .kwarg("w", 8);
    assert_eq!(
        pformat("{user.name}/{user.age:>{w}}/{user[id]}", &args).unwrap(),
        "Ada/{user.age:>8}/{user[id]}"
    );
}

#[test]
fn partial_second_pass_completes() {
    let template = "{param1}_{param2}/{id}/{loss:.2f}.csv";
    let first = pformat(
        template,
        &Args::new().kwarg("param1", "a").kwarg("param2", "b"),
    )
    .unwrap();
    assert_eq!(first, "a_b/{id}/{loss:.2f}.csv");

    let second = pformat(&first, &Args::new().kwarg("id", 3)).unwrap();
    assert_eq!(second, "a_b/3/{loss:.2f}.csv");

    let done = PARTIAL
        .format(&second, &Args::new().kwarg("loss", 1.0 / 3.0))
        .unwrap();
    assert_eq!(done, "a_b/3/0.33.csv");
}

#[test]
fn partial_does_not_swallow_other_errors() {
    let args = Args::new().kwarg("n", 3);
    assert_eq!(
        pformat("{n[0]}", &args).unwrap_err(),
        FormatError::NotSubscriptable { type_name: "integer" }
    );
    assert!(matches!(
        pformat("{a} }", &args).unwrap_err(),
        FormatError::Syntax { .. }
    ));
    assert!(matches!(
        pformat("{n:.2s}", &args).unwrap_err(),
        FormatError::UnknownFormatCode { .. }
    ));
}

// =========================================================================
// GLOB
// =========================================================================

#[test]
fn glob_replaces_missing_with_wildcard() {
    let args = Args::new().arg("aaa").arg("ccc");
    assert_eq!(gformat("{:s}/b/{}/d/{:s}", &args).unwrap(), "aaa/b/ccc/d/*");
}

#[test]
fn glob_bypasses_numeric_spec() {
    let template = "{}/loss_{:.2f}";
    assert_eq!(
        GLOB.format(template, &Args::new().arg("abc").arg(1.0 / 3.0))
            .unwrap(),
        "abc/loss_0.33"
    );
    assert_eq!(
        GLOB.format(template, &Args::new().arg("abc")).unwrap(),
        "abc/loss_*"
    );
}

// =========================================================================
// DEFAULT
// =========================================================================

#[test]
fn default_bound_value_wins() {
    let args = Args::new().arg(1).arg(2).kwarg("blah", 3);
    assert_eq!(
        dformat("{:.2f}/b/{}/d/{blah._[1]:.2f}", &args).unwrap(),
        "1.00/b/2/d/3.00"
    );
}

#[test]
fn default_used_when_missing() {
    let args = Args::new().arg(1).arg(2);
    assert_eq!(
        dformat("{:.2f}/b/{}/d/{blah._[1]:.2f}", &args).unwrap(),
        "1.00/b/2/d/1"
    );
    assert_eq!(
        dformat("{:.2f}/b/2/d/{blah._[None]:.2f}", &args).unwrap(),
        "1.00/b/2/d/None"
    );
    assert_eq!(
        dformat("{:.2f}/b/{}/d/{blah._[---]:.2f}", &args).unwrap(),
        "1.00/b/2/d/---"
    );
}

#[test]
fn default_with_nested_base_key() {
    let args = Args::new().kwarg("run", json!({"loss": 0.125}));
    assert_eq!(
        DEFAULT
            .format("{run.loss._[--]:.1%} {run.acc._[n/a]}", &args)
            .unwrap(),
        "12.5% n/a"
    );
}

#[test]
fn default_without_syntax_raises_original_error() {
    let err = dformat("{name}/loss_{loss:.2f}", &Args::new().kwarg("name", "abc")).unwrap_err();
    assert_eq!(
        err.as_lookup().map(|e| e.kind),
        Some(LookupErrorKind::KeyNotFound)
    );
}

#[test]
fn default_null_value_is_not_missing() {
    let args = Args::new().kwarg("x", json!(null));
    assert_eq!(dformat("{x._[fallback]}", &args).unwrap(), "null");
    assert_eq!(dformat("{x._[fallback]!r}", &Args::new().kwarg("x", "")).unwrap(), "\"\"");
}

// =========================================================================
// REGEX
// =========================================================================

#[test]
fn regex_accepts_matching_value() {
    let args = Args::new().kwarg("i", "3aasdfasdf");
    assert_eq!(reformat(r"{i:/\d[^\d]*/}", &args).unwrap(), "3aasdfasdf");
}

#[test]
fn regex_rejects_non_matching_value() {
    let args = Args::new().kwarg("i", "a3aasdfasdf");
    let err = REGEX.format(r"{i:/\d[^\d]*/}", &args).unwrap_err();
    assert_eq!(
        err.to_string(),
        r"Input (a3aasdfasdf) did not match the regex pattern (/\d[^\d]*/)"
    );
}

#[test]
fn regex_lone_slash_is_empty_pattern() {
    let args = Args::new().kwarg("i", "abc");
    assert_eq!(reformat("{i:/}", &args).unwrap(), "abc");
}

#[test]
fn regex_falls_through_to_ordinary_formatting() {
    let args = Args::new().kwarg("i", 7);
    assert_eq!(reformat("{i:03d}", &args).unwrap(), "007");
}

#[test]
fn regex_does_not_handle_missing_fields() {
    let err = reformat(r"{i:/\d/}", &Args::new()).unwrap_err();
    assert!(err.as_lookup().is_some());
}

// =========================================================================
// COMBINED
// =========================================================================

#[test]
fn combined_default_and_partial() {
    let xformat = combine([Formatter::defaults(), Formatter::partial()]);
    assert_eq!(
        xformat.format("{x._[--]:.2f}{unit}", &Args::new()).unwrap(),
        "--{unit}"
    );
    assert_eq!(
        xformat
            .format("{x._[--]:.2f}{unit}", &Args::new().kwarg("x", 2).kwarg("unit", "m"))
            .unwrap(),
        "2.00m"
    );
}

#[test]
fn combined_default_fills_before_pass_through() {
    // The inline default resolves the field; pass-through never sees it.
    let xformat = combine([Formatter::partial(), Formatter::defaults()]);
    assert_eq!(xformat.format("{a._[z]}{b}", &Args::new()).unwrap(), "z{b}");
}

#[test]
fn combined_regex_and_glob() {
    let xformat = combine([Formatter::regex(), Formatter::glob()]);
    let args = Args::new().kwarg("id", "A12");
    assert_eq!(
        xformat.format("{id:/[A-Z]\\d+/}-{rest:/\\d+/}", &args).unwrap(),
        "A12-*"
    );
    assert!(matches!(
        xformat
            .format("{id:/\\d+/}", &args)
            .unwrap_err(),
        FormatError::PatternMismatch { .. }
    ));
}

#[test]
fn recursion_guard_applies_to_every_policy() {
    for f in [&*PARTIAL, &*GLOB, &*DEFAULT, &*REGEX] {
        let err = f.format("{a:{b:{c}}}", &Args::new()).unwrap_err();
        assert!(
            matches!(err, FormatError::RecursionDepthExceeded { .. }),
            "{:?} gave {:?}",
            f,
            err
        );
    }
}

#[test]
fn deeper_budget_allows_deeper_nesting() {
    let f = Formatter::new().with_max_depth(3);
    let args = Args::new().kwarg("a", 5).kwarg("b", 3).kwarg("c", "");
    assert_eq!(f.format("{a:{b:{c}}}", &args).unwrap(), "  5");
}
