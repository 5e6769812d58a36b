//! Property tests for policy-independent behaviour

use partial_format::{combine, Args, Formatter, DEFAULT, GLOB, PARTIAL, REGEX};
use proptest::prelude::*;

const NAMES: [&str; 4] = ["alpha", "beta", "run", "id"];

// -- Strategy helpers --

fn arb_suffix() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(""),
        Just(":>6"),
        Just(":^5"),
        Just(":s"),
        Just("!s"),
        Just("!r:<12"),
    ]
}

/// Templates over `NAMES` with brace-free literal text.
fn arb_template() -> impl Strategy<Value = String> {
    prop::collection::vec(("[a-z _./-]{0,6}", 0..NAMES.len(), arb_suffix()), 0..6).prop_map(
        |parts| {
            parts
                .into_iter()
                .map(|(literal, name, suffix)| format!("{}{{{}{}}}", literal, NAMES[name], suffix))
                .collect()
        },
    )
}

fn arb_values() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9]{0,8}", NAMES.len())
}

fn bind(values: &[String], keep: impl Fn(usize) -> bool) -> Args {
    NAMES
        .iter()
        .zip(values)
        .enumerate()
        .filter(|(i, _)| keep(*i))
        .fold(Args::new(), |args, (_, (name, value))| {
            args.kwarg(*name, value.as_str())
        })
}

proptest! {
    /// With every field bound, no policy changes the output.
    #[test]
    fn fully_bound_output_is_policy_independent(
        template in arb_template(),
        values in arb_values(),
    ) {
        let args = bind(&values, |_| true);
        let expected = Formatter::new().format(&template, &args).unwrap();
        for formatter in [&*PARTIAL, &*GLOB, &*DEFAULT, &*REGEX] {
            prop_assert_eq!(&formatter.format(&template, &args).unwrap(), &expected);
        }
        let all = combine([Formatter::regex(), Formatter::defaults(), Formatter::glob(), Formatter::partial()]);
        prop_assert_eq!(all.format(&template, &args).unwrap(), expected);
    }

    /// Filling in two passes equals filling in one.
    #[test]
    fn two_pass_partial_matches_direct(
        template in arb_template(),
        values in arb_values(),
        mask in prop::collection::vec(any::<bool>(), NAMES.len()),
    ) {
        let first = bind(&values, |i| mask[i]);
        let second = bind(&values, |i| !mask[i]);

        let staged = PARTIAL.format(&template, &first).unwrap();
        let done = PARTIAL.format(&staged, &second).unwrap();
        let direct = Formatter::new().format(&template, &bind(&values, |_| true)).unwrap();
        prop_assert_eq!(done, direct);
    }

    /// Pass-through with nothing bound leaves the template unchanged.
    #[test]
    fn partial_with_no_args_is_identity(template in arb_template()) {
        prop_assert_eq!(PARTIAL.format(&template, &Args::new()).unwrap(), template);
    }

    /// Nothing bound under glob leaves no field syntax behind.
    #[test]
    fn glob_with_no_args_leaves_no_braces(template in arb_template()) {
        let pattern = GLOB.format(&template, &Args::new()).unwrap();
        prop_assert!(
            !pattern.contains(['{', '}']),
            "left field syntax: {:?}",
            pattern
        );
    }
}
