// tests/interpolation_props.rs

use asr_runner::engine::{interpolate, Vars};
use proptest::prelude::*;

fn vars_strategy() -> impl Strategy<Value = Vars> {
    (".*", ".*", ".*", ".*").prop_map(|(target, result, parent_result, outdir)| Vars {
        target,
        result,
        parent_result,
        outdir,
    })
}

proptest! {
    #[test]
    fn text_without_braces_is_untouched(template in "[^{]*", vars in vars_strategy()) {
        prop_assert_eq!(interpolate(&template, &vars), template);
    }

    #[test]
    fn each_token_is_replaced_in_place(
        prefix in "[^{]*",
        suffix in "[^{]*",
        vars in vars_strategy(),
    ) {
        let cases = [
            ("{target}", vars.target.clone()),
            ("{result}", vars.result.clone()),
            ("{parent_result}", vars.parent_result.clone()),
            ("{outdir}", vars.outdir.clone()),
        ];
        for (token, value) in cases {
            let template = format!("{prefix}{token}{suffix}");
            prop_assert_eq!(interpolate(&template, &vars), format!("{prefix}{value}{suffix}"));
        }
    }

    #[test]
    fn substituted_values_are_never_rescanned(vars in vars_strategy()) {
        let template = "{target}|{result}|{parent_result}|{outdir}";
        let expected = format!("{}|{}|{}|{}", vars.target, vars.result, vars.parent_result, vars.outdir);
        prop_assert_eq!(interpolate(template, &vars), expected);
    }
}

#[test]
fn placeholder_looking_values_are_inserted_literally() {
    let vars = Vars {
        target: "{result}".into(),
        result: "r".into(),
        parent_result: String::new(),
        outdir: "o".into(),
    };
    assert_eq!(interpolate("x {target} {result}", &vars), "x {result} r");
}

#[test]
fn unknown_and_unbalanced_braces_pass_through() {
    let vars = Vars {
        target: "t".into(),
        ..Vars::default()
    };
    assert_eq!(interpolate("{TARGET} {foo} { {target", &vars), "{TARGET} {foo} { {target");
    assert_eq!(interpolate("awk '{print $1}' {target}", &vars), "awk '{print $1}' t");
    assert_eq!(interpolate("{{target}}", &vars), "{t}");
}
