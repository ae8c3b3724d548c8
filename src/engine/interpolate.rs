// src/engine/interpolate.rs

//! Placeholder substitution for command templates.
//!
//! Exactly four tokens are recognised, case-sensitively: `{target}`,
//! `{result}`, `{parent_result}` and `{outdir}`. Anything else, including
//! unknown `{...}` groups, is copied through untouched.

/// Values substituted into a command template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vars {
    pub target: String,
    pub result: String,
    pub parent_result: String,
    pub outdir: String,
}

impl Vars {
    fn lookup(&self, token: &str) -> Option<&str> {
        match token {
            "{target}" => Some(&self.target),
            "{result}" => Some(&self.result),
            "{parent_result}" => Some(&self.parent_result),
            "{outdir}" => Some(&self.outdir),
            _ => None,
        }
    }
}

const TOKENS: [&str; 4] = ["{target}", "{result}", "{parent_result}", "{outdir}"];

/// Replace every placeholder occurrence in `template`.
///
/// The scan is a single left-to-right pass and substituted text is never
/// scanned again, so a value that happens to contain a placeholder token is
/// inserted literally.
pub fn interpolate(template: &str, vars: &Vars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match TOKENS.iter().find(|token| tail.starts_with(**token)) {
            Some(token) => {
                out.push_str(vars.lookup(token).unwrap_or(token));
                rest = &tail[token.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
