//! Environment predicate evaluation.
//!
//! Decides whether a manifest entry applies to the current interpreter
//! version and operating-system family. Pure and deterministic: the
//! entire behavior is a function of (entry fields, context).

/// The environment a manifest is being synchronized against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvContext {
    /// Interpreter version at `major.minor` granularity, e.g. `"3.11"`.
    pub python: String,
    /// OS family token, `"posix"` or `"nt"`.
    pub system: String,
}

impl EnvContext {
    pub fn new(python: impl Into<String>, system: impl Into<String>) -> Self {
        EnvContext {
            python: truncate_to_major_minor(&python.into()),
            system: system.into(),
        }
    }
}

/// Reduces a full interpreter version (`"3.11.4"`) to `"3.11"`.
pub fn truncate_to_major_minor(version: &str) -> String {
    let mut parts = version.trim().splitn(3, '.');
    match (parts.next(), parts.next()) {
        (Some(major), Some(minor)) => format!("{}.{}", major, minor),
        (Some(major), None) => major.to_string(),
        _ => String::new(),
    }
}

/// Evaluates a manifest entry's environment predicates.
///
/// `python` and `system` hold comma-separated exclusive tokens; an absent
/// field is a universal wildcard. Both conditions are ANDed. Interpreter
/// tokens match exactly at `major.minor` granularity; OS tokens match the
/// family name exactly.
pub fn applies(python: Option<&str>, system: Option<&str>, env: &EnvContext) -> bool {
    let python_ok = match python {
        Some(tokens) => token_match(tokens, &env.python),
        None => true,
    };
    let system_ok = match system {
        Some(tokens) => token_match(tokens, &env.system),
        None => true,
    };
    python_ok && system_ok
}

fn token_match(tokens: &str, value: &str) -> bool {
    tokens.split(',').any(|token| token.trim() == value)
}
