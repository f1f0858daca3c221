//! PEP-440-style specifier sets.
//!
//! A specifier set is a comma-separated list of clauses evaluated
//! conjunctively, e.g. `>=1.0,!=1.5,<2.0`. A bare version is shorthand
//! for exact equality; `*` wildcards are prefix matches and only valid
//! with the equality operators.

use std::fmt;

use crate::error::PipitError;
use crate::version::Version;

/// Comparison operator of a single specifier clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    /// `~=`, the compatible-release operator.
    Compatible,
}

impl Operator {
    fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Compatible => "~=",
        }
    }
}

/// A single comparison clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Specifier {
    op: Operator,
    version: Version,
    /// Trailing `.*` on an equality clause (prefix match).
    wildcard: bool,
}

impl Specifier {
    fn parse(clause: &str, input: &str) -> Result<Specifier, PipitError> {
        let clause = clause.trim();
        if clause.is_empty() {
            return Err(PipitError::InvalidVersionFormat(input.to_string()));
        }
        if clause.starts_with("===") {
            return Err(PipitError::UnsupportedOperator {
                operator: "===".to_string(),
                input: input.to_string(),
            });
        }

        // Longest operators first so `>=` is not read as `>`.
        const OPERATORS: [(&str, Operator); 7] = [
            ("==", Operator::Eq),
            ("!=", Operator::Ne),
            (">=", Operator::Ge),
            ("<=", Operator::Le),
            ("~=", Operator::Compatible),
            (">", Operator::Gt),
            ("<", Operator::Lt),
        ];
        let (op, rest) = OPERATORS
            .iter()
            .find_map(|(prefix, op)| clause.strip_prefix(prefix).map(|rest| (*op, rest)))
            // No operator: a bare version means exact equality.
            .unwrap_or((Operator::Eq, clause));

        let rest = rest.trim();
        let (version_str, wildcard) = match rest.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (rest, false),
        };

        if wildcard && !matches!(op, Operator::Eq | Operator::Ne) {
            return Err(PipitError::InvalidVersionFormat(input.to_string()));
        }

        let version = Version::parse(version_str)
            .map_err(|_| PipitError::InvalidVersionFormat(input.to_string()))?;

        if op == Operator::Compatible && version.release().len() < 2 {
            // `~=1` is meaningless: there is no release prefix to hold.
            return Err(PipitError::InvalidVersionFormat(input.to_string()));
        }

        Ok(Specifier {
            op,
            version,
            wildcard,
        })
    }

    /// Evaluates this clause against a concrete version.
    pub fn matches(&self, candidate: &Version) -> bool {
        match self.op {
            Operator::Eq if self.wildcard => candidate.release_starts_with(self.version.release()),
            Operator::Ne if self.wildcard => !candidate.release_starts_with(self.version.release()),
            Operator::Eq => candidate == &self.version,
            Operator::Ne => candidate != &self.version,
            Operator::Ge => candidate >= &self.version,
            Operator::Le => candidate <= &self.version,
            Operator::Gt => candidate > &self.version,
            Operator::Lt => candidate < &self.version,
            Operator::Compatible => {
                let release = self.version.release();
                let prefix = &release[..release.len() - 1];
                candidate >= &self.version && candidate.release_starts_with(prefix)
            }
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)?;
        if self.wildcard {
            write!(f, ".*")?;
        }
        Ok(())
    }
}

/// A conjunction of specifier clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
}

impl SpecifierSet {
    /// Parses a comma-separated specifier set.
    pub fn parse(input: &str) -> Result<SpecifierSet, PipitError> {
        let specifiers = input
            .split(',')
            .map(|clause| Specifier::parse(clause, input))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SpecifierSet { specifiers })
    }

    /// Evaluates all clauses conjunctively.
    pub fn matches(&self, candidate: &Version) -> bool {
        self.specifiers.iter().all(|spec| spec.matches(candidate))
    }

    /// Whether an installed version string satisfies the set.
    ///
    /// An installed version that does not parse never satisfies anything,
    /// so it surfaces as an action instead of being silently kept.
    pub fn is_satisfied_by(&self, installed: &str) -> bool {
        match Version::parse(installed) {
            Ok(version) => self.matches(&version),
            Err(_) => false,
        }
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .specifiers
            .iter()
            .map(|spec| spec.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(s: &str) -> SpecifierSet {
        SpecifierSet::parse(s).unwrap()
    }

    fn ver(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_single_comparisons() {
        assert!(set(">=1.0").matches(&ver("1.0")));
        assert!(set(">=1.0").matches(&ver("2.3")));
        assert!(!set(">=1.0").matches(&ver("0.9")));
        assert!(set("<2.0").matches(&ver("1.9.9")));
        assert!(!set("<2.0").matches(&ver("2.0")));
        assert!(set("!=1.5").matches(&ver("1.4")));
        assert!(!set("!=1.5").matches(&ver("1.5")));
    }

    #[test]
    fn test_clauses_are_anded() {
        let range = set(">=1.0,<2.0");
        assert!(range.matches(&ver("1.0")));
        assert!(range.matches(&ver("1.9")));
        assert!(!range.matches(&ver("2.0")));
        assert!(!range.matches(&ver("0.9")));

        let punctured = set(">=1.0,!=1.5,<2.0");
        assert!(punctured.matches(&ver("1.4")));
        assert!(!punctured.matches(&ver("1.5")));
    }

    #[test]
    fn test_bare_version_is_exact() {
        assert!(set("1.2.3").matches(&ver("1.2.3")));
        assert!(!set("1.2.3").matches(&ver("1.2.4")));
    }

    #[test]
    fn test_wildcard_prefix_match() {
        let minor = set("==1.4.*");
        assert!(minor.matches(&ver("1.4")));
        assert!(minor.matches(&ver("1.4.7")));
        assert!(!minor.matches(&ver("1.5.0")));
        assert!(!minor.matches(&ver("1.40.0")));

        let excluded = set("!=1.4.*");
        assert!(!excluded.matches(&ver("1.4.7")));
        assert!(excluded.matches(&ver("1.5.0")));
    }

    #[test]
    fn test_wildcard_only_with_equality() {
        assert!(matches!(
            SpecifierSet::parse(">=1.4.*"),
            Err(PipitError::InvalidVersionFormat(_))
        ));
        assert!(matches!(
            SpecifierSet::parse("<1.*"),
            Err(PipitError::InvalidVersionFormat(_))
        ));
    }

    #[test]
    fn test_compatible_release() {
        let patch = set("~=1.4.2");
        assert!(patch.matches(&ver("1.4.2")));
        assert!(patch.matches(&ver("1.4.9")));
        assert!(!patch.matches(&ver("1.5.0")));
        assert!(!patch.matches(&ver("1.4.1")));

        let minor = set("~=1.4");
        assert!(minor.matches(&ver("1.4")));
        assert!(minor.matches(&ver("1.9")));
        assert!(!minor.matches(&ver("2.0")));
    }

    #[test]
    fn test_compatible_release_needs_two_segments() {
        assert!(matches!(
            SpecifierSet::parse("~=1"),
            Err(PipitError::InvalidVersionFormat(_))
        ));
    }

    #[test]
    fn test_arbitrary_equality_is_unsupported() {
        match SpecifierSet::parse("===1.0") {
            Err(PipitError::UnsupportedOperator { operator, input }) => {
                assert_eq!(operator, "===");
                assert_eq!(input, "===1.0");
            }
            other => panic!("expected UnsupportedOperator, got {:?}", other),
        }
        // Even buried in an otherwise valid set.
        assert!(matches!(
            SpecifierSet::parse(">=1.0,===1.5"),
            Err(PipitError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn test_invalid_clauses() {
        assert!(SpecifierSet::parse("").is_err());
        assert!(SpecifierSet::parse(">=1.0,").is_err());
        assert!(SpecifierSet::parse(">~1.0").is_err());
        assert!(SpecifierSet::parse("==abc").is_err());
    }

    #[test]
    fn test_prerelease_ordering_in_ranges() {
        assert!(set(">=1.0").matches(&ver("1.0.post1")));
        assert!(!set(">=1.0").matches(&ver("1.0rc1")));
        assert!(set("<1.0").matches(&ver("1.0rc1")));
    }

    #[test]
    fn test_display_canonical_form() {
        assert_eq!(set(">= 1.0 , < 2.0").to_string(), ">=1.0,<2.0");
        assert_eq!(set("1.2.3").to_string(), "==1.2.3");
        assert_eq!(set("==1.4.*").to_string(), "==1.4.*");
        assert_eq!(set("~=1.4.2").to_string(), "~=1.4.2");
    }

    #[test]
    fn test_is_satisfied_by_unparseable_installed_version() {
        assert!(!set(">=1.0").is_satisfied_by("not-a-version"));
        assert!(set(">=1.0").is_satisfied_by("1.2"));
    }
}
