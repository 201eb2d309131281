//! npm-style version range expressions.
//!
//! A range expression is a string such as `^1.2.3`, `>=1.0.0 <2.0.0`,
//! `1.2.x` or `1.0.0 || 2.0.0`. Alternatives joined with `||` are ORed,
//! whitespace-separated terms within an alternative are ANDed, and
//! `a - b` denotes an inclusive hyphen range. Construction never fails:
//! terms that do not match any known form fail closed and satisfy no
//! version.

use std::fmt;

use super::Version;

/// Parsed version range expression
#[derive(Debug, Clone)]
pub struct VersionRange {
    expr: String,
    // OR over AND-joined terms
    clauses: Vec<Vec<Term>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Term {
    /// `*` or empty: matches anything
    Any,
    /// Bare version string: exact triple equality
    Exact(Version),
    /// `^x.y.z`: pins the leftmost nonzero component
    Caret(Version),
    /// `~x.y.z` / `~x.y` / `~x`: only the lowest specified component may increase
    Tilde { base: Version, parts: usize },
    /// `>`, `>=`, `<`, `<=` against a bound
    Cmp(CmpOp, Version),
    /// `a - b`: inclusive on both ends
    Hyphen(Version, Version),
    /// `1.2.x` / `1.x` / `1.*`: fixed leading components
    Wildcard { major: Option<u64>, minor: Option<u64> },
    /// Unrecognized input: satisfies nothing
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Greater,
    GreaterEq,
    Less,
    LessEq,
}

impl VersionRange {
    /// Parse a range expression. Never fails; unrecognized terms fail closed.
    pub fn parse(expr: &str) -> Self {
        let clauses = expr
            .split("||")
            .map(|alt| {
                let alt = alt.trim();
                if alt.is_empty() {
                    return vec![Term::Any];
                }
                // Hyphen ranges contain spaces, so recognize them before
                // splitting the alternative into AND terms.
                if let Some((lo, hi)) = alt.split_once(" - ") {
                    return vec![Term::parse_hyphen(lo.trim(), hi.trim())];
                }
                alt.split_whitespace().map(Term::parse).collect()
            })
            .collect();

        Self {
            expr: expr.to_string(),
            clauses,
        }
    }

    /// The raw expression this range was constructed from
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Check whether a version satisfies this range
    pub fn matches(&self, version: &Version) -> bool {
        self.clauses
            .iter()
            .any(|terms| terms.iter().all(|term| term.matches(version)))
    }

    /// Select the highest candidate satisfying this range
    pub fn select_best(&self, candidates: &[Version]) -> Option<Version> {
        candidates
            .iter()
            .filter(|v| self.matches(v))
            .max()
            .cloned()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

impl Term {
    fn parse(term: &str) -> Self {
        if term.is_empty() || term == "*" {
            return Term::Any;
        }

        if let Some(stripped) = term.strip_prefix('^') {
            return match stripped.parse() {
                Ok(version) => Term::Caret(version),
                Err(_) => Term::Never,
            };
        }

        if let Some(stripped) = term.strip_prefix('~') {
            let core = stripped.split('-').next().unwrap_or(stripped);
            let parts = core.split('.').count();
            return match stripped.parse() {
                Ok(base) if (1..=3).contains(&parts) => Term::Tilde { base, parts },
                _ => Term::Never,
            };
        }

        for (prefix, op) in [
            (">=", CmpOp::GreaterEq),
            ("<=", CmpOp::LessEq),
            (">", CmpOp::Greater),
            ("<", CmpOp::Less),
        ] {
            if let Some(stripped) = term.strip_prefix(prefix) {
                return match stripped.trim().parse() {
                    Ok(version) => Term::Cmp(op, version),
                    Err(_) => Term::Never,
                };
            }
        }

        if Self::has_wildcard_component(term) {
            return Self::parse_wildcard(term);
        }

        match term.parse() {
            Ok(version) => Term::Exact(version),
            Err(_) => Term::Never,
        }
    }

    fn parse_hyphen(lo: &str, hi: &str) -> Self {
        match (lo.parse(), hi.parse()) {
            (Ok(lo), Ok(hi)) => Term::Hyphen(lo, hi),
            _ => Term::Never,
        }
    }

    fn has_wildcard_component(term: &str) -> bool {
        term.split('.')
            .any(|part| matches!(part, "x" | "X" | "*"))
    }

    fn parse_wildcard(term: &str) -> Self {
        let mut fixed = Vec::new();
        for part in term.split('.') {
            if matches!(part, "x" | "X" | "*") {
                break;
            }
            match part.parse::<u64>() {
                Ok(n) => fixed.push(n),
                Err(_) => return Term::Never,
            }
        }

        match fixed.as_slice() {
            [] => Term::Any,
            [major] => Term::Wildcard {
                major: Some(*major),
                minor: None,
            },
            [major, minor] => Term::Wildcard {
                major: Some(*major),
                minor: Some(*minor),
            },
            _ => Term::Never,
        }
    }

    fn matches(&self, v: &Version) -> bool {
        match self {
            Term::Any => true,
            Term::Exact(base) => v == base,
            Term::Caret(base) => Self::matches_caret(base, v),
            Term::Tilde { base, parts } => Self::matches_tilde(base, *parts, v),
            Term::Cmp(op, bound) => match op {
                CmpOp::Greater => v > bound,
                CmpOp::GreaterEq => v >= bound,
                CmpOp::Less => v < bound,
                CmpOp::LessEq => v <= bound,
            },
            Term::Hyphen(lo, hi) => v >= lo && v <= hi,
            Term::Wildcard { major, minor } => {
                major.map_or(true, |m| v.major == m) && minor.map_or(true, |m| v.minor == m)
            },
            Term::Never => false,
        }
    }

    /// Caret pins the leftmost nonzero component of the base version.
    fn matches_caret(base: &Version, v: &Version) -> bool {
        if v < base {
            return false;
        }
        if base.major == 0 && base.minor == 0 {
            // Only an exact patch match is allowed
            v.major == 0 && v.minor == 0 && v.patch == base.patch
        } else if base.major == 0 {
            v.major == 0 && v.minor == base.minor
        } else {
            v.major == base.major
        }
    }

    /// Tilde holds the higher components fixed and lets the lowest
    /// specified one increase.
    fn matches_tilde(base: &Version, parts: usize, v: &Version) -> bool {
        match parts {
            3 => v.major == base.major && v.minor == base.minor && v.patch >= base.patch,
            2 => v.major == base.major && v.minor >= base.minor,
            1 => v.major >= base.major,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_wildcard_and_empty_match_anything() {
        for expr in ["*", "", "  "] {
            let range = VersionRange::parse(expr);
            assert!(range.matches(&v("0.0.1")), "{:?}", expr);
            assert!(range.matches(&v("999.999.999")), "{:?}", expr);
        }
    }

    #[test]
    fn test_caret_range() {
        let range = VersionRange::parse("^1.2.3");
        assert!(range.matches(&v("1.2.3")));
        assert!(range.matches(&v("1.9.9")));
        assert!(!range.matches(&v("2.0.0")));
        assert!(!range.matches(&v("1.2.2")));
        assert!(!range.matches(&v("0.9.9")));
    }

    #[test]
    fn test_caret_pins_leftmost_nonzero() {
        // major 0: minor must match exactly
        let range = VersionRange::parse("^0.2.3");
        assert!(range.matches(&v("0.2.9")));
        assert!(!range.matches(&v("0.3.0")));
        assert!(!range.matches(&v("1.0.0")));

        // major 0, minor 0: only exact patch match
        let range = VersionRange::parse("^0.0.3");
        assert!(range.matches(&v("0.0.3")));
        assert!(!range.matches(&v("0.0.4")));
    }

    #[test]
    fn test_tilde_range() {
        let range = VersionRange::parse("~1.2.3");
        assert!(range.matches(&v("1.2.3")));
        assert!(range.matches(&v("1.2.9")));
        assert!(!range.matches(&v("1.3.0")));
        assert!(!range.matches(&v("1.2.2")));

        let range = VersionRange::parse("~1.2");
        assert!(range.matches(&v("1.2.0")));
        assert!(range.matches(&v("1.9.0")));
        assert!(!range.matches(&v("2.0.0")));

        let range = VersionRange::parse("~1");
        assert!(range.matches(&v("1.0.0")));
        assert!(range.matches(&v("5.0.0")));
        assert!(!range.matches(&v("0.9.0")));
    }

    #[test]
    fn test_comparison_terms() {
        let range = VersionRange::parse(">=1.0.0 <2.0.0");
        assert!(range.matches(&v("1.5.0")));
        assert!(range.matches(&v("1.0.0")));
        assert!(!range.matches(&v("2.0.0")));
        assert!(!range.matches(&v("0.9.0")));

        let range = VersionRange::parse(">1.0.0");
        assert!(!range.matches(&v("1.0.0")));
        assert!(range.matches(&v("1.0.1")));

        let range = VersionRange::parse("<=1.0.0");
        assert!(range.matches(&v("1.0.0")));
        assert!(!range.matches(&v("1.0.1")));
    }

    #[test]
    fn test_or_alternatives() {
        let range = VersionRange::parse("1.0.0 || 2.0.0");
        assert!(range.matches(&v("1.0.0")));
        assert!(range.matches(&v("2.0.0")));
        assert!(!range.matches(&v("1.5.0")));
    }

    #[test]
    fn test_hyphen_range() {
        let range = VersionRange::parse("1.2.0 - 2.3.4");
        assert!(range.matches(&v("1.2.0")));
        assert!(range.matches(&v("2.0.0")));
        assert!(range.matches(&v("2.3.4")));
        assert!(!range.matches(&v("1.1.9")));
        assert!(!range.matches(&v("2.3.5")));
    }

    #[test]
    fn test_dotted_wildcard() {
        let range = VersionRange::parse("1.2.x");
        assert!(range.matches(&v("1.2.0")));
        assert!(range.matches(&v("1.2.99")));
        assert!(!range.matches(&v("1.3.0")));

        let range = VersionRange::parse("1.x");
        assert!(range.matches(&v("1.0.0")));
        assert!(range.matches(&v("1.9.9")));
        assert!(!range.matches(&v("2.0.0")));

        let range = VersionRange::parse("1.*");
        assert!(range.matches(&v("1.4.2")));
        assert!(!range.matches(&v("0.4.2")));
    }

    #[test]
    fn test_exact_version() {
        let range = VersionRange::parse("1.2.3");
        assert!(range.matches(&v("1.2.3")));
        assert!(!range.matches(&v("1.2.4")));
    }

    #[test]
    fn test_unrecognized_fails_closed() {
        for expr in ["banana", "^x.y.z", ">=a.b.c", "1.2.3.4.5"] {
            let range = VersionRange::parse(expr);
            assert!(!range.matches(&v("1.2.3")), "{:?} should fail closed", expr);
        }
    }

    #[test]
    fn test_select_best() {
        let candidates: Vec<Version> = ["1.0.0", "1.2.0", "1.9.9", "2.0.0"]
            .iter()
            .map(|s| v(s))
            .collect();

        let range = VersionRange::parse("^1.0.0");
        assert_eq!(range.select_best(&candidates), Some(v("1.9.9")));

        let range = VersionRange::parse("^3.0.0");
        assert_eq!(range.select_best(&candidates), None);

        let range = VersionRange::parse("*");
        assert_eq!(range.select_best(&candidates), Some(v("2.0.0")));
    }

    #[test]
    fn test_compound_and_with_or() {
        let range = VersionRange::parse(">=1.0.0 <2.0.0 || ^3.0.0");
        assert!(range.matches(&v("1.5.0")));
        assert!(range.matches(&v("3.2.0")));
        assert!(!range.matches(&v("2.5.0")));
    }
}
