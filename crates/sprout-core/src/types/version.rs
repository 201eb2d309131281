//! Semantic version type.
//!
//! Versions follow `major.minor.patch[-prerelease]`. Missing minor and patch
//! components default to zero, so `"1"` and `"1.0.0"` parse to the same
//! version. Ordering and equality compare the numeric triple only; the
//! prerelease tag is carried through parsing and display but does not
//! participate in comparison (`1.0.0` and `1.0.0-beta` compare equal).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SproutError;

/// Semantic version (major.minor.patch-prerelease)
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl Version {
    /// Create a new version without a prerelease tag
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Compare by the numeric (major, minor, patch) triple
    pub fn compare(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl FromStr for Version {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        // Split on '-' for prerelease
        let (core_part, prerelease) = match input.split_once('-') {
            Some((c, p)) if !c.is_empty() && !p.is_empty() => (c, Some(p.to_string())),
            Some(_) => {
                return Err(SproutError::VersionParse {
                    input: input.to_string(),
                })
            },
            None => (input, None),
        };

        // Parse major[.minor[.patch]], missing components default to 0
        let parts: Vec<&str> = core_part.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(SproutError::VersionParse {
                input: input.to_string(),
            });
        }

        let component = |idx: usize| -> Result<u64, SproutError> {
            match parts.get(idx) {
                Some(text) => text.parse().map_err(|_| SproutError::VersionParse {
                    input: input.to_string(),
                }),
                None => Ok(0),
            }
        };

        Ok(Version {
            major: component(0)?,
            minor: component(1)?,
            patch: component(2)?,
            prerelease,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

// Equality and ordering intentionally ignore the prerelease tag.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch).hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let v: Version = "1.2.3".parse().unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
        assert_eq!(v.prerelease, None);
    }

    #[test]
    fn test_missing_components_default_to_zero() {
        let v: Version = "1".parse().unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 0, 0));

        let v: Version = "2.5".parse().unwrap();
        assert_eq!((v.major, v.minor, v.patch), (2, 5, 0));
    }

    #[test]
    fn test_version_with_prerelease() {
        let v: Version = "1.2.3-alpha.1".parse().unwrap();
        assert_eq!(v.prerelease, Some("alpha.1".to_string()));
        assert_eq!(v.to_string(), "1.2.3-alpha.1");
    }

    #[test]
    fn test_invalid_versions() {
        assert!("".parse::<Version>().is_err());
        assert!("a.b.c".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
        assert!("-beta".parse::<Version>().is_err());
    }

    #[test]
    fn test_numeric_not_lexicographic_comparison() {
        let v9: Version = "0.9.0".parse().unwrap();
        let v10: Version = "0.10.0".parse().unwrap();
        assert!(v10 > v9);

        let a: Version = "10.0.0".parse().unwrap();
        let b: Version = "9.0.0".parse().unwrap();
        assert!(a > b);
    }

    #[test]
    fn test_prerelease_ignored_in_comparison() {
        let release: Version = "1.0.0".parse().unwrap();
        let beta: Version = "1.0.0-beta".parse().unwrap();
        assert_eq!(release, beta);
        assert_eq!(release.compare(&beta), Ordering::Equal);
    }

    #[test]
    fn test_version_ordering() {
        let v1 = Version::new(1, 0, 0);
        let v2 = Version::new(2, 0, 0);
        let v3 = Version::new(1, 1, 0);

        assert!(v1 < v2);
        assert!(v1 < v3);
        assert!(v3 < v2);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn version_round_trip(
            major in 0u64..1000,
            minor in 0u64..1000,
            patch in 0u64..1000,
            prerelease in prop::option::of("[a-zA-Z0-9.]{1,12}")
        ) {
            let original = Version {
                major,
                minor,
                patch,
                prerelease: prerelease.clone(),
            };

            let parsed: Version = original.to_string().parse().unwrap();

            prop_assert_eq!(parsed.major, original.major);
            prop_assert_eq!(parsed.minor, original.minor);
            prop_assert_eq!(parsed.patch, original.patch);
            prop_assert_eq!(parsed.prerelease, original.prerelease);
        }
    }

    proptest! {
        #[test]
        fn version_comparison_transitivity(
            a in (0u64..100, 0u64..100, 0u64..100),
            b in (0u64..100, 0u64..100, 0u64..100),
            c in (0u64..100, 0u64..100, 0u64..100),
        ) {
            let a = Version::new(a.0, a.1, a.2);
            let b = Version::new(b.0, b.1, b.2);
            let c = Version::new(c.0, c.1, c.2);

            if a < b && b < c {
                prop_assert!(a < c);
            }
            if a > b && b > c {
                prop_assert!(a > c);
            }
        }
    }
}
