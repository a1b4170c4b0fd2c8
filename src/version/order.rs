//! Ordering and prefix matching for dotted numeric go versions
//!
//! Versions have one to three purely numeric segments (`1`, `1.21`, `1.21.4`).
//! Segments compare as integers, and when every shared segment is equal the
//! version with fewer segments sorts first, so `1.2 < 1.2.4` and `2 < 10`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::version::error::VersionError;

static VALID_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+){0,2}$").unwrap());

/// Number of segments of a full, installable version
const FULL_VERSION_SEGMENTS: usize = 3;

/// One numeric segment, kept as written.
///
/// Segments compare by numeric value without a size limit, so `02 == 2` and
/// `18446744073709551616 > 9`. The original digits are kept for display.
#[derive(Debug, Clone)]
struct Segment {
    digits: String,
}

impl Segment {
    fn zero() -> Self {
        Self {
            digits: "0".to_string(),
        }
    }

    /// Digits without leading zeros, `"0"` for zero
    fn value(&self) -> &str {
        let trimmed = self.digits.trim_start_matches('0');
        if trimmed.is_empty() { "0" } else { trimmed }
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for Segment {}

impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.value(), other.value());
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

/// A validated version with one to three numeric segments
///
/// `Ord` is the version ordering: `Vec` compares lexicographically and treats
/// a strict prefix as smaller, which is exactly the rule for partial versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    segments: Vec<Segment>,
}

impl Version {
    /// Returns true for `major.minor.patch` versions
    pub fn is_full(&self) -> bool {
        self.segments.len() == FULL_VERSION_SEGMENTS
    }

    /// Returns true if every segment of `prefix` equals the segment at the
    /// same position of this version. Segments are compared as numbers, so
    /// `10` does not have the prefix `1`.
    pub fn has_prefix(&self, prefix: &Version) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(p, v)| p == v)
    }

    /// Like [`Version::has_prefix`], where `None` (an empty prefix) matches
    /// every version
    pub fn matches(&self, prefix: Option<&Version>) -> bool {
        prefix.is_none_or(|p| self.has_prefix(p))
    }

    /// Truncates the version to at most `major.minor`
    pub fn family(&self) -> Version {
        Version {
            segments: self.segments.iter().take(2).cloned().collect(),
        }
    }

    /// Pads a partial version with zero segments up to `major.minor.patch`
    pub fn to_full(&self) -> Version {
        let mut segments = self.segments.clone();
        segments.resize(FULL_VERSION_SEGMENTS, Segment::zero());
        Version { segments }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !VALID_VERSION_RE.is_match(s) {
            return Err(VersionError::Invalid(s.to_string()));
        }

        let segments = s
            .split('.')
            .map(|digits| Segment {
                digits: digits.to_string(),
            })
            .collect();

        Ok(Version { segments })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            f.write_str(&segment.digits)?;
            first = false;
        }
        Ok(())
    }
}

/// Returns true if `s` is a version with one to three numeric segments.
/// The empty string is not a version.
pub fn is_valid(s: &str) -> bool {
    s.parse::<Version>().is_ok()
}

/// Returns true if `s` is a valid version with exactly three segments
pub fn is_full_version(s: &str) -> bool {
    s.parse::<Version>().is_ok_and(|v| v.is_full())
}

/// Returns the greatest version of a non-empty list
pub fn latest<'a, I>(versions: I) -> Result<&'a Version, VersionError>
where
    I: IntoIterator<Item = &'a Version>,
{
    versions.into_iter().max().ok_or(VersionError::EmptyInput)
}

/// Returns the greatest version that has the given prefix, if any
pub fn latest_with_prefix<'a, I>(versions: I, prefix: Option<&Version>) -> Option<&'a Version>
where
    I: IntoIterator<Item = &'a Version>,
{
    versions.into_iter().filter(|v| v.matches(prefix)).max()
}

/// Validates every entry, then returns a comparator suitable for a stable sort.
///
/// Fails on the first invalid entry.
pub fn stable_comparator_for(
    versions: &[String],
) -> Result<fn(&String, &String) -> Ordering, VersionError> {
    for version in versions {
        if !is_valid(version) {
            return Err(VersionError::Invalid(version.clone()));
        }
    }

    Ok(|a: &String, b: &String| match (a.parse::<Version>(), b.parse::<Version>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    })
}

/// Sorts version strings ascending with [`stable_comparator_for`]
pub fn sort_versions(mut versions: Vec<String>) -> Result<Vec<String>, VersionError> {
    let comparator = stable_comparator_for(&versions)?;
    versions.sort_by(comparator);
    Ok(versions)
}
