//! Include / exclude route lists.

use std::fmt;

use crate::routing::matcher::{split_path, PatternError, RoutePattern};

/// A set of route patterns, tested for membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteList {
    patterns: Vec<RoutePattern>,
}

impl RouteList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every pattern, failing on the first invalid one.
    pub fn parse<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| RoutePattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn push(&mut self, pattern: RoutePattern) {
        self.patterns.push(pattern);
    }

    pub fn extend<I: IntoIterator<Item = RoutePattern>>(&mut self, patterns: I) {
        self.patterns.extend(patterns);
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutePattern> {
        self.patterns.iter()
    }

    /// The configured pattern strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.as_str().to_string()).collect()
    }

    /// Returns true if any pattern in the list matches `path`.
    pub fn matches_any(&self, path: &str) -> bool {
        self.matches_any_segments(&split_path(path))
    }

    /// Same as [`matches_any`](Self::matches_any) for a path split once up front.
    pub fn matches_any_segments(&self, segments: &[&str]) -> bool {
        self.patterns.iter().any(|p| p.matches_segments(segments))
    }
}

impl FromIterator<RoutePattern> for RouteList {
    fn from_iter<T: IntoIterator<Item = RoutePattern>>(iter: T) -> Self {
        Self {
            patterns: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for RouteList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, pattern) in self.patterns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", pattern)?;
        }
        write!(f, "]")
    }
}

/// The include and exclude lists of a filter, swapped as one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRules {
    pub include: RouteList,
    pub exclude: RouteList,
}

impl RouteRules {
    pub fn new(include: RouteList, exclude: RouteList) -> Self {
        Self { include, exclude }
    }

    /// Returns true if checks apply to `path`: included and not excluded.
    pub fn applies(&self, path: &str) -> bool {
        let segments = split_path(path);
        let included = self.include.is_empty() || self.include.matches_any_segments(&segments);
        included && !self.exclude.matches_any_segments(&segments)
    }
}
