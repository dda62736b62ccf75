//! Glob-style route pattern matching.
//!
//! # Responsibilities
//! - Parse `/`-delimited patterns into literal, `*` and `**` segments
//! - Match request paths against a parsed pattern
//!
//! # Design Decisions
//! - Matching is segment based, case-sensitive
//! - Empty segments (leading, trailing or doubled slashes) are ignored
//! - `**` may appear anywhere; the remaining suffix must still align with the
//!   rest of the path
//! - Single pass with one resume point, O(pattern × path) for any request path
//! - No regex; callers split a path once and reuse it across patterns

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while parsing a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern text was empty or whitespace.
    #[error("route pattern is empty")]
    Empty,

    /// A segment mixed a wildcard with literal characters (e.g. `api*`).
    #[error("invalid wildcard segment `{segment}` in pattern `{pattern}`")]
    InvalidWildcard { pattern: String, segment: String },
}

/// A single segment of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment.
    Any,
    /// `**`: zero or more segments.
    AnyDepth,
}

/// A parsed, immutable route pattern such as `/api/*/users/**`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut segments: Vec<Segment> = Vec::new();
        for raw in split_segments(trimmed) {
            let segment = match raw {
                "**" => Segment::AnyDepth,
                "*" => Segment::Any,
                s if s.contains('*') => {
                    return Err(PatternError::InvalidWildcard {
                        pattern: trimmed.to_string(),
                        segment: s.to_string(),
                    });
                }
                s => Segment::Literal(s.to_string()),
            };

            // `/**/**` is the same as `/**`
            if segment == Segment::AnyDepth && segments.last() == Some(&Segment::AnyDepth) {
                continue;
            }
            segments.push(segment);
        }

        Ok(Self {
            source: trimmed.to_string(),
            segments,
        })
    }

    /// The catch-all pattern `/**`.
    pub fn catch_all() -> Self {
        Self {
            source: "/**".to_string(),
            segments: vec![Segment::AnyDepth],
        }
    }

    /// The pattern text as it was configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.matches_segments(&split_path(path))
    }

    /// Match a path already split with [`split_path`].
    pub fn matches_segments(&self, path: &[&str]) -> bool {
        match_segments(&self.segments, path)
    }
}

/// Returns true if `path` matches `pattern`. An unparsable pattern never matches.
pub fn matches(path: &str, pattern: &str) -> bool {
    RoutePattern::parse(pattern)
        .map(|p| p.matches(path))
        .unwrap_or(false)
}

/// Split a request path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    split_segments(path).collect()
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Iterative wildcard match, O(pattern × path).
///
/// On a mismatch, resume after the most recent `**` and let it absorb one
/// more path segment. Earlier `**`s never need revisiting: any alignment
/// they could produce is reachable through the latest one.
fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    let (mut p, mut s) = (0, 0);
    // (pattern index after the last `**`, path index it resumed at)
    let mut resume: Option<(usize, usize)> = None;

    while s < path.len() {
        match pattern.get(p) {
            Some(Segment::AnyDepth) => {
                p += 1;
                resume = Some((p, s));
            }
            Some(Segment::Any) => {
                p += 1;
                s += 1;
            }
            Some(Segment::Literal(literal)) if literal == path[s] => {
                p += 1;
                s += 1;
            }
            _ => match resume {
                Some((after, from)) => {
                    p = after;
                    s = from + 1;
                    resume = Some((after, s));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|seg| *seg == Segment::AnyDepth)
}

impl FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
