//! Path pattern compilation and matching
//!
//! A pattern is literal text interleaved with captures:
//!
//! - `{name}` - a required capture of one path segment (`[^/]+`)
//! - `{name}?` - the same capture, optional (its leading `/` is optional too)
//! - `{name}(regex)` - a capture with a custom expression
//! - `*` - a greedy wildcard, reported under both `*` and `glob`
//!
//! Patterns compile to a single anchored, case-insensitive [`Regex`]. Unless
//! the matcher is strict, one trailing `/` is accepted after the pattern.
//!
//! ```
//! use isoroute::RoutePattern;
//!
//! let pattern = RoutePattern::compile("/users/{id}/posts/{slug}?").unwrap();
//!
//! let params = pattern.matches("/users/42/posts").unwrap();
//! assert_eq!(params.get("id"), Some(&"42".to_string()));
//! assert!(params.get("slug").is_none());
//!
//! assert!(pattern.matches("/users").is_none());
//! ```

use crate::error::RouterError;
use crate::params::RouteParams;
use regex::Regex;

/// Name under which the wildcard capture is also exposed
pub const GLOB_PARAM: &str = "glob";

const WILDCARD: &str = "*";

/// A compiled route pattern
#[derive(Debug, Clone)]
pub struct RoutePattern {
    pattern: String,
    segments: Vec<Segment>,
    regex: Regex,
    strict: bool,
}

/// A single piece of a route pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text that must match literally (case-insensitively)
    Literal(String),
    /// A named capture
    Capture(Capture),
}

/// A named capture inside a pattern
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    /// Parameter name (`*` for the wildcard)
    pub name: String,
    /// Custom expression from `{name}(expr)`
    pub expr: Option<String>,
    /// Capture may be absent
    pub optional: bool,
    /// A `/` directly precedes the capture and belongs to it
    pub slash: bool,
    /// A `.` directly precedes the capture and belongs to it
    pub dot: bool,
    /// The capture is followed by `/` or the end of the pattern
    closed: bool,
}

impl Capture {
    fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    fn expression(&self) -> &str {
        match &self.expr {
            Some(expr) => expr,
            None if self.is_wildcard() => ".+?",
            None => "[^/]+",
        }
    }

    fn is_optional(&self) -> bool {
        self.optional || self.is_wildcard()
    }
}

impl RoutePattern {
    /// Compile a pattern with the default, non-strict trailing slash rule
    pub fn compile(pattern: &str) -> Result<Self, RouterError> {
        Self::compile_with(pattern, false)
    }

    /// Compile a pattern, optionally rejecting a trailing `/` the pattern
    /// does not spell out
    pub fn compile_with(pattern: &str, strict: bool) -> Result<Self, RouterError> {
        if pattern.is_empty() {
            return Err(invalid(pattern, "pattern must not be empty"));
        }

        let segments = parse_segments(pattern)?;
        let source = build_regex_source(&segments, strict);
        let regex = Regex::new(&source).map_err(|e| invalid(pattern, &e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            regex,
            strict,
        })
    }

    /// The pattern text this matcher was compiled from
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Parsed segments
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether a trailing `/` must be spelled out by the pattern
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Names of all parameters this pattern can produce
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for segment in &self.segments {
            if let Segment::Capture(capture) = segment {
                names.push(capture.name.as_str());
                if capture.is_wildcard() {
                    names.push(GLOB_PARAM);
                }
            }
        }
        names
    }

    /// Check whether `path` matches without extracting parameters
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path`, returning the extracted parameters
    ///
    /// Optional captures that did not participate are left out of the map.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let caps = self.regex.captures(path)?;
        let mut params = RouteParams::new();

        for (index, capture) in self.captures().enumerate() {
            let value = caps.name(&group_name(index)).map(|m| m.as_str());

            if capture.is_wildcard() {
                let value = value.unwrap_or_default().to_string();
                params.insert(WILDCARD.to_string(), value.clone());
                params.insert(GLOB_PARAM.to_string(), value);
            } else if let Some(value) = value {
                params.insert(capture.name.clone(), value.to_string());
            }
        }

        Some(params)
    }

    /// Build a concrete path from this pattern
    ///
    /// Values are percent-encoded; the wildcard keeps its `/` separators.
    /// Missing optional captures are dropped together with their leading
    /// `/` or `.`. Returns `None` when a required parameter is missing.
    pub fn fill(&self, params: &RouteParams) -> Option<String> {
        let mut path = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Capture(capture) => {
                    let value = if capture.is_wildcard() {
                        params.get(GLOB_PARAM).or_else(|| params.get(WILDCARD))
                    } else {
                        params.get(&capture.name)
                    };

                    let Some(value) = value.filter(|v| !v.is_empty()) else {
                        if capture.is_optional() {
                            continue;
                        }
                        return None;
                    };

                    if capture.slash {
                        path.push('/');
                    }
                    if capture.dot {
                        path.push('.');
                    }
                    if capture.is_wildcard() {
                        let encoded: Vec<String> = value
                            .split('/')
                            .map(|part| urlencoding::encode(part).into_owned())
                            .collect();
                        path.push_str(&encoded.join("/"));
                    } else {
                        path.push_str(&urlencoding::encode(value));
                    }
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        Some(path)
    }

    fn captures(&self) -> impl Iterator<Item = &Capture> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Capture(capture) => Some(capture),
            Segment::Literal(_) => None,
        })
    }
}

fn invalid(pattern: &str, reason: &str) -> RouterError {
    RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

fn group_name(index: usize) -> String {
    format!("p{}", index)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '*'))
}

/// Split a pattern into literal text and captures
fn parse_segments(pattern: &str) -> Result<Vec<Segment>, RouterError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let (name, mut next) = match chars[i] {
            '*' => (WILDCARD.to_string(), i + 1),
            '{' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&c| c == '}')
                    .map(|offset| i + 1 + offset)
                    .ok_or_else(|| invalid(pattern, "unclosed '{'"))?;
                let name: String = chars[i + 1..close].iter().collect();
                if !is_valid_name(&name) {
                    return Err(invalid(pattern, &format!("bad pattern name: {}", name)));
                }
                (name, close + 1)
            }
            c => {
                literal.push(c);
                i += 1;
                continue;
            }
        };

        let mut expr = None;
        if chars[i] == '{' && chars.get(next) == Some(&'(') {
            let end = closing_paren(&chars, next)
                .ok_or_else(|| invalid(pattern, "unbalanced '(' in capture expression"))?;
            let body: String = chars[next + 1..end].iter().collect();
            if body.is_empty() {
                return Err(invalid(pattern, "empty capture expression"));
            }
            expr = Some(body);
            next = end + 1;
        }

        let optional = chars.get(next) == Some(&'?');
        if optional {
            next += 1;
        }

        let dot = literal.ends_with('.');
        if dot {
            literal.pop();
        }
        let slash = literal.ends_with('/');
        if slash {
            literal.pop();
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }

        let closed = matches!(chars.get(next), None | Some('/'));
        segments.push(Segment::Capture(Capture {
            name,
            expr,
            optional,
            slash,
            dot,
            closed,
        }));
        i = next;
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

fn closing_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;

    for (offset, &c) in chars[open..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }

    None
}

fn build_regex_source(segments: &[Segment], strict: bool) -> String {
    let mut source = String::from("(?i)^");
    let mut index = 0;

    for segment in segments {
        match segment {
            Segment::Literal(text) => source.push_str(&regex::escape(text)),
            Segment::Capture(capture) => {
                let slash = if capture.slash { "/" } else { "" };
                let dot = if capture.dot { "\\." } else { "" };
                let optional = if capture.is_optional() { "?" } else { "" };
                let group = format!("(?P<{}>{})", group_name(index), capture.expression());

                if capture.closed {
                    source.push_str(&format!("(?:{}{}{}){}", slash, dot, group, optional));
                } else {
                    source.push_str(&format!("{}(?:{}{}){}", slash, dot, group, optional));
                }
                index += 1;
            }
        }
    }

    if !strict {
        source.push_str("/?");
    }
    source.push('$');
    source
}
