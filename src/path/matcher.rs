use std::collections::HashMap;

use regex::Regex;

use crate::error::{Result, SignpostError};
use crate::model::Context;

use super::normalize::{segments, PathNormalizer};

/// Compiles and evaluates the segment-based path pattern language:
/// literal segments, `*` (one whole segment), `**` (zero or more whole
/// segments), and `${name}` (a named variable).
pub struct PathMatcher;

impl PathMatcher {
    /// True iff `pattern`, with any `${name}` occurrences resolved from
    /// `context`, matches `path`.
    ///
    /// Both pattern and path are normalized first. Variable substitution
    /// happens before matching: an occurrence whose name is present in
    /// `context` is replaced with its stringified value; an occurrence
    /// whose name is absent is left verbatim (and is then matched as
    /// ordinary literal text, which in practice cannot match a real path
    /// segment containing a `/`).
    pub fn matches(pattern: &str, path: &str, context: &Context) -> Result<bool> {
        let substituted = substitute_variables(pattern, context);
        let normalized_pattern = PathNormalizer::normalize(&substituted)?;
        let normalized_path = PathNormalizer::normalize(path)?;

        let pattern_segments = collapse_double_star(&segments(&normalized_pattern));
        let path_segments = segments(&normalized_path);

        Ok(segments_match(&pattern_segments, &path_segments))
    }

    /// Extract the concrete values bound to each `${name}` occurrence in
    /// `pattern` when matched against `path`. Returns an empty map if the
    /// pattern does not match, or if it matches but binds no variables.
    ///
    /// Unlike `matches`, this operates directly on `pattern` without any
    /// variable substitution: `${name}` segments act as named capture
    /// slots against the concrete path.
    pub fn extract(pattern: &str, path: &str) -> Result<HashMap<String, String>> {
        let normalized_pattern = PathNormalizer::normalize(pattern)?;
        let normalized_path = PathNormalizer::normalize(path)?;

        let pattern_segments = collapse_double_star(&segments(&normalized_pattern));
        let body = build_regex_body(&pattern_segments, true)?;
        let re = Regex::new(&format!("^{body}$")).map_err(|e| SignpostError::PatternCompile {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let match_string = normalized_path.trim_start_matches('/');
        let Some(caps) = re.captures(match_string) else {
            return Ok(HashMap::new());
        };

        let mut result = HashMap::new();
        for name in re.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                result.insert(name.to_string(), m.as_str().to_string());
            }
        }
        Ok(result)
    }
}

fn substitute_variables(pattern: &str, context: &Context) -> String {
    let token = variable_token_pattern();
    token
        .replace_all(pattern, |caps: &regex::Captures| {
            let name = &caps[1];
            match context.get(name) {
                Some(value) => value.stringify(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn variable_token_pattern() -> Regex {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static pattern is valid")
}

fn collapse_double_star<'a>(segments: &[&'a str]) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::with_capacity(segments.len());
    for &seg in segments {
        if seg == "**" && out.last() == Some(&"**") {
            continue;
        }
        out.push(seg);
    }
    out
}

/// Boolean segment-walking matcher with backtracking on `**`. Operating on
/// segment lists directly (rather than a compiled regex) keeps the
/// backtracking semantics of `**` obvious and avoids re-deriving them from
/// a generated regex string.
fn segments_match(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(&"**") => {
            // ** matches zero segments...
            if segments_match(&pattern[1..], path) {
                return true;
            }
            // ...or consumes one more segment and keeps trying.
            if let Some((_, rest)) = path.split_first() {
                return segments_match(pattern, rest);
            }
            false
        }
        Some(&"*") => match path.split_first() {
            Some((_, rest)) => segments_match(&pattern[1..], rest),
            None => false,
        },
        Some(seg) => match path.split_first() {
            Some((head, rest)) if head == seg => segments_match(&pattern[1..], rest),
            _ => false,
        },
    }
}

/// Build the body of an anchored regex (no `^`/`$`) matching the
/// slash-less representation of a normalized path (i.e. with its leading
/// slash stripped) against `pattern_segments`.
///
/// When `named` is true, `${name}` tokens inside literal segments become
/// named capture groups; otherwise they are matched as literal text (used
/// for `matches`, where substitution has already resolved what it could).
fn build_regex_body(pattern_segments: &[&str], named: bool) -> Result<String> {
    if pattern_segments.len() == 1 && pattern_segments[0] == "**" {
        return Ok("(?:[^/]+(?:/[^/]+)*)?".to_string());
    }

    let mut out = String::new();
    let mut need_slash = false;
    let len = pattern_segments.len();

    for (i, &seg) in pattern_segments.iter().enumerate() {
        if seg == "**" {
            if i == 0 {
                out.push_str("(?:[^/]+/)*");
                need_slash = false;
            } else if i == len - 1 {
                out.push_str("(?:/[^/]+)*");
                need_slash = false;
            } else {
                out.push_str("(?:/[^/]+)*");
                need_slash = true;
            }
            continue;
        }

        if need_slash {
            out.push('/');
        }
        if seg == "*" {
            out.push_str("[^/]+");
        } else if named {
            out.push_str(&segment_fragment_with_captures(seg)?);
        } else {
            out.push_str(&regex::escape(seg));
        }
        need_slash = true;
    }

    Ok(out)
}

/// Translate a single segment that may contain `${name}` tokens into a
/// regex fragment with a named capture group per occurrence. Non-final
/// occurrences within the same segment capture non-greedily so multiple
/// variables in one segment don't fight over the same text.
fn segment_fragment_with_captures(segment: &str) -> Result<String> {
    let token = variable_token_pattern();
    if !token.is_match(segment) {
        return Ok(regex::escape(segment));
    }

    let matches: Vec<_> = token.captures_iter(segment).collect();
    let mut out = String::new();
    let mut last_end = 0;
    for (i, caps) in matches.iter().enumerate() {
        let whole = caps.get(0).unwrap();
        out.push_str(&regex::escape(&segment[last_end..whole.start()]));
        let name = &caps[1];
        let quantifier = if i == matches.len() - 1 { "+" } else { "+?" };
        out.push_str(&format!("(?P<{name}>[^/]{quantifier})"));
        last_end = whole.end();
    }
    out.push_str(&regex::escape(&segment[last_end..]));
    Ok(out)
}
