//! URL patterns with `{name}` placeholders and `*name` wildcards.
//!
//! - `{id}` matches one path segment (no `/`)
//! - `{id:\d+}` matches the given regular expression
//! - `*path` matches the rest of the URL, slashes included

use super::MapperError;
use regex::Regex;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Static(String),
    Placeholder { name: String, requirement: Option<String> },
    Wildcard(String),
}

/// A compiled route URL pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    tokens: Vec<Token>,
    regex: Regex,
}

/// A path segment is static when it carries no placeholder or wildcard.
pub fn is_static_segment(segment: &str) -> bool {
    !segment.contains('{') && !segment.contains('*')
}

impl RoutePattern {
    pub fn parse(url: &str) -> Result<Self, MapperError> {
        let tokens = tokenize(url)?;

        let mut expr = String::from("^");
        for token in &tokens {
            match token {
                Token::Static(text) => expr.push_str(&regex::escape(text)),
                Token::Placeholder { name, requirement } => {
                    let requirement = requirement.as_deref().unwrap_or("[^/]+");
                    expr.push_str(&format!("(?P<{}>{})", name, requirement));
                }
                Token::Wildcard(name) => expr.push_str(&format!("(?P<{}>.*)", name)),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| MapperError::Pattern {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            source: url.to_string(),
            tokens,
            regex,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the placeholders and wildcards, in order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Static(_) => None,
            Token::Placeholder { name, .. } | Token::Wildcard(name) => Some(name.as_str()),
        })
    }

    /// Match a request path as sent, still percent-encoded, returning the
    /// decoded values of the captured variables.
    ///
    /// Segments are decoded before matching except for `%2F` and `%25`, so
    /// an encoded slash stays inside its segment.
    pub fn captures(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let path = decode_segments(path)?;
        let caps = self.regex.captures(&path)?;
        self.variables()
            .filter_map(|name| caps.name(name).map(|value| (name, value.as_str())))
            .map(|(name, value)| {
                let value = urlencoding::decode(value).ok()?;
                Some((name.to_string(), value.into_owned()))
            })
            .collect()
    }

    /// Build a URL from this pattern. Placeholder values are percent-encoded;
    /// wildcard values keep their slashes.
    pub fn generate(&self, params: &BTreeMap<String, String>) -> Result<String, MapperError> {
        let mut url = String::new();
        for token in &self.tokens {
            match token {
                Token::Static(text) => url.push_str(text),
                Token::Placeholder { name, .. } => {
                    let value = lookup(params, name, &self.source)?;
                    url.push_str(&urlencoding::encode(value));
                }
                Token::Wildcard(name) => {
                    let value = lookup(params, name, &self.source)?;
                    let encoded: Vec<String> = value
                        .split('/')
                        .map(|part| urlencoding::encode(part).into_owned())
                        .collect();
                    url.push_str(&encoded.join("/"));
                }
            }
        }
        Ok(url)
    }
}

/// Percent-decode each segment of `path`, re-encoding `%` and `/` so segment
/// boundaries survive. `None` when a segment is not valid UTF-8.
fn decode_segments(path: &str) -> Option<String> {
    let segments = path
        .split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment).ok()?;
            Some(decoded.replace('%', "%25").replace('/', "%2F"))
        })
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

fn lookup<'a>(params: &'a BTreeMap<String, String>, name: &str, url: &str) -> Result<&'a str, MapperError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| MapperError::MissingParameter {
            name: name.to_string(),
            url: url.to_string(),
        })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(url: &str) -> Result<Vec<Token>, MapperError> {
    let invalid = |message: &str| MapperError::Pattern {
        url: url.to_string(),
        message: message.to_string(),
    };

    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = url.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut body = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => body.push(c),
                        None => return Err(invalid("unterminated placeholder")),
                    }
                }
                let (name, requirement) = match body.split_once(':') {
                    Some((name, requirement)) => (name.to_string(), Some(requirement.to_string())),
                    None => (body, None),
                };
                if name.is_empty() || !name.chars().all(is_name_char) {
                    return Err(invalid("placeholder names must be identifiers"));
                }
                if !text.is_empty() {
                    tokens.push(Token::Static(std::mem::take(&mut text)));
                }
                tokens.push(Token::Placeholder { name, requirement });
            }
            '*' if text.is_empty() || text.ends_with('/') => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_name_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(invalid("wildcards need a name"));
                }
                if !text.is_empty() {
                    tokens.push(Token::Static(std::mem::take(&mut text)));
                }
                tokens.push(Token::Wildcard(name));
            }
            other => text.push(other),
        }
    }
    if !text.is_empty() {
        tokens.push(Token::Static(text));
    }
    Ok(tokens)
}
