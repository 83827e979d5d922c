//! Translatable message extraction.
//!
//! Two extraction methods are provided, registered under the names the
//! catalog tooling knows them by:
//!
//! - `spline-python`: Python source, scanned for calls to translation
//!   keywords and for URL literals passed to `connect(...)`.
//! - `spline-mako`: compiled template source carrying `# SOURCE LINE <n>`
//!   markers; lines are reported against the original template.
//!
//! Extraction parses the whole source first. A syntax error fails the run
//! before any message is produced.

mod literal;
mod pot;
mod python;
mod template;

pub use pot::{write_pot, Occurrence};
pub use template::line_map;

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("syntax error at line {line}")]
    Parse { line: usize },

    #[error("failed to load the Python grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("parser returned no syntax tree")]
    NoTree,
}

/// Which gettext function a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    /// A single message (`ugettext`)
    Singular,
    /// A singular/plural pair (`ungettext`)
    Plural,
}

impl FunctionKind {
    /// Name of the gettext function catalog tools expect for this kind.
    pub fn gettext_name(&self) -> &'static str {
        match self {
            FunctionKind::Singular => "ugettext",
            FunctionKind::Plural => "ungettext",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageText {
    Single(String),
    /// Singular text and, when it was a literal, the plural text
    Plural(String, Option<String>),
}

impl MessageText {
    /// The msgid (singular text) of the message.
    pub fn msgid(&self) -> &str {
        match self {
            MessageText::Single(text) | MessageText::Plural(text, _) => text,
        }
    }

    pub fn plural(&self) -> Option<&str> {
        match self {
            MessageText::Single(_) => None,
            MessageText::Plural(_, plural) => plural.as_deref(),
        }
    }
}

/// One translatable message found in a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedMessage {
    /// 1-based line of the call in the original source
    pub line: usize,
    pub kind: FunctionKind,
    pub message: MessageText,
    /// Advisory tags (`Py2Format`, `Py3Format`) and `comment=` text
    pub comments: Vec<String>,
}

/// Function names treated as translation calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords(HashSet<String>);

impl Keywords {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }
}

impl Default for Keywords {
    fn default() -> Self {
        Self::new(["_", "gettext", "ugettext", "ngettext", "ungettext", "N_"])
    }
}

/// Extraction method, named as in the catalog tooling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMethod {
    Python,
    Template,
}

impl ExtractMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ExtractMethod::Python => "spline-python",
            ExtractMethod::Template => "spline-mako",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "spline-python" => Some(ExtractMethod::Python),
            "spline-mako" => Some(ExtractMethod::Template),
            _ => None,
        }
    }

    /// `.py` files are Python; everything else is taken to be compiled
    /// template source.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => ExtractMethod::Python,
            _ => ExtractMethod::Template,
        }
    }

    pub fn extract(&self, source: &str, keywords: &Keywords) -> Result<Messages, ExtractError> {
        match self {
            ExtractMethod::Python => extract_python(source, keywords),
            ExtractMethod::Template => extract_template(source, keywords),
        }
    }
}

/// Messages of one extraction run, in source order. Consumed once.
#[derive(Debug)]
pub struct Messages {
    inner: std::vec::IntoIter<ExtractedMessage>,
}

impl Iterator for Messages {
    type Item = ExtractedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Messages {}

/// Extract messages from Python source.
pub fn extract_python(source: &str, keywords: &Keywords) -> Result<Messages, ExtractError> {
    let messages = python::extract(source, keywords)?;
    Ok(Messages {
        inner: messages.into_iter(),
    })
}

/// Extract messages from compiled template source, reporting each message at
/// the template line named by the most recent `# SOURCE LINE` marker.
pub fn extract_template(compiled: &str, keywords: &Keywords) -> Result<Messages, ExtractError> {
    let map = line_map(compiled);
    let fallback = map.last().copied().unwrap_or(0);
    let messages = python::extract(compiled, keywords)?
        .into_iter()
        .map(|mut message| {
            message.line = map.get(message.line).copied().unwrap_or(fallback);
            message
        })
        .collect::<Vec<_>>();
    Ok(Messages {
        inner: messages.into_iter(),
    })
}
