//! Message catalogs loaded from gettext `.po` files.
//!
//! Messages with a context are keyed `context|msgid`, whether the context
//! comes from a `msgctxt` line or is already part of the msgid (which is how
//! the extractor writes URL segments: `url|about`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

/// Translations of one domain into one language.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Debug, Default)]
struct Entry {
    context: Option<String>,
    id: Option<String>,
    id_plural: Option<String>,
    strs: Vec<(usize, String)>,
    last: Option<Field>,
    fuzzy: bool,
}

impl Entry {
    fn has_translation(&self) -> bool {
        !self.strs.is_empty()
    }

    fn append(&mut self, field: Field, text: &str) {
        match field {
            Field::Context => self.context.get_or_insert_with(String::new).push_str(text),
            Field::Id => self.id.get_or_insert_with(String::new).push_str(text),
            Field::IdPlural => self.id_plural.get_or_insert_with(String::new).push_str(text),
            Field::Str(index) => match self.strs.iter_mut().find(|(i, _)| *i == index) {
                Some((_, existing)) => existing.push_str(text),
                None => self.strs.push((index, text.to_string())),
            },
        }
        self.last = Some(field);
    }
}

impl Catalog {
    /// Load a catalog from a `.po` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse the text of a `.po` file.
    ///
    /// The header entry (empty msgid), entries flagged `#, fuzzy`, obsolete
    /// entries (`#~`) and entries without any non-empty translation are left
    /// out, as msgfmt does.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();
        let mut entry = Entry::default();

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();

            if line.is_empty() {
                catalog.flush(&mut entry);
                continue;
            }
            if line.starts_with('#') {
                if entry.has_translation() {
                    catalog.flush(&mut entry);
                }
                if let Some(flags) = line.strip_prefix("#,") {
                    entry.fuzzy |= flags.split(',').any(|flag| flag.trim() == "fuzzy");
                }
                continue;
            }

            if line.starts_with('"') {
                let field = entry.last.ok_or_else(|| CatalogError::Syntax {
                    line: line_no,
                    message: "continuation string without a keyword".to_string(),
                })?;
                let text = unquote(line, line_no)?;
                entry.append(field, &text);
                continue;
            }

            let (keyword, rest) = line.split_once(char::is_whitespace).ok_or_else(|| {
                CatalogError::Syntax {
                    line: line_no,
                    message: format!("expected a keyword and a string, got {:?}", line),
                }
            })?;
            let field = parse_keyword(keyword, line_no)?;

            // A new msgctxt/msgid after a translation starts the next entry.
            if matches!(field, Field::Context | Field::Id) && entry.has_translation() {
                catalog.flush(&mut entry);
            }

            let text = unquote(rest.trim(), line_no)?;
            entry.append(field, &text);
        }
        catalog.flush(&mut entry);

        Ok(catalog)
    }

    fn flush(&mut self, entry: &mut Entry) {
        let finished = std::mem::take(entry);
        if finished.fuzzy {
            return;
        }
        let Some(id) = finished.id else {
            return;
        };
        if id.is_empty() {
            return;
        }

        let mut strs = finished.strs;
        strs.sort_by_key(|(index, _)| *index);
        let translations: Vec<String> = strs.into_iter().map(|(_, text)| text).collect();
        if translations.iter().all(|text| text.is_empty()) {
            return;
        }

        let key = match finished.context {
            Some(context) => format!("{}|{}", context, id),
            None => id,
        };
        self.messages.insert(key, translations);
    }

    /// Translation of a singular message, if the catalog has one.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.messages
            .get(key)
            .and_then(|strs| strs.first())
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }

    /// Translation of plural form `index`, if the catalog has one.
    pub fn lookup_plural(&self, key: &str, index: usize) -> Option<&str> {
        self.messages
            .get(key)
            .and_then(|strs| strs.get(index))
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Insert a translation directly. Used to build catalogs in code.
    pub fn insert(&mut self, key: impl Into<String>, translation: impl Into<String>) {
        self.messages.insert(key.into(), vec![translation.into()]);
    }
}

fn parse_keyword(keyword: &str, line: usize) -> Result<Field, CatalogError> {
    match keyword {
        "msgctxt" => Ok(Field::Context),
        "msgid" => Ok(Field::Id),
        "msgid_plural" => Ok(Field::IdPlural),
        "msgstr" => Ok(Field::Str(0)),
        other => other
            .strip_prefix("msgstr[")
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|index| index.parse().ok())
            .map(Field::Str)
            .ok_or_else(|| CatalogError::Syntax {
                line,
                message: format!("unknown keyword {:?}", other),
            }),
    }
}

fn unquote(text: &str, line: usize) -> Result<String, CatalogError> {
    let inner = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| CatalogError::Syntax {
            line,
            message: format!("expected a quoted string, got {:?}", text),
        })?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# Spanish translations for spline.
msgid ""
msgstr ""
"Content-Type: text/plain; charset=UTF-8\n"
"Plural-Forms: nplurals=2; plural=(n != 1);\n"

#: spline/templates/index.tmpl:3
msgid "Welcome"
msgstr "Bienvenido"

msgid "url|about"
msgstr "acerca"

msgctxt "url"
msgid "news"
msgstr "noticias"

msgid "%d page"
msgid_plural "%d pages"
msgstr[0] "%d página"
msgstr[1] "%d páginas"

msgid "Untranslated"
msgstr ""

msgid "Long "
"message"
msgstr "Mensaje "
"largo\n"
"#;

    // ==================== parse Tests ====================

    #[test]
    fn test_parse_simple_message() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.lookup("Welcome"), Some("Bienvenido"));
    }

    #[test]
    fn test_parse_skips_header_and_empty_translations() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.lookup(""), None);
        assert_eq!(catalog.lookup("Untranslated"), None);
    }

    #[test]
    fn test_parse_context_forms() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.lookup("url|about"), Some("acerca"));
        assert_eq!(catalog.lookup("url|news"), Some("noticias"));
    }

    #[test]
    fn test_parse_plural_forms() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.lookup_plural("%d page", 0), Some("%d página"));
        assert_eq!(catalog.lookup_plural("%d page", 1), Some("%d páginas"));
        assert_eq!(catalog.lookup_plural("%d page", 2), None);
    }

    #[test]
    fn test_parse_multiline_strings() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.lookup("Long message"), Some("Mensaje largo\n"));
    }

    #[test]
    fn test_parse_counts_entries() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 5);
    }

    #[test]
    fn test_parse_entries_without_blank_separator() {
        let text = "msgid \"a\"\nmsgstr \"A\"\nmsgid \"b\"\nmsgstr \"B\"\n";
        let catalog = Catalog::parse(text).unwrap();
        assert_eq!(catalog.lookup("a"), Some("A"));
        assert_eq!(catalog.lookup("b"), Some("B"));
    }

    #[test]
    fn test_parse_escapes() {
        let text = r#"msgid "say \"hi\""
msgstr "di \"hola\"\tya"
"#;
        let catalog = Catalog::parse(text).unwrap();
        assert_eq!(catalog.lookup("say \"hi\""), Some("di \"hola\"\tya"));
    }

    #[test]
    fn test_parse_skips_fuzzy_entries() {
        let text = r#"#: spline/controllers/main.py:12
#, fuzzy, python-format
msgid "Guessed %s"
msgstr "Adivinado %s"

#, python-format
msgid "Checked %s"
msgstr "Revisado %s"
#, fuzzy
msgid "Next"
msgstr "Siguiente"
msgid "After"
msgstr "Después"
"#;
        let catalog = Catalog::parse(text).unwrap();
        assert_eq!(catalog.lookup("Guessed %s"), None);
        assert_eq!(catalog.lookup("Checked %s"), Some("Revisado %s"));
        assert_eq!(catalog.lookup("Next"), None);
        assert_eq!(catalog.lookup("After"), Some("Después"));
        assert_eq!(catalog.len(), 2);
    }

    // ==================== Error Tests ====================

    #[test]
    fn test_parse_unknown_keyword() {
        let err = Catalog::parse("msgfoo \"x\"\n").unwrap_err();
        assert!(matches!(err, CatalogError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_parse_orphan_continuation() {
        let err = Catalog::parse("\"dangling\"\n").unwrap_err();
        assert!(err.to_string().contains("continuation"));
    }

    #[test]
    fn test_parse_unquoted_string() {
        let err = Catalog::parse("msgid hello\n").unwrap_err();
        assert!(matches!(err, CatalogError::Syntax { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load("/nonexistent/spline.po").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
