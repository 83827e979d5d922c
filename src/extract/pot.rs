//! Gettext template (`.pot`) output for extracted messages.

use super::ExtractedMessage;
use std::fmt::Write;
use std::path::PathBuf;

/// An extracted message together with the file it came from.
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub path: PathBuf,
    pub message: ExtractedMessage,
}

struct PotEntry<'a> {
    msgid: &'a str,
    plural: Option<&'a str>,
    is_plural: bool,
    comments: Vec<&'a str>,
    references: Vec<String>,
}

const HEADER: &str = r#"# Translations template for spline.
#
#, fuzzy
msgid ""
msgstr ""
"Project-Id-Version: spline\n"
"MIME-Version: 1.0\n"
"Content-Type: text/plain; charset=utf-8\n"
"Content-Transfer-Encoding: 8bit\n"
"#;

/// Render occurrences as a `.pot` file.
///
/// Identical messages (same msgid and plural) are merged into one entry in
/// order of first appearance, collecting every `#: file:line` reference and
/// each distinct `#.` comment.
pub fn write_pot(occurrences: &[Occurrence]) -> String {
    let mut entries: Vec<PotEntry<'_>> = Vec::new();

    for occurrence in occurrences {
        let message = &occurrence.message;
        let msgid = message.message.msgid();
        let plural = message.message.plural();
        let is_plural = matches!(message.message, super::MessageText::Plural(..));
        let reference = format!("{}:{}", occurrence.path.display(), message.line);

        let index = entries
            .iter()
            .position(|entry| entry.msgid == msgid && entry.plural == plural && entry.is_plural == is_plural);
        let entry = match index {
            Some(index) => &mut entries[index],
            None => {
                entries.push(PotEntry {
                    msgid,
                    plural,
                    is_plural,
                    comments: Vec::new(),
                    references: Vec::new(),
                });
                let last = entries.len() - 1;
                &mut entries[last]
            }
        };

        for comment in &message.comments {
            if !entry.comments.contains(&comment.as_str()) {
                entry.comments.push(comment);
            }
        }
        if !entry.references.contains(&reference) {
            entry.references.push(reference);
        }
    }

    let mut out = String::from(HEADER);
    for entry in &entries {
        out.push('\n');
        for comment in &entry.comments {
            let _ = writeln!(out, "#. {}", comment);
        }
        for reference in &entry.references {
            let _ = writeln!(out, "#: {}", reference);
        }
        let _ = writeln!(out, "msgid {}", quote(entry.msgid));
        if entry.is_plural {
            // A non-literal plural leaves only the singular to go on.
            let plural = entry.plural.unwrap_or(entry.msgid);
            let _ = writeln!(out, "msgid_plural {}", quote(plural));
            out.push_str("msgstr[0] \"\"\nmsgstr[1] \"\"\n");
        } else {
            out.push_str("msgstr \"\"\n");
        }
    }
    out
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{FunctionKind, MessageText};
    use crate::i18n::Catalog;

    fn occurrence(path: &str, line: usize, message: MessageText, comments: &[&str]) -> Occurrence {
        let kind = match message {
            MessageText::Single(_) => FunctionKind::Singular,
            MessageText::Plural(..) => FunctionKind::Plural,
        };
        Occurrence {
            path: PathBuf::from(path),
            message: ExtractedMessage {
                line,
                kind,
                message,
                comments: comments.iter().map(|c| c.to_string()).collect(),
            },
        }
    }

    #[test]
    fn test_merges_identical_messages() {
        let pot = write_pot(&[
            occurrence("a.py", 3, MessageText::Single("Save".into()), &["Py2Format"]),
            occurrence("b.py", 7, MessageText::Single("Save".into()), &["Py2Format"]),
        ]);
        assert_eq!(pot.matches("msgid \"Save\"").count(), 1);
        assert!(pot.contains("#. Py2Format\n#: a.py:3\n#: b.py:7\nmsgid \"Save\""));
    }

    #[test]
    fn test_plural_entry() {
        let pot = write_pot(&[occurrence(
            "a.py",
            1,
            MessageText::Plural("%d page".into(), Some("%d pages".into())),
            &[],
        )]);
        assert!(pot.contains("msgid \"%d page\"\nmsgid_plural \"%d pages\"\nmsgstr[0] \"\"\nmsgstr[1] \"\"\n"));
    }

    #[test]
    fn test_unknown_plural_repeats_singular() {
        let pot = write_pot(&[occurrence("a.py", 1, MessageText::Plural("item".into(), None), &[])]);
        assert!(pot.contains("msgid \"item\"\nmsgid_plural \"item\"\n"));
    }

    #[test]
    fn test_escapes_text() {
        let pot = write_pot(&[occurrence(
            "a.py",
            1,
            MessageText::Single("say \"hi\"\n".into()),
            &[],
        )]);
        assert!(pot.contains(r#"msgid "say \"hi\"\n""#));
    }

    #[test]
    fn test_output_parses_as_catalog() {
        let pot = write_pot(&[
            occurrence("a.py", 1, MessageText::Single("url|about".into()), &[]),
            occurrence("a.py", 2, MessageText::Single("Welcome".into()), &[]),
        ]);
        // Every msgstr is empty, so nothing is translated
        let catalog = Catalog::parse(&pot).unwrap();
        assert!(catalog.is_empty());
    }
}
