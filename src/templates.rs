//! Template lookup over prioritised directories.
//!
//! Templates are plain text with `{name}` or `{a.b}` placeholders. Values are
//! HTML-escaped; `{name|n}` inserts one as written. A template name is
//! resolved against each directory in turn, so a template in a higher
//! priority directory overrides one of the same name further down.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("failed to read template {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)(\|n)?\}")
            .expect("template placeholder regex")
    })
}

#[derive(Debug, Clone, Default)]
pub struct TemplateLookup {
    directories: Vec<PathBuf>,
}

impl TemplateLookup {
    /// Directories in priority order, highest first.
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self { directories }
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Path of the first template named `name`, searching directories in
    /// priority order. Names are relative (a leading `/` is ignored) and may
    /// not climb out of a template directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return None;
        }

        self.directories
            .iter()
            .map(|dir| dir.join(relative))
            .find(|path| path.is_file())
    }

    pub fn render(&self, name: &str, vars: &BTreeMap<String, String>) -> Result<String, TemplateError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        debug!("Rendering {} from {:?}", name, path);

        let source = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(interpolate(&source, vars))
    }
}

/// Replace `{name}` placeholders with their escaped values and `{name|n}`
/// with the raw values; unknown names stay as written. Substituted values are
/// not scanned again.
pub fn interpolate(source: &str, vars: &BTreeMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(source, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) if caps.get(2).is_some() => value.clone(),
            Some(value) => escape_html(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    // ==================== interpolate Tests ====================

    #[test]
    fn test_interpolate_known_and_unknown() {
        let out = interpolate("Hi {name}, {missing} {a.b}", &vars(&[("name", "Ana"), ("a.b", "dot")]));
        assert_eq!(out, "Hi Ana, {missing} dot");
    }

    #[test]
    fn test_interpolate_leaves_css_alone() {
        let css = "body { margin: 0 }\na{color:red}";
        assert_eq!(interpolate(css, &BTreeMap::new()), css);
    }

    #[test]
    fn test_interpolate_does_not_rescan_values() {
        let out = interpolate("{content|n}", &vars(&[("content", "{content}"), ("other", "x")]));
        assert_eq!(out, "{content}");
    }

    #[test]
    fn test_interpolate_escapes_values() {
        let values = vars(&[("q", "<script>alert('x') & \"y\"</script>")]);
        assert_eq!(
            interpolate("<p>{q}</p>", &values),
            "<p>&lt;script&gt;alert(&#39;x&#39;) &amp; &#34;y&#34;&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn test_interpolate_raw_form() {
        let values = vars(&[("content", "<p>page</p>")]);
        assert_eq!(interpolate("<main>{content|n}</main>", &values), "<main><p>page</p></main>");
        assert_eq!(interpolate("{content}", &values), "&lt;p&gt;page&lt;/p&gt;");
        assert_eq!(interpolate("{content|x}", &values), "{content|x}");
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_resolve_prefers_first_directory() {
        let high = TempDir::new().unwrap();
        let low = TempDir::new().unwrap();
        fs::write(high.path().join("index.tmpl"), "high").unwrap();
        fs::write(low.path().join("index.tmpl"), "low").unwrap();
        fs::write(low.path().join("only_low.tmpl"), "low only").unwrap();

        let lookup = TemplateLookup::new(vec![high.path().to_path_buf(), low.path().to_path_buf()]);
        assert_eq!(lookup.render("/index.tmpl", &BTreeMap::new()).unwrap(), "high");
        assert_eq!(lookup.render("only_low.tmpl", &BTreeMap::new()).unwrap(), "low only");
    }

    #[test]
    fn test_render_missing_template() {
        let lookup = TemplateLookup::new(vec![]);
        assert!(matches!(
            lookup.render("nope.tmpl", &BTreeMap::new()),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_parent_components() {
        let root = TempDir::new().unwrap();
        let templates = root.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(root.path().join("secret.tmpl"), "secret").unwrap();

        let lookup = TemplateLookup::new(vec![templates]);
        assert!(lookup.resolve("../secret.tmpl").is_none());
    }
}
