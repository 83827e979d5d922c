//! Language registry: the languages a deployment serves translated routes for.
//!
//! Languages are discovered from the locale directory. A language counts as
//! available when `<locale_dir>/<code>/LC_MESSAGES/<domain>.po` exists,
//! including the canonical language when a deployment ships a catalog for it.

use crate::i18n::Language;
use anyhow::Result;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// The set of languages available for translation, sorted by code.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
}

impl LanguageRegistry {
    /// Build a registry from an explicit list of languages.
    pub fn new(languages: impl IntoIterator<Item = Language>) -> Self {
        let mut languages: Vec<Language> = languages.into_iter().collect();
        languages.sort();
        languages.dedup();
        Self { languages }
    }

    /// Build a registry from language codes, rejecting malformed ones.
    pub fn from_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let languages = codes
            .into_iter()
            .map(Language::from_code)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(languages))
    }

    /// Walk `locale_dir` looking for `<code>/LC_MESSAGES/<domain>.po`.
    ///
    /// A missing locale directory yields an empty registry. Directories whose
    /// name is not a valid language code are skipped with a warning.
    pub fn discover(locale_dir: impl AsRef<Path>, domain: &str) -> Result<Self> {
        let locale_dir = locale_dir.as_ref();
        if !locale_dir.is_dir() {
            debug!("Locale directory {:?} not found, no translated languages", locale_dir);
            return Ok(Self::default());
        }

        let catalog_name = format!("{}.po", domain);
        let mut languages = Vec::new();

        for entry in WalkDir::new(locale_dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable locale entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() || entry.file_name() != "LC_MESSAGES" {
                continue;
            }
            if !entry.path().join(&catalog_name).is_file() {
                continue;
            }
            let Some(code) = entry
                .path()
                .parent()
                .and_then(|parent| parent.file_name())
                .and_then(|name| name.to_str())
            else {
                continue;
            };
            match Language::from_code(code) {
                Ok(language) => {
                    debug!("Found {} catalog for language {}", domain, language);
                    languages.push(language);
                }
                Err(e) => warn!("Ignoring catalog directory {:?}: {}", entry.path(), e),
            }
        }

        Ok(Self::new(languages))
    }

    /// All available languages.
    pub fn list_enabled(&self) -> &[Language] {
        &self.languages
    }

    pub fn get_by_code(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|lang| lang.code() == code)
    }

    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
