//! Gettext-style translators.
//!
//! A `Translator` answers lookups for one language. Context lookups use the
//! `context|message` convention; when the looked-up text still carries a `|`
//! (the message was untranslated, or the translation kept its prefix), the
//! part up to and including the first `|` is stripped. A translation that
//! legitimately contains `|` therefore loses its first segment.

use crate::i18n::{Catalog, CatalogError, Language, LanguageRegistry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Something that can build a translator scoped to a list of languages.
///
/// The route mapper uses this to translate URL segments at registration time.
pub trait TranslatorSource: Send + Sync {
    /// Build a translator for the first of `languages` that has a catalog,
    /// or a translator that returns messages untouched.
    fn translator(&self, languages: &[Language]) -> Translator;
}

/// Translator for a single language.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    language: Option<Language>,
    catalog: Option<Arc<Catalog>>,
}

impl Translator {
    /// A translator that returns every message untouched.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn new(language: Language, catalog: Arc<Catalog>) -> Self {
        Self {
            language: Some(language),
            catalog: Some(catalog),
        }
    }

    /// Language this translator translates into, `None` for a null translator.
    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    pub fn gettext(&self, message: &str) -> String {
        self.lookup(message).unwrap_or(message).to_string()
    }

    /// Translate `message` under a disambiguation context.
    pub fn pgettext(&self, context: &str, message: &str) -> String {
        let key = format!("{}|{}", context, message);
        strip_context(self.lookup(&key).unwrap_or(key.as_str()))
    }

    pub fn ngettext(&self, singular: &str, plural: &str, n: u64) -> String {
        let index = plural_index(n);
        self.catalog
            .as_ref()
            .and_then(|catalog| catalog.lookup_plural(singular, index))
            .unwrap_or(if index == 0 { singular } else { plural })
            .to_string()
    }

    pub fn npgettext(&self, context: &str, singular: &str, plural: &str, n: u64) -> String {
        let key = format!("{}|{}", context, singular);
        let fallback = format!("{}|{}", context, plural);
        let index = plural_index(n);
        let text = self
            .catalog
            .as_ref()
            .and_then(|catalog| catalog.lookup_plural(&key, index))
            .unwrap_or(if index == 0 { key.as_str() } else { fallback.as_str() });
        strip_context(text)
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.catalog.as_ref().and_then(|catalog| catalog.lookup(key))
    }
}

/// Plural form index for `n` (two-form languages).
fn plural_index(n: u64) -> usize {
    if n == 1 {
        0
    } else {
        1
    }
}

fn strip_context(text: &str) -> String {
    match text.split_once('|') {
        Some((_, rest)) => rest.to_string(),
        None => text.to_string(),
    }
}

/// Catalogs of one gettext domain, loaded once for every available language.
#[derive(Debug, Clone)]
pub struct TranslationDomain {
    name: String,
    locale_dir: PathBuf,
    catalogs: HashMap<Language, Arc<Catalog>>,
}

impl TranslationDomain {
    /// Load `<locale_dir>/<code>/LC_MESSAGES/<name>.po` for every language in
    /// `registry`.
    pub fn load(
        name: &str,
        locale_dir: impl AsRef<Path>,
        registry: &LanguageRegistry,
    ) -> Result<Self, CatalogError> {
        let locale_dir = locale_dir.as_ref();
        let mut catalogs = HashMap::new();

        for language in registry.list_enabled() {
            let path = locale_dir
                .join(language.code())
                .join("LC_MESSAGES")
                .join(format!("{}.po", name));
            if !path.is_file() {
                debug!("No {} catalog for {}", name, language);
                continue;
            }
            let catalog = Catalog::load(&path)?;
            debug!("Loaded {} messages from {:?}", catalog.len(), path);
            catalogs.insert(language.clone(), Arc::new(catalog));
        }

        info!("Loaded {} catalogs for domain {}", catalogs.len(), name);

        Ok(Self {
            name: name.to_string(),
            locale_dir: locale_dir.to_path_buf(),
            catalogs,
        })
    }

    /// Build a domain from catalogs constructed in code.
    pub fn from_catalogs(name: &str, catalogs: impl IntoIterator<Item = (Language, Catalog)>) -> Self {
        Self {
            name: name.to_string(),
            locale_dir: PathBuf::new(),
            catalogs: catalogs
                .into_iter()
                .map(|(language, catalog)| (language, Arc::new(catalog)))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locale_dir(&self) -> &Path {
        &self.locale_dir
    }

    /// Languages this domain has a catalog for, sorted by code.
    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.catalogs.keys().cloned().collect();
        languages.sort();
        languages
    }
}

impl TranslatorSource for TranslationDomain {
    fn translator(&self, languages: &[Language]) -> Translator {
        languages
            .iter()
            .find_map(|language| {
                self.catalogs
                    .get(language)
                    .map(|catalog| Translator::new(language.clone(), Arc::clone(catalog)))
            })
            .unwrap_or_default()
    }
}
