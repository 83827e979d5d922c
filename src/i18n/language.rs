//! Language type: validated language code plus display metadata.

use anyhow::{bail, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Display metadata for a language the application knows by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Language code as used in catalog directories and URL prefixes
    pub code: &'static str,

    /// English name of the language (e.g., "Spanish")
    pub name: &'static str,

    /// Native name of the language (e.g., "Español")
    pub native_name: &'static str,
}

/// Languages with known display names. Codes missing here are still valid;
/// they simply display as their code.
const KNOWN_LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo { code: "en", name: "English", native_name: "English" },
    LanguageInfo { code: "es", name: "Spanish", native_name: "Español" },
    LanguageInfo { code: "fr", name: "French", native_name: "Français" },
    LanguageInfo { code: "de", name: "German", native_name: "Deutsch" },
    LanguageInfo { code: "it", name: "Italian", native_name: "Italiano" },
    LanguageInfo { code: "cs", name: "Czech", native_name: "Čeština" },
    LanguageInfo { code: "ja", name: "Japanese", native_name: "日本語" },
    LanguageInfo { code: "ko", name: "Korean", native_name: "한국어" },
    LanguageInfo { code: "pl", name: "Polish", native_name: "Polski" },
    LanguageInfo { code: "pt_BR", name: "Brazilian Portuguese", native_name: "Português do Brasil" },
];

static CODE_REGEX: OnceLock<Regex> = OnceLock::new();

fn code_regex() -> &'static Regex {
    CODE_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z]{2,3}(?:[_-][A-Za-z]{2,4})?$").expect("Invalid language code regex")
    })
}

/// A validated language code.
///
/// Codes end up in URL prefixes (`/es/...`) and catalog paths, so only
/// well-formed ISO 639 codes with an optional region are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Language {
    code: String,
}

impl Language {
    /// Code of the language the source strings are written in.
    pub const CANONICAL_CODE: &'static str = "en";

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is well formed
    /// * `Err` otherwise
    pub fn from_code(code: &str) -> Result<Language> {
        if !code_regex().is_match(code) {
            bail!("Invalid language code: '{}'", code);
        }
        Ok(Language {
            code: code.to_string(),
        })
    }

    /// The canonical (source) language. Messages are written in it, so it
    /// never needs a catalog.
    pub fn canonical() -> Language {
        Language {
            code: Self::CANONICAL_CODE.to_string(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Display metadata, if the language is one we know by name.
    pub fn info(&self) -> Option<&'static LanguageInfo> {
        KNOWN_LANGUAGES.iter().find(|info| info.code == self.code)
    }

    /// English name of the language, falling back to its code.
    pub fn name(&self) -> &str {
        self.info().map(|info| info.name).unwrap_or(&self.code)
    }

    /// Native name of the language, falling back to its code.
    pub fn native_name(&self) -> &str {
        self.info().map(|info| info.native_name).unwrap_or(&self.code)
    }

    pub fn is_canonical(&self) -> bool {
        self.code == Self::CANONICAL_CODE
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
