//! Internationalization (i18n) support.
//!
//! Everything that turns source text into per-language text lives here:
//! language identities, discovery of the languages a deployment ships
//! catalogs for, `.po` catalog loading and gettext-style translators.
//!
//! # Architecture
//!
//! - `language`: validated `Language` type plus static display metadata
//! - `registry`: the languages available to translated routes, discovered
//!   from the locale directory
//! - `catalog`: `.po` parsing into an in-memory message table
//! - `translator`: `gettext`/`pgettext`/`ngettext` lookups and the
//!   `TranslatorSource` seam used by the route mapper
//!
//! # Example
//!
//! ```rust,ignore
//! use spline::i18n::{LanguageRegistry, TranslationDomain};
//!
//! let registry = LanguageRegistry::discover("i18n", "spline")?;
//! let domain = TranslationDomain::load("spline", "i18n", &registry)?;
//! let translator = domain.translator(registry.list_enabled());
//! let title = translator.gettext("Welcome");
//! ```

mod catalog;
mod language;
mod registry;
mod translator;

pub use catalog::{Catalog, CatalogError};
pub use language::{Language, LanguageInfo};
pub use registry::LanguageRegistry;
pub use translator::{TranslationDomain, Translator, TranslatorSource};
