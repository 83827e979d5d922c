use crate::config::Config;
use crate::i18n::{LanguageRegistry, TranslationDomain};
use crate::plugin::{CorePlugin, LocalPlugin, Plugin, PluginRegistry};
use crate::templates::TemplateLookup;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Everything loaded once at startup and shared by the route table,
/// controllers and scheduler.
#[derive(Debug, Clone)]
pub struct Environment {
    pub config: Arc<Config>,
    pub languages: LanguageRegistry,
    pub plugins: Arc<PluginRegistry>,
    pub templates: Arc<TemplateLookup>,
    pub translations: Arc<TranslationDomain>,
}

/// Load plugins, languages and catalogs.
///
/// Plugin order: the core application, then `extra_plugins`, then the local
/// instance directory if one is configured.
pub fn load_environment(config: Config, extra_plugins: Vec<Arc<dyn Plugin>>) -> Result<Environment> {
    let mut plugins: Vec<Arc<dyn Plugin>> = vec![Arc::new(CorePlugin::new(&config.root_dir))];
    plugins.extend(extra_plugins);
    if let Some(local_dir) = &config.local_dir {
        plugins.push(Arc::new(LocalPlugin::new(local_dir)));
    }
    let plugins = PluginRegistry::load(&plugins);

    let languages = LanguageRegistry::discover(&config.locale_dir, &config.domain)
        .with_context(|| format!("Failed to discover languages in {:?}", config.locale_dir))?;
    let translations = TranslationDomain::load(&config.domain, &config.locale_dir, &languages)
        .with_context(|| format!("Failed to load {} catalogs", config.domain))?;
    info!(
        "Languages: {}",
        languages
            .list_enabled()
            .iter()
            .map(|language| language.code())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let templates = TemplateLookup::new(plugins.template_dirs().to_vec());

    Ok(Environment {
        config: Arc::new(config),
        languages,
        plugins: Arc::new(plugins),
        templates: Arc::new(templates),
        translations: Arc::new(translations),
    })
}
