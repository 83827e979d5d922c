//! Plugins: bundles of templates, content, controllers and hooks.
//!
//! The registry is built once at startup from an explicit plugin list and
//! handed to whoever needs it.

use crate::config::Config;
use crate::controllers::Controller;
use crate::routing::I18nMapper;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Order in which plugin components are loaded; lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    VeryFirst = 1,
    First = 2,
    Normal = 3,
    Last = 4,
    VeryLast = 5,
}

pub type RoutesMappingFn = Arc<dyn Fn(&Config, &mut I18nMapper) -> Result<()> + Send + Sync>;
pub type CronFn = Arc<dyn Fn(&Config) -> Result<()> + Send + Sync>;

/// Code a plugin injects at a named point.
#[derive(Clone)]
pub enum Hook {
    /// Runs while building the route table, before the catch-all `/` route
    RoutesMapping(RoutesMappingFn),
    /// Runs on every cron trigger
    Cron(CronFn),
}

impl Hook {
    pub fn name(&self) -> &'static str {
        match self {
            Hook::RoutesMapping(_) => "routes_mapping",
            Hook::Cron(_) => "cron",
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({})", self.name())
    }
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn root_dir(&self) -> &Path;

    /// Template directories with their priority. Defaults to `templates/`
    /// under the plugin root, if present.
    fn template_dirs(&self) -> Vec<(PathBuf, Priority)> {
        let dir = self.root_dir().join("templates");
        if dir.is_dir() {
            vec![(dir, Priority::Normal)]
        } else {
            Vec::new()
        }
    }

    /// Directory of content pages. Defaults to `content/`, if present.
    fn content_dir(&self) -> Option<PathBuf> {
        let dir = self.root_dir().join("content");
        dir.is_dir().then_some(dir)
    }

    fn controllers(&self) -> Vec<(String, Arc<dyn Controller>)> {
        Vec::new()
    }

    fn hooks(&self) -> Vec<(Priority, Hook)> {
        Vec::new()
    }
}

/// The application's own templates and content. Its templates have the
/// lowest priority so any plugin can override them.
#[derive(Debug, Clone)]
pub struct CorePlugin {
    root_dir: PathBuf,
}

impl CorePlugin {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }
}

impl Plugin for CorePlugin {
    fn name(&self) -> &str {
        "core"
    }

    fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn template_dirs(&self) -> Vec<(PathBuf, Priority)> {
        vec![(self.root_dir.join("templates"), Priority::VeryLast)]
    }
}

/// A pseudo-plugin made from an instance directory. Its templates come
/// first, so a deployment can override any template.
#[derive(Debug, Clone)]
pub struct LocalPlugin {
    root_dir: PathBuf,
}

impl LocalPlugin {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }
}

impl Plugin for LocalPlugin {
    fn name(&self) -> &str {
        "local"
    }

    fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn template_dirs(&self) -> Vec<(PathBuf, Priority)> {
        vec![(self.root_dir.join("templates"), Priority::VeryFirst)]
    }

    fn content_dir(&self) -> Option<PathBuf> {
        Some(self.root_dir.join("content"))
    }
}

#[derive(Debug, Clone)]
struct Registered {
    plugin: String,
    priority: Priority,
    hook: Hook,
}

/// Summary of one run of a set of hooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookRun {
    pub ran: usize,
    pub failed: usize,
}

/// Everything the loaded plugins provide.
#[derive(Default)]
pub struct PluginRegistry {
    names: Vec<String>,
    template_dirs: Vec<PathBuf>,
    content_dirs: Vec<PathBuf>,
    controllers: HashMap<String, Arc<dyn Controller>>,
    hooks: Vec<Registered>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("names", &self.names)
            .field("template_dirs", &self.template_dirs)
            .field("content_dirs", &self.content_dirs)
            .field("controllers", &self.controllers.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl PluginRegistry {
    pub fn load(plugins: &[Arc<dyn Plugin>]) -> Self {
        let mut registry = Self::default();
        let mut template_dirs: Vec<(PathBuf, Priority)> = Vec::new();

        for plugin in plugins {
            let name = plugin.name().to_string();
            debug!("Loading plugin {} from {:?}", name, plugin.root_dir());

            template_dirs.extend(plugin.template_dirs());
            if let Some(dir) = plugin.content_dir() {
                registry.content_dirs.push(dir);
            }
            for (controller, instance) in plugin.controllers() {
                if registry.controllers.insert(controller.clone(), instance).is_some() {
                    debug!("Plugin {} replaces controller {}", name, controller);
                }
            }
            for (priority, hook) in plugin.hooks() {
                registry.hooks.push(Registered {
                    plugin: name.clone(),
                    priority,
                    hook,
                });
            }
            registry.names.push(name);
        }

        // Stable sorts keep plugin order within a priority
        template_dirs.sort_by_key(|(_, priority)| *priority);
        registry.template_dirs = template_dirs.into_iter().map(|(dir, _)| dir).collect();
        registry.hooks.sort_by_key(|registered| registered.priority);

        info!(
            "Loaded {} plugins ({} template directories, {} hooks)",
            registry.names.len(),
            registry.template_dirs.len(),
            registry.hooks.len()
        );
        registry
    }

    pub fn plugin_names(&self) -> &[String] {
        &self.names
    }

    /// Template directories, highest priority first.
    pub fn template_dirs(&self) -> &[PathBuf] {
        &self.template_dirs
    }

    pub fn content_dirs(&self) -> &[PathBuf] {
        &self.content_dirs
    }

    pub fn controller(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.controllers.get(name).cloned()
    }

    pub fn controllers(&self) -> impl Iterator<Item = (&str, &Arc<dyn Controller>)> {
        self.controllers.iter().map(|(name, controller)| (name.as_str(), controller))
    }

    /// Run every `routes_mapping` hook. The first failure aborts route
    /// table construction.
    pub fn run_routes_mapping(&self, config: &Config, map: &mut I18nMapper) -> Result<()> {
        for registered in &self.hooks {
            if let Hook::RoutesMapping(hook) = &registered.hook {
                debug!("Running routes_mapping hook of {}", registered.plugin);
                hook(config, map)
                    .with_context(|| format!("routes_mapping hook of plugin {} failed", registered.plugin))?;
            }
        }
        Ok(())
    }

    /// Run every `cron` hook. Failures are logged and do not stop the others.
    pub fn run_cron(&self, config: &Config) -> HookRun {
        let mut run = HookRun::default();
        for registered in &self.hooks {
            if let Hook::Cron(hook) = &registered.hook {
                run.ran += 1;
                if let Err(e) = hook(config) {
                    run.failed += 1;
                    error!("Cron hook of {} failed: {:#}", registered.plugin, e);
                }
            }
        }
        run
    }
}
