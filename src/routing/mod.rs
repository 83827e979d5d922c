//! URL routing.
//!
//! - `pattern`: URL patterns with placeholders and wildcards
//! - `mapper`: the route table, adding a `/{lang}` variant of every route
//! - `content`: routes for content pages found on disk
//!
//! [`make_map`] builds the application's route table in precedence order:
//! content pages first so nothing can shadow them, the catch-all `/` last so
//! plugins can map anything before it.

mod content;
mod mapper;
mod pattern;

pub use content::connect_content;
pub use mapper::{
    translate_url, I18nMapper, MapperError, Route, RouteKey, RouteMatch, RouteSpec, LANG_PARAM, URL_CONTEXT,
};
pub use pattern::{is_static_segment, RoutePattern};

use crate::environment::Environment;
use anyhow::{Context, Result};
use tracing::info;

pub fn make_map(env: &Environment) -> Result<I18nMapper> {
    let mut map = I18nMapper::new(&env.languages);

    let pages = connect_content(&mut map, env.plugins.content_dirs()).context("Failed to map content pages")?;
    info!("Mapped {} content pages", pages);

    map.connect(RouteSpec::new("/error/{action}").controller("error"))?;
    map.connect(RouteSpec::new("/error/{action}/{id}").controller("error"))?;

    map.connect(RouteSpec::new("/css").controller("main").action("css"))?;
    map.connect(RouteSpec::new("/cron").controller("main").action("cron"))?;

    env.plugins.run_routes_mapping(&env.config, &mut map)?;

    map.connect(RouteSpec::new("/").controller("main").action("index"))?;

    info!(
        "Route table ready: {} routes, {} languages",
        map.len(),
        map.languages().len()
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::environment::load_environment;
    use crate::plugin::{Hook, Plugin, Priority};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct NewsPlugin;

    impl Plugin for NewsPlugin {
        fn name(&self) -> &str {
            "news"
        }

        fn root_dir(&self) -> &Path {
            Path::new("/nonexistent")
        }

        fn hooks(&self) -> Vec<(Priority, Hook)> {
            vec![(
                Priority::Normal,
                Hook::RoutesMapping(Arc::new(|_: &Config, map: &mut I18nMapper| -> Result<()> {
                    map.connect(RouteSpec::named("news", "/{section}").controller("news"))?;
                    Ok(())
                })),
            )]
        }
    }

    fn site() -> TempDir {
        let root = TempDir::new().unwrap();
        let content = root.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("css.html"), "page named like a route").unwrap();
        let messages = root.path().join("i18n/es/LC_MESSAGES");
        fs::create_dir_all(&messages).unwrap();
        fs::write(messages.join("spline.po"), "").unwrap();
        root
    }

    #[test]
    fn test_route_order() {
        let root = site();
        let env = load_environment(Config::for_root(root.path()), vec![Arc::new(NewsPlugin)]).unwrap();
        let map = make_map(&env).unwrap();

        let base: Vec<&str> = map
            .routes()
            .filter(|route| route.language().is_none())
            .map(|route| route.url())
            .collect();
        assert_eq!(
            base,
            vec!["/css.html", "/error/{action}", "/error/{action}/{id}", "/css", "/cron", "/{section}", "/"]
        );
        // Every route has a Spanish variant
        assert_eq!(map.len(), base.len() * 2);
    }

    #[test]
    fn test_plugin_routes_precede_index() {
        let root = site();
        let env = load_environment(Config::for_root(root.path()), vec![Arc::new(NewsPlugin)]).unwrap();
        let map = make_map(&env).unwrap();

        assert_eq!(map.match_path("/css").unwrap().action(), "css");
        assert_eq!(map.match_path("/sports").unwrap().controller(), Some("news"));
        assert_eq!(map.match_path("/").unwrap().action(), "index");
        assert_eq!(map.match_path("/es/css").unwrap().param(LANG_PARAM), Some("es"));
    }

    #[test]
    fn test_error_routes() {
        let root = site();
        let env = load_environment(Config::for_root(root.path()), vec![]).unwrap();
        let map = make_map(&env).unwrap();

        let matched = map.match_path("/error/document/3").unwrap();
        assert_eq!(matched.controller(), Some("error"));
        assert_eq!(matched.action(), "document");
        assert_eq!(matched.param("id"), Some("3"));

        let index = map.match_path("/es").unwrap();
        assert_eq!(index.action(), "index");
        assert_eq!(index.param(LANG_PARAM), Some("es"));
    }
}
