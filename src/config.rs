use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub debug: bool,

    // Application layout
    pub root_dir: PathBuf,
    pub local_dir: Option<PathBuf>,

    // Translations
    pub locale_dir: PathBuf,
    pub domain: String,

    // Scheduler (6-field cron expression, seconds first)
    pub cron_schedule: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let root_dir = PathBuf::from(std::env::var("SPLINE_ROOT").unwrap_or_else(|_| ".".to_string()));

        let port = match std::env::var("PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?,
            Err(_) => 5000,
        };

        Ok(Self {
            // Server
            host: std::env::var("SPLINE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            debug: std::env::var("SPLINE_DEBUG")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),

            // Translations
            locale_dir: std::env::var("SPLINE_LOCALE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| root_dir.join("i18n")),
            domain: std::env::var("SPLINE_DOMAIN").unwrap_or_else(|_| "spline".to_string()),

            // Application layout
            local_dir: std::env::var("SPLINE_LOCAL_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            root_dir,

            // Scheduler
            cron_schedule: std::env::var("SPLINE_CRON_SCHEDULE")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }

    /// Defaults for an application rooted at `root_dir`, ignoring the
    /// environment.
    pub fn for_root(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            debug: false,
            local_dir: None,
            locale_dir: root_dir.join("i18n"),
            domain: "spline".to_string(),
            cron_schedule: None,
            root_dir,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 8] = [
        "SPLINE_HOST",
        "PORT",
        "SPLINE_ROOT",
        "SPLINE_LOCAL_DIR",
        "SPLINE_LOCALE_DIR",
        "SPLINE_DOMAIN",
        "SPLINE_DEBUG",
        "SPLINE_CRON_SCHEDULE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.root_dir, PathBuf::from("."));
        assert_eq!(config.locale_dir, PathBuf::from("./i18n"));
        assert_eq!(config.domain, "spline");
        assert!(config.local_dir.is_none());
        assert!(config.cron_schedule.is_none());
        assert!(!config.debug);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("SPLINE_ROOT", "/srv/spline");
        std::env::set_var("PORT", "8080");
        std::env::set_var("SPLINE_DEBUG", "yes");
        std::env::set_var("SPLINE_LOCAL_DIR", "/srv/site");
        std::env::set_var("SPLINE_CRON_SCHEDULE", "0 */5 * * * *");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.port, 8080);
        assert!(config.debug);
        assert_eq!(config.locale_dir, PathBuf::from("/srv/spline/i18n"));
        assert_eq!(config.local_dir, Some(PathBuf::from("/srv/site")));
        assert_eq!(config.cron_schedule.as_deref(), Some("0 */5 * * * *"));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_port() {
        clear_env();
        std::env::set_var("PORT", "http");
        let result = Config::from_env();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_for_root() {
        let config = Config::for_root("/app");
        assert_eq!(config.locale_dir, PathBuf::from("/app/i18n"));
        assert_eq!(config.domain, "spline");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
