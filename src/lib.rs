//! spline: a small web application whose every route also exists under a
//! `/{lang}` prefix with translated path segments, plus the extractor that
//! collects its translatable strings.

pub mod config;
pub mod controllers;
pub mod environment;
pub mod extract;
pub mod i18n;
pub mod plugin;
pub mod routing;
pub mod scheduler;
pub mod server;
pub mod templates;
