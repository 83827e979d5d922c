//! Request controllers.
//!
//! Controllers are synchronous: the server runs them on the blocking pool.
//! Each one answers a set of named actions.

mod error;
mod main;

pub use error::{render_error, ErrorController};
pub use main::MainController;

use crate::i18n::Language;
use crate::templates::TemplateError;
use axum::http::StatusCode;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("controller {controller} has no action {action}")]
    UnknownAction { controller: String, action: String },

    #[error("missing route parameter {0}")]
    MissingParameter(&'static str),
}

impl ControllerError {
    /// Status of the error page shown for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ControllerError::UnknownAction { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What a controller sees of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub path: String,
    /// Route defaults and captured URL variables
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    /// Language of the matched route, `None` on base routes
    pub language: Option<Language>,
}

impl RequestContext {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Code of the request language, the canonical language on base routes.
    pub fn language_code(&self) -> &str {
        self.language
            .as_ref()
            .map(Language::code)
            .unwrap_or(Language::CANONICAL_CODE)
    }

    /// Variables every page template gets.
    pub fn template_vars(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("lang".to_string(), self.language_code().to_string());
        vars.insert("path".to_string(), self.path.clone());
        vars
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    pub fn html(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    pub fn css(body: String) -> Self {
        Self {
            content_type: "text/css; charset=utf-8",
            ..Self::html(body)
        }
    }

    pub fn text(body: String) -> Self {
        Self {
            content_type: "text/plain; charset=utf-8",
            ..Self::html(body)
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

pub trait Controller: Send + Sync {
    fn call(&self, action: &str, request: &RequestContext) -> Result<Reply, ControllerError>;
}
