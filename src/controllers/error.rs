use super::{Controller, ControllerError, Reply, RequestContext};
use crate::templates::TemplateLookup;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::warn;

/// Error documents, for `/error/document` and for the server's own 404 and
/// 500 pages.
pub struct ErrorController {
    templates: Arc<TemplateLookup>,
}

impl ErrorController {
    pub fn new(templates: Arc<TemplateLookup>) -> Self {
        Self { templates }
    }
}

impl Controller for ErrorController {
    fn call(&self, action: &str, request: &RequestContext) -> Result<Reply, ControllerError> {
        match action {
            "document" => {
                let status = request
                    .query
                    .get("code")
                    .and_then(|code| code.parse::<u16>().ok())
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Ok(render_error(&self.templates, request, status))
            }
            other => Err(ControllerError::UnknownAction {
                controller: "error".to_string(),
                action: other.to_string(),
            }),
        }
    }
}

/// Render `error.tmpl` for `status`. Falls back to a plain text page when the
/// template itself cannot be rendered.
pub fn render_error(templates: &TemplateLookup, request: &RequestContext, status: StatusCode) -> Reply {
    let reason = status.canonical_reason().unwrap_or("Error");

    let mut vars = request.template_vars();
    vars.insert("code".to_string(), status.as_u16().to_string());
    vars.insert("message".to_string(), reason.to_string());

    match templates.render("error.tmpl", &vars) {
        Ok(body) => Reply::html(body).with_status(status),
        Err(e) => {
            warn!("Could not render error page: {}", e);
            Reply::text(format!("{} {}\n", status.as_u16(), reason)).with_status(status)
        }
    }
}
