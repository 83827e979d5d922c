//! HTTP front end.
//!
//! Every request goes through one fallback handler that matches the path
//! against the route table and calls the named controller action on the
//! blocking pool.

use crate::controllers::{render_error, Controller, ErrorController, MainController, Reply, RequestContext};
use crate::environment::Environment;
use crate::routing::{make_map, I18nMapper};
use crate::scheduler::CronRunner;
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Shared application state.
pub struct App {
    env: Environment,
    map: I18nMapper,
    controllers: HashMap<String, Arc<dyn Controller>>,
    cron: Arc<CronRunner>,
}

impl App {
    /// Build the route table and controllers. Plugin controllers override
    /// the built-in ones of the same name.
    pub fn new(env: Environment) -> Result<Self> {
        let map = make_map(&env).context("Failed to build the route table")?;
        let cron = Arc::new(CronRunner::new(Arc::clone(&env.config), Arc::clone(&env.plugins)));

        let mut controllers: HashMap<String, Arc<dyn Controller>> = HashMap::new();
        controllers.insert(
            "main".to_string(),
            Arc::new(MainController::new(
                Arc::clone(&env.templates),
                Arc::clone(&env.translations),
                Arc::clone(&cron),
            )),
        );
        controllers.insert(
            "error".to_string(),
            Arc::new(ErrorController::new(Arc::clone(&env.templates))),
        );
        for (name, controller) in env.plugins.controllers() {
            controllers.insert(name.to_string(), Arc::clone(controller));
        }

        Ok(Self {
            env,
            map,
            controllers,
            cron,
        })
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn map(&self) -> &I18nMapper {
        &self.map
    }

    pub fn cron_runner(&self) -> Arc<CronRunner> {
        Arc::clone(&self.cron)
    }
}

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Bind to the configured address and serve until the process ends.
pub async fn serve(app: Arc<App>) -> Result<()> {
    let addr = app.env.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(app)).await.context("Server error")?;
    Ok(())
}

async fn dispatch(
    State(app): State<Arc<App>>,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let path = uri.path().to_string();

    let Some(matched) = app.map.match_path(&path) else {
        debug!("No route for {}", path);
        return error_page(&app, &RequestContext { path, query, ..Default::default() }, StatusCode::NOT_FOUND);
    };

    let action = matched.action().to_string();
    let request = RequestContext {
        path,
        params: matched.params.clone(),
        query,
        language: matched.language.clone(),
    };

    let controller = match matched.controller().and_then(|name| app.controllers.get(name)) {
        Some(controller) => Arc::clone(controller),
        None => {
            debug!("Route for {} names no known controller", request.path);
            return error_page(&app, &request, StatusCode::NOT_FOUND);
        }
    };

    let call_request = request.clone();
    let result = tokio::task::spawn_blocking(move || controller.call(&action, &call_request)).await;

    match result {
        Ok(Ok(reply)) => into_response(reply),
        Ok(Err(e)) => {
            error!("Request for {} failed: {}", request.path, e);
            error_page(&app, &request, e.status())
        }
        Err(e) => {
            error!("Controller task for {} panicked: {}", request.path, e);
            error_page(&app, &request, StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn error_page(app: &App, request: &RequestContext, status: StatusCode) -> Response {
    into_response(render_error(&app.env.templates, request, status))
}

fn into_response(reply: Reply) -> Response {
    (reply.status, [(header::CONTENT_TYPE, reply.content_type)], reply.body).into_response()
}
