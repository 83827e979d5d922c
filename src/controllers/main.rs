use super::{Controller, ControllerError, Reply, RequestContext};
use crate::i18n::{TranslationDomain, Translator, TranslatorSource};
use crate::scheduler::{CronOutcome, CronRunner};
use crate::templates::TemplateLookup;
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Front page, stylesheet, content pages and the cron trigger.
pub struct MainController {
    templates: Arc<TemplateLookup>,
    translations: Arc<TranslationDomain>,
    cron: Arc<CronRunner>,
}

impl MainController {
    pub fn new(templates: Arc<TemplateLookup>, translations: Arc<TranslationDomain>, cron: Arc<CronRunner>) -> Self {
        Self {
            templates,
            translations,
            cron,
        }
    }

    fn translator(&self, request: &RequestContext) -> Translator {
        match &request.language {
            Some(language) => self.translations.translator(std::slice::from_ref(language)),
            None => Translator::null(),
        }
    }

    fn index(&self, request: &RequestContext) -> Result<Reply, ControllerError> {
        let translator = self.translator(request);
        let mut vars = request.template_vars();
        vars.insert("welcome".to_string(), translator.gettext("Welcome"));
        Ok(Reply::html(self.templates.render("index.tmpl", &vars)?))
    }

    /// Every stylesheet of every template directory, concatenated.
    ///
    /// Stylesheets are unique by file name, so a higher priority directory
    /// overrides a lower one's file of the same name.
    fn css(&self, request: &RequestContext) -> Result<Reply, ControllerError> {
        let mut names = BTreeSet::new();
        for directory in self.templates.directories().iter().rev() {
            let pattern = format!("{}/css/*.tmpl", Pattern::escape(&directory.to_string_lossy()));
            let paths = match glob::glob(&pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!("Bad stylesheet pattern {}: {}", pattern, e);
                    continue;
                }
            };
            for path in paths.flatten() {
                if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                    names.insert(name.to_string());
                }
            }
        }
        debug!("Serving {} stylesheets", names.len());

        let vars = request.template_vars();
        let stylesheets = names
            .iter()
            .map(|name| self.templates.render(&format!("css/{}", name), &vars))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Reply::css(stylesheets.join("\n")))
    }

    /// A content page, read from disk on every request and wrapped in the
    /// content template.
    fn content(&self, request: &RequestContext) -> Result<Reply, ControllerError> {
        let path = PathBuf::from(
            request
                .param("path")
                .ok_or(ControllerError::MissingParameter("path"))?,
        );
        let content = std::fs::read_to_string(&path).map_err(|source| ControllerError::Io {
            path: path.clone(),
            source,
        })?;

        let mut vars = request.template_vars();
        vars.insert("content".to_string(), content);
        Ok(Reply::html(self.templates.render("content.tmpl", &vars)?))
    }

    fn cron(&self) -> Reply {
        match self.cron.run() {
            CronOutcome::Completed(run) => Reply::text(format!(
                "cron: ran {} hooks, {} failed\n",
                run.ran, run.failed
            )),
            CronOutcome::Skipped => Reply::text("cron: already running, skipped\n".to_string()),
        }
    }
}

impl Controller for MainController {
    fn call(&self, action: &str, request: &RequestContext) -> Result<Reply, ControllerError> {
        match action {
            "index" => self.index(request),
            "css" => self.css(request),
            "content" => self.content(request),
            "cron" => Ok(self.cron()),
            other => Err(ControllerError::UnknownAction {
                controller: "main".to_string(),
                action: other.to_string(),
            }),
        }
    }
}
