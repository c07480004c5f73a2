use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::feedback::{ErrorLog, LogEntry, LogKind};
use crate::i18n::I18nManager;

pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

type ErrorCallback = Arc<dyn Fn(&CaughtError) + Send + Sync>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaughtError {
    pub message: String,
    /// The render panicked instead of returning an error.
    pub panicked: bool,
    pub boundary: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundaryFallback {
    pub title: String,
    pub message: String,
    pub retry_label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Rendered<T> {
    Content(T),
    Fallback(BoundaryFallback),
}

impl<T> Rendered<T> {
    pub fn content(self) -> Option<T> {
        match self {
            Rendered::Content(content) => Some(content),
            Rendered::Fallback(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Rendered::Fallback(_))
    }
}

/// Contains render failures of a subtree and shows a fallback instead.
pub struct ErrorBoundary {
    name: Option<String>,
    error: Option<CaughtError>,
    reset_keys: Option<Vec<String>>,
    on_error: Option<ErrorCallback>,
    log: Option<ErrorLog>,
    i18n: I18nManager,
}

impl Default for ErrorBoundary {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorBoundary {
    pub fn new() -> Self {
        Self {
            name: None,
            error: None,
            reset_keys: None,
            on_error: None,
            log: None,
            i18n: I18nManager::new(),
        }
    }

    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&CaughtError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn log(mut self, log: ErrorLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn i18n(mut self, i18n: I18nManager) -> Self {
        self.i18n = i18n;
        self
    }

    pub fn error(&self) -> Option<&CaughtError> {
        self.error.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Clears the recorded error so the next render runs the subtree again.
    pub fn reset(&mut self) {
        self.error = None;
    }

    pub fn render<T>(&mut self, render: impl FnOnce() -> Result<T, RenderError>) -> Rendered<T> {
        if let Some(error) = &self.error {
            return Rendered::Fallback(self.fallback(error));
        }

        let caught = match catch_unwind(AssertUnwindSafe(render)) {
            Ok(Ok(content)) => return Rendered::Content(content),
            Ok(Err(error)) => {
                if let Some(log) = &self.log {
                    log.log_error(&*error, self.name.as_deref());
                }
                CaughtError {
                    message: error.to_string(),
                    panicked: false,
                    boundary: self.name.clone(),
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                if let Some(log) = &self.log {
                    let mut entry = LogEntry::new(message.clone(), LogKind::Error);
                    entry.context = self.name.clone();
                    log.push(entry);
                }
                CaughtError {
                    message,
                    panicked: true,
                    boundary: self.name.clone(),
                }
            }
        };

        tracing::error!(
            boundary = self.name.as_deref().unwrap_or("anonymous"),
            panicked = caught.panicked,
            error = %caught.message,
            "render failed, showing fallback"
        );
        if let Some(on_error) = &self.on_error {
            on_error(&caught);
        }
        let fallback = self.fallback(&caught);
        self.error = Some(caught);
        Rendered::Fallback(fallback)
    }

    /// Like [`ErrorBoundary::render`], resetting first when `keys` differ from
    /// the keys of the previous keyed render.
    pub fn render_keyed<T, K: ToString>(
        &mut self,
        keys: &[K],
        render: impl FnOnce() -> Result<T, RenderError>,
    ) -> Rendered<T> {
        let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
        if self.reset_keys.as_ref().is_some_and(|previous| *previous != keys) {
            self.reset();
        }
        self.reset_keys = Some(keys);
        self.render(render)
    }

    fn fallback(&self, error: &CaughtError) -> BoundaryFallback {
        BoundaryFallback {
            title: self.i18n.t("boundary.fallback"),
            message: error.message.clone(),
            retry_label: self.i18n.t("boundary.retry"),
        }
    }
}

impl Debug for ErrorBoundary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("name", &self.name)
            .field("error", &self.error)
            .field("reset_keys", &self.reset_keys)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "render panicked".to_string()
    }
}
