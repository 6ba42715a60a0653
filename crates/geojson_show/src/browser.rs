use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use url::Url;

use crate::error::ShowError;

/// A capability for opening the served URL, selected by URI scheme at
/// configuration time.
#[derive(Debug, Clone)]
pub enum Browser {
    Web(WebBrowser),
    Null(NullBrowser),
}

impl Browser {
    pub fn open_url(&self, url: &str) -> Result<(), ShowError> {
        match self {
            Browser::Web(b) => b.open_url(url),
            Browser::Null(b) => b.open_url(url),
        }
    }
}

/// Opens URLs in the operating system's default web browser.
#[derive(Debug, Clone, Default)]
pub struct WebBrowser;

impl WebBrowser {
    pub fn open_url(&self, url: &str) -> Result<(), ShowError> {
        webbrowser::open(url).map_err(|e| ShowError::BrowserOpen(e.to_string()))
    }
}

/// Records opened URLs and does nothing else. The headless implementation,
/// used by tests and scripted runs.
#[derive(Debug, Clone, Default)]
pub struct NullBrowser {
    opened: Arc<Mutex<Vec<String>>>,
}

impl NullBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_url(&self, url: &str) -> Result<(), ShowError> {
        tracing::debug!(%url, "null browser open");
        self.opened
            .lock()
            .expect("null browser lock poisoned")
            .push(url.to_string());
        Ok(())
    }

    /// URLs opened so far, in order.
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .expect("null browser lock poisoned")
            .clone()
    }
}

pub type BrowserInit = fn(&Url) -> Result<Browser, ShowError>;

/// Maps URI schemes to browser constructors. Constructed explicitly at
/// process start and passed to whatever needs to resolve a browser.
pub struct BrowserRegistry {
    schemes: HashMap<String, BrowserInit>,
}

impl BrowserRegistry {
    pub fn new() -> Self {
        Self {
            schemes: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("web", |_| Ok(Browser::Web(WebBrowser)));
        registry.register("null", |_| Ok(Browser::Null(NullBrowser::new())));
        registry
    }

    pub fn register(&mut self, scheme: &str, init: BrowserInit) {
        self.schemes.insert(scheme.to_string(), init);
    }

    /// Resolves a browser URI such as `web://`. The constructor receives the
    /// full parsed URI so scheme-specific implementations can read their
    /// configuration from query parameters.
    pub fn resolve(&self, uri: &str) -> Result<Browser, ShowError> {
        let parsed = Url::parse(uri)
            .map_err(|e| ShowError::Config(format!("invalid browser uri '{uri}': {e}")))?;

        let init = self.schemes.get(parsed.scheme()).ok_or_else(|| {
            ShowError::Config(format!(
                "unknown browser scheme '{}', valid schemes are: {}",
                parsed.scheme(),
                self.schemes().join(", ")
            ))
        })?;

        init(&parsed)
    }

    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.schemes.keys().cloned().collect();
        schemes.sort();
        schemes
    }
}

impl Default for BrowserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
