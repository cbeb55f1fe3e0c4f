pub mod chrome;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failures raised by the browser automation layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser: {0}")]
    Browser(String),
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { waited: Duration, what: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Handle to one DOM element. Locates return `Ok(None)` when nothing matches;
/// an `Err` means the session itself failed, not that the element is absent.
#[async_trait]
pub trait Element: Send + Sync {
    async fn attr(&self, name: &str) -> Result<Option<String>, SessionError>;
    /// Rendered text content. Hidden elements read as empty.
    async fn text(&self) -> Result<String, SessionError>;
    async fn click(&self) -> Result<(), SessionError>;
    async fn scroll_into_view(&self) -> Result<(), SessionError>;
    async fn remove_attr(&self, name: &str) -> Result<(), SessionError>;
    async fn is_displayed(&self) -> Result<bool, SessionError>;
    async fn query(&self, selector: &str) -> Result<Option<Box<dyn Element>>, SessionError>;
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, SessionError>;
}

/// One isolated automation session: a headless browser with a single tab.
#[async_trait]
pub trait Session: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), SessionError>;
    async fn back(&self) -> Result<(), SessionError>;
    async fn current_url(&self) -> Result<String, SessionError>;
    async fn document_ready(&self) -> Result<bool, SessionError>;
    /// Scroll to the bottom of the page and report the page height.
    async fn scroll_to_bottom(&self) -> Result<u64, SessionError>;
    async fn query(&self, selector: &str) -> Result<Option<Box<dyn Element>>, SessionError>;
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, SessionError>;
    async fn screenshot(&self, path: &Path) -> Result<(), SessionError>;
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Hands out isolated sessions. The executor acquires exactly one per task
/// and releases it unconditionally before the next task starts.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn Session>, SessionError>;
    async fn release(&self, session: Box<dyn Session>) -> Result<(), SessionError>;
}
