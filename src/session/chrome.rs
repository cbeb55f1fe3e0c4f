//! chromiumoxide-backed implementation of the session traits. One browser
//! process serves the whole run; every acquired session is its own tab.

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element as CdpElement;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Element, Session, SessionError, SessionProvider};

impl From<CdpError> for SessionError {
    fn from(err: CdpError) -> Self {
        SessionError::Browser(err.to_string())
    }
}

const IS_DISPLAYED_FN: &str = "function() {
    const rect = this.getBoundingClientRect();
    if (rect.width <= 0 || rect.height <= 0) return false;
    const style = window.getComputedStyle(this);
    return style.display !== 'none' && style.visibility !== 'hidden';
}";

pub struct ChromeProvider {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl ChromeProvider {
    /// Launch a headless browser tuned like the production runs: fixed
    /// window size, automation flag hidden, shm disabled for containers.
    pub async fn launch() -> Result<Self, SessionError> {
        let config = BrowserConfig::builder()
            .window_size(1280, 1024)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(SessionError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Close the browser and stop its event loop.
    pub async fn shutdown(mut self) -> Result<(), SessionError> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for ChromeProvider {
    async fn acquire(&self) -> Result<Box<dyn Session>, SessionError> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(Box::new(ChromeSession { page }))
    }

    async fn release(&self, mut session: Box<dyn Session>) -> Result<(), SessionError> {
        session.close().await
    }
}

pub struct ChromeSession {
    page: Page,
}

#[async_trait]
impl Session for ChromeSession {
    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn back(&self) -> Result<(), SessionError> {
        self.page.evaluate("history.back()").await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn document_ready(&self) -> Result<bool, SessionError> {
        let result = self.page.evaluate("document.readyState").await?;
        Ok(result.into_value::<String>().unwrap_or_default() == "complete")
    }

    async fn scroll_to_bottom(&self) -> Result<u64, SessionError> {
        let result = self
            .page
            .evaluate(
                "(() => { window.scrollTo(0, document.body.scrollHeight); \
                 return document.body.scrollHeight; })()",
            )
            .await?;
        Ok(result.into_value::<u64>().unwrap_or_default())
    }

    async fn query(&self, selector: &str) -> Result<Option<Box<dyn Element>>, SessionError> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(wrap(element))),
            Err(CdpError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, SessionError> {
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements.into_iter().map(wrap).collect()),
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<(), SessionError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page.save_screenshot(params, path).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.page.clone().close().await?;
        Ok(())
    }
}

fn wrap(element: CdpElement) -> Box<dyn Element> {
    Box::new(ChromeElement { inner: element })
}

struct ChromeElement {
    inner: CdpElement,
}

#[async_trait]
impl Element for ChromeElement {
    async fn attr(&self, name: &str) -> Result<Option<String>, SessionError> {
        Ok(self.inner.attribute(name).await?)
    }

    async fn text(&self) -> Result<String, SessionError> {
        Ok(self.inner.inner_text().await?.unwrap_or_default())
    }

    async fn click(&self) -> Result<(), SessionError> {
        match self.inner.click().await {
            Ok(_) => Ok(()),
            Err(err) => {
                // overlays sometimes swallow the synthetic mouse event
                debug!("Native click failed ({}), falling back to JS", err);
                self.inner
                    .call_js_fn("function() { this.click(); }", false)
                    .await?;
                Ok(())
            }
        }
    }

    async fn scroll_into_view(&self) -> Result<(), SessionError> {
        self.inner
            .call_js_fn(
                "function() { this.scrollIntoView({block: 'center', inline: 'center'}); }",
                false,
            )
            .await?;
        Ok(())
    }

    async fn remove_attr(&self, name: &str) -> Result<(), SessionError> {
        self.inner
            .call_js_fn(
                &format!("function() {{ this.removeAttribute('{name}'); }}"),
                false,
            )
            .await?;
        Ok(())
    }

    async fn is_displayed(&self) -> Result<bool, SessionError> {
        let returns = self.inner.call_js_fn(IS_DISPLAYED_FN, false).await?;
        Ok(returns
            .result
            .value
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }

    async fn query(&self, selector: &str) -> Result<Option<Box<dyn Element>>, SessionError> {
        match self.inner.find_element(selector).await {
            Ok(element) => Ok(Some(wrap(element))),
            Err(CdpError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, SessionError> {
        match self.inner.find_elements(selector).await {
            Ok(elements) => Ok(elements.into_iter().map(wrap).collect()),
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}
