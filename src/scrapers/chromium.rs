use crate::config::Config;
use crate::errors::{Result, WatcherError};
use crate::scrapers::base::{BrowserLauncher, RenderedPage, Renderer};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::page::Page;
use futures::{stream, StreamExt};
use log::{debug, info};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 启动无沙箱的无头 Chromium
pub struct ChromiumLauncher {
    request_timeout: Duration,
    quiet_window: Duration,
}

impl ChromiumLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            request_timeout: config.nav_timeout,
            quiet_window: config.idle_quiet_window,
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn Renderer>> {
        // CDP 请求默认 30 秒超时，需与导航超时保持一致
        let browser_config = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.request_timeout)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .build()
            .map_err(WatcherError::LaunchError)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;

        // CDP 事件循环必须持续运行
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        info!("Headless Chromium launched");
        Ok(Box::new(ChromiumRenderer {
            browser,
            handler,
            quiet_window: self.quiet_window,
        }))
    }
}

pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    quiet_window: Duration,
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_page(&self) -> Result<Box<dyn RenderedPage>> {
        let page = self.browser.new_page("about:blank").await?;
        let activity = Arc::new(Mutex::new(NetworkActivity::new(Instant::now())));
        let tracker = track_network(&page, Arc::clone(&activity)).await?;

        Ok(Box::new(ChromiumPage {
            page,
            activity,
            tracker,
            quiet_window: self.quiet_window,
        }))
    }

    async fn shutdown(self: Box<Self>) -> Result<()> {
        let mut this = *self;
        this.browser.close().await?;
        if let Err(e) = this.browser.wait().await {
            debug!("Waiting for browser process failed: {}", e);
        }
        this.handler.abort();
        info!("Headless Chromium closed");
        Ok(())
    }
}

enum NetworkEvent {
    Started(String),
    Finished(String),
}

/// 进行中的网络请求及最近一次变化的时间
#[derive(Debug)]
struct NetworkActivity {
    in_flight: HashSet<String>,
    last_change: Instant,
}

impl NetworkActivity {
    fn new(now: Instant) -> Self {
        Self {
            in_flight: HashSet::new(),
            last_change: now,
        }
    }

    fn apply(&mut self, event: NetworkEvent, now: Instant) {
        match event {
            NetworkEvent::Started(id) => {
                self.in_flight.insert(id);
            }
            NetworkEvent::Finished(id) => {
                self.in_flight.remove(&id);
            }
        }
        self.last_change = now;
    }

    /// 没有进行中的请求，且至少静默了 `quiet_window`
    fn is_idle(&self, now: Instant, quiet_window: Duration) -> bool {
        self.in_flight.is_empty() && now.saturating_duration_since(self.last_change) >= quiet_window
    }
}

// 订阅页面的网络事件，在后台任务中维护进行中的请求集合
async fn track_network(page: &Page, activity: Arc<Mutex<NetworkActivity>>) -> Result<JoinHandle<()>> {
    let started = page
        .event_listener::<EventRequestWillBeSent>()
        .await?
        .map(|event| NetworkEvent::Started(event.request_id.inner().clone()));
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await?
        .map(|event| NetworkEvent::Finished(event.request_id.inner().clone()));
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await?
        .map(|event| NetworkEvent::Finished(event.request_id.inner().clone()));

    let mut events = Box::pin(stream::select(started, stream::select(finished, failed)));
    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let mut activity = activity.lock().unwrap_or_else(|e| e.into_inner());
            activity.apply(event, Instant::now());
        }
    }))
}

pub struct ChromiumPage {
    page: Page,
    activity: Arc<Mutex<NetworkActivity>>,
    tracker: JoinHandle<()>,
    quiet_window: Duration,
}

impl ChromiumPage {
    fn is_idle(&self) -> bool {
        let activity = self.activity.lock().unwrap_or_else(|e| e.into_inner());
        activity.is_idle(Instant::now(), self.quiet_window)
    }
}

#[async_trait]
impl RenderedPage for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(WatcherError::Timeout(format!(
                "navigation timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }

    async fn wait_for_idle(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while !self.is_idle() {
            if Instant::now() >= deadline {
                return Err(WatcherError::Timeout(format!(
                    "network idle not reached within {}ms",
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.tracker.abort();
        self.page.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launcher_uses_navigation_timeout_for_requests() {
        let config = Config::new().with_nav_timeout(Duration::from_secs(90));
        let launcher = ChromiumLauncher::new(&config);
        assert_eq!(launcher.request_timeout, Duration::from_secs(90));
        assert_eq!(launcher.quiet_window, config.idle_quiet_window);
    }

    #[test]
    fn pending_request_keeps_page_busy() {
        let start = Instant::now();
        let quiet = Duration::from_millis(500);
        let mut activity = NetworkActivity::new(start);

        activity.apply(NetworkEvent::Started("1".to_string()), start);
        activity.apply(NetworkEvent::Started("2".to_string()), start);
        activity.apply(NetworkEvent::Finished("1".to_string()), start);
        // 长轮询请求仍未结束
        assert!(!activity.is_idle(start + Duration::from_secs(30), quiet));

        let done = start + Duration::from_secs(31);
        activity.apply(NetworkEvent::Finished("2".to_string()), done);
        assert!(!activity.is_idle(done + Duration::from_millis(100), quiet));
        assert!(activity.is_idle(done + quiet, quiet));
    }

    #[test]
    fn redirect_reuses_request_id() {
        let start = Instant::now();
        let mut activity = NetworkActivity::new(start);

        activity.apply(NetworkEvent::Started("doc".to_string()), start);
        activity.apply(NetworkEvent::Started("doc".to_string()), start);
        activity.apply(NetworkEvent::Finished("doc".to_string()), start);

        assert!(activity.is_idle(start + Duration::from_secs(1), Duration::from_millis(500)));
    }

    #[tokio::test]
    #[ignore] // 需要本机安装 Chromium
    async fn renders_data_url() {
        let config = Config::new();
        let renderer = ChromiumLauncher::new(&config).launch().await.unwrap();
        let mut page = renderer.open_page().await.unwrap();

        page.navigate(
            "data:text/html,<div><span>24H Hashrate</span><span>5.2 TH/s</span></div>",
            Duration::from_secs(10),
        )
        .await
        .unwrap();
        page.wait_for_idle(Duration::from_secs(5)).await.unwrap();

        let html = page.content().await.unwrap();
        assert!(html.contains("5.2 TH/s"));

        page.close().await.unwrap();
        renderer.shutdown().await.unwrap();
    }
}
