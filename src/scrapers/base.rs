use crate::errors::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Starts a rendering engine for one run
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Renderer>>;
}

/// 渲染引擎，每个目标打开一个独立页面
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh, isolated page
    async fn open_page(&self) -> Result<Box<dyn RenderedPage>>;

    /// 关闭浏览器并释放资源
    async fn shutdown(self: Box<Self>) -> Result<()>;
}

/// 单个渲染页面
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// Navigate to `url`, failing with a timeout error after `timeout`
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// 等待网络空闲；超过 `timeout` 时返回 `WatcherError::Timeout`
    async fn wait_for_idle(&mut self, timeout: Duration) -> Result<()>;

    /// Rendered document HTML
    async fn content(&self) -> Result<String>;

    async fn close(self: Box<Self>) -> Result<()>;
}
