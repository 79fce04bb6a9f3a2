use crate::config::Config;
use crate::errors::{Result, WatcherError};
use crate::models::watcher::{DashboardUrl, Reading, Snapshot, WatchTarget};
use crate::scrapers::base::{BrowserLauncher, RenderedPage, Renderer};
use crate::scrapers::extract::Extractor;
use crate::services::output::OutputGuard;
use crate::services::watch_list;
use crate::util::{self, url_utils};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

/// 快照服务，依次访问每个观察者面板并写出结果
pub struct SnapshotService {
    config: Config,
    launcher: Arc<dyn BrowserLauncher>,
    extractor: Extractor,
}

impl SnapshotService {
    /// 创建新的快照服务实例
    pub fn new(config: Config, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            config,
            launcher,
            extractor: Extractor::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 完整运行一次：读取列表、抓取、写出结果
    ///
    /// 无论以何种方式结束，输出文件都会被写入且只写一次。返回写出的快照数量。
    pub async fn run_to_file(&self) -> Result<usize> {
        let output = OutputGuard::new(&self.config.output_path);
        let targets = watch_list::load(&self.config.input_path);

        if targets.is_empty() {
            warn!("No watch targets configured, writing empty result");
            output.commit(&[])?;
            return Ok(0);
        }

        let snapshots = self.run(&targets).await?;
        output.commit(&snapshots)?;
        Ok(snapshots.len())
    }

    /// 按输入顺序为每个目标生成一个快照
    pub async fn run(&self, targets: &[WatchTarget]) -> Result<Vec<Snapshot>> {
        let renderer = self.launcher.launch().await?;
        let ts = util::format_timestamp(&Utc::now());

        let mut snapshots = Vec::with_capacity(targets.len());
        for target in targets {
            snapshots.push(self.capture(renderer.as_ref(), target, &ts).await);
        }

        if let Err(e) = renderer.shutdown().await {
            warn!("Failed to shut down browser: {}", e);
        }

        let failed = snapshots.iter().filter(|s| !s.ok).count();
        info!(
            "Captured {} snapshots ({} ok, {} failed)",
            snapshots.len(),
            snapshots.len() - failed,
            failed
        );
        Ok(snapshots)
    }

    /// 抓取单个目标；任何错误都记录在快照中而不会向上传播
    pub async fn capture(&self, renderer: &dyn Renderer, target: &WatchTarget, ts: &str) -> Snapshot {
        let date = util::format_day(&Utc::now());

        let dashboard = match url_utils::normalize(target) {
            Ok(dashboard) => dashboard,
            Err(e) => {
                warn!("[ERR] {} => {}", target.label(), e);
                return Snapshot::failed(target, None, e.to_string(), &date, ts);
            }
        };

        match self.visit(renderer, &dashboard).await {
            Ok(reading) => {
                info!(
                    "[OK] {} => {}",
                    target.label(),
                    reading.hashrate.as_deref().unwrap_or("N/A")
                );
                Snapshot::captured(target, &dashboard, reading, &date, ts)
            }
            Err(e) => {
                warn!("[ERR] {} => {}", target.label(), e);
                Snapshot::failed(target, Some(&dashboard), e.to_string(), &date, ts)
            }
        }
    }

    // 每个目标使用独立页面，结束后立即关闭
    async fn visit(&self, renderer: &dyn Renderer, dashboard: &DashboardUrl) -> Result<Reading> {
        let mut page = renderer.open_page().await?;
        let result = self.read_page(page.as_mut(), dashboard).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
        result
    }

    async fn read_page(&self, page: &mut dyn RenderedPage, dashboard: &DashboardUrl) -> Result<Reading> {
        page.navigate(dashboard.as_str(), self.config.nav_timeout).await?;

        match page.wait_for_idle(self.config.idle_timeout).await {
            Ok(()) => {}
            Err(WatcherError::Timeout(message)) => debug!("{}, continuing", message),
            Err(e) => return Err(e),
        }

        // 等待客户端渲染完成
        tokio::time::sleep(self.config.settle_delay).await;

        let html = match tokio::time::timeout(self.config.lookup_timeout, page.content()).await {
            Ok(content) => content?,
            Err(_) => {
                return Err(WatcherError::Timeout(format!(
                    "page content not available within {}ms",
                    self.config.lookup_timeout.as_millis()
                )))
            }
        };

        Ok(self.extractor.extract(&html))
    }
}
