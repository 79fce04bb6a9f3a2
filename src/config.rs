use std::path::PathBuf;
use std::time::Duration;

/// 规范化后的观察者面板主机
pub const CANONICAL_HOST: &str = "www.viabtc.com";

/// 规范化后的观察者面板路径
pub const DASHBOARD_PATH: &str = "/en/observer/dashboard";

/// 未指定币种时使用的默认值
pub const DEFAULT_COIN: &str = "LTC";

pub const WATCHERS_FILE: &str = "watchers.json";
pub const OUTPUT_FILE: &str = "data.json";

pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub nav_timeout: Duration,
    pub idle_timeout: Duration,
    pub idle_quiet_window: Duration,
    pub settle_delay: Duration,
    pub lookup_timeout: Duration,
}

impl Config {
    pub fn new() -> Self {
        Self {
            input_path: PathBuf::from(WATCHERS_FILE),
            output_path: PathBuf::from(OUTPUT_FILE),
            nav_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(15),
            idle_quiet_window: Duration::from_millis(500),
            settle_delay: Duration::from_secs(2),
            lookup_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_input_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.input_path = path.into();
        self
    }

    pub fn with_output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_nav_timeout(mut self, timeout: Duration) -> Self {
        self.nav_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_idle_quiet_window(mut self, window: Duration) -> Self {
        self.idle_quiet_window = window;
        self
    }

    // 页面空闲后额外等待客户端渲染
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
