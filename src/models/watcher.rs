use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// 单个观察者链接配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchTarget {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub coin: Option<String>,
    pub url: String,
}

impl WatchTarget {
    pub fn new(name: &str, coin: Option<&str>, url: &str) -> Self {
        Self {
            name: name.to_string(),
            coin: coin.map(str::to_string),
            url: url.to_string(),
        }
    }

    /// 日志中用于标识目标的名称，未命名时退回到原始链接
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

/// Canonical observer dashboard URL together with the values resolved from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardUrl {
    url: Url,
    access_key: Option<String>,
    coin: String,
}

impl DashboardUrl {
    pub(crate) fn new(url: Url, access_key: Option<String>, coin: String) -> Self {
        Self { url, access_key, coin }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn access_key(&self) -> Option<&str> {
        self.access_key.as_deref()
    }

    pub fn coin(&self) -> &str {
        &self.coin
    }
}

impl fmt::Display for DashboardUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// 从渲染页面中提取的文本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reading {
    pub hashrate: Option<String>,
    pub workers: Option<String>,
}

/// 单个目标在一次运行中的抓取结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: String,
    pub name: String,
    pub coin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashrate_24h: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<String>,
    pub access_key: Option<String>,
    pub url: String,
    pub ts: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Snapshot {
    /// 抓取成功，缺失的字段写为空字符串
    pub fn captured(target: &WatchTarget, dashboard: &DashboardUrl, reading: Reading, date: &str, ts: &str) -> Self {
        Self {
            date: date.to_string(),
            name: target.name.clone(),
            coin: dashboard.coin().to_string(),
            hashrate_24h: Some(reading.hashrate.unwrap_or_default()),
            workers: Some(reading.workers.unwrap_or_default()),
            access_key: dashboard.access_key().map(str::to_string),
            url: dashboard.to_string(),
            ts: ts.to_string(),
            ok: true,
            error: None,
        }
    }

    /// 抓取失败；链接无法规范化时保留原始链接
    pub fn failed(
        target: &WatchTarget,
        dashboard: Option<&DashboardUrl>,
        error: String,
        date: &str,
        ts: &str,
    ) -> Self {
        let (coin, access_key, url) = match dashboard {
            Some(d) => (
                d.coin().to_string(),
                d.access_key().map(str::to_string),
                d.to_string(),
            ),
            None => (
                target
                    .coin
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .map(|c| c.trim().to_uppercase())
                    .unwrap_or_default(),
                None,
                target.url.clone(),
            ),
        };

        Self {
            date: date.to_string(),
            name: target.name.clone(),
            coin,
            hashrate_24h: None,
            workers: None,
            access_key,
            url,
            ts: ts.to_string(),
            ok: false,
            error: Some(error),
        }
    }
}
