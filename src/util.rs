use chrono::{DateTime, SecondsFormat, Utc};

// 运行时间戳，与 ISO-8601 毫秒精度格式一致
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// 日期字符串 YYYY-MM-DD
pub fn format_day(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

// 观察者链接规范化工具
pub mod url_utils {
    use crate::config::{CANONICAL_HOST, DASHBOARD_PATH, DEFAULT_COIN};
    use crate::errors::Result;
    use crate::models::watcher::{DashboardUrl, WatchTarget};
    use url::Url;

    /// 将任意观察者链接改写为固定主机上的英文面板链接
    ///
    /// 币种优先取配置项，其次取链接中的 `coin` 参数，最后使用默认值，并统一转为大写。
    pub fn normalize(target: &WatchTarget) -> Result<DashboardUrl> {
        let source = Url::parse(target.url.trim())?;

        let access_key = query_value(&source, "access_key");
        let coin = target
            .coin
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .or_else(|| query_value(&source, "coin").map(|c| c.trim().to_string()))
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COIN.to_string())
            .to_uppercase();

        let mut url = Url::parse(&format!("https://{}{}", CANONICAL_HOST, DASHBOARD_PATH))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = &access_key {
                query.append_pair("access_key", key);
            }
            query.append_pair("coin", &coin);
        }

        Ok(DashboardUrl::new(url, access_key, coin))
    }

    fn query_value(url: &Url, name: &str) -> Option<String> {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }
}
