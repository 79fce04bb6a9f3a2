use crate::errors::{Result, WatcherError};
use crate::models::watcher::WatchTarget;
use log::{debug, info, warn};
use serde_json::Value;
use std::path::Path;

/// 读取观察者列表；文件缺失或格式错误时返回空列表，保证后续流程仍能输出结果
pub fn load(path: &Path) -> Vec<WatchTarget> {
    match read_targets(path) {
        Ok(targets) => targets,
        Err(e) => {
            warn!("Failed to load watch list {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

pub fn read_targets(path: &Path) -> Result<Vec<WatchTarget>> {
    let raw = std::fs::read_to_string(path)?;
    parse_targets(&raw)
}

/// Parse a JSON array of `{name, coin, url}` objects, skipping entries without a usable `url`.
pub fn parse_targets(raw: &str) -> Result<Vec<WatchTarget>> {
    let value: Value = serde_json::from_str(raw)?;
    let entries = value
        .as_array()
        .ok_or_else(|| WatcherError::DataError("watch list is not a JSON array".to_string()))?;

    let mut targets = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match target_from_entry(entry) {
            Some(target) => targets.push(target),
            None => debug!("Skipping watch list entry {} without a usable url", index),
        }
    }

    info!(
        "Loaded {} watch targets ({} skipped)",
        targets.len(),
        entries.len() - targets.len()
    );
    Ok(targets)
}

fn target_from_entry(entry: &Value) -> Option<WatchTarget> {
    let url = entry.get("url")?.as_str()?.trim();
    if url.is_empty() {
        return None;
    }

    let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
    let coin = entry
        .get("coin")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|coin| !coin.is_empty());

    Some(WatchTarget::new(name, coin, url))
}
