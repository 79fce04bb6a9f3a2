use crate::errors::Result;
use crate::models::watcher::Snapshot;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

/// 输出文件守卫
///
/// `commit` 写入本次运行的结果。若守卫在提交成功前被释放（错误提前返回或 panic），
/// 则写入空数组，保证输出文件始终存在。
pub struct OutputGuard {
    path: PathBuf,
    written: bool,
}

impl OutputGuard {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            written: false,
        }
    }

    pub fn commit(mut self, snapshots: &[Snapshot]) -> Result<()> {
        write_snapshots(&self.path, snapshots)?;
        self.written = true;
        Ok(())
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if self.written {
            return;
        }
        match write_snapshots(&self.path, &[]) {
            Ok(()) => warn!("Run ended without results, wrote empty {}", self.path.display()),
            Err(e) => error!("Failed to write fallback output {}: {}", self.path.display(), e),
        }
    }
}

/// 以缩进格式写出快照数组
pub fn write_snapshots(path: &Path, snapshots: &[Snapshot]) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshots)?;
    std::fs::write(path, json)?;
    info!("Wrote {} snapshots to {}", snapshots.len(), path.display());
    Ok(())
}
