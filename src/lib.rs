// 公开导出的模块，供外部使用
pub mod models;
pub mod errors;
pub mod config;
pub mod scrapers;
pub mod services;
pub mod util;

// 重新导出常用类型，方便使用
pub use models::watcher::{DashboardUrl, Reading, Snapshot, WatchTarget};
pub use services::snapshot_service::SnapshotService;
pub use errors::{Result, WatcherError};
