pub mod output;
pub mod snapshot_service;
pub mod watch_list;
