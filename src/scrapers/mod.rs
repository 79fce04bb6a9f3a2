pub mod base;
pub mod chromium;
pub mod extract;
