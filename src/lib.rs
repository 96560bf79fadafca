pub mod app;
pub mod config;
pub mod draft;
pub mod editor_core;
pub mod preview;
pub mod prompt;
pub mod session;
pub mod sidebar;
pub mod storage;
pub mod tree;
