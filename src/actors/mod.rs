pub mod document;
pub mod file_watcher;
pub mod tracking_store;
