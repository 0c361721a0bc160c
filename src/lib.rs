pub mod app;
pub mod config;
pub mod engine;
pub mod storage;
pub mod ui;
pub mod util;
