pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod install;
pub mod system;
pub mod ui;
pub mod wizard;
