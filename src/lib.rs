pub mod api;
pub mod audit;
pub mod config;
pub mod logging;
pub mod models;
pub mod service;
pub mod shortcode;
pub mod storage;
