///! rinkwatch - venue ice-time schedule monitor
pub mod config;
pub mod logging;
pub mod module;
