pub mod errors;
pub mod models;
pub mod ports;
pub mod reaper;
pub mod service;
