pub mod collections;
pub mod config;
pub mod log;
pub mod state;
pub mod util;
