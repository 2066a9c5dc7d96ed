pub mod log_setup;

pub use log_setup::{setup_logging, LogConfig};
