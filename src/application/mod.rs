pub mod app_error;
pub mod ports;
pub mod use_cases;

pub use app_error::*;
