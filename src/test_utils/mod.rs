//! In-memory mocks, fixture factories and an app-state builder for tests.

pub mod app_state_builder;
pub mod billing_mocks;
pub mod factories;

pub use app_state_builder::*;
pub use billing_mocks::*;
pub use factories::*;
