pub mod announcement;
pub mod billing_record;
pub mod plan;
pub mod webhook;
