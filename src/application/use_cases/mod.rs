pub mod plan_resolver;
pub mod subscription_lifecycle;
pub mod view_metering;
