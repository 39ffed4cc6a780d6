// Domain layer - line configuration and metrics models
pub mod line;
pub mod metrics;
