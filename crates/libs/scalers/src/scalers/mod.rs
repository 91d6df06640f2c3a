//! Concrete scaler implementations, one module per trigger type. Each
//! module exposes one or more `build` factories matching
//! [`crate::registry::Factory`].

pub mod aws_sqs;
pub mod cpu;
pub mod cron;
pub mod external;
pub mod kafka;
pub mod kubernetes_workload;
pub mod memory;
pub mod prometheus;
pub mod queue_depth;
pub mod redis_streams;
