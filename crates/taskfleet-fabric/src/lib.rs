//! Execution fabric for taskfleet
//!
//! This crate provides the contract the dispatcher uses to reach a
//! broker and worker pool ([`ExecutionFabric`]), the task contract those
//! workers execute ([`Task`]), and [`LocalFabric`], an in-process
//! implementation with named queues, per-task retry policies and
//! cooperative revocation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use serde_json::json;
//! use taskfleet_core::TaskSpec;
//! use taskfleet_fabric::{ExecutionFabric, FabricConfig, LocalFabric, TaskContext, TaskFn};
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let fabric = LocalFabric::builder(FabricConfig::from_env())
//!         .task("hello", TaskFn::arc(|_ctx: TaskContext| async { Ok(json!("hi")) }))
//!         .queue("default", 4)
//!         .build()?;
//!
//!     let handle = fabric.submit(&TaskSpec::new("hello", "default")).await?;
//!     let output = fabric.get_result(&handle, Duration::from_secs(5)).await?;
//!     println!("{} after {} retries", output.value, output.retries);
//!     Ok(())
//! }
//! ```

mod backend;
mod client;
mod config;
mod error;
mod local;
mod task;
mod worker;

// Re-export main types
pub use backend::{JobState, ResultBackend};
pub use client::{ExecutionFabric, TaskHandle, TaskOutput};
pub use config::{FabricConfig, BROKER_URL_ENV, RESULT_BACKEND_ENV};
pub use error::{FabricError, TaskError};
pub use local::{LocalFabric, LocalFabricBuilder};
pub use task::{Task, TaskContext, TaskFn, TaskRef};
