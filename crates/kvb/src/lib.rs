//! 🌉 kvb: the key/value bridge.
//!
//! External workers print `key<TAB>value` lines. Sinks want schema-typed records.
//! This crate stands in the middle: a [`BridgeWriter`] that packs each tuple into
//! records according to an [`OutputMode`] and a [`RecordSchema`], and hands them to a
//! borrowed sink in strict order, forwarding every sink failure untouched. 🦆

pub mod app_config;
pub mod backends;
pub mod bridge;
pub mod common;
pub mod error;
pub mod modes;
pub mod progress;
pub mod schema;
mod supervisors;

use anyhow::{Context, Result};
use tokio::sync::watch;

pub use crate::app_config::AppConfig;
pub use crate::bridge::{BridgeState, BridgeStats, BridgeWriter};
pub use crate::common::{FieldValue, RawTuple, StructuredRecord};
pub use crate::error::{BridgeError, SinkError};
pub use crate::modes::{ModeResolver, OutputMode, SchemaResolver};
pub use crate::progress::TaskSummary;
pub use crate::schema::{FieldSchema, FieldType, RecordSchema};
pub use crate::supervisors::run_task;

/// 🚀 Run one bridge task from config: source → bridge → sink, sink closed exactly once.
///
/// Send `true` on the `shutdown` channel to stop between tuples; the task then fails
/// with [`BridgeError::Interrupted`] after closing the sink.
pub async fn run(app_config: AppConfig, shutdown: watch::Receiver<bool>) -> Result<TaskSummary> {
    supervisors::Supervisor::new(app_config)
        .run(shutdown)
        .await
        .context("💀 The bridge task did not complete")
}
