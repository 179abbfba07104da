use async_trait::async_trait;

use crate::backends::{file, in_mem};
use crate::common::StructuredRecord;
use crate::error::SinkError;

/// 📥 The write half of a sink: accept one record, persist it, report how that went.
///
/// This is the ONLY capability a `BridgeWriter` is handed. Note what is missing:
/// `close`. The writer borrows a `RecordSink`, so the type system itself keeps it
/// from closing a resource it does not own. No runtime flag. No honor system.
///
/// # Contract 📜
/// - `write` may block (await) on physical I/O. It must not reorder records.
/// - Failures are `SinkError::Io` or `SinkError::Interrupted`. Nothing else.
#[async_trait]
pub trait RecordSink: std::fmt::Debug + Send {
    /// 📡 Persist one record. The sink now owns it.
    async fn write(&mut self, record: StructuredRecord) -> Result<(), SinkError>;
}

/// 🕳️ A full sink: the write half plus the lifecycle half.
///
/// # Contract 📜
/// - `close` flushes, finalizes, and releases. Called exactly once, by whoever OWNS
///   the sink (the task context), never by the bridge writer.
/// - Skipping `close` is a bug. It is also considered rude.
#[async_trait]
pub trait Sink: RecordSink {
    /// 🗑️ Flush, finalize, and release. Call this. Always. Once.
    async fn close(&mut self) -> Result<(), SinkError>;
}

/// 🎭 The many faces of a Sink: one enum, every record destination we ship.
///
/// The enum dispatches `write` and `close` to the inner concrete type,
/// keeping the supervisor blissfully ignorant of where records actually land.
#[derive(Debug)]
pub enum SinkBackend {
    InMemory(in_mem::InMemorySink),
    File(file::FileSink),
}

#[async_trait]
impl RecordSink for SinkBackend {
    async fn write(&mut self, record: StructuredRecord) -> Result<(), SinkError> {
        match self {
            SinkBackend::InMemory(sink) => sink.write(record).await,
            SinkBackend::File(sink) => sink.write(record).await,
        }
    }
}

#[async_trait]
impl Sink for SinkBackend {
    async fn close(&mut self) -> Result<(), SinkError> {
        match self {
            SinkBackend::InMemory(sink) => sink.close().await,
            SinkBackend::File(sink) => sink.close().await,
        }
    }
}
