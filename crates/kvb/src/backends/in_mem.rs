//! # Previously, on KVB...
//!
//! 🎬 The records were ready. Typed. Ordered. Schema-conformant. And nowhere to go.
//! Someone had to catch them. Someone had to be brave. Someone had to write a
//! backend so simple it lives entirely in RAM, gone the moment you blink.
//!
//! This module drew the short straw.
//!
//! `in_mem` provides an in-memory [`TupleSource`] and [`Sink`] for tests and demos.
//! [`InMemorySource`] hands out a configured list of tuples, then nothing, forever.
//! [`InMemorySink`] hoards every record behind an `Arc<Mutex<...>>` and counts how
//! many times somebody closed it, because "exactly once" is a claim and claims need
//! receipts. 🦆
//!
//! ⚠️ This is NOT for production. If you're deploying this to prod, please also
//! deploy a therapist.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use crate::backends::{RecordSink, Sink, TupleSource};
use crate::common::{RawTuple, StructuredRecord};
use crate::error::SinkError;

/// 📋 Tuples for the in-memory source, straight from config: `tuples = [["a", "1"], ["b", "2"]]`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InMemorySourceConfig {
    #[serde(default)]
    pub tuples: Vec<(String, String)>,
}

/// 📦 The world's most predictable data source. It knows its tuples. It gives them up in order.
#[derive(Debug, Default)]
pub struct InMemorySource {
    pending: VecDeque<RawTuple>,
}

impl InMemorySource {
    pub fn new(config: InMemorySourceConfig) -> Self {
        Self::from_tuples(config.tuples)
    }

    pub fn from_tuples<T: Into<RawTuple>>(tuples: impl IntoIterator<Item = T>) -> Self {
        Self {
            pending: tuples.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TupleSource for InMemorySource {
    async fn next_tuple(&mut self) -> Result<Option<RawTuple>> {
        // -- 🎯 FIFO. First tuple in, first tuple out. Like a deli counter with better manners.
        Ok(self.pending.pop_front())
    }
}

/// 📦 A sink that keeps every record it is handed, and remembers every time it was closed.
///
/// Clone-able because tests need to peek inside after handing a copy to the pipeline.
/// The `Arc` means every clone shares the same Vec and the same close counter.
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    /// 🔒 The evidence locker. Each entry = one record, in arrival order.
    received: Arc<tokio::sync::Mutex<Vec<StructuredRecord>>>,
    /// 🧮 How many times `close` was called. The answer should always be 0 or 1.
    close_calls: Arc<AtomicUsize>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 📋 Snapshot of everything received so far.
    pub async fn records(&self) -> Vec<StructuredRecord> {
        self.received.lock().await.clone()
    }

    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSink for InMemorySink {
    async fn write(&mut self, record: StructuredRecord) -> Result<(), SinkError> {
        trace!("📥 in-memory sink stashing a {}-field record", record.len());
        // 🔒 clones share this Vec, so the lock is what keeps arrival order honest
        self.received.lock().await.push(record);
        Ok(())
    }
}

#[async_trait]
impl Sink for InMemorySink {
    /// 🗑️ Nothing to flush. We live in RAM. We just tally the farewell.
    async fn close(&mut self) -> Result<(), SinkError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{ModeResolver, OutputMode, SchemaResolver};
    use crate::schema::RecordSchema;

    #[tokio::test]
    async fn the_one_where_the_source_gives_everything_once_then_nothing() -> Result<()> {
        let mut the_source = InMemorySource::new(InMemorySourceConfig {
            tuples: vec![("a".into(), "1".into()), ("b".into(), "2".into())],
        });
        assert_eq!(the_source.next_tuple().await?, Some(RawTuple::new("a", "1")));
        assert_eq!(the_source.next_tuple().await?, Some(RawTuple::new("b", "2")));
        assert_eq!(the_source.next_tuple().await?, None);
        assert_eq!(the_source.next_tuple().await?, None, "the well does not refill");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_clones_share_one_evidence_locker() -> Result<()> {
        let the_witness = InMemorySink::new();
        let mut the_pipeline_copy = the_witness.clone();

        let the_resolver = SchemaResolver::new(RecordSchema::default_for(OutputMode::KeyValue));
        for record in the_resolver.assemble(OutputMode::KeyValue, "k", "v")? {
            the_pipeline_copy.write(record).await?;
        }
        the_pipeline_copy.close().await?;

        assert_eq!(the_witness.records().await.len(), 1);
        assert_eq!(the_witness.close_count(), 1);
        Ok(())
    }
}
