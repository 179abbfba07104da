//! 🚰 The SourceWorker: pulls tuples from the transport and drops them in the channel.
//!
//! It does not know what a schema is. It does not want to know. It reads, it sends,
//! and when the reading stops it hangs up the phone so the bridge knows it's over.

use anyhow::{Context, Result};
use async_channel::Sender;
use tokio::task::JoinHandle;
use tracing::debug;

use super::Worker;
use crate::backends::{SourceBackend, TupleSource};
use crate::common::RawTuple;

#[derive(Debug)]
pub(crate) struct SourceWorker {
    tx: Sender<RawTuple>,
    source: SourceBackend,
}

impl SourceWorker {
    pub(crate) fn new(tx: Sender<RawTuple>, source: SourceBackend) -> Self {
        Self { tx, source }
    }
}

impl Worker for SourceWorker {
    fn start(mut self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            debug!("🚰 SourceWorker started pouring tuples...");
            let mut sent = 0u64;
            while let Some(tuple) = self
                .source
                .next_tuple()
                .await
                .context("💀 SourceWorker failed to read the next tuple")?
            {
                if self.tx.send(tuple).await.is_err() {
                    // -- 📴 the bridge hung up first. it has its reasons. we stop quietly.
                    debug!("📴 SourceWorker: channel closed by the bridge after {} tuples", sent);
                    return Ok(());
                }
                sent += 1;
            }
            // -- 🏁 dropping self (and the sender) closes the channel. That IS the end-of-input signal.
            debug!("🏁 SourceWorker: source ran dry after {} tuples", sent);
            Ok(())
        })
    }
}
