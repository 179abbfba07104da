// ai
//! 🌉 The BridgeWriter: untyped tuples in, schema-typed records out, in order, no excuses.
//!
//! 🎬 COLD OPEN. EXT. A BRIDGE, NIGHT, LIGHT RAIN
//!
//! On one bank: a worker process that only knows how to print two strings and a tab.
//! On the other: a sink that only accepts records with names, types, and a schema.
//! In the middle, holding an umbrella it does not own and refusing to close it:
//! the BridgeWriter. It takes a tuple, asks the resolver to dress it up, and walks
//! every resulting record across. One at a time. In order. Then it waits for the next.
//!
//! ## The rules of the bridge 📜
//! - One writer, one caller at a time (`&mut self`). No locks, no background tasks, no queue.
//! - Every record of tuple N reaches the sink before any record of tuple N+1.
//! - Sink failures are forwarded verbatim. No retries here; that is the caller's call.
//! - The first failing record stops the tuple: nothing after it is forwarded.
//! - After `close()`, `write` fails with `IllegalState` and the sink is left alone.
//! - The sink is BORROWED. The writer's bound is `RecordSink`, which has no `close`.
//!   Closing is the task context's job, exactly once, after the writer is done.
//!
//! ## Knowledge Graph 🧠
//! - Strategy: `R: ModeResolver` (default [`SchemaResolver`]) decides record shape.
//! - Sink: `&'s mut S` where `S: RecordSink + ?Sized`, so `dyn RecordSink` works too.
//! - Used by: `supervisors::Supervisor`'s bridge loop. 🦆

use tracing::{debug, trace};

use crate::backends::RecordSink;
use crate::error::BridgeError;
use crate::modes::{ModeResolver, OutputMode, SchemaResolver};

/// 🚦 The whole state machine. Two states. One direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Open,
    Closed,
}

/// 📊 Read-only counters. Not a buffer. Nothing here is ever replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeStats {
    /// 🧮 Tuples whose records ALL reached the sink.
    pub tuples_written: u64,
    /// 🧮 Records the sink accepted.
    pub records_written: u64,
}

/// 🌉 Per-task adapter from `(key, value)` text to records in a borrowed sink.
#[derive(Debug)]
pub struct BridgeWriter<'s, S: RecordSink + ?Sized, R: ModeResolver = SchemaResolver> {
    sink: &'s mut S,
    resolver: R,
    mode: OutputMode,
    state: BridgeState,
    stats: BridgeStats,
}

impl<'s, S: RecordSink + ?Sized, R: ModeResolver> BridgeWriter<'s, S, R> {
    /// 🏗️ Build an open writer. Fails fast with `SchemaMismatch` if the resolver
    /// has no slot layout for `mode`, before a single tuple shows up.
    pub fn new(mode: OutputMode, resolver: R, sink: &'s mut S) -> Result<Self, BridgeError> {
        resolver.validate(mode)?;
        debug!("🌉 bridge writer open in {} mode", mode);
        Ok(Self {
            sink,
            resolver,
            mode,
            state: BridgeState::Open,
            stats: BridgeStats::default(),
        })
    }

    /// 🚶 Carry one tuple across the bridge.
    ///
    /// Assembles the tuple's records, then forwards each one to the sink in order,
    /// awaiting each write before starting the next. The first failure ends the call.
    pub async fn write(&mut self, key: &str, value: &str) -> Result<(), BridgeError> {
        if self.state == BridgeState::Closed {
            return Err(BridgeError::IllegalState("write called after the bridge writer was closed"));
        }

        let records = self.resolver.assemble(self.mode, key, value)?;
        for record in records {
            // -- 📡 the sink owns the record now. we keep nothing. not even a glance.
            self.sink.write(record).await.map_err(BridgeError::from)?;
            self.stats.records_written += 1;
        }
        self.stats.tuples_written += 1;
        trace!("🌉 tuple #{} crossed the bridge", self.stats.tuples_written);
        Ok(())
    }

    /// 🏁 End-of-task signal. Moves to `Closed` for good.
    ///
    /// Idempotent. Does NOT close the sink; the sink belongs to the task context.
    pub fn close(&mut self) {
        if self.state == BridgeState::Open {
            debug!(
                "🏁 bridge writer closed after {} tuples / {} records",
                self.stats.tuples_written, self.stats.records_written
            );
        }
        self.state = BridgeState::Closed;
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == BridgeState::Open
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }
}
