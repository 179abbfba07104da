//! 🔌 Backends: where the real I/O happens.
//!
//! 🚰 Sources pour tuples in, Sinks slurp records up. And in between, the bridge
//! does the typing. We panic! (kidding, we use anyhow on this side and thiserror on that one)
//!
//! 🧠 Knowledge graph:
//! - Pattern: trait → concrete impls (InMemory, File, Stdin) → Backend enum dispatch
//! - `RecordSink` is the write half, `Sink` adds `close`. The bridge only ever sees the first.
//! - Configs live next to the backend that uses them and are re-exported here.
//!
//! 🦆 The duck is here because every file must have one. This is law.

pub(crate) mod file;
pub(crate) mod in_mem;
pub(crate) mod lines;
pub(crate) mod sink;
pub(crate) mod source;
pub(crate) mod stdin;

pub use file::{FileSink, FileSinkConfig, FileSource, FileSourceConfig};
pub use in_mem::{InMemorySink, InMemorySource, InMemorySourceConfig};
pub use sink::{RecordSink, Sink, SinkBackend};
pub use source::{SourceBackend, TupleSource};
pub use stdin::{StdinSource, StdinSourceConfig};
