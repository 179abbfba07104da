use anyhow::Result;
use async_trait::async_trait;

use crate::backends::{file, in_mem, stdin};
use crate::common::RawTuple;

/// 🚰 The transport's end of the bridge: hands over key/value tuples in FIFO order.
///
/// # Contract 📜
/// - `next_tuple` returns `Some(tuple)` while input flows and `None` once it runs dry.
/// - After `None`, further calls keep returning `None`. The well does not refill.
/// - Errors mean the transport itself broke (unreadable file, invalid UTF-8, ...).
#[async_trait]
pub trait TupleSource: std::fmt::Debug + Send {
    /// 📦 Fetch the next tuple from wherever the worker's output lives.
    async fn next_tuple(&mut self) -> Result<Option<RawTuple>>;
}

/// 🎭 Polymorphic source dispatch: RAM, disk, or the standard input void.
#[derive(Debug)]
pub enum SourceBackend {
    InMemory(in_mem::InMemorySource),
    File(file::FileSource),
    Stdin(stdin::StdinSource),
}

#[async_trait]
impl TupleSource for SourceBackend {
    async fn next_tuple(&mut self) -> Result<Option<RawTuple>> {
        match self {
            SourceBackend::InMemory(source) => source.next_tuple().await,
            SourceBackend::File(source) => source.next_tuple().await,
            SourceBackend::Stdin(source) => source.next_tuple().await,
        }
    }
}
