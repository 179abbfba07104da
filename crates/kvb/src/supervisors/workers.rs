//! 🧵 Workers: the ones who actually do the work while the Supervisor takes all
//! the credit in the sprint retro.
//!
//! Only the source side gets a worker. The bridge loop stays on the supervisor's own
//! task because it borrows the sink, and a borrowed sink cannot be shipped off to
//! `tokio::spawn`. That is the whole point of borrowing it. 🦆

use anyhow::Result;
use tokio::task::JoinHandle;

mod source_worker;
pub(crate) use source_worker::SourceWorker;

/// 🏗️ Something that runs on its own tokio task until its input runs dry.
///
/// "What's the DEAL with lifetime annotations? You borrow something,
///  you give it back. It's not that hard, Jerry!" (Seinfeld, on Rust)
pub(crate) trait Worker {
    /// 🚀 Start the worker. Returns a JoinHandle because we trust but verify.
    fn start(self) -> JoinHandle<Result<()>>;
}
