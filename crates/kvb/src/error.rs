//! 💥 Errors: the five ways a tuple can fail to become a record.
//!
//! 🎬 *[a tuple approaches the bridge. the bridge looks at the schema. the schema looks back.]*
//!
//! The bridge core speaks `thiserror`, not `anyhow`, because callers need to tell
//! "your config is wrong, stop forever" apart from "the disk hiccuped, maybe retry".
//! Everything above the core (config, sources, supervisor, CLI) goes back to `anyhow`
//! and these enums ride along inside it, still downcastable. 🦆
//!
//! 🧠 Knowledge graph:
//! - `SinkError`: what a sink may report. `Io` or `Interrupted`. That's the whole menu.
//! - `BridgeError`: what `BridgeWriter::write` may report. Sink kinds pass through verbatim.
//! - `From<SinkError> for BridgeError` is the one-way valve. It never reclassifies.

use std::io;

use thiserror::Error;

use crate::modes::OutputMode;
use crate::schema::FieldType;

/// 📡 Failures a sink is allowed to surface from `write` or `close`.
#[derive(Debug, Error)]
pub enum SinkError {
    /// 💀 The sink tried. The disk (or socket, or whatever) said no.
    #[error("sink I/O failed: {0}")]
    Io(#[source] io::Error),

    /// ⏸️ The blocking write was interrupted before it finished.
    #[error("sink write was interrupted")]
    Interrupted,
}

impl From<io::Error> for SinkError {
    /// 🔀 `ErrorKind::Interrupted` gets its own lane; every other kind stays an `Io`.
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::Interrupted => SinkError::Interrupted,
            _ => SinkError::Io(err),
        }
    }
}

/// 🌉 Everything `BridgeWriter` and `ModeResolver` can fail with.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// 🧩 The schema has no slot layout for the requested mode. Config bug, fatal, never retried.
    #[error(
        "schema '{schema}' cannot hold {mode} records: mode packs {expected} field(s), schema declares {actual}"
    )]
    SchemaMismatch {
        mode: OutputMode,
        schema: String,
        expected: usize,
        actual: usize,
    },

    /// 📐 The schema itself is malformed (empty name, duplicate fields, ...).
    #[error("invalid record schema: {0}")]
    InvalidSchema(String),

    /// 🔢 The text could not be coerced into the slot's type.
    #[error("field '{field}' expects {expected}, got {raw:?}")]
    InvalidValue {
        field: String,
        expected: FieldType,
        raw: String,
    },

    /// 💀 The sink's write failed. The original `io::Error` is preserved as the source.
    #[error("sink write failed")]
    Io(#[source] io::Error),

    /// ⏸️ The sink's blocking write was interrupted. No partial cleanup was attempted.
    #[error("sink write was interrupted")]
    Interrupted,

    /// 🚫 The writer was asked to do something its state does not allow.
    #[error("illegal bridge state: {0}")]
    IllegalState(&'static str),
}

impl BridgeError {
    /// 🔄 True for failures a caller's retry policy may reasonably retry.
    ///
    /// The bridge itself never retries. This only answers the question for whoever does.
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Io(_) | BridgeError::Interrupted)
    }
}

impl From<SinkError> for BridgeError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io(io_err) => BridgeError::Io(io_err),
            SinkError::Interrupted => BridgeError::Interrupted,
        }
    }
}
